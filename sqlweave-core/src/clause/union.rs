//! `UNION` of two selects

use super::{rank, ClauseRules};
use crate::dynamic::{Dynamic, Element};
use crate::error::{Error, Failure, Result};
use crate::schema::ResultField;
use crate::serialize::{Context, ToSql};
use crate::statement::Select;
use crate::type_set::TableSet;

/// Right-hand side of a union, optionally [`dynamic`](crate::dynamic())
pub trait IntoUnionArm {
    fn into_union_arm(self) -> Result<Element<Select>>;
}

impl IntoUnionArm for Select {
    fn into_union_arm(self) -> Result<Element<Select>> {
        Ok(Element::Static(self))
    }
}

impl IntoUnionArm for Result<Select> {
    fn into_union_arm(self) -> Result<Element<Select>> {
        Ok(Element::Static(self?))
    }
}

impl<T: IntoUnionArm> IntoUnionArm for Dynamic<T> {
    fn into_union_arm(self) -> Result<Element<Select>> {
        let active = self.active;
        let value = self.value.into_union_arm()?.into_value();
        Ok(Element::Dynamic { active, value })
    }
}

/// Union arms must produce rows of the same shape
pub(crate) fn check_union_fields(lhs: &[ResultField], rhs: &[ResultField]) -> Result<()> {
    if lhs != rhs {
        return Err(Error::check("union", Failure::UnionResultMismatch));
    }
    Ok(())
}

/// `UNION ALL` / `UNION DISTINCT` with another select
#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    distinct: bool,
    rhs: Element<Box<Select>>,
}

impl Union {
    pub(crate) fn new(fields: &[ResultField], distinct: bool, rhs: Element<Select>) -> Result<Self> {
        check_union_fields(fields, &rhs.value().result_fields())?;
        Ok(Self {
            distinct,
            rhs: rhs.map(Box::new),
        })
    }
}

impl ClauseRules for Union {
    fn name(&self) -> &'static str {
        "union"
    }

    fn rank(&self) -> u8 {
        rank::UNION
    }

    fn required_tables(&self) -> TableSet {
        self.rhs.value().unresolved_tables()
    }

    fn required_static_tables(&self) -> TableSet {
        match &self.rhs {
            Element::Static(rhs) => rhs.unresolved_tables(),
            Element::Dynamic { .. } => TableSet::new(),
        }
    }

    fn required_ctes(&self) -> TableSet {
        self.rhs.value().unresolved_ctes()
    }

    fn required_static_ctes(&self) -> TableSet {
        match &self.rhs {
            Element::Static(rhs) => rhs.unresolved_ctes(),
            Element::Dynamic { .. } => TableSet::new(),
        }
    }
}

impl ToSql for Union {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        match self.rhs.active_value() {
            Some(rhs) => {
                let keyword = context.dialect().union_keyword(self.distinct);
                Ok(format!(" {} {}", keyword, rhs.to_sql_string(context)?))
            }
            None => Ok(String::new()),
        }
    }
}
