//! `GROUP BY` columns and the `HAVING` clause

use super::where_::check_condition;
use super::{ctes_of, rank, static_ctes_of, static_tables_of, tables_of, ClauseRules};
use crate::check::{check_grouped, StatementContext};
use crate::dynamic::{active_values, static_values, Element};
use crate::error::{Error, Failure, Result};
use crate::expr::Expr;
use crate::serialize::{join, Context, ToSql};
use crate::type_set::{has_duplicates, TableSet, TypeSet};

/// `GROUP BY ...`; entries are columns or declared group_by columns
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    entries: Vec<Element<Expr>>,
}

impl GroupBy {
    pub(crate) fn new(entries: Vec<Element<Expr>>) -> Result<Self> {
        let fail = |failure| Err(Error::check("group_by", failure));
        if entries.is_empty() {
            return fail(Failure::NoArguments);
        }
        for entry in &entries {
            if !matches!(entry.value(), Expr::Column(_) | Expr::GroupByColumn(_)) {
                return fail(Failure::NotAGroupByColumn);
            }
        }
        let values: Vec<&Expr> = entries.iter().map(Element::value).collect();
        if has_duplicates(&values) {
            return fail(Failure::DuplicateArguments);
        }
        Ok(Self { entries })
    }
}

impl ClauseRules for GroupBy {
    fn name(&self) -> &'static str {
        "group_by"
    }

    fn rank(&self) -> u8 {
        rank::GROUP_BY
    }

    fn required_tables(&self) -> TableSet {
        tables_of(self.entries.iter().map(Element::value))
    }

    fn required_static_tables(&self) -> TableSet {
        static_tables_of(static_values(&self.entries))
    }

    fn required_ctes(&self) -> TableSet {
        ctes_of(self.entries.iter().map(Element::value))
    }

    fn required_static_ctes(&self) -> TableSet {
        static_ctes_of(static_values(&self.entries))
    }

    fn group_by(&self) -> Option<(TypeSet<Expr>, TypeSet<Expr>)> {
        let all = self.entries.iter().map(Element::value).cloned().collect();
        let static_only = static_values(&self.entries).cloned().collect();
        Some((all, static_only))
    }
}

impl ToSql for GroupBy {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let active: Vec<&Expr> = active_values(&self.entries).collect();
        if active.is_empty() {
            return Ok(String::new());
        }
        Ok(format!(" GROUP BY {}", join(context, active, ", ")?))
    }
}

/// `HAVING condition`
#[derive(Debug, Clone, PartialEq)]
pub struct Having {
    condition: Element<Expr>,
}

impl Having {
    pub(crate) fn new(condition: Element<Expr>) -> Result<Self> {
        check_condition("having", condition.value())?;
        Ok(Self { condition })
    }
}

impl ClauseRules for Having {
    fn name(&self) -> &'static str {
        "having"
    }

    fn rank(&self) -> u8 {
        rank::HAVING
    }

    fn required_tables(&self) -> TableSet {
        self.condition.value().required_tables()
    }

    fn required_static_tables(&self) -> TableSet {
        match &self.condition {
            Element::Static(condition) => condition.required_static_tables(),
            Element::Dynamic { .. } => TableSet::new(),
        }
    }

    fn required_ctes(&self) -> TableSet {
        self.condition.value().required_ctes()
    }

    fn required_static_ctes(&self) -> TableSet {
        match &self.condition {
            Element::Static(condition) => condition.required_static_ctes(),
            Element::Dynamic { .. } => TableSet::new(),
        }
    }

    fn check_consistency(&self, context: &StatementContext) -> Result<()> {
        let condition = self.condition.value();
        if context.has_group_by {
            check_grouped("having", [(condition, self.condition.is_static())], context)
        } else if !condition.is_aggregate_over(&TypeSet::new()) {
            Err(Error::check("having", Failure::NotAggregate))
        } else {
            Ok(())
        }
    }
}

impl ToSql for Having {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        match self.condition.active_value() {
            Some(condition) => Ok(format!(" HAVING {}", condition.to_sql_string(context)?)),
            None => Ok(String::new()),
        }
    }
}
