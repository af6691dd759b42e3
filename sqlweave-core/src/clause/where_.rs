//! `WHERE` conditions, also used for `HAVING` and `ON CONFLICT ... WHERE`

use super::{rank, ClauseRules};
use crate::dynamic::Element;
use crate::error::{Error, Failure, Result};
use crate::expr::Expr;
use crate::serialize::{Context, ToSql};
use crate::type_set::TableSet;
use crate::value_type::HasValueType;

/// `WHERE condition`, or an explicit decision to affect every row
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    Condition(Element<Expr>),
    Unconditionally,
}

impl WhereClause {
    pub(crate) fn condition(condition: Element<Expr>) -> Result<Self> {
        check_condition("where", condition.value())?;
        if condition.value().contains_aggregate_function() {
            return Err(Error::check("where", Failure::AggregateNotAllowed));
        }
        Ok(WhereClause::Condition(condition))
    }
}

/// Conditions must be boolean
pub(crate) fn check_condition(clause: &'static str, condition: &Expr) -> Result<()> {
    let found = condition.value_type();
    if !found.is_boolean() {
        return Err(Error::check(clause, Failure::NotBoolean { found }));
    }
    Ok(())
}

impl ClauseRules for WhereClause {
    fn name(&self) -> &'static str {
        "where"
    }

    fn rank(&self) -> u8 {
        rank::WHERE
    }

    fn required_tables(&self) -> TableSet {
        match self {
            WhereClause::Condition(condition) => condition.value().required_tables(),
            WhereClause::Unconditionally => TableSet::new(),
        }
    }

    fn required_static_tables(&self) -> TableSet {
        match self {
            WhereClause::Condition(Element::Static(condition)) => {
                condition.required_static_tables()
            }
            _ => TableSet::new(),
        }
    }

    fn required_ctes(&self) -> TableSet {
        match self {
            WhereClause::Condition(condition) => condition.value().required_ctes(),
            WhereClause::Unconditionally => TableSet::new(),
        }
    }

    fn required_static_ctes(&self) -> TableSet {
        match self {
            WhereClause::Condition(Element::Static(condition)) => condition.required_static_ctes(),
            _ => TableSet::new(),
        }
    }
}

impl ToSql for WhereClause {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        match self {
            WhereClause::Condition(condition) => match condition.active_value() {
                Some(condition) => Ok(format!(" WHERE {}", condition.to_sql_string(context)?)),
                None => Ok(String::new()),
            },
            WhereClause::Unconditionally => Ok(String::new()),
        }
    }
}
