//! Sort orders for ORDER BY

use super::Expr;
use crate::error::{Error, Failure, Result};
use crate::serialize::{Context, ToSql};
use crate::value_type::HasValueType;
use std::fmt::{self, Display};

/// Sort direction for ORDER BY
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// An expression with a sort direction
#[derive(Debug, Clone, PartialEq)]
pub struct SortOrder {
    expr: Expr,
    direction: SortDirection,
    nulls: Option<NullsOrder>,
}

impl SortOrder {
    pub(crate) fn new(expr: Expr, direction: SortDirection) -> Result<Self> {
        if !expr.value_type().has_value() {
            return Err(Error::check(
                "order_by",
                Failure::OperandType {
                    operator: "ORDER BY",
                    operand: expr.value_type(),
                },
            ));
        }
        Ok(Self {
            expr,
            direction,
            nulls: None,
        })
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

impl ToSql for SortOrder {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let mut sql = format!("{} {}", self.expr.embraced_sql(context)?, self.direction);
        match self.nulls {
            Some(NullsOrder::First) => sql.push_str(" NULLS FIRST"),
            Some(NullsOrder::Last) => sql.push_str(" NULLS LAST"),
            None => {}
        }
        Ok(sql)
    }
}
