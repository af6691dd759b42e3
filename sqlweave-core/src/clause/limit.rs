//! `LIMIT` and `OFFSET` row counts

use super::{rank, ClauseRules};
use crate::error::{Error, Failure, Result};
use crate::expr::{Expr, IntoExpr};
use crate::value::Value;
use crate::serialize::{Context, ToSql};
use crate::value_type::{HasValueType, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Limit,
    Offset,
}

impl LimitKind {
    fn keyword(&self) -> &'static str {
        match self {
            LimitKind::Limit => "LIMIT",
            LimitKind::Offset => "OFFSET",
        }
    }

    fn keyword_name(&self) -> &'static str {
        match self {
            LimitKind::Limit => "limit",
            LimitKind::Offset => "offset",
        }
    }
}

/// `LIMIT n` or `OFFSET n`; `n` is an integral literal or parameter
#[derive(Debug, Clone, PartialEq)]
pub struct RowLimit {
    kind: LimitKind,
    count: Expr,
}

impl RowLimit {
    pub(crate) fn new(kind: LimitKind, count: impl IntoExpr) -> Result<Self> {
        let count = count.into_expr()?;
        let value_type = count.value_type();
        let literal = matches!(count, Expr::Value(_) | Expr::Parameter(_));
        let integral = value_type != ValueType::Null
            && (value_type.is_integral() || value_type.is_unsigned_integral());
        if !literal || !integral {
            return Err(Error::check(
                kind.keyword_name(),
                Failure::OperandType {
                    operator: kind.keyword(),
                    operand: value_type,
                },
            ));
        }
        if let Expr::Value(Value::Int(n)) = &count {
            if *n < 0 {
                return Err(Error::check(
                    kind.keyword_name(),
                    Failure::NegativeCount {
                        operator: kind.keyword(),
                        value: *n,
                    },
                ));
            }
        }
        Ok(Self { kind, count })
    }
}

impl ClauseRules for RowLimit {
    fn name(&self) -> &'static str {
        self.kind.keyword_name()
    }

    fn rank(&self) -> u8 {
        match self.kind {
            LimitKind::Limit => rank::LIMIT,
            LimitKind::Offset => rank::OFFSET,
        }
    }
}

impl ToSql for RowLimit {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        Ok(format!(" {} {}", self.kind.keyword(), self.count.to_sql_string(context)?))
    }
}
