//! Named expressions, as used in select columns

use super::Expr;
use crate::error::{Error, Failure, Result};
use crate::serialize::{Context, ToSql};
use crate::value_type::{HasValueType, ValueType};

/// An expression with an explicit result name
#[derive(Debug, Clone, PartialEq)]
pub struct Aliased {
    expr: Expr,
    name: String,
}

impl Aliased {
    pub(crate) fn new(expr: Expr, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::check("as", Failure::MissingName));
        }
        Ok(Self {
            expr,
            name: name.to_string(),
        })
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl HasValueType for Aliased {
    fn value_type(&self) -> ValueType {
        self.expr.value_type()
    }
}

impl ToSql for Aliased {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let expr = self.expr.embraced_sql(context)?;
        Ok(format!("{} AS {}", expr, context.quote(&self.name)))
    }
}
