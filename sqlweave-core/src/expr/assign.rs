//! Column assignments for SET, INSERT and ON CONFLICT DO UPDATE

use super::{Expr, IntoExpr};
use crate::error::{Error, Failure, Result};
use crate::schema::Column;
use crate::serialize::{Context, ToSql};
use crate::value_type::{values_are_comparable, HasValueType};

#[derive(Debug, Clone, PartialEq)]
pub enum AssignedValue {
    Expr(Expr),
    Default,
}

/// `column = value`; has no value type of its own
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    column: Column,
    value: AssignedValue,
}

impl Assignment {
    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn value(&self) -> &AssignedValue {
        &self.value
    }

    pub(crate) fn expr(&self) -> Option<&Expr> {
        match &self.value {
            AssignedValue::Expr(expr) => Some(expr),
            AssignedValue::Default => None,
        }
    }
}

impl ToSql for Assignment {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let value = match &self.value {
            AssignedValue::Expr(expr) => expr.to_sql_string(context)?,
            AssignedValue::Default => "DEFAULT".to_string(),
        };
        Ok(format!("{} = {}", self.column.unqualified_sql(context), value))
    }
}

impl Column {
    fn assignable(&self) -> Result<()> {
        if self.spec().is_read_only() {
            return Err(Error::check(
                "set",
                Failure::ReadOnlyColumn {
                    column: self.name().to_string(),
                },
            ));
        }
        Ok(())
    }

    /// Check that `value` may be stored in this column
    pub(crate) fn check_assigned(&self, value: &Expr) -> Result<()> {
        let column_type = self.value_type();
        let value_type = value.value_type();
        let nullability = column_type.is_optional() || !value_type.is_optional();
        if !values_are_comparable(column_type, value_type) || !nullability {
            return Err(Error::check(
                "set",
                Failure::AssignmentTypes {
                    column: self.name().to_string(),
                    column_type,
                    value: value_type,
                },
            ));
        }
        if value.contains_aggregate_function() {
            return Err(Error::check("set", Failure::AggregateNotAllowed));
        }
        Ok(())
    }

    /// `column = value`
    pub fn set(&self, value: impl IntoExpr) -> Result<Assignment> {
        self.assignable()?;
        let value = value.into_expr()?;
        self.check_assigned(&value)?;
        Ok(Assignment {
            column: self.clone(),
            value: AssignedValue::Expr(value),
        })
    }

    /// `column = DEFAULT`
    pub fn set_default(&self) -> Result<Assignment> {
        self.assignable()?;
        Ok(Assignment {
            column: self.clone(),
            value: AssignedValue::Default,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{null, ExpressionOps};
    use crate::fixtures::{TabBar, TabFoo};
    use crate::serialize::{render, DefaultDialect};

    #[test]
    fn test_assignment_sql() {
        let foo = TabFoo::new();
        let a = foo.double_n().set(42).unwrap();
        assert_eq!(render(&DefaultDialect, &a).unwrap(), "double_n = 42");
        let a = foo.int_n().set(foo.int_n().add(1)).unwrap();
        assert_eq!(render(&DefaultDialect, &a).unwrap(), "int_n = tab_foo.int_n + 1");
        let a = foo.text_nn_d().set_default().unwrap();
        assert_eq!(render(&DefaultDialect, &a).unwrap(), "text_nn_d = DEFAULT");
    }

    #[test]
    fn test_assignment_type_mismatch() {
        let foo = TabFoo::new();
        let err = foo.int_n().set("seven").unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::AssignmentTypes { .. })));
        let bar = TabBar::new();
        let err = bar.bool_nn().set(null()).unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::AssignmentTypes { .. })));
        assert!(foo.int_n().set(null()).is_ok());
    }

    #[test]
    fn test_read_only_column() {
        let bar = TabBar::new();
        let err = bar.computed().set(1).unwrap_err();
        assert_eq!(
            err.failure(),
            Some(&Failure::ReadOnlyColumn {
                column: "computed".to_string()
            })
        );
    }
}
