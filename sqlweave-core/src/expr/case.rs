//! CASE WHEN ... THEN ... ELSE ... END

use super::{Expr, IntoExpr};
use crate::error::{Error, Failure, Result};
use crate::serialize::{Context, ToSql};
use crate::value_type::{values_are_comparable, HasValueType, ValueType};

/// A searched CASE expression
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    whens: Vec<(Expr, Expr)>,
    else_: Expr,
    value_type: ValueType,
}

impl Case {
    pub(crate) fn nodes(&self) -> Vec<&Expr> {
        let mut nodes = Vec::with_capacity(self.whens.len() * 2 + 1);
        for (condition, result) in &self.whens {
            nodes.push(condition);
            nodes.push(result);
        }
        nodes.push(&self.else_);
        nodes
    }
}

impl HasValueType for Case {
    fn value_type(&self) -> ValueType {
        self.value_type
    }
}

impl ToSql for Case {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let mut sql = String::from("CASE");
        for (condition, result) in &self.whens {
            sql.push_str(" WHEN ");
            sql.push_str(&condition.to_sql_string(context)?);
            sql.push_str(" THEN ");
            sql.push_str(&result.to_sql_string(context)?);
        }
        sql.push_str(" ELSE ");
        sql.push_str(&self.else_.to_sql_string(context)?);
        sql.push_str(" END");
        Ok(sql)
    }
}

/// Start a CASE expression with its first condition
pub fn case_when(condition: impl IntoExpr) -> CaseWhen {
    CaseWhen {
        whens: Ok(Vec::new()),
        condition: condition.into_expr(),
    }
}

/// A CASE expression waiting for the result of its last condition
#[derive(Debug)]
pub struct CaseWhen {
    whens: Result<Vec<(Expr, Expr)>>,
    condition: Result<Expr>,
}

impl CaseWhen {
    pub fn then(self, result: impl IntoExpr) -> CaseThen {
        let whens = self.whens.and_then(|mut whens| {
            let condition = self.condition?;
            if !condition.value_type().is_boolean() {
                return Err(Error::check(
                    "case",
                    Failure::NotBoolean {
                        found: condition.value_type(),
                    },
                ));
            }
            whens.push((condition, result.into_expr()?));
            Ok(whens)
        });
        CaseThen { whens }
    }
}

/// A CASE expression that can take another condition or be completed
#[derive(Debug)]
pub struct CaseThen {
    whens: Result<Vec<(Expr, Expr)>>,
}

impl CaseThen {
    pub fn when(self, condition: impl IntoExpr) -> CaseWhen {
        CaseWhen {
            whens: self.whens,
            condition: condition.into_expr(),
        }
    }

    /// Complete the expression; all results must be comparable
    pub fn else_(self, result: impl IntoExpr) -> Result<Expr> {
        let whens = self.whens?;
        let else_ = result.into_expr()?;
        let results: Vec<ValueType> = whens
            .iter()
            .map(|(_, result)| result.value_type())
            .chain(std::iter::once(else_.value_type()))
            .collect();
        let first = results
            .iter()
            .copied()
            .find(|value_type| value_type.data_type().is_some())
            .unwrap_or(ValueType::Null);
        for value_type in &results {
            if !values_are_comparable(first, *value_type) {
                return Err(Error::check(
                    "case",
                    Failure::OperandTypes {
                        operator: "CASE",
                        left: first,
                        right: *value_type,
                    },
                ));
            }
        }
        let optional = results.iter().any(ValueType::is_optional);
        Ok(Expr::Case(Box::new(Case {
            whens,
            else_,
            value_type: first.optional_if(optional),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExpressionOps;
    use crate::fixtures::TabFoo;
    use crate::serialize::{render, DefaultDialect};
    use crate::value_type::DataType;

    #[test]
    fn test_case_sql_and_type() {
        let foo = TabFoo::new();
        let e = case_when(foo.id().gt(10))
            .then("big")
            .when(foo.id().gt(5))
            .then("medium")
            .else_("small")
            .unwrap();
        assert_eq!(
            render(&DefaultDialect, &e).unwrap(),
            "CASE WHEN tab_foo.id > 10 THEN 'big' WHEN tab_foo.id > 5 THEN 'medium' ELSE 'small' END"
        );
        assert_eq!(e.value_type(), ValueType::of(DataType::Text));
    }

    #[test]
    fn test_case_with_null_else_is_optional() {
        let foo = TabFoo::new();
        let e = case_when(foo.bool_n())
            .then(foo.id())
            .else_(crate::expr::null())
            .unwrap();
        assert_eq!(e.value_type(), ValueType::optional(DataType::Integral));
    }

    #[test]
    fn test_case_requires_boolean_condition() {
        let foo = TabFoo::new();
        let err = case_when(foo.id()).then(1).else_(2).unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::NotBoolean { .. })));
    }

    #[test]
    fn test_case_results_must_be_comparable() {
        let foo = TabFoo::new();
        let err = case_when(foo.bool_n()).then(1).else_("x").unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::OperandTypes { operator: "CASE", .. })));
    }
}
