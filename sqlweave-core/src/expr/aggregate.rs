//! Aggregate functions

use super::{Expr, IntoExpr};
use crate::error::{Error, Failure, Result};
use crate::serialize::{Context, ToSql};
use crate::value_type::{DataType, HasValueType, ValueType};
use std::fmt::{self, Display};

/// Aggregate functions for SELECT queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }

    /// Lowercase name, also the implicit result column name
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }
}

impl Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An aggregate function call; `argument` is `None` for `COUNT(*)`
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    function: AggregateFunction,
    distinct: bool,
    argument: Option<Expr>,
    over: bool,
}

impl Aggregate {
    fn build(function: AggregateFunction, distinct: bool, argument: impl IntoExpr) -> Result<Expr> {
        let argument = argument.into_expr()?;
        if argument.contains_aggregate_function() {
            return Err(Error::check(function.name(), Failure::NestedAggregates));
        }
        let operand = argument.value_type();
        let accepted = match function {
            AggregateFunction::Sum | AggregateFunction::Avg => operand.is_numeric(),
            AggregateFunction::Count | AggregateFunction::Min | AggregateFunction::Max => {
                operand.has_value()
            }
        };
        if !accepted {
            return Err(Error::check(
                function.name(),
                Failure::OperandType {
                    operator: function.as_str(),
                    operand,
                },
            ));
        }
        Ok(Expr::Aggregate(Box::new(Aggregate {
            function,
            distinct,
            argument: Some(argument),
            over: false,
        })))
    }

    pub fn function(&self) -> AggregateFunction {
        self.function
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn argument(&self) -> Option<&Expr> {
        self.argument.as_ref()
    }

    pub fn is_window(&self) -> bool {
        self.over
    }

    pub(crate) fn set_over(&mut self) {
        self.over = true;
    }
}

impl HasValueType for Aggregate {
    fn value_type(&self) -> ValueType {
        let argument = self
            .argument
            .as_ref()
            .map(HasValueType::value_type)
            .unwrap_or(ValueType::NoValue);
        match self.function {
            AggregateFunction::Count => ValueType::of(DataType::Integral),
            AggregateFunction::Avg => ValueType::optional(DataType::FloatingPoint),
            AggregateFunction::Sum => match argument.data_type() {
                Some(DataType::Boolean) | None => ValueType::optional(DataType::Integral),
                Some(data_type) => ValueType::optional(data_type),
            },
            AggregateFunction::Min | AggregateFunction::Max => argument.force_optional(),
        }
    }
}

impl ToSql for Aggregate {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let argument = match &self.argument {
            Some(argument) => argument.to_sql_string(context)?,
            None => "*".to_string(),
        };
        let mut sql = format!(
            "{}({}{})",
            self.function,
            if self.distinct { "DISTINCT " } else { "" },
            argument
        );
        if self.over {
            sql.push_str(" OVER()");
        }
        Ok(sql)
    }
}

pub fn count(expr: impl IntoExpr) -> Result<Expr> {
    Aggregate::build(AggregateFunction::Count, false, expr)
}

pub fn count_distinct(expr: impl IntoExpr) -> Result<Expr> {
    Aggregate::build(AggregateFunction::Count, true, expr)
}

/// `COUNT(*)`
pub fn count_all() -> Expr {
    Expr::Aggregate(Box::new(Aggregate {
        function: AggregateFunction::Count,
        distinct: false,
        argument: None,
        over: false,
    }))
}

pub fn sum(expr: impl IntoExpr) -> Result<Expr> {
    Aggregate::build(AggregateFunction::Sum, false, expr)
}

pub fn sum_distinct(expr: impl IntoExpr) -> Result<Expr> {
    Aggregate::build(AggregateFunction::Sum, true, expr)
}

pub fn avg(expr: impl IntoExpr) -> Result<Expr> {
    Aggregate::build(AggregateFunction::Avg, false, expr)
}

pub fn avg_distinct(expr: impl IntoExpr) -> Result<Expr> {
    Aggregate::build(AggregateFunction::Avg, true, expr)
}

pub fn min(expr: impl IntoExpr) -> Result<Expr> {
    Aggregate::build(AggregateFunction::Min, false, expr)
}

pub fn max(expr: impl IntoExpr) -> Result<Expr> {
    Aggregate::build(AggregateFunction::Max, false, expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{value, ExpressionOps};
    use crate::fixtures::TabFoo;
    use crate::serialize::{render, DefaultDialect};

    fn sql(expr: &Expr) -> String {
        render(&DefaultDialect, expr).unwrap()
    }

    #[test]
    fn test_aggregate_sql() {
        let foo = TabFoo::new();
        assert_eq!(sql(&count(foo.id()).unwrap()), "COUNT(tab_foo.id)");
        assert_eq!(sql(&count_all()), "COUNT(*)");
        assert_eq!(
            sql(&count_distinct(foo.int_n()).unwrap()),
            "COUNT(DISTINCT tab_foo.int_n)"
        );
        assert_eq!(
            sql(&sum(foo.int_n()).unwrap().over().unwrap()),
            "SUM(tab_foo.int_n) OVER()"
        );
        assert_eq!(sql(&avg(foo.double_n()).unwrap()), "AVG(tab_foo.double_n)");
    }

    #[test]
    fn test_aggregate_value_types() {
        let foo = TabFoo::new();
        assert_eq!(
            count(foo.int_n()).unwrap().value_type(),
            ValueType::of(DataType::Integral)
        );
        assert_eq!(
            sum(foo.id()).unwrap().value_type(),
            ValueType::optional(DataType::Integral)
        );
        assert_eq!(
            sum(foo.bool_n()).unwrap().value_type(),
            ValueType::optional(DataType::Integral)
        );
        assert_eq!(
            avg(foo.id()).unwrap().value_type(),
            ValueType::optional(DataType::FloatingPoint)
        );
        assert_eq!(
            max(foo.text_nn_d()).unwrap().value_type(),
            ValueType::optional(DataType::Text)
        );
    }

    #[test]
    fn test_nested_aggregates_rejected() {
        let foo = TabFoo::new();
        let err = max(count(foo.id())).unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::NestedAggregates));
        assert_eq!(err.clause(), Some("max"));
        let err = sum(count(foo.id()).unwrap().add(1)).unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::NestedAggregates));
    }

    #[test]
    fn test_sum_requires_numeric() {
        let foo = TabFoo::new();
        let err = sum(foo.text_nn_d()).unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::OperandType { operator: "SUM", .. })));
    }

    #[test]
    fn test_over_requires_aggregate() {
        let err = value(1).over().unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::OverRequiresAggregate));
    }
}
