//! Typed expression trees
//!
//! Every constructor checks the operand value types of the operator it
//! builds, so an `Expr` that exists is well typed. Expressions are combined
//! through [`ExpressionOps`], implemented for [`Column`] and [`Expr`]:
//!
//! ```
//! use sqlweave_core::{ColumnSpec, DataType, ExpressionOps, Table};
//!
//! let t = Table::new("t", [ColumnSpec::new("id", DataType::Integral)]);
//! let id = t.column("id").unwrap();
//! let condition = id.clone().gt(7).unwrap().and(id.lt(100)).unwrap();
//! assert!(condition.required_tables().contains(&"t".to_string()));
//! ```

pub mod aggregate;
pub mod alias;
pub mod assign;
pub mod case;
pub mod sort;

pub use aggregate::{
    avg, avg_distinct, count, count_all, count_distinct, max, min, sum, sum_distinct, Aggregate,
    AggregateFunction,
};
pub use alias::Aliased;
pub use assign::{AssignedValue, Assignment};
pub use case::{case_when, Case, CaseThen, CaseWhen};
pub use sort::{NullsOrder, SortDirection, SortOrder};

use crate::dynamic::{static_values, Element, IntoElement, IntoElementList};
use crate::error::{Error, Failure, Result};
use crate::operator::{IntoOperator, Operator, OperatorFamily};
use crate::schema::Column;
use crate::serialize::{Context, ToSql};
use crate::statement::Select;
use crate::type_set::{TableSet, TypeSet};
use crate::value::Value;
use crate::value_type::{values_are_comparable, DataType, HasValueType, ValueType};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// A named placeholder, bound when a prepared statement is executed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value_type: ValueType,
}

/// Parameters reported by serialization, in placeholder order
pub type ParameterSpec = Parameter;

impl Parameter {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// A placeholder of the given type
pub fn parameter(name: &str, value_type: impl Into<ValueType>) -> Expr {
    Expr::Parameter(Parameter::new(name, value_type.into()))
}

/// A literal value
pub fn value(value: impl Into<Value>) -> Expr {
    Expr::Value(value.into())
}

/// The NULL literal
pub fn null() -> Expr {
    Expr::Value(Value::Null)
}

/// Immediate children of `expr`
pub fn nodes_of(expr: &Expr) -> Vec<&Expr> {
    expr.nodes()
}

/// A typed SQL expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(Column),
    Value(Value),
    Parameter(Parameter),
    Binary {
        op: Operator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        value_type: ValueType,
    },
    /// Text `+` text
    Concat {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// AND/OR chain; only the first operand is guaranteed to be static
    Logical {
        op: Operator,
        operands: Vec<Element<Expr>>,
    },
    Negate(Box<Expr>),
    BitNot(Box<Expr>),
    Not(Box<Expr>),
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    In {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    Case(Box<Case>),
    Aggregate(Box<Aggregate>),
    /// An expression usable as a group_by entry
    GroupByColumn(Box<Expr>),
    Exists(Box<Select>),
    Subquery(Box<Select>),
}

/// How an expression relates to aggregation when no group_by is present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    /// Literals and parameters fit either way
    Neutral,
    Aggregate,
    NonAggregate,
    Mixed,
}

impl AggregateKind {
    fn combine(self, other: AggregateKind) -> AggregateKind {
        use AggregateKind::*;
        match (self, other) {
            (Neutral, kind) | (kind, Neutral) => kind,
            (Aggregate, Aggregate) => Aggregate,
            (NonAggregate, NonAggregate) => NonAggregate,
            _ => Mixed,
        }
    }
}

impl Expr {
    pub(crate) fn binary(lhs: impl IntoExpr, op: Operator, rhs: impl IntoExpr) -> Result<Expr> {
        let lhs = lhs.into_expr()?;
        let rhs = rhs.into_expr()?;
        if op.family() == OperatorFamily::Logical {
            return Expr::logical(op, lhs, Element::Static(rhs));
        }
        let (left, right) = (lhs.value_type(), rhs.value_type());
        let both_null = left == ValueType::Null && right == ValueType::Null;
        if op == Operator::PLUS && left.is_text() && right.is_text() && !both_null {
            return Ok(Expr::Concat {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            });
        }
        let value_type = op
            .result_type(left, right)
            .map_err(|failure| Error::check("expression", failure))?;
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            value_type,
        })
    }

    /// Append to an AND/OR chain, flattening chains of the same operator
    pub(crate) fn logical(op: Operator, lhs: Expr, rhs: Element<Expr>) -> Result<Expr> {
        op.result_type(lhs.value_type(), rhs.value().value_type())
            .map_err(|failure| Error::check("expression", failure))?;
        match lhs {
            Expr::Logical {
                op: chain_op,
                mut operands,
            } if chain_op == op => {
                operands.push(rhs);
                Ok(Expr::Logical { op, operands })
            }
            lhs => Ok(Expr::Logical {
                op,
                operands: vec![Element::Static(lhs), rhs],
            }),
        }
    }

    fn unary(
        operand: impl IntoExpr,
        operator: &'static str,
        accepts: impl Fn(&ValueType) -> bool,
        build: impl FnOnce(Box<Expr>) -> Expr,
    ) -> Result<Expr> {
        let operand = operand.into_expr()?;
        let value_type = operand.value_type();
        if !accepts(&value_type) {
            return Err(Error::check(
                "expression",
                Failure::OperandType {
                    operator,
                    operand: value_type,
                },
            ));
        }
        Ok(build(Box::new(operand)))
    }

    fn membership(expr: Expr, list: Vec<Expr>, negated: bool) -> Result<Expr> {
        let left = expr.value_type();
        for item in &list {
            if !values_are_comparable(left, item.value_type()) {
                return Err(Error::check(
                    "expression",
                    Failure::OperandTypes {
                        operator: if negated { "NOT IN" } else { "IN" },
                        left,
                        right: item.value_type(),
                    },
                ));
            }
        }
        Ok(Expr::In {
            expr: Box::new(expr),
            list,
            negated,
        })
    }

    /// Immediate child nodes. Sub-selects are a scope of their own and
    /// contribute no children.
    pub fn nodes(&self) -> Vec<&Expr> {
        match self {
            Expr::Column(_)
            | Expr::Value(_)
            | Expr::Parameter(_)
            | Expr::Exists(_)
            | Expr::Subquery(_) => Vec::new(),
            Expr::Binary { lhs, rhs, .. } | Expr::Concat { lhs, rhs } => vec![&**lhs, &**rhs],
            Expr::Logical { operands, .. } => operands.iter().map(Element::value).collect(),
            Expr::Negate(inner) | Expr::BitNot(inner) | Expr::Not(inner) => vec![&**inner],
            Expr::IsNull { expr, .. } => vec![&**expr],
            Expr::In { expr, list, .. } => {
                let mut nodes = vec![&**expr];
                nodes.extend(list.iter());
                nodes
            }
            Expr::Between { expr, low, high } => vec![&**expr, &**low, &**high],
            Expr::Case(case) => case.nodes(),
            Expr::Aggregate(aggregate) => aggregate.argument().into_iter().collect(),
            Expr::GroupByColumn(inner) => vec![&**inner],
        }
    }

    /// Tables this expression reads from
    pub fn required_tables(&self) -> TableSet {
        match self {
            Expr::Column(column) => TableSet::new().with(column.qualifier().to_string()),
            Expr::Exists(select) | Expr::Subquery(select) => select.unresolved_tables(),
            _ => self
                .nodes()
                .into_iter()
                .fold(TableSet::new(), |tables, node| {
                    tables.union(&node.required_tables())
                }),
        }
    }

    /// Tables required by the static part of this expression
    pub fn required_static_tables(&self) -> TableSet {
        match self {
            Expr::Logical { operands, .. } => {
                static_values(operands).fold(TableSet::new(), |tables, node| {
                    tables.union(&node.required_static_tables())
                })
            }
            Expr::Column(_) | Expr::Exists(_) | Expr::Subquery(_) => self.required_tables(),
            _ => self
                .nodes()
                .into_iter()
                .fold(TableSet::new(), |tables, node| {
                    tables.union(&node.required_static_tables())
                }),
        }
    }

    /// Common table expressions referenced but not defined inside this expression
    pub fn required_ctes(&self) -> TableSet {
        match self {
            Expr::Exists(select) | Expr::Subquery(select) => select.unresolved_ctes(),
            _ => self
                .nodes()
                .into_iter()
                .fold(TableSet::new(), |ctes, node| ctes.union(&node.required_ctes())),
        }
    }

    /// CTEs required by the static part of this expression
    pub fn required_static_ctes(&self) -> TableSet {
        match self {
            Expr::Logical { operands, .. } => {
                static_values(operands).fold(TableSet::new(), |ctes, node| {
                    ctes.union(&node.required_static_ctes())
                })
            }
            Expr::Exists(_) | Expr::Subquery(_) => self.required_ctes(),
            _ => self
                .nodes()
                .into_iter()
                .fold(TableSet::new(), |ctes, node| ctes.union(&node.required_static_ctes())),
        }
    }

    pub fn contains_aggregate_function(&self) -> bool {
        match self {
            Expr::Aggregate(_) => true,
            _ => self
                .nodes()
                .into_iter()
                .any(Expr::contains_aggregate_function),
        }
    }

    /// Whether the expression only reads aggregate functions, constants and
    /// the `known` group_by entries
    pub fn is_aggregate_over(&self, known: &TypeSet<Expr>) -> bool {
        if known.contains(self) {
            return true;
        }
        match self {
            Expr::Value(_) | Expr::Parameter(_) | Expr::Aggregate(_) => true,
            Expr::Exists(_) | Expr::Subquery(_) => true,
            Expr::Column(_) | Expr::GroupByColumn(_) => false,
            _ => self
                .nodes()
                .into_iter()
                .all(|node| node.is_aggregate_over(known)),
        }
    }

    pub fn aggregate_kind(&self) -> AggregateKind {
        match self {
            Expr::Value(_) | Expr::Parameter(_) | Expr::Exists(_) | Expr::Subquery(_) => {
                AggregateKind::Neutral
            }
            Expr::Aggregate(_) => AggregateKind::Aggregate,
            Expr::Column(_) | Expr::GroupByColumn(_) => AggregateKind::NonAggregate,
            _ => self
                .nodes()
                .into_iter()
                .fold(AggregateKind::Neutral, |kind, node| {
                    kind.combine(node.aggregate_kind())
                }),
        }
    }

    /// The column name a result field derives from this expression, if any
    pub(crate) fn implicit_name(&self) -> Option<&str> {
        match self {
            Expr::Column(column) => Some(column.name()),
            Expr::GroupByColumn(inner) => inner.implicit_name(),
            Expr::Aggregate(aggregate) => Some(aggregate.function().name()),
            _ => None,
        }
    }

    /// Needs parentheses when used as an operand
    fn is_compound(&self) -> bool {
        match self {
            Expr::Column(_)
            | Expr::Value(_)
            | Expr::Parameter(_)
            | Expr::Case(_)
            | Expr::Aggregate(_)
            | Expr::Exists(_)
            | Expr::Subquery(_) => false,
            Expr::GroupByColumn(inner) => inner.is_compound(),
            _ => true,
        }
    }

    /// Render as an operand of an enclosing operator
    pub(crate) fn embraced_sql(&self, context: &mut Context<'_>) -> Result<String> {
        let sql = self.to_sql_string(context)?;
        Ok(if self.is_compound() {
            format!("({})", sql)
        } else {
            sql
        })
    }
}

impl HasValueType for Expr {
    fn value_type(&self) -> ValueType {
        let boolean = ValueType::of(DataType::Boolean);
        match self {
            Expr::Column(column) => column.value_type(),
            Expr::Value(value) => value.value_type(),
            Expr::Parameter(parameter) => parameter.value_type,
            Expr::Binary { value_type, .. } => *value_type,
            Expr::Concat { lhs, rhs } => ValueType::of(DataType::Text)
                .optional_if(lhs.value_type().is_optional() || rhs.value_type().is_optional()),
            Expr::Negate(inner) | Expr::BitNot(inner) | Expr::GroupByColumn(inner) => {
                inner.value_type()
            }
            Expr::Not(inner) => boolean.optional_if(inner.value_type().is_optional()),
            Expr::IsNull { .. } | Expr::Exists(_) => boolean,
            Expr::Logical { .. } | Expr::In { .. } | Expr::Between { .. } => {
                boolean.optional_if(self.nodes().iter().any(|n| n.value_type().is_optional()))
            }
            Expr::Case(case) => case.value_type(),
            Expr::Aggregate(aggregate) => aggregate.value_type(),
            Expr::Subquery(select) => select
                .result_fields()
                .first()
                .map(|field| field.value_type.force_optional())
                .unwrap_or(ValueType::NoValue),
        }
    }
}

impl ToSql for Expr {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        match self {
            Expr::Column(column) => column.to_sql_string(context),
            Expr::Value(value) => context.dialect().literal(value),
            Expr::Parameter(parameter) => Ok(context.push_parameter(parameter)),
            Expr::Binary { op, lhs, rhs, .. } => Ok(format!(
                "{} {} {}",
                lhs.embraced_sql(context)?,
                op,
                rhs.embraced_sql(context)?
            )),
            Expr::Concat { lhs, rhs } => {
                let lhs = lhs.embraced_sql(context)?;
                let rhs = rhs.embraced_sql(context)?;
                Ok(context.dialect().concat(&lhs, &rhs))
            }
            Expr::Logical { op, operands } => {
                let active: Vec<&Expr> = operands.iter().filter_map(Element::active_value).collect();
                if let [single] = active.as_slice() {
                    return single.to_sql_string(context);
                }
                let mut parts = Vec::with_capacity(active.len());
                for operand in active {
                    parts.push(operand.embraced_sql(context)?);
                }
                Ok(parts.join(&format!(" {} ", op)))
            }
            Expr::Negate(inner) => {
                let operand = inner.embraced_sql(context)?;
                // `--` would open a line comment
                if operand.starts_with('-') {
                    Ok(format!("-({})", operand))
                } else {
                    Ok(format!("-{}", operand))
                }
            }
            Expr::BitNot(inner) => Ok(format!("~{}", inner.embraced_sql(context)?)),
            Expr::Not(inner) => Ok(format!("NOT {}", inner.embraced_sql(context)?)),
            Expr::IsNull { expr, negated } => Ok(format!(
                "{} IS {}NULL",
                expr.embraced_sql(context)?,
                if *negated { "NOT " } else { "" }
            )),
            Expr::In {
                expr,
                list,
                negated,
            } => {
                if list.is_empty() {
                    return Ok(context.dialect().boolean_literal(*negated));
                }
                let expr = expr.embraced_sql(context)?;
                let mut items = Vec::with_capacity(list.len());
                for item in list {
                    items.push(item.to_sql_string(context)?);
                }
                Ok(format!(
                    "{} {}IN ({})",
                    expr,
                    if *negated { "NOT " } else { "" },
                    items.join(", ")
                ))
            }
            Expr::Between { expr, low, high } => Ok(format!(
                "{} BETWEEN {} AND {}",
                expr.embraced_sql(context)?,
                low.embraced_sql(context)?,
                high.embraced_sql(context)?
            )),
            Expr::Case(case) => case.to_sql_string(context),
            Expr::Aggregate(aggregate) => aggregate.to_sql_string(context),
            Expr::GroupByColumn(inner) => inner.to_sql_string(context),
            Expr::Exists(select) => Ok(format!("EXISTS ({})", select.to_sql_string(context)?)),
            Expr::Subquery(select) => Ok(format!("({})", select.to_sql_string(context)?)),
        }
    }
}

/// Conversion into an expression node
pub trait IntoExpr {
    fn into_expr(self) -> Result<Expr>;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Result<Expr> {
        Ok(self)
    }
}

impl IntoExpr for Result<Expr> {
    fn into_expr(self) -> Result<Expr> {
        self
    }
}

impl IntoExpr for Column {
    fn into_expr(self) -> Result<Expr> {
        Ok(Expr::Column(self))
    }
}

impl IntoExpr for &Column {
    fn into_expr(self) -> Result<Expr> {
        Ok(Expr::Column(self.clone()))
    }
}

impl IntoExpr for Value {
    fn into_expr(self) -> Result<Expr> {
        Ok(Expr::Value(self))
    }
}

impl IntoExpr for Parameter {
    fn into_expr(self) -> Result<Expr> {
        Ok(Expr::Parameter(self))
    }
}

/// A single-column select used as a value
impl IntoExpr for Select {
    fn into_expr(self) -> Result<Expr> {
        if self.result_fields().len() != 1 {
            return Err(Error::check("sub-select", Failure::ScalarSubquery));
        }
        Ok(Expr::Subquery(Box::new(self)))
    }
}

impl<T: Into<Value>> IntoExpr for Option<T> {
    fn into_expr(self) -> Result<Expr> {
        Ok(Expr::Value(Value::from(self)))
    }
}

macro_rules! impl_into_expr_for_literal {
    ($($source:ty),*) => {
        $(
            impl IntoExpr for $source {
                fn into_expr(self) -> Result<Expr> {
                    Ok(Expr::Value(Value::from(self)))
                }
            }
        )*
    };
}

impl_into_expr_for_literal!(
    bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, char, String, &str, NaiveDate,
    NaiveTime, NaiveDateTime
);

/// Conditions may be wrapped in [`dynamic`](crate::dynamic())
impl<T: IntoExpr> IntoElement<Expr> for T {
    fn into_element(self) -> Result<Element<Expr>> {
        Ok(Element::Static(self.into_expr()?))
    }
}

impl<T: IntoExpr> IntoElementList<Expr> for T {
    fn into_elements(self) -> Result<Vec<Element<Expr>>> {
        Ok(vec![self.into_element()?])
    }
}

/// EXISTS over a sub-select
pub fn exists(select: Select) -> Result<Expr> {
    Ok(Expr::Exists(Box::new(select)))
}

/// NOT over a boolean expression
pub fn not(expr: impl IntoExpr) -> Result<Expr> {
    Expr::unary(expr, "NOT", ValueType::is_boolean, Expr::Not)
}

/// Make an arbitrary expression usable as a group_by entry
pub fn declare_group_by_column(expr: impl IntoExpr) -> Result<Expr> {
    let expr = expr.into_expr()?;
    if expr.contains_aggregate_function() {
        return Err(Error::check("group_by", Failure::AggregateNotAllowed));
    }
    Ok(Expr::GroupByColumn(Box::new(expr)))
}

/// Operators available on columns and expressions
pub trait ExpressionOps: IntoExpr + Sized {
    /// Apply any binary operator, given as [`Operator`] or as its SQL symbol
    fn binary(self, op: impl IntoOperator, rhs: impl IntoExpr) -> Result<Expr> {
        let op = op.into_operator()?;
        Expr::binary(self, op, rhs)
    }

    fn eq(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::EQ, rhs)
    }

    fn ne(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::NEQ, rhs)
    }

    fn lt(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::LT, rhs)
    }

    fn le(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::LTE, rhs)
    }

    fn gt(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::GT, rhs)
    }

    fn ge(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::GTE, rhs)
    }

    fn is_distinct_from(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::IS_DISTINCT_FROM, rhs)
    }

    fn is_not_distinct_from(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::IS_NOT_DISTINCT_FROM, rhs)
    }

    fn is_null(self) -> Result<Expr> {
        Expr::unary(self, "IS NULL", ValueType::has_value, |expr| Expr::IsNull {
            expr,
            negated: false,
        })
    }

    fn is_not_null(self) -> Result<Expr> {
        Expr::unary(self, "IS NOT NULL", ValueType::has_value, |expr| Expr::IsNull {
            expr,
            negated: true,
        })
    }

    fn in_<I, T>(self, list: I) -> Result<Expr>
    where
        I: IntoIterator<Item = T>,
        T: IntoExpr,
    {
        let list = list
            .into_iter()
            .map(IntoExpr::into_expr)
            .collect::<Result<Vec<_>>>()?;
        Expr::membership(self.into_expr()?, list, false)
    }

    fn not_in<I, T>(self, list: I) -> Result<Expr>
    where
        I: IntoIterator<Item = T>,
        T: IntoExpr,
    {
        let list = list
            .into_iter()
            .map(IntoExpr::into_expr)
            .collect::<Result<Vec<_>>>()?;
        Expr::membership(self.into_expr()?, list, true)
    }

    fn between(self, low: impl IntoExpr, high: impl IntoExpr) -> Result<Expr> {
        let expr = self.into_expr()?;
        let low = low.into_expr()?;
        let high = high.into_expr()?;
        for bound in [&low, &high] {
            if !values_are_comparable(expr.value_type(), bound.value_type()) {
                return Err(Error::check(
                    "expression",
                    Failure::OperandTypes {
                        operator: "BETWEEN",
                        left: expr.value_type(),
                        right: bound.value_type(),
                    },
                ));
            }
        }
        Ok(Expr::Between {
            expr: Box::new(expr),
            low: Box::new(low),
            high: Box::new(high),
        })
    }

    fn like(self, pattern: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::LIKE, pattern)
    }

    /// `+`, or concatenation when both sides are text
    fn add(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::PLUS, rhs)
    }

    fn sub(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::MINUS, rhs)
    }

    fn mul(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::MULTIPLY, rhs)
    }

    fn div(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::DIVIDE, rhs)
    }

    fn rem(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::MODULUS, rhs)
    }

    fn neg(self) -> Result<Expr> {
        Expr::unary(self, "-", ValueType::is_numeric, Expr::Negate)
    }

    fn bit_and(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::BIT_AND, rhs)
    }

    fn bit_or(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::BIT_OR, rhs)
    }

    fn bit_xor(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::BIT_XOR, rhs)
    }

    fn shl(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::SHIFT_LEFT, rhs)
    }

    fn shr(self, rhs: impl IntoExpr) -> Result<Expr> {
        Expr::binary(self, Operator::SHIFT_RIGHT, rhs)
    }

    fn bit_not(self) -> Result<Expr> {
        Expr::unary(
            self,
            "~",
            |t| t.is_integral() || t.is_unsigned_integral(),
            Expr::BitNot,
        )
    }

    fn and(self, rhs: impl IntoElement<Expr>) -> Result<Expr> {
        Expr::logical(Operator::AND, self.into_expr()?, rhs.into_element()?)
    }

    fn or(self, rhs: impl IntoElement<Expr>) -> Result<Expr> {
        Expr::logical(Operator::OR, self.into_expr()?, rhs.into_element()?)
    }

    fn not(self) -> Result<Expr> {
        not(self)
    }

    fn asc(self) -> Result<SortOrder> {
        SortOrder::new(self.into_expr()?, SortDirection::Asc)
    }

    fn desc(self) -> Result<SortOrder> {
        SortOrder::new(self.into_expr()?, SortDirection::Desc)
    }

    fn as_(self, name: &str) -> Result<Aliased> {
        Aliased::new(self.into_expr()?, name)
    }

    /// Turn an aggregate function into a window function over all rows
    fn over(self) -> Result<Expr> {
        match self.into_expr()? {
            Expr::Aggregate(mut aggregate) => {
                aggregate.set_over();
                Ok(Expr::Aggregate(aggregate))
            }
            _ => Err(Error::check("over", Failure::OverRequiresAggregate)),
        }
    }
}

impl ExpressionOps for Expr {}

impl ExpressionOps for Column {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::dynamic;
    use crate::fixtures::{TabBar, TabFoo};
    use crate::serialize::{render, DefaultDialect, SqliteDialect};

    fn sql(expr: &Expr) -> String {
        render(&DefaultDialect, expr).unwrap()
    }

    #[test]
    fn test_arithmetic_nesting() {
        let e = value(1).add(value(17).add(4)).unwrap();
        assert_eq!(sql(&e), "1 + (17 + 4)");
        let e = value(1).neg().unwrap().add(1).unwrap();
        assert_eq!(sql(&e), "(-1) + 1");
        let e = value(17).add(4).unwrap().neg().unwrap();
        assert_eq!(sql(&e), "-(17 + 4)");
    }

    #[test]
    fn test_arithmetic_result_types() {
        let foo = TabFoo::new();
        let e = foo.id().add(1).unwrap();
        assert_eq!(e.value_type(), ValueType::of(DataType::Integral));
        let e = foo.id().add(foo.double_n()).unwrap();
        assert_eq!(e.value_type(), ValueType::optional(DataType::Numeric));
        let e = foo.id().div(2).unwrap();
        assert_eq!(e.value_type(), ValueType::of(DataType::FloatingPoint));
    }

    #[test]
    fn test_text_plus_is_concatenation() {
        let e = value("a").add("b").unwrap();
        assert_eq!(sql(&e), "CONCAT('a', 'b')");
        assert_eq!(render(&SqliteDialect, &e).unwrap(), "'a' || 'b'");
        assert_eq!(e.value_type(), ValueType::of(DataType::Text));
    }

    #[test]
    fn test_operand_type_mismatch() {
        let foo = TabFoo::new();
        let err = foo.text_nn_d().add(1).unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::OperandTypes { operator: "+", .. })));
        let err = foo.id().like("a%").unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::OperandTypes { .. })));
        let err = foo.id().and(true).unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::OperandTypes { operator: "AND", .. })));
        let err = foo.double_n().bit_not().unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::OperandType { operator: "~", .. })));
    }

    #[test]
    fn test_comparisons() {
        let foo = TabFoo::new();
        assert_eq!(sql(&value(1).ne(1).unwrap()), "1 <> 1");
        let e = foo.int_n().is_distinct_from(Value::Null).unwrap();
        assert_eq!(sql(&e), "tab_foo.int_n IS DISTINCT FROM NULL");
        assert_eq!(e.value_type(), ValueType::of(DataType::Boolean));
        let e = foo.int_n().gt(17).unwrap();
        assert_eq!(e.value_type(), ValueType::optional(DataType::Boolean));
        assert_eq!(sql(&foo.int_n().is_null().unwrap()), "tab_foo.int_n IS NULL");
        assert_eq!(
            sql(&foo.int_n().is_not_null().unwrap()),
            "tab_foo.int_n IS NOT NULL"
        );
    }

    #[test]
    fn test_operator_by_symbol() {
        let foo = TabFoo::new();
        let e = foo.id().binary(">=", 3).unwrap();
        assert_eq!(sql(&e), "tab_foo.id >= 3");
        let err = foo.id().binary("===", 3).unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::UnknownOperator { .. })));
    }

    #[test]
    fn test_logical_chains() {
        let e = value(true).and(value(17).gt(15)).unwrap();
        assert_eq!(sql(&e), "1 AND (17 > 15)");

        let foo = TabFoo::new();
        let e = foo
            .id()
            .gt(1)
            .unwrap()
            .and(foo.id().lt(10))
            .unwrap()
            .and(foo.int_n().is_null())
            .unwrap();
        assert_eq!(
            sql(&e),
            "(tab_foo.id > 1) AND (tab_foo.id < 10) AND (tab_foo.int_n IS NULL)"
        );
        assert!(matches!(&e, Expr::Logical { operands, .. } if operands.len() == 3));

        let e = value(true)
            .and(true)
            .unwrap()
            .or(value(false).and(false))
            .unwrap();
        assert_eq!(sql(&e), "(1 AND 1) OR (0 AND 0)");
    }

    #[test]
    fn test_dynamic_logical_operands() {
        let foo = TabFoo::new();
        let bar = TabBar::new();
        let e = foo
            .id()
            .gt(1)
            .unwrap()
            .and(dynamic(false, bar.bool_nn().eq(true)))
            .unwrap();
        assert_eq!(sql(&e), "tab_foo.id > 1");
        assert_eq!(e.required_tables().len(), 2);
        assert_eq!(e.required_static_tables(), TableSet::new().with("tab_foo".to_string()));

        let e = foo
            .id()
            .gt(1)
            .unwrap()
            .and(dynamic(true, bar.bool_nn()))
            .unwrap();
        assert_eq!(sql(&e), "(tab_foo.id > 1) AND tab_bar.bool_nn");
    }

    #[test]
    fn test_not_and_unary() {
        let foo = TabFoo::new();
        assert_eq!(sql(&foo.bool_n().not().unwrap()), "NOT tab_foo.bool_n");
        assert_eq!(
            sql(&not(foo.id().eq(1)).unwrap()),
            "NOT (tab_foo.id = 1)"
        );
        assert_eq!(sql(&foo.id().bit_not().unwrap()), "~tab_foo.id");
        assert!(foo.text_nn_d().not().is_err());
    }

    #[test]
    fn test_negation_never_renders_a_comment() {
        let foo = TabFoo::new();
        assert_eq!(sql(&foo.id().neg().unwrap()), "-tab_foo.id");
        assert_eq!(sql(&value(-5).neg().unwrap()), "-(-5)");
        assert_eq!(sql(&value(-5).neg().unwrap().neg().unwrap()), "-(-(-5))");
        assert_eq!(sql(&foo.id().add(1).unwrap().neg().unwrap()), "-(tab_foo.id + 1)");
        assert_eq!(sql(&value(2.5).neg().unwrap()), "-2.5");
    }

    #[test]
    fn test_remainder_of_integral_columns() {
        let foo = TabFoo::new();
        assert_eq!(sql(&foo.id().rem(3).unwrap()), "tab_foo.id % 3");
        assert_eq!(sql(&foo.u_int_n().rem(foo.u_int_n()).unwrap()), "tab_foo.u_int_n % tab_foo.u_int_n");
        let err = foo.double_n().rem(2).unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::OperandTypes { operator: "%", .. })));
        assert!(foo.id().rem(1.5).is_err());
    }

    #[test]
    fn test_in_and_between() {
        let foo = TabFoo::new();
        let e = foo.id().in_([1, 2, 3]).unwrap();
        assert_eq!(sql(&e), "tab_foo.id IN (1, 2, 3)");
        let e = foo.id().not_in([7]).unwrap();
        assert_eq!(sql(&e), "tab_foo.id NOT IN (7)");
        let e = foo.id().between(1, 10).unwrap();
        assert_eq!(sql(&e), "tab_foo.id BETWEEN 1 AND 10");
        assert!(foo.id().in_(["a"]).is_err());
        assert!(foo.id().between("a", 2).is_err());
    }

    #[test]
    fn test_empty_in_collapses_to_literal() {
        let foo = TabFoo::new();
        let empty: Vec<i64> = Vec::new();
        assert_eq!(sql(&foo.id().in_(empty.clone()).unwrap()), "0");
        assert_eq!(sql(&foo.id().not_in(empty.clone()).unwrap()), "1");
        let pg = crate::serialize::PostgresDialect;
        assert_eq!(render(&pg, &foo.id().in_(empty).unwrap()).unwrap(), "false");
    }

    #[test]
    fn test_nodes_of() {
        let foo = TabFoo::new();
        let e = foo.id().add(foo.int_n()).unwrap();
        let nodes = nodes_of(&e);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0], &Expr::Column(foo.id()));
        assert!(value(1).nodes().is_empty());
    }

    #[test]
    fn test_required_tables() {
        let foo = TabFoo::new();
        let a = foo.as_("a");
        let e = foo.id().eq(a.id()).unwrap();
        assert_eq!(
            e.required_tables(),
            TableSet::new()
                .with("a".to_string())
                .with("tab_foo".to_string())
        );
        assert!(value(1).required_tables().is_empty());
    }

    #[test]
    fn test_aggregate_kinds() {
        let foo = TabFoo::new();
        assert_eq!(value(1).aggregate_kind(), AggregateKind::Neutral);
        assert_eq!(foo.id().into_expr().unwrap().aggregate_kind(), AggregateKind::NonAggregate);
        let agg = count(foo.id()).unwrap();
        assert_eq!(agg.aggregate_kind(), AggregateKind::Aggregate);
        assert_eq!(
            agg.clone().add(1).unwrap().aggregate_kind(),
            AggregateKind::Aggregate
        );
        assert_eq!(
            agg.add(foo.id()).unwrap().aggregate_kind(),
            AggregateKind::Mixed
        );
    }

    #[test]
    fn test_is_aggregate_over() {
        let foo = TabFoo::new();
        let known: TypeSet<Expr> = TypeSet::new().with(foo.id().into_expr().unwrap());
        assert!(foo.id().add(1).unwrap().is_aggregate_over(&known));
        assert!(!foo.int_n().add(1).unwrap().is_aggregate_over(&known));
        assert!(max(foo.int_n()).unwrap().is_aggregate_over(&known));
        assert!(value(3).is_aggregate_over(&TypeSet::new()));
    }

    #[test]
    fn test_parameters_are_collected() {
        let foo = TabFoo::new();
        let e = foo
            .id()
            .eq(parameter("id", DataType::Integral))
            .unwrap();
        let mut context = Context::new(&crate::serialize::PostgresDialect);
        assert_eq!(e.to_sql_string(&mut context).unwrap(), "tab_foo.id = $1");
        assert_eq!(context.parameters()[0].name, "id");
    }

    #[test]
    fn test_declare_group_by_column() {
        let foo = TabFoo::new();
        let e = declare_group_by_column(foo.id().add(1)).unwrap();
        assert_eq!(sql(&e), "tab_foo.id + 1");
        let err = declare_group_by_column(count(foo.id())).unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::AggregateNotAllowed));
    }
}
