//! Selected columns and the shared rendering of result columns

use super::{ctes_of, rank, static_ctes_of, static_tables_of, tables_of, ClauseRules};
use crate::check::{check_grouped, StatementContext};
use crate::dynamic::{Element, IntoElement, IntoElementList};
use crate::error::{Error, Failure, Result};
use crate::expr::{AggregateKind, Aliased, Expr, IntoExpr};
use crate::schema::ResultField;
use crate::serialize::{Context, ToSql};
use crate::type_set::{has_duplicates, TableSet};
use crate::value_type::HasValueType;

/// One named entry of a SELECT or RETURNING list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    expr: Expr,
    name: String,
    aliased: bool,
}

impl SelectColumn {
    fn from_expr(expr: Expr) -> Result<Self> {
        let name = expr
            .implicit_name()
            .ok_or_else(|| Error::check("select", Failure::MissingName))?
            .to_string();
        // engines disagree on the default name of an aggregate column
        let aliased = matches!(expr, Expr::Aggregate(_));
        Ok(Self {
            expr,
            name,
            aliased,
        })
    }

    fn from_aliased(aliased: Aliased) -> Self {
        Self {
            expr: aliased.expr().clone(),
            name: aliased.name().to_string(),
            aliased: true,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ToSql for SelectColumn {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        if self.aliased {
            let expr = self.expr.embraced_sql(context)?;
            Ok(format!("{} AS {}", expr, context.quote(&self.name)))
        } else {
            self.expr.to_sql_string(context)
        }
    }
}

impl<X: IntoExpr> IntoElement<SelectColumn> for X {
    fn into_element(self) -> Result<Element<SelectColumn>> {
        Ok(Element::Static(SelectColumn::from_expr(self.into_expr()?)?))
    }
}

impl IntoElement<SelectColumn> for Aliased {
    fn into_element(self) -> Result<Element<SelectColumn>> {
        Ok(Element::Static(SelectColumn::from_aliased(self)))
    }
}

impl IntoElement<SelectColumn> for Result<Aliased> {
    fn into_element(self) -> Result<Element<SelectColumn>> {
        Ok(Element::Static(SelectColumn::from_aliased(self?)))
    }
}

impl<X: IntoExpr> IntoElementList<SelectColumn> for X {
    fn into_elements(self) -> Result<Vec<Element<SelectColumn>>> {
        Ok(vec![self.into_element()?])
    }
}

impl IntoElementList<SelectColumn> for Aliased {
    fn into_elements(self) -> Result<Vec<Element<SelectColumn>>> {
        Ok(vec![self.into_element()?])
    }
}

impl IntoElementList<SelectColumn> for Result<Aliased> {
    fn into_elements(self) -> Result<Vec<Element<SelectColumn>>> {
        Ok(vec![self.into_element()?])
    }
}

/// Result fields of a column list; dynamic columns and columns reading
/// `optional_tables` may be NULL
pub(crate) fn result_fields(
    columns: &[Element<SelectColumn>],
    optional_tables: &TableSet,
) -> Vec<ResultField> {
    columns
        .iter()
        .map(|element| {
            let column = element.value();
            let value_type = column.expr.value_type();
            let optional = !element.is_static()
                || !column.expr.required_tables().is_disjoint(optional_tables);
            ResultField::new(column.name.clone(), value_type.optional_if(optional))
        })
        .collect()
}

/// Inactive dynamic columns keep their place as `NULL AS name`
pub(crate) fn render_columns(
    columns: &[Element<SelectColumn>],
    context: &mut Context<'_>,
) -> Result<String> {
    let mut parts = Vec::with_capacity(columns.len());
    for element in columns {
        match element.active_value() {
            Some(column) => parts.push(column.to_sql_string(context)?),
            None => parts.push(format!("NULL AS {}", context.quote(element.value().name()))),
        }
    }
    Ok(parts.join(", "))
}

pub(crate) fn check_unique_names(clause: &'static str, columns: &[Element<SelectColumn>]) -> Result<()> {
    let names: Vec<&str> = columns.iter().map(|element| element.value().name()).collect();
    if has_duplicates(&names) {
        return Err(Error::check(clause, Failure::DuplicateArguments));
    }
    Ok(())
}

pub(crate) fn column_exprs(columns: &[Element<SelectColumn>]) -> impl Iterator<Item = &Expr> {
    columns.iter().map(|element| &element.value().expr)
}

pub(crate) fn static_column_exprs(columns: &[Element<SelectColumn>]) -> impl Iterator<Item = &Expr> {
    columns
        .iter()
        .filter(|element| element.is_static())
        .map(|element| &element.value().expr)
}

/// `SELECT [DISTINCT] ...`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumns {
    columns: Vec<Element<SelectColumn>>,
    distinct: bool,
}

impl SelectColumns {
    pub(crate) fn new(columns: Vec<Element<SelectColumn>>) -> Result<Self> {
        check_unique_names("select", &columns)?;
        Ok(Self {
            columns,
            distinct: false,
        })
    }

    pub(crate) fn set_distinct(&mut self) {
        self.distinct = true;
    }

    pub fn columns(&self) -> &[Element<SelectColumn>] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn result_fields(&self) -> Vec<ResultField> {
        result_fields(&self.columns, &TableSet::new())
    }

    /// Result fields with the tables of `optional_tables` possibly NULL
    pub fn result_fields_within(&self, optional_tables: &TableSet) -> Vec<ResultField> {
        result_fields(&self.columns, optional_tables)
    }

    fn check_mixed_aggregates(&self) -> Result<()> {
        let mut aggregate = false;
        let mut non_aggregate = false;
        for expr in column_exprs(&self.columns) {
            match expr.aggregate_kind() {
                AggregateKind::Mixed => return Err(Error::check("select", Failure::MixedAggregates)),
                AggregateKind::Aggregate => aggregate = true,
                AggregateKind::NonAggregate => non_aggregate = true,
                AggregateKind::Neutral => {}
            }
        }
        if aggregate && non_aggregate {
            return Err(Error::check("select", Failure::MixedAggregates));
        }
        Ok(())
    }
}

impl ClauseRules for SelectColumns {
    fn name(&self) -> &'static str {
        "select"
    }

    fn rank(&self) -> u8 {
        rank::SELECT
    }

    fn required_tables(&self) -> TableSet {
        tables_of(column_exprs(&self.columns))
    }

    fn required_static_tables(&self) -> TableSet {
        static_tables_of(static_column_exprs(&self.columns))
    }

    fn required_ctes(&self) -> TableSet {
        ctes_of(column_exprs(&self.columns))
    }

    fn required_static_ctes(&self) -> TableSet {
        static_ctes_of(static_column_exprs(&self.columns))
    }

    fn check_consistency(&self, context: &StatementContext) -> Result<()> {
        if context.has_group_by {
            let entries = self
                .columns
                .iter()
                .map(|element| (&element.value().expr, element.is_static()));
            check_grouped("select", entries, context)
        } else {
            self.check_mixed_aggregates()
        }
    }
}

impl ToSql for SelectColumns {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let flags = if self.distinct { "DISTINCT " } else { "" };
        Ok(format!("SELECT {}{}", flags, render_columns(&self.columns, context)?))
    }
}
