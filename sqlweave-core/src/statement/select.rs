use super::Statement;
use crate::check::{self, StatementContext};
use crate::clause::{
    Clause, ClauseList, FromClause, GroupBy, Having, IntoUnionArm, LimitKind, OrderBy, RowLimit,
    SelectColumn, SelectColumns, Union, WhereClause, WithClause,
};
use crate::dynamic::{IntoElement, IntoElementList};
use crate::error::{Error, Failure, Result};
use crate::expr::{Expr, IntoExpr, SortOrder};
use crate::schema::{derived_column, derived_columns, Column, HasColumns, ResultField};
use crate::serialize::{Context, ToSql};
use crate::table_ref::IntoTableRef;
use crate::type_set::TableSet;

/// A SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    clauses: ClauseList,
}

/// Start a SELECT with the given columns
///
/// Columns are expressions with an implicit name (columns, aggregates of
/// columns) or aliased expressions, optionally [`dynamic`](crate::dynamic()).
///
/// # Examples
/// ```
/// use sqlweave_core::{select, ColumnSpec, DataType, ExpressionOps, Statement, Table};
///
/// let t = Table::new("t", [ColumnSpec::new("id", DataType::Integral)]);
/// let id = t.column("id")?;
/// let statement = select(id.clone())?.from(&t)?.where_(id.gt(7))?;
/// assert_eq!(statement.to_sql()?, "SELECT t.id FROM t WHERE t.id > 7");
/// # Ok::<(), sqlweave_core::Error>(())
/// ```
pub fn select(columns: impl IntoElementList<SelectColumn>) -> Result<Select> {
    Select::build(None, columns)
}

impl Select {
    pub(crate) fn build(
        with: Option<WithClause>,
        columns: impl IntoElementList<SelectColumn>,
    ) -> Result<Self> {
        let mut clauses = ClauseList::default();
        if let Some(with) = with {
            clauses.push(Clause::With(with))?;
        }
        let columns = SelectColumns::new(columns.into_elements()?)?;
        clauses.push(Clause::SelectColumns(columns))?;
        Ok(Self { clauses })
    }

    fn push(mut self, clause: Clause) -> Result<Self> {
        self.clauses.push(clause)?;
        Ok(self)
    }

    /// `SELECT DISTINCT`; only valid directly after the column list
    pub fn distinct(mut self) -> Result<Self> {
        match self.clauses.last_mut() {
            Some(Clause::SelectColumns(columns)) => {
                columns.set_distinct();
                Ok(self)
            }
            Some(last) => Err(Error::check(
                "distinct",
                Failure::ClauseOrder {
                    clause: "distinct",
                    after: last.name(),
                },
            )),
            None => Err(Error::check("distinct", Failure::NoColumnsSelected)),
        }
    }

    pub fn from(self, table: impl IntoTableRef) -> Result<Self> {
        let table = table.into_table_ref()?;
        self.push(Clause::From(FromClause::from(table)))
    }

    pub fn where_(self, condition: impl IntoElement<Expr>) -> Result<Self> {
        let clause = WhereClause::condition(condition.into_element()?)?;
        self.push(Clause::Where(clause))
    }

    pub fn group_by(self, entries: impl IntoElementList<Expr>) -> Result<Self> {
        let clause = GroupBy::new(entries.into_elements()?)?;
        self.push(Clause::GroupBy(clause))
    }

    pub fn having(self, condition: impl IntoElement<Expr>) -> Result<Self> {
        let clause = Having::new(condition.into_element()?)?;
        self.push(Clause::Having(clause))
    }

    pub fn union_all(self, rhs: impl IntoUnionArm) -> Result<Self> {
        self.union(false, rhs)
    }

    pub fn union_distinct(self, rhs: impl IntoUnionArm) -> Result<Self> {
        self.union(true, rhs)
    }

    fn union(self, distinct: bool, rhs: impl IntoUnionArm) -> Result<Self> {
        let rhs = rhs.into_union_arm()?;
        rhs.value().check_consistency()?;
        let clause = Union::new(&self.result_fields(), distinct, rhs)?;
        self.push(Clause::Union(clause))
    }

    pub fn order_by(self, entries: impl IntoElementList<SortOrder>) -> Result<Self> {
        let clause = OrderBy::new(entries.into_elements()?)?;
        self.push(Clause::OrderBy(clause))
    }

    pub fn limit(self, count: impl IntoExpr) -> Result<Self> {
        let clause = RowLimit::new(LimitKind::Limit, count)?;
        self.push(Clause::Limit(clause))
    }

    pub fn offset(self, count: impl IntoExpr) -> Result<Self> {
        let clause = RowLimit::new(LimitKind::Offset, count)?;
        self.push(Clause::Limit(clause))
    }

    /// Use the select as a named table
    pub fn as_(self, alias: &str) -> Result<SubSelect> {
        self.check_consistency()?;
        let fields = self.result_fields();
        Ok(SubSelect {
            select: Box::new(self),
            alias: alias.to_string(),
            fields,
        })
    }

    fn columns(&self) -> Option<&SelectColumns> {
        self.clauses.find(|clause| match clause {
            Clause::SelectColumns(columns) => Some(columns),
            _ => None,
        })
    }

    /// Names and value types of the result row; columns of outer joined
    /// tables may be NULL
    pub fn result_fields(&self) -> Vec<ResultField> {
        let optional_tables = StatementContext::fold(self.clauses.as_slice()).provided_optional_tables;
        self.columns()
            .map(|columns| columns.result_fields_within(&optional_tables))
            .unwrap_or_default()
    }

    /// Tables the select reads without providing them itself
    pub fn unresolved_tables(&self) -> TableSet {
        StatementContext::fold(self.clauses.as_slice()).unresolved_tables()
    }

    pub fn unresolved_ctes(&self) -> TableSet {
        StatementContext::fold(self.clauses.as_slice()).unresolved_ctes()
    }
}

impl Statement for Select {
    fn kind(&self) -> &'static str {
        "select"
    }

    fn clauses(&self) -> &[Clause] {
        self.clauses.as_slice()
    }

    fn check_consistency(&self) -> Result<()> {
        check::check_consistency(self.kind(), self.clauses(), |_| {
            match self.columns() {
                Some(columns) if !columns.is_empty() => Ok(()),
                _ => Err(Error::check("select", Failure::NoColumnsSelected)),
            }
        })
    }
}

impl ToSql for Select {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        self.clauses.to_sql_string(context)
    }
}

/// Anything usable where a finished select is expected
pub trait IntoSelect {
    fn into_select(self) -> Result<Select>;
}

impl IntoSelect for Select {
    fn into_select(self) -> Result<Select> {
        Ok(self)
    }
}

impl IntoSelect for Result<Select> {
    fn into_select(self) -> Result<Select> {
        self
    }
}

/// A select used as a table, `(SELECT ...) AS alias`
#[derive(Debug, Clone, PartialEq)]
pub struct SubSelect {
    select: Box<Select>,
    alias: String,
    fields: Vec<ResultField>,
}

impl SubSelect {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn select(&self) -> &Select {
        &self.select
    }

    /// One result column, qualified with the alias
    pub fn column(&self, name: &str) -> Result<Column> {
        derived_column(&self.alias, &self.fields, name)
    }
}

impl HasColumns for SubSelect {
    fn all_columns(&self) -> Vec<Column> {
        derived_columns(&self.alias, &self.fields)
    }
}

impl ToSql for SubSelect {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let select = self.select.to_sql_string(context)?;
        Ok(format!("({}) AS {}", select, context.quote(&self.alias)))
    }
}
