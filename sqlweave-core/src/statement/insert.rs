use super::Statement;
use crate::check::{self, StatementContext};
use crate::clause::{
    Clause, ClauseList, InsertValues, OnConflict, Returning, SelectColumn, TargetKind, TargetTable,
    WithClause,
};
use crate::dynamic::{Element, IntoElement, IntoElementList};
use crate::error::{Error, Failure, Result};
use crate::expr::{Assignment, Expr};
use crate::schema::{Column, ResultField, Table};
use crate::serialize::{Context, ToSql};

/// An INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    clauses: ClauseList,
}

/// Start an INSERT into `table`
///
/// # Examples
/// ```
/// use sqlweave_core::{insert_into, ColumnSpec, DataType, Statement, Table};
///
/// let t = Table::new("t", [ColumnSpec::new("id", DataType::Integral)]);
/// let statement = insert_into(&t).set(t.column("id")?.set(7))?;
/// assert_eq!(statement.to_sql()?, "INSERT INTO t (id) VALUES (7)");
/// # Ok::<(), sqlweave_core::Error>(())
/// ```
pub fn insert_into(table: &Table) -> Insert {
    Insert::build(None, table)
}

impl Insert {
    pub(crate) fn build(with: Option<WithClause>, table: &Table) -> Self {
        let mut clauses = Vec::with_capacity(2);
        clauses.extend(with.map(Clause::With));
        clauses.push(Clause::Target(TargetTable::new(TargetKind::InsertInto, table)));
        Self {
            clauses: ClauseList::from_ordered(clauses),
        }
    }

    fn push(mut self, clause: Clause) -> Result<Self> {
        self.clauses.push(clause)?;
        Ok(self)
    }

    /// `(a, b) VALUES (1, 2)` from assignments
    pub fn set(self, assignments: impl IntoElementList<Assignment>) -> Result<Self> {
        let values = InsertValues::set(assignments.into_elements()?)?;
        self.push(Clause::Values(values))
    }

    pub fn default_values(self) -> Result<Self> {
        self.push(Clause::Values(InsertValues::DefaultValues))
    }

    /// Declare the columns of a multi-row insert; rows follow with [`Insert::values`]
    pub fn columns(self, columns: impl IntoIterator<Item = Column>) -> Result<Self> {
        let values = InsertValues::columns(columns.into_iter().collect())?;
        self.push(Clause::Values(values))
    }

    /// Append one row, in the order of [`Insert::columns`]
    ///
    /// The column list is fixed, so rows take static values only.
    pub fn values(mut self, row: impl IntoElementList<Expr>) -> Result<Self> {
        let row = row
            .into_elements()?
            .into_iter()
            .map(|element| match element {
                Element::Static(value) => Ok(value),
                Element::Dynamic { .. } => Err(Error::check("values", Failure::DynamicRowValue)),
            })
            .collect::<Result<Vec<Expr>>>()?;
        match self.clauses.last_mut() {
            Some(Clause::Values(values)) => values.push_row(row)?,
            last => {
                return Err(Error::check(
                    "values",
                    Failure::ClauseOrder {
                        clause: "values",
                        after: last.map_or("insert_into", |clause| clause.name()),
                    },
                ))
            }
        }
        Ok(self)
    }

    /// PostgreSQL `ON CONFLICT (columns)`, completed by `do_nothing` or `do_update`.
    /// Only `do_nothing` accepts an empty column list.
    pub fn on_conflict(self, columns: impl IntoIterator<Item = Column>) -> OnConflictPending {
        OnConflictPending {
            insert: self,
            columns: columns.into_iter().collect(),
        }
    }

    /// The condition of `on_conflict(...).do_update(...)`; an inactive one renders no WHERE
    pub fn where_(mut self, condition: impl IntoElement<Expr>) -> Result<Self> {
        let condition = condition.into_element()?;
        match self.clauses.last_mut() {
            Some(Clause::OnConflict(on_conflict)) => on_conflict.set_condition(condition)?,
            last => {
                return Err(Error::check(
                    "where",
                    Failure::ClauseOrder {
                        clause: "where",
                        after: last.map_or("insert_into", |clause| clause.name()),
                    },
                ))
            }
        }
        Ok(self)
    }

    pub fn returning(self, columns: impl IntoElementList<SelectColumn>) -> Result<Self> {
        let clause = Returning::new(columns.into_elements()?)?;
        self.push(Clause::Returning(clause))
    }

    /// Result row of `returning`, empty without it
    pub fn result_fields(&self) -> Vec<ResultField> {
        returning_fields(&self.clauses)
    }
}

/// Result row of a RETURNING clause
pub(super) fn returning_fields(clauses: &ClauseList) -> Vec<ResultField> {
    let optional_tables = StatementContext::fold(clauses.as_slice()).provided_optional_tables;
    clauses
        .find(|clause| match clause {
            Clause::Returning(returning) => Some(returning),
            _ => None,
        })
        .map(|returning| returning.result_fields(&optional_tables))
        .unwrap_or_default()
}

/// An insert waiting for its conflict action
#[must_use]
pub struct OnConflictPending {
    insert: Insert,
    columns: Vec<Column>,
}

impl OnConflictPending {
    pub fn do_nothing(self) -> Result<Insert> {
        let clause = OnConflict::do_nothing(self.columns)?;
        self.insert.push(Clause::OnConflict(clause))
    }

    /// Requires a following [`Insert::where_`]
    pub fn do_update(self, assignments: impl IntoElementList<Assignment>) -> Result<Insert> {
        let clause = OnConflict::do_update(self.columns, assignments.into_elements()?)?;
        self.insert.push(Clause::OnConflict(clause))
    }
}

impl Statement for Insert {
    fn kind(&self) -> &'static str {
        "insert"
    }

    fn clauses(&self) -> &[Clause] {
        self.clauses.as_slice()
    }

    fn check_consistency(&self) -> Result<()> {
        check::check_consistency(self.kind(), self.clauses(), |_| {
            let values = self.clauses.find(|clause| match clause {
                Clause::Values(values) => Some(values),
                _ => None,
            });
            match values {
                Some(values) if values.is_complete() => Ok(()),
                _ => Err(Error::check("insert_into", Failure::InsertValuesRequired)),
            }
        })
    }
}

impl ToSql for Insert {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        self.clauses.to_sql_string(context)
    }
}
