use super::insert::returning_fields;
use super::Statement;
use crate::check;
use crate::clause::{
    Clause, ClauseList, FromClause, Returning, SelectColumn, TargetKind, TargetTable, WhereClause,
    WithClause,
};
use crate::dynamic::{IntoElement, IntoElementList};
use crate::error::{Error, Failure, Result};
use crate::expr::Expr;
use crate::schema::{ResultField, Table};
use crate::serialize::{Context, ToSql};
use crate::table_ref::IntoTableRef;

/// A DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    clauses: ClauseList,
}

/// Start a DELETE from `table`; `where_` or `unconditionally` is required
pub fn delete_from(table: &Table) -> Delete {
    Delete::build(None, table)
}

impl Delete {
    pub(crate) fn build(with: Option<WithClause>, table: &Table) -> Self {
        let mut clauses = Vec::with_capacity(2);
        clauses.extend(with.map(Clause::With));
        clauses.push(Clause::Target(TargetTable::new(TargetKind::DeleteFrom, table)));
        Self {
            clauses: ClauseList::from_ordered(clauses),
        }
    }

    fn push(mut self, clause: Clause) -> Result<Self> {
        self.clauses.push(clause)?;
        Ok(self)
    }

    /// `USING` tables the condition may refer to
    pub fn using(self, table: impl IntoTableRef) -> Result<Self> {
        let table = table.into_table_ref()?;
        self.push(Clause::From(FromClause::using(table)))
    }

    pub fn where_(self, condition: impl IntoElement<Expr>) -> Result<Self> {
        let clause = WhereClause::condition(condition.into_element()?)?;
        self.push(Clause::Where(clause))
    }

    /// Delete every row
    pub fn unconditionally(self) -> Result<Self> {
        self.push(Clause::Where(WhereClause::Unconditionally))
    }

    pub fn returning(self, columns: impl IntoElementList<SelectColumn>) -> Result<Self> {
        let clause = Returning::new(columns.into_elements()?)?;
        self.push(Clause::Returning(clause))
    }

    pub fn result_fields(&self) -> Vec<ResultField> {
        returning_fields(&self.clauses)
    }
}

impl Statement for Delete {
    fn kind(&self) -> &'static str {
        "delete"
    }

    fn clauses(&self) -> &[Clause] {
        self.clauses.as_slice()
    }

    fn check_consistency(&self) -> Result<()> {
        check::check_consistency(self.kind(), self.clauses(), |_| {
            if self.clauses().iter().any(|clause| matches!(clause, Clause::Where(_))) {
                Ok(())
            } else {
                Err(Error::check("delete_from", Failure::WhereRequired))
            }
        })
    }
}

impl ToSql for Delete {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        self.clauses.to_sql_string(context)
    }
}
