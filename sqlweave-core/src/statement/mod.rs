//! Statement builders
//!
//! A statement is an ordered list of clauses. Builder methods append a
//! clause and return the extended statement; every method checks what can
//! be checked locally and fails with a named [`Failure`](crate::Failure).
//! Checks that need the whole statement run in
//! [`Statement::check_consistency`] and [`Statement::check_prepare`].

mod delete;
mod insert;
mod select;
mod update;

pub use delete::{delete_from, Delete};
pub use insert::{insert_into, Insert, OnConflictPending};
pub use select::{select, IntoSelect, Select, SubSelect};
pub use update::{update, Update};

use crate::check;
use crate::clause::{Clause, SelectColumn, WithClause};
use crate::cte::Cte;
use crate::dynamic::IntoElementList;
use crate::error::Result;
use crate::schema::Table;
use crate::serialize::{Context, DefaultDialect, Dialect, SerializedStatement, ToSql};
use tracing::trace;

/// Core trait for all statements
pub trait Statement {
    /// Statement kind, used in diagnostics
    fn kind(&self) -> &'static str;

    /// The clauses in SQL order
    fn clauses(&self) -> &[Clause];

    /// First failure of the statement's own rules, if any
    fn check_consistency(&self) -> Result<()>;

    /// Consistency, plus every table and CTE the statement reads must be
    /// provided by the statement itself
    fn check_prepare(&self) -> Result<()> {
        check::check_prepare(self.kind(), self.clauses(), self.check_consistency())
    }

    /// Render the statement and collect its parameters
    fn serialize(&self, dialect: &dyn Dialect) -> Result<SerializedStatement> {
        self.check_consistency()?;
        let mut context = Context::new(dialect);
        let mut sql = String::new();
        for clause in self.clauses() {
            sql.push_str(&clause.to_sql_string(&mut context)?);
        }
        trace!(
            statement = self.kind(),
            dialect = %dialect.kind(),
            parameters = context.parameters().len(),
            sql = %sql,
            "serialized statement"
        );
        Ok(SerializedStatement {
            sql,
            parameters: context.into_parameters(),
        })
    }

    /// Generate the SQL text for `dialect`
    fn to_sql_with(&self, dialect: &dyn Dialect) -> Result<String> {
        Ok(self.serialize(dialect)?.sql)
    }

    /// Generate the SQL text for the default dialect
    fn to_sql(&self) -> Result<String> {
        self.to_sql_with(&DefaultDialect)
    }
}

/// Common table expressions waiting for their statement
#[derive(Debug, Clone, PartialEq)]
pub struct With {
    clause: WithClause,
}

/// Start a statement with `WITH`
///
/// # Examples
/// ```
/// use sqlweave_core::{cte, select, value, with, ExpressionOps, Statement};
///
/// let x = cte("x").as_(select(value(1).as_("a")))?;
/// let statement = with(x.clone())?.select(x.column("a")?)?.from(&x)?;
/// assert_eq!(statement.to_sql()?, "WITH x AS (SELECT 1 AS a) SELECT x.a FROM x");
/// # Ok::<(), sqlweave_core::Error>(())
/// ```
pub fn with(ctes: impl IntoElementList<Cte>) -> Result<With> {
    Ok(With {
        clause: WithClause::new(ctes.into_elements()?)?,
    })
}

impl With {
    pub fn select(self, columns: impl IntoElementList<SelectColumn>) -> Result<Select> {
        Select::build(Some(self.clause), columns)
    }

    pub fn insert_into(self, table: &Table) -> Insert {
        Insert::build(Some(self.clause), table)
    }

    pub fn update(self, table: &Table) -> Update {
        Update::build(Some(self.clause), table)
    }

    pub fn delete_from(self, table: &Table) -> Delete {
        Delete::build(Some(self.clause), table)
    }
}
