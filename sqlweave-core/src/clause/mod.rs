//! Statement clauses
//!
//! A statement is an ordered list of [`Clause`] values. Each clause knows
//! the tables and CTEs it provides and requires, checks itself against the
//! folded [`StatementContext`], and renders its own SQL fragment. Fragments
//! other than the leading keyword clause start with a space; absent clauses
//! render nothing.

mod from;
mod group_by;
mod limit;
mod on_conflict;
mod order_by;
mod returning;
mod select_columns;
mod set;
mod target;
mod union;
mod values;
mod where_;
mod with;

pub use from::FromClause;
pub use group_by::{GroupBy, Having};
pub use limit::{LimitKind, RowLimit};
pub use on_conflict::{ConflictAction, OnConflict};
pub use order_by::OrderBy;
pub use returning::Returning;
pub use select_columns::{SelectColumn, SelectColumns};
pub use set::SetClause;
pub use target::{TargetKind, TargetTable};
pub use union::{IntoUnionArm, Union};
pub(crate) use union::check_union_fields;
pub use values::InsertValues;
pub use where_::WhereClause;
pub use with::WithClause;

use crate::check::StatementContext;
use crate::error::{Error, Failure, Result};
use crate::expr::Expr;
use crate::schema::Table;
use crate::serialize::{Context, ToSql};
use crate::type_set::{TableSet, TypeSet};

/// Per-clause contribution to the statement checks
pub(crate) trait ClauseRules {
    /// Builder call the clause comes from, used to attribute failures
    fn name(&self) -> &'static str;

    /// Position in SQL order; clauses must be added with increasing rank
    fn rank(&self) -> u8;

    fn provided_tables(&self) -> TableSet {
        TableSet::new()
    }

    fn provided_static_tables(&self) -> TableSet {
        self.provided_tables()
    }

    /// Provided tables that outer joins may fill with NULL
    fn provided_optional_tables(&self) -> TableSet {
        TableSet::new()
    }

    fn required_tables(&self) -> TableSet {
        TableSet::new()
    }

    fn required_static_tables(&self) -> TableSet {
        self.required_tables()
    }

    fn provided_ctes(&self) -> TableSet {
        TableSet::new()
    }

    /// Provided CTEs, not counting dynamic ones
    fn provided_static_ctes(&self) -> TableSet {
        self.provided_ctes()
    }

    fn required_ctes(&self) -> TableSet {
        TableSet::new()
    }

    fn required_static_ctes(&self) -> TableSet {
        self.required_ctes()
    }

    /// All and static group_by entries
    fn group_by(&self) -> Option<(TypeSet<Expr>, TypeSet<Expr>)> {
        None
    }

    fn target_table(&self) -> Option<&Table> {
        None
    }

    fn check_consistency(&self, _context: &StatementContext) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    With(WithClause),
    SelectColumns(SelectColumns),
    Target(TargetTable),
    Set(SetClause),
    Values(InsertValues),
    From(FromClause),
    Where(WhereClause),
    GroupBy(GroupBy),
    Having(Having),
    Union(Union),
    OrderBy(OrderBy),
    Limit(RowLimit),
    OnConflict(OnConflict),
    Returning(Returning),
}

impl Clause {
    pub(crate) fn rules(&self) -> &dyn ClauseRules {
        match self {
            Clause::With(clause) => clause,
            Clause::SelectColumns(clause) => clause,
            Clause::Target(clause) => clause,
            Clause::Set(clause) => clause,
            Clause::Values(clause) => clause,
            Clause::From(clause) => clause,
            Clause::Where(clause) => clause,
            Clause::GroupBy(clause) => clause,
            Clause::Having(clause) => clause,
            Clause::Union(clause) => clause,
            Clause::OrderBy(clause) => clause,
            Clause::Limit(clause) => clause,
            Clause::OnConflict(clause) => clause,
            Clause::Returning(clause) => clause,
        }
    }

    pub fn name(&self) -> &'static str {
        self.rules().name()
    }
}

impl ToSql for Clause {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        match self {
            Clause::With(clause) => clause.to_sql_string(context),
            Clause::SelectColumns(clause) => clause.to_sql_string(context),
            Clause::Target(clause) => clause.to_sql_string(context),
            Clause::Set(clause) => clause.to_sql_string(context),
            Clause::Values(clause) => clause.to_sql_string(context),
            Clause::From(clause) => clause.to_sql_string(context),
            Clause::Where(clause) => clause.to_sql_string(context),
            Clause::GroupBy(clause) => clause.to_sql_string(context),
            Clause::Having(clause) => clause.to_sql_string(context),
            Clause::Union(clause) => clause.to_sql_string(context),
            Clause::OrderBy(clause) => clause.to_sql_string(context),
            Clause::Limit(clause) => clause.to_sql_string(context),
            Clause::OnConflict(clause) => clause.to_sql_string(context),
            Clause::Returning(clause) => clause.to_sql_string(context),
        }
    }
}

/// Ordered clause storage shared by all statements
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct ClauseList {
    clauses: Vec<Clause>,
}

impl ClauseList {
    /// Statement heads (`WITH`, target table) whose order is fixed by the builder
    pub fn from_ordered(clauses: Vec<Clause>) -> Self {
        debug_assert!(clauses
            .windows(2)
            .all(|pair| pair[0].rules().rank() < pair[1].rules().rank()));
        Self { clauses }
    }

    /// Append a clause, rejecting clauses that are out of SQL order or repeated
    pub fn push(&mut self, clause: Clause) -> Result<()> {
        if let Some(last) = self.clauses.last() {
            if last.rules().rank() >= clause.rules().rank() {
                return Err(Error::check(
                    clause.name(),
                    Failure::ClauseOrder {
                        clause: clause.name(),
                        after: last.name(),
                    },
                ));
            }
        }
        self.clauses.push(clause);
        Ok(())
    }

    pub fn as_slice(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn last_mut(&mut self) -> Option<&mut Clause> {
        self.clauses.last_mut()
    }

    pub fn find<T>(&self, pick: impl Fn(&Clause) -> Option<&T>) -> Option<&T> {
        self.clauses.iter().find_map(pick)
    }

    /// Render every clause in order
    pub fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let mut sql = String::new();
        for clause in &self.clauses {
            sql.push_str(&clause.to_sql_string(context)?);
        }
        Ok(sql)
    }
}

/// Union of the required tables of `exprs`
pub(crate) fn tables_of<'a>(exprs: impl IntoIterator<Item = &'a Expr>) -> TableSet {
    exprs
        .into_iter()
        .fold(TableSet::new(), |tables, expr| tables.union(&expr.required_tables()))
}

/// Union of the statically required tables of `exprs`
pub(crate) fn static_tables_of<'a>(exprs: impl IntoIterator<Item = &'a Expr>) -> TableSet {
    exprs.into_iter().fold(TableSet::new(), |tables, expr| {
        tables.union(&expr.required_static_tables())
    })
}

pub(crate) fn ctes_of<'a>(exprs: impl IntoIterator<Item = &'a Expr>) -> TableSet {
    exprs
        .into_iter()
        .fold(TableSet::new(), |ctes, expr| ctes.union(&expr.required_ctes()))
}

pub(crate) fn static_ctes_of<'a>(exprs: impl IntoIterator<Item = &'a Expr>) -> TableSet {
    exprs
        .into_iter()
        .fold(TableSet::new(), |ctes, expr| ctes.union(&expr.required_static_ctes()))
}

pub(crate) mod rank {
    pub const WITH: u8 = 0;
    pub const SELECT: u8 = 1;
    pub const TARGET: u8 = 1;
    pub const SET: u8 = 2;
    pub const VALUES: u8 = 2;
    pub const FROM: u8 = 3;
    pub const WHERE: u8 = 4;
    pub const GROUP_BY: u8 = 5;
    pub const HAVING: u8 = 6;
    pub const UNION: u8 = 7;
    pub const ORDER_BY: u8 = 8;
    pub const LIMIT: u8 = 9;
    pub const OFFSET: u8 = 10;
    pub const ON_CONFLICT: u8 = 11;
    pub const RETURNING: u8 = 12;
}
