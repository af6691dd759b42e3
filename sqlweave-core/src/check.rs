//! Folding a statement's clauses into one context and computing its verdict
//!
//! Each clause reports the tables and CTEs it provides and requires, and
//! group_by reports the entries that count as aggregates. The fold unions
//! all of them; every clause is then checked against the final context, so
//! a clause may rely on information from clauses that follow it (the select
//! columns on FROM, for example). Only the first failure is reported.

use crate::clause::Clause;
use crate::error::{Error, Failure, Result};
use crate::expr::Expr;
use crate::schema::Table;
use crate::type_set::{TableSet, TypeSet};
use tracing::debug;

/// Everything a statement knows after folding its clauses
#[derive(Debug, Clone, Default)]
pub struct StatementContext {
    pub provided_tables: TableSet,
    pub provided_static_tables: TableSet,
    /// Tables on the NULL-filled side of an outer join
    pub provided_optional_tables: TableSet,
    pub required_tables: TableSet,
    pub required_static_tables: TableSet,
    pub provided_ctes: TableSet,
    pub provided_static_ctes: TableSet,
    pub required_ctes: TableSet,
    pub required_static_ctes: TableSet,
    pub has_group_by: bool,
    pub group_by: TypeSet<Expr>,
    pub static_group_by: TypeSet<Expr>,
    /// Table modified by INSERT, UPDATE or DELETE
    pub target: Option<Table>,
}

impl StatementContext {
    pub fn fold(clauses: &[Clause]) -> Self {
        let mut context = StatementContext::default();
        for clause in clauses {
            let rules = clause.rules();
            context.provided_tables.extend(rules.provided_tables());
            context.provided_static_tables.extend(rules.provided_static_tables());
            context.provided_optional_tables.extend(rules.provided_optional_tables());
            context.required_tables.extend(rules.required_tables());
            context.required_static_tables.extend(rules.required_static_tables());
            context.provided_ctes.extend(rules.provided_ctes());
            context.provided_static_ctes.extend(rules.provided_static_ctes());
            context.required_ctes.extend(rules.required_ctes());
            context.required_static_ctes.extend(rules.required_static_ctes());
            if let Some((all, static_only)) = rules.group_by() {
                context.has_group_by = true;
                context.group_by.extend(all);
                context.static_group_by.extend(static_only);
            }
            if let Some(table) = rules.target_table() {
                context.target = Some(table.clone());
            }
        }
        context
    }

    /// Required tables that no clause provides
    pub fn unresolved_tables(&self) -> TableSet {
        self.required_tables.difference(&self.provided_tables)
    }

    pub fn unresolved_ctes(&self) -> TableSet {
        self.required_ctes.difference(&self.provided_ctes)
    }
}

/// The consistency verdict: every clause check plus the statement's own
/// completeness rule, evaluated against the folded context
pub(crate) fn check_consistency(
    kind: &'static str,
    clauses: &[Clause],
    completeness: impl FnOnce(&StatementContext) -> Result<()>,
) -> Result<()> {
    let context = StatementContext::fold(clauses);
    let verdict = consistency_verdict(clauses, &context).and_then(|()| completeness(&context));
    debug!(
        statement = kind,
        clauses = clauses.len(),
        consistent = verdict.is_ok(),
        "computed consistency verdict"
    );
    verdict
}

fn consistency_verdict(clauses: &[Clause], context: &StatementContext) -> Result<()> {
    for clause in clauses {
        clause.rules().check_consistency(context)?;
    }
    let dynamic_only = context
        .provided_tables
        .difference(&context.provided_static_tables);
    let dynamic_only_ctes = context
        .provided_ctes
        .difference(&context.provided_static_ctes);
    for clause in clauses {
        let rules = clause.rules();
        let unknown = rules.required_static_tables().intersect(&dynamic_only);
        if !unknown.is_empty() {
            return Err(Error::check(
                rules.name(),
                Failure::UnknownStaticTables {
                    tables: unknown.into_vec(),
                },
            ));
        }
        let unknown = rules.required_static_ctes().intersect(&dynamic_only_ctes);
        if !unknown.is_empty() {
            return Err(Error::check(
                rules.name(),
                Failure::UnknownStaticCtes {
                    ctes: unknown.into_vec(),
                },
            ));
        }
    }
    Ok(())
}

/// The prepare verdict: consistency, then every required table and CTE must
/// be provided by the statement itself
pub(crate) fn check_prepare(
    kind: &'static str,
    clauses: &[Clause],
    consistency: Result<()>,
) -> Result<()> {
    consistency?;
    let context = StatementContext::fold(clauses);
    for clause in clauses {
        let rules = clause.rules();
        let unknown = rules.required_tables().difference(&context.provided_tables);
        if !unknown.is_empty() {
            debug!(statement = kind, clause = rules.name(), "unknown tables");
            return Err(Error::check(
                rules.name(),
                Failure::UnknownTables {
                    tables: unknown.into_vec(),
                },
            ));
        }
        let unknown = rules.required_ctes().difference(&context.provided_ctes);
        if !unknown.is_empty() {
            debug!(statement = kind, clause = rules.name(), "unknown ctes");
            return Err(Error::check(
                rules.name(),
                Failure::UnknownCtes {
                    ctes: unknown.into_vec(),
                },
            ));
        }
    }
    Ok(())
}

/// With group_by present, entries must only read group_by entries, aggregate
/// functions and constants; static entries must manage with the static
/// group_by entries.
pub(crate) fn check_grouped<'a>(
    clause: &'static str,
    entries: impl IntoIterator<Item = (&'a Expr, bool)>,
    context: &StatementContext,
) -> Result<()> {
    for (expr, is_static) in entries {
        if !expr.is_aggregate_over(&context.group_by) {
            return Err(Error::check(clause, Failure::NotAggregate));
        }
        if is_static && !expr.is_aggregate_over(&context.static_group_by) {
            return Err(Error::check(clause, Failure::NotStaticAggregate));
        }
    }
    Ok(())
}
