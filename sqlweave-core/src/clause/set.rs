//! `SET` assignments of UPDATE and INSERT

use super::{ctes_of, rank, static_ctes_of, static_tables_of, tables_of, ClauseRules};
use crate::check::StatementContext;
use crate::dynamic::{active_values, Element, IntoElement, IntoElementList};
use crate::error::{Error, Failure, Result};
use crate::expr::{Assignment, Expr};
use crate::schema::{Column, Table};
use crate::serialize::{join, Context, ToSql};
use crate::type_set::{has_duplicates, TableSet};

impl IntoElement<Assignment> for Assignment {
    fn into_element(self) -> Result<Element<Assignment>> {
        Ok(Element::Static(self))
    }
}

impl IntoElement<Assignment> for Result<Assignment> {
    fn into_element(self) -> Result<Element<Assignment>> {
        Ok(Element::Static(self?))
    }
}

impl IntoElementList<Assignment> for Assignment {
    fn into_elements(self) -> Result<Vec<Element<Assignment>>> {
        Ok(vec![Element::Static(self)])
    }
}

impl IntoElementList<Assignment> for Result<Assignment> {
    fn into_elements(self) -> Result<Vec<Element<Assignment>>> {
        Ok(vec![Element::Static(self?)])
    }
}

/// Columns may appear once, and all of them belong to one table
pub(crate) fn check_columns<'a>(
    clause: &'static str,
    columns: impl IntoIterator<Item = &'a Column>,
) -> Result<()> {
    let columns: Vec<&Column> = columns.into_iter().collect();
    if columns.is_empty() {
        return Err(Error::check(clause, Failure::NoArguments));
    }
    let names: Vec<(&str, &str)> = columns
        .iter()
        .map(|column| (column.qualifier(), column.name()))
        .collect();
    if has_duplicates(&names) {
        return Err(Error::check(clause, Failure::DuplicateColumns));
    }
    if columns
        .iter()
        .any(|column| column.qualifier() != columns[0].qualifier())
    {
        return Err(Error::check(clause, Failure::MultipleTables));
    }
    Ok(())
}

/// Every column must belong to the statement's target table
pub(crate) fn check_target<'a>(
    clause: &'static str,
    columns: impl IntoIterator<Item = &'a Column>,
    target: Option<&Table>,
) -> Result<()> {
    let target = match target {
        Some(target) => target,
        None => return Ok(()),
    };
    for column in columns {
        if column.qualifier() != target.identity() {
            return Err(Error::check(
                clause,
                Failure::ForeignColumn {
                    column: format!("{}.{}", column.qualifier(), column.name()),
                    table: target.identity().to_string(),
                },
            ));
        }
    }
    Ok(())
}

pub(crate) fn assigned_exprs(assignments: &[Element<Assignment>]) -> impl Iterator<Item = &Expr> {
    assignments.iter().filter_map(|element| element.value().expr())
}

pub(crate) fn static_assigned_exprs(
    assignments: &[Element<Assignment>],
) -> impl Iterator<Item = &Expr> {
    assignments
        .iter()
        .filter(|element| element.is_static())
        .filter_map(|element| element.value().expr())
}

/// `SET a = 1, b = 2` of an UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    assignments: Vec<Element<Assignment>>,
}

impl SetClause {
    pub(crate) fn new(assignments: Vec<Element<Assignment>>) -> Result<Self> {
        check_columns("set", assignments.iter().map(|a| a.value().column()))?;
        Ok(Self { assignments })
    }

    pub fn assignments(&self) -> &[Element<Assignment>] {
        &self.assignments
    }
}

impl ClauseRules for SetClause {
    fn name(&self) -> &'static str {
        "set"
    }

    fn rank(&self) -> u8 {
        rank::SET
    }

    fn required_tables(&self) -> TableSet {
        tables_of(assigned_exprs(&self.assignments))
    }

    fn required_static_tables(&self) -> TableSet {
        static_tables_of(static_assigned_exprs(&self.assignments))
    }

    fn required_ctes(&self) -> TableSet {
        ctes_of(assigned_exprs(&self.assignments))
    }

    fn required_static_ctes(&self) -> TableSet {
        static_ctes_of(static_assigned_exprs(&self.assignments))
    }

    fn check_consistency(&self, context: &StatementContext) -> Result<()> {
        let columns = self.assignments.iter().map(|a| a.value().column());
        check_target("set", columns, context.target.as_ref())?;
        if active_values(&self.assignments).next().is_none() {
            return Err(Error::check("set", Failure::AssignmentsRequired));
        }
        Ok(())
    }
}

impl ToSql for SetClause {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let active: Vec<&Assignment> = active_values(&self.assignments).collect();
        Ok(format!(" SET {}", join(context, active, ", ")?))
    }
}
