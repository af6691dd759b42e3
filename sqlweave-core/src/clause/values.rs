//! `VALUES` rows and `DEFAULT VALUES` of INSERT

use super::set::{assigned_exprs, check_columns, check_target, static_assigned_exprs};
use super::{ctes_of, rank, static_ctes_of, static_tables_of, tables_of, ClauseRules};
use crate::check::StatementContext;
use crate::dynamic::{active_values, static_values, Element};
use crate::error::{Error, Failure, Result};
use crate::expr::{Assignment, Expr};
use crate::schema::{Column, Table};
use crate::serialize::{join, Context, ToSql};
use crate::type_set::TableSet;

/// The rows of an INSERT
#[derive(Debug, Clone, PartialEq)]
pub enum InsertValues {
    DefaultValues,
    Set(Vec<Element<Assignment>>),
    Rows {
        columns: Vec<Column>,
        rows: Vec<Vec<Expr>>,
    },
}

impl InsertValues {
    pub(crate) fn set(assignments: Vec<Element<Assignment>>) -> Result<Self> {
        check_columns("set", assignments.iter().map(|a| a.value().column()))?;
        Ok(InsertValues::Set(assignments))
    }

    pub(crate) fn columns(columns: Vec<Column>) -> Result<Self> {
        check_columns("columns", &columns)?;
        for column in &columns {
            if column.spec().is_read_only() {
                return Err(Error::check(
                    "columns",
                    Failure::ReadOnlyColumn {
                        column: column.name().to_string(),
                    },
                ));
            }
        }
        Ok(InsertValues::Rows {
            columns,
            rows: Vec::new(),
        })
    }

    /// Append one row to a multi-row insert
    pub(crate) fn push_row(&mut self, row: Vec<Expr>) -> Result<()> {
        match self {
            InsertValues::Rows { columns, rows } => {
                if row.len() != columns.len() {
                    return Err(Error::check(
                        "values",
                        Failure::RowWidth {
                            expected: columns.len(),
                            found: row.len(),
                        },
                    ));
                }
                for (column, value) in columns.iter().zip(&row) {
                    column.check_assigned(value)?;
                }
                rows.push(row);
                Ok(())
            }
            _ => Err(Error::check(
                "values",
                Failure::ClauseOrder {
                    clause: "values",
                    after: self.name(),
                },
            )),
        }
    }

    /// Has at least one row to insert
    pub(crate) fn is_complete(&self) -> bool {
        !matches!(self, InsertValues::Rows { rows, .. } if rows.is_empty())
    }

    fn exprs(&self) -> Vec<&Expr> {
        match self {
            InsertValues::DefaultValues => Vec::new(),
            InsertValues::Set(assignments) => assigned_exprs(assignments).collect(),
            InsertValues::Rows { rows, .. } => rows.iter().flatten().collect(),
        }
    }

    fn assigned_columns(&self) -> Vec<&Column> {
        match self {
            InsertValues::DefaultValues => Vec::new(),
            InsertValues::Set(assignments) => {
                assignments.iter().map(|a| a.value().column()).collect()
            }
            InsertValues::Rows { columns, .. } => columns.iter().collect(),
        }
    }

    /// Columns assigned in every rendering of the statement
    fn static_columns(&self) -> Vec<&Column> {
        match self {
            InsertValues::Set(assignments) => {
                static_values(assignments).map(Assignment::column).collect()
            }
            _ => self.assigned_columns(),
        }
    }

    fn check_required_columns(&self, target: &Table) -> Result<()> {
        let assigned: Vec<&str> = self
            .static_columns()
            .into_iter()
            .map(Column::name)
            .collect();
        let missing: Vec<String> = target
            .required_insert_columns()
            .iter()
            .filter(|column| !assigned.contains(&column.name()))
            .map(|column| column.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::check(
                self.name(),
                Failure::MissingRequiredColumns { columns: missing },
            ));
        }
        Ok(())
    }
}

impl ClauseRules for InsertValues {
    fn name(&self) -> &'static str {
        match self {
            InsertValues::DefaultValues => "default_values",
            InsertValues::Set(_) => "set",
            InsertValues::Rows { .. } => "values",
        }
    }

    fn rank(&self) -> u8 {
        rank::VALUES
    }

    fn required_tables(&self) -> TableSet {
        tables_of(self.exprs())
    }

    fn required_static_tables(&self) -> TableSet {
        match self {
            InsertValues::Set(assignments) => static_tables_of(static_assigned_exprs(assignments)),
            _ => static_tables_of(self.exprs()),
        }
    }

    fn required_ctes(&self) -> TableSet {
        ctes_of(self.exprs())
    }

    fn required_static_ctes(&self) -> TableSet {
        match self {
            InsertValues::Set(assignments) => static_ctes_of(static_assigned_exprs(assignments)),
            _ => static_ctes_of(self.exprs()),
        }
    }

    fn check_consistency(&self, context: &StatementContext) -> Result<()> {
        let target = match &context.target {
            Some(target) => target,
            None => return Ok(()),
        };
        check_target(self.name(), self.assigned_columns(), Some(target))?;
        self.check_required_columns(target)
    }
}

impl ToSql for InsertValues {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        match self {
            InsertValues::DefaultValues => Ok(" DEFAULT VALUES".to_string()),
            InsertValues::Set(assignments) => {
                let active: Vec<&Assignment> = active_values(assignments).collect();
                if active.is_empty() {
                    return Ok(" DEFAULT VALUES".to_string());
                }
                let mut columns = Vec::with_capacity(active.len());
                let mut values = Vec::with_capacity(active.len());
                for assignment in active {
                    columns.push(assignment.column().unqualified_sql(context));
                    values.push(match assignment.expr() {
                        Some(expr) => expr.to_sql_string(context)?,
                        None => "DEFAULT".to_string(),
                    });
                }
                Ok(format!(
                    " ({}) VALUES ({})",
                    columns.join(", "),
                    values.join(", ")
                ))
            }
            InsertValues::Rows { columns, rows } => {
                let names: Vec<String> = columns
                    .iter()
                    .map(|column| column.unqualified_sql(context))
                    .collect();
                let mut rendered = Vec::with_capacity(rows.len());
                for row in rows {
                    rendered.push(format!("({})", join(context, row, ", ")?));
                }
                Ok(format!(
                    " ({}) VALUES {}",
                    names.join(", "),
                    rendered.join(", ")
                ))
            }
        }
    }
}
