//! Target table of INSERT, UPDATE and DELETE

use super::{rank, ClauseRules};
use crate::error::Result;
use crate::schema::Table;
use crate::serialize::{Context, ToSql};
use crate::type_set::TableSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    InsertInto,
    Update,
    DeleteFrom,
}

/// The table modified by a statement
#[derive(Debug, Clone, PartialEq)]
pub struct TargetTable {
    kind: TargetKind,
    table: Table,
}

impl TargetTable {
    pub(crate) fn new(kind: TargetKind, table: &Table) -> Self {
        Self {
            kind,
            table: table.clone(),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

impl ClauseRules for TargetTable {
    fn name(&self) -> &'static str {
        match self.kind {
            TargetKind::InsertInto => "insert_into",
            TargetKind::Update => "update",
            TargetKind::DeleteFrom => "delete_from",
        }
    }

    fn rank(&self) -> u8 {
        rank::TARGET
    }

    fn provided_tables(&self) -> TableSet {
        TableSet::new().with(self.table.identity().to_string())
    }

    fn target_table(&self) -> Option<&Table> {
        Some(&self.table)
    }
}

impl ToSql for TargetTable {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let keyword = match self.kind {
            TargetKind::InsertInto => "INSERT INTO",
            TargetKind::Update => "UPDATE",
            TargetKind::DeleteFrom => "DELETE FROM",
        };
        Ok(format!("{} {}", keyword, self.table.to_sql_string(context)?))
    }
}
