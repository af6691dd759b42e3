//! `FROM` and `USING` tables

use super::{rank, ClauseRules};
use crate::error::Result;
use crate::serialize::{Context, ToSql};
use crate::table_ref::TableRef;
use crate::type_set::TableSet;

/// `FROM` for SELECT, `USING` for DELETE
#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    table: TableRef,
    using: bool,
}

impl FromClause {
    pub(crate) fn from(table: TableRef) -> Self {
        Self { table, using: false }
    }

    pub(crate) fn using(table: TableRef) -> Self {
        Self { table, using: true }
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }
}

impl ClauseRules for FromClause {
    fn name(&self) -> &'static str {
        if self.using {
            "using"
        } else {
            "from"
        }
    }

    fn rank(&self) -> u8 {
        rank::FROM
    }

    fn provided_tables(&self) -> TableSet {
        self.table.provided_tables()
    }

    fn provided_static_tables(&self) -> TableSet {
        self.table.provided_static_tables()
    }

    fn provided_optional_tables(&self) -> TableSet {
        self.table.provided_optional_tables()
    }

    fn required_tables(&self) -> TableSet {
        self.table.required_tables()
    }

    fn required_ctes(&self) -> TableSet {
        self.table.required_ctes()
    }

    fn required_static_ctes(&self) -> TableSet {
        self.table.required_static_ctes()
    }
}

impl ToSql for FromClause {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let keyword = if self.using { "USING" } else { "FROM" };
        Ok(format!(" {} {}", keyword, self.table.to_sql_string(context)?))
    }
}
