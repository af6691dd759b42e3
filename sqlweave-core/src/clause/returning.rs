//! `RETURNING` columns of INSERT, UPDATE and DELETE

use super::select_columns::{check_unique_names, column_exprs, render_columns, result_fields, static_column_exprs};
use super::{ctes_of, rank, static_ctes_of, static_tables_of, tables_of, ClauseRules, SelectColumn};
use crate::dynamic::Element;
use crate::error::{Error, Failure, Result};
use crate::schema::ResultField;
use crate::serialize::{Context, ToSql};
use crate::type_set::TableSet;

/// `RETURNING ...` for INSERT, UPDATE and DELETE
#[derive(Debug, Clone, PartialEq)]
pub struct Returning {
    columns: Vec<Element<SelectColumn>>,
}

impl Returning {
    pub(crate) fn new(columns: Vec<Element<SelectColumn>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::check("returning", Failure::NoArguments));
        }
        check_unique_names("returning", &columns)?;
        if column_exprs(&columns).any(|expr| expr.contains_aggregate_function()) {
            return Err(Error::check("returning", Failure::AggregateNotAllowed));
        }
        Ok(Self { columns })
    }

    /// Result fields with the tables of `optional_tables` possibly NULL
    pub fn result_fields(&self, optional_tables: &TableSet) -> Vec<ResultField> {
        result_fields(&self.columns, optional_tables)
    }
}

impl ClauseRules for Returning {
    fn name(&self) -> &'static str {
        "returning"
    }

    fn rank(&self) -> u8 {
        rank::RETURNING
    }

    fn required_tables(&self) -> TableSet {
        tables_of(column_exprs(&self.columns))
    }

    fn required_static_tables(&self) -> TableSet {
        static_tables_of(static_column_exprs(&self.columns))
    }

    fn required_ctes(&self) -> TableSet {
        ctes_of(column_exprs(&self.columns))
    }

    fn required_static_ctes(&self) -> TableSet {
        static_ctes_of(static_column_exprs(&self.columns))
    }
}

impl ToSql for Returning {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        Ok(format!(" RETURNING {}", render_columns(&self.columns, context)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::IntoElementList;
    use crate::expr::{max, ExpressionOps};
    use crate::fixtures::TabFoo;
    use crate::serialize::{render, PostgresDialect};

    #[test]
    fn test_returning_sql() {
        let foo = TabFoo::new();
        let list = (foo.id(), foo.int_n().mul(2).unwrap().as_("twice"))
            .into_elements()
            .unwrap();
        let clause = Returning::new(list).unwrap();
        assert_eq!(
            render(&PostgresDialect, &clause).unwrap(),
            " RETURNING tab_foo.id, (tab_foo.int_n * 2) AS twice"
        );
        assert_eq!(clause.result_fields(&TableSet::new()).len(), 2);
    }

    #[test]
    fn test_returning_rejects_aggregates() {
        let foo = TabFoo::new();
        let list = max(foo.id()).unwrap().as_("m").into_elements().unwrap();
        let err = Returning::new(list).unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::AggregateNotAllowed));
        assert_eq!(err.clause(), Some("returning"));
    }
}
