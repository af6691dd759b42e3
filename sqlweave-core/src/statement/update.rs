use super::insert::returning_fields;
use super::Statement;
use crate::check;
use crate::clause::{
    Clause, ClauseList, Returning, SelectColumn, SetClause, TargetKind, TargetTable, WhereClause,
    WithClause,
};
use crate::dynamic::{IntoElement, IntoElementList};
use crate::error::{Error, Failure, Result};
use crate::expr::{Assignment, Expr};
use crate::schema::{ResultField, Table};
use crate::serialize::{Context, ToSql};

/// An UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    clauses: ClauseList,
}

/// Start an UPDATE of `table`; `set` and `where_` (or `unconditionally`) are required
pub fn update(table: &Table) -> Update {
    Update::build(None, table)
}

impl Update {
    pub(crate) fn build(with: Option<WithClause>, table: &Table) -> Self {
        let mut clauses = Vec::with_capacity(2);
        clauses.extend(with.map(Clause::With));
        clauses.push(Clause::Target(TargetTable::new(TargetKind::Update, table)));
        Self {
            clauses: ClauseList::from_ordered(clauses),
        }
    }

    fn push(mut self, clause: Clause) -> Result<Self> {
        self.clauses.push(clause)?;
        Ok(self)
    }

    pub fn set(self, assignments: impl IntoElementList<Assignment>) -> Result<Self> {
        let clause = SetClause::new(assignments.into_elements()?)?;
        self.push(Clause::Set(clause))
    }

    pub fn where_(self, condition: impl IntoElement<Expr>) -> Result<Self> {
        let clause = WhereClause::condition(condition.into_element()?)?;
        self.push(Clause::Where(clause))
    }

    /// Update every row
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

impl Statement for Update {
    fn kind(&self) -> &'static str {
        "update"
    }

    fn clauses(&self) -> &[Clause] {
        self.clauses.as_slice()
    }

    fn check_consistency(&self) -> Result<()> {
        check::check_consistency(self.kind(), self.clauses(), |_| {
            let clauses = self.clauses();
            if !clauses.iter().any(|clause| matches!(clause, Clause::Set(_))) {
                return Err(Error::check("update", Failure::AssignmentsRequired));
            }
            if !clauses.iter().any(|clause| matches!(clause, Clause::Where(_))) {
                return Err(Error::check("update", Failure::WhereRequired));
            }
            Ok(())
        })
    }
}

impl ToSql for Update {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        self.clauses.to_sql_string(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::dynamic;
    use crate::expr::ExpressionOps;
    use crate::fixtures::{TabBar, TabFoo};
    use crate::schema::ColumnSpec;
    use crate::serialize::PostgresDialect;
    use crate::value_type::DataType;

    #[test]
    fn test_update_sql() -> Result<()> {
        let foo = TabFoo::new();
        let statement = update(foo.table())
            .set((foo.int_n().set(foo.int_n().add(1)), foo.text_nn_d().set_default()))?
            .where_(foo.id().eq(3))?;
        assert_eq!(
            statement.to_sql()?,
            "UPDATE tab_foo SET int_n = tab_foo.int_n + 1, text_nn_d = DEFAULT WHERE tab_foo.id = 3"
        );
        assert!(statement.check_prepare().is_ok());
        Ok(())
    }

    #[test]
    fn test_update_requires_where() -> Result<()> {
        let foo = TabFoo::new();
        let statement = update(foo.table()).set(foo.int_n().set(1))?;
        let err = statement.check_consistency().unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::WhereRequired));
        assert_eq!(err.clause(), Some("update"));

        let statement = statement.unconditionally()?;
        assert_eq!(statement.to_sql()?, "UPDATE tab_foo SET int_n = 1");
        Ok(())
    }

    #[test]
    fn test_update_requires_set() {
        let foo = TabFoo::new();
        let err = update(foo.table())
            .unconditionally()
            .unwrap()
            .check_consistency()
            .unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::AssignmentsRequired));
    }

    #[test]
    fn test_update_all_assignments_inactive() -> Result<()> {
        let foo = TabFoo::new();
        let statement = update(foo.table())
            .set(dynamic(false, foo.int_n().set(1)))?
            .unconditionally()?;
        let err = statement.check_consistency().unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::AssignmentsRequired));
        assert_eq!(err.clause(), Some("set"));
        Ok(())
    }

    #[test]
    fn test_update_where_reads_other_table() -> Result<()> {
        let foo = TabFoo::new();
        let bar = TabBar::new();
        let statement = update(foo.table())
            .set(foo.int_n().set(1))?
            .where_(bar.id().eq(1))?;
        let err = statement.check_prepare().unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::UnknownTables { .. })));
        Ok(())
    }

    #[test]
    fn test_update_quotes_reserved_column_names() -> Result<()> {
        let t = Table::new(
            "t",
            [
                ColumnSpec::new("id", DataType::Integral),
                ColumnSpec::new("order", DataType::Integral),
            ],
        );
        let statement = update(&t)
            .set(t.column("order")?.set(2))?
            .where_(t.column("order")?.gt(1))?;
        assert_eq!(
            statement.to_sql()?,
            "UPDATE t SET \"order\" = 2 WHERE t.\"order\" > 1"
        );
        Ok(())
    }

    #[test]
    fn test_update_returning() -> Result<()> {
        let foo = TabFoo::new();
        let statement = update(foo.table())
            .set(foo.int_n().set(1))?
            .where_(foo.id().eq(3))?
            .returning((foo.id(), foo.int_n().as_("n")))?;
        assert_eq!(
            statement.to_sql_with(&PostgresDialect)?,
            "UPDATE tab_foo SET int_n = 1 WHERE tab_foo.id = 3 RETURNING tab_foo.id, tab_foo.int_n AS n"
        );
        assert_eq!(statement.result_fields().len(), 2);
        Ok(())
    }
}
