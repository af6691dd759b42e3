//! `ON CONFLICT` handling of INSERT

use super::set::{assigned_exprs, check_columns, check_target, static_assigned_exprs};
use super::where_::check_condition;
use super::{ctes_of, rank, static_ctes_of, static_tables_of, tables_of, ClauseRules};
use crate::check::StatementContext;
use crate::dynamic::{active_values, Element};
use crate::error::{Error, Failure, Result};
use crate::expr::{Assignment, Expr};
use crate::schema::Column;
use crate::serialize::{join, Context, ToSql};
use crate::type_set::{has_duplicates, TableSet};

#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAction {
    DoNothing,
    DoUpdate {
        assignments: Vec<Element<Assignment>>,
        condition: Option<Element<Expr>>,
    },
}

/// PostgreSQL `ON CONFLICT [(...)] DO NOTHING | DO UPDATE SET ... WHERE ...`
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    columns: Vec<Column>,
    action: ConflictAction,
}

impl OnConflict {
    /// An empty conflict target matches any constraint
    pub(crate) fn do_nothing(columns: Vec<Column>) -> Result<Self> {
        check_conflict_target(&columns)?;
        Ok(Self {
            columns,
            action: ConflictAction::DoNothing,
        })
    }

    pub(crate) fn do_update(columns: Vec<Column>, assignments: Vec<Element<Assignment>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::check("do_update", Failure::ConflictTargetRequired));
        }
        check_conflict_target(&columns)?;
        check_columns("do_update", assignments.iter().map(|a| a.value().column()))?;
        Ok(Self {
            columns,
            action: ConflictAction::DoUpdate {
                assignments,
                condition: None,
            },
        })
    }

    /// Attach the mandatory condition of `do_update`
    pub(crate) fn set_condition(&mut self, new_condition: Element<Expr>) -> Result<()> {
        match &mut self.action {
            ConflictAction::DoUpdate { condition, .. } if condition.is_none() => {
                check_condition("where", new_condition.value())?;
                if new_condition.value().contains_aggregate_function() {
                    return Err(Error::check("where", Failure::AggregateNotAllowed));
                }
                *condition = Some(new_condition);
                Ok(())
            }
            _ => Err(Error::check(
                "where",
                Failure::ClauseOrder {
                    clause: "where",
                    after: "on_conflict",
                },
            )),
        }
    }

    fn exprs(&self) -> Vec<&Expr> {
        match &self.action {
            ConflictAction::DoNothing => Vec::new(),
            ConflictAction::DoUpdate {
                assignments,
                condition,
            } => assigned_exprs(assignments)
                .chain(condition.iter().map(Element::value))
                .collect(),
        }
    }

    fn static_exprs(&self) -> Vec<&Expr> {
        match &self.action {
            ConflictAction::DoNothing => Vec::new(),
            ConflictAction::DoUpdate {
                assignments,
                condition,
            } => {
                let condition = condition
                    .iter()
                    .filter(|condition| condition.is_static())
                    .map(Element::value);
                static_assigned_exprs(assignments).chain(condition).collect()
            }
        }
    }
}

/// Conflict target columns may appear once
fn check_conflict_target(columns: &[Column]) -> Result<()> {
    let names: Vec<(&str, &str)> = columns
        .iter()
        .map(|column| (column.qualifier(), column.name()))
        .collect();
    if has_duplicates(&names) {
        return Err(Error::check("on_conflict", Failure::DuplicateColumns));
    }
    Ok(())
}

impl ClauseRules for OnConflict {
    fn name(&self) -> &'static str {
        "on_conflict"
    }

    fn rank(&self) -> u8 {
        rank::ON_CONFLICT
    }

    fn required_tables(&self) -> TableSet {
        tables_of(self.exprs())
    }

    fn required_static_tables(&self) -> TableSet {
        static_tables_of(self.static_exprs())
    }

    fn required_ctes(&self) -> TableSet {
        ctes_of(self.exprs())
    }

    fn required_static_ctes(&self) -> TableSet {
        static_ctes_of(self.static_exprs())
    }

    fn check_consistency(&self, context: &StatementContext) -> Result<()> {
        check_target("on_conflict", &self.columns, context.target.as_ref())?;
        if let ConflictAction::DoUpdate {
            assignments,
            condition,
        } = &self.action
        {
            let columns = assignments.iter().map(|a| a.value().column());
            check_target("do_update", columns, context.target.as_ref())?;
            if active_values(assignments).next().is_none() {
                return Err(Error::check("do_update", Failure::AssignmentsRequired));
            }
            if condition.is_none() {
                return Err(Error::check("do_update", Failure::OnConflictWhereRequired));
            }
        }
        Ok(())
    }
}

impl ToSql for OnConflict {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|column| column.unqualified_sql(context))
            .collect();
        let mut sql = if columns.is_empty() {
            " ON CONFLICT".to_string()
        } else {
            format!(" ON CONFLICT ({})", columns.join(", "))
        };
        match &self.action {
            ConflictAction::DoNothing => sql.push_str(" DO NOTHING"),
            ConflictAction::DoUpdate {
                assignments,
                condition,
            } => {
                let active: Vec<&Assignment> = active_values(assignments).collect();
                sql.push_str(" DO UPDATE SET ");
                sql.push_str(&join(context, active, ", ")?);
                if let Some(condition) = condition.as_ref().and_then(Element::active_value) {
                    sql.push_str(" WHERE ");
                    sql.push_str(&condition.to_sql_string(context)?);
                }
            }
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::{dynamic, IntoElementList};
    use crate::expr::ExpressionOps;
    use crate::fixtures::TabFoo;
    use crate::serialize::{render, PostgresDialect};

    #[test]
    fn test_do_nothing_sql() -> Result<()> {
        let foo = TabFoo::new();
        let clause = OnConflict::do_nothing(vec![foo.id()])?;
        assert_eq!(
            render(&PostgresDialect, &clause)?,
            " ON CONFLICT (id) DO NOTHING"
        );
        Ok(())
    }

    #[test]
    fn test_do_update_requires_condition() -> Result<()> {
        let foo = TabFoo::new();
        let context = StatementContext {
            target: Some(foo.table().clone()),
            ..StatementContext::default()
        };
        let mut clause =
            OnConflict::do_update(vec![foo.id()], foo.int_n().set(5).into_elements()?)?;
        assert_eq!(
            clause.check_consistency(&context).unwrap_err().failure(),
            Some(&Failure::OnConflictWhereRequired)
        );

        clause.set_condition(Element::Static(foo.int_n().lt(5)?))?;
        assert!(clause.check_consistency(&context).is_ok());
        assert_eq!(
            render(&PostgresDialect, &clause)?,
            " ON CONFLICT (id) DO UPDATE SET int_n = 5 WHERE tab_foo.int_n < 5"
        );
        assert!(clause.set_condition(Element::Static(foo.int_n().lt(5)?)).is_err());
        Ok(())
    }

    #[test]
    fn test_do_nothing_without_target() -> Result<()> {
        let clause = OnConflict::do_nothing(Vec::new())?;
        assert_eq!(render(&PostgresDialect, &clause)?, " ON CONFLICT DO NOTHING");
        assert!(clause.check_consistency(&StatementContext::default()).is_ok());
        Ok(())
    }

    #[test]
    fn test_conflict_target_checks() {
        let foo = TabFoo::new();
        let err = OnConflict::do_update(Vec::new(), foo.int_n().set(5).into_elements().unwrap())
            .unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::ConflictTargetRequired));
        assert_eq!(err.clause(), Some("do_update"));

        let err = OnConflict::do_nothing(vec![foo.id(), foo.id()]).unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::DuplicateColumns));

        let clause = OnConflict::do_nothing(vec![foo.id(), foo.int_n()]).unwrap();
        assert_eq!(
            render(&PostgresDialect, &clause).unwrap(),
            " ON CONFLICT (id, int_n) DO NOTHING"
        );
    }

    #[test]
    fn test_do_update_with_only_inactive_assignments() -> Result<()> {
        let foo = TabFoo::new();
        let context = StatementContext {
            target: Some(foo.table().clone()),
            ..StatementContext::default()
        };
        let mut clause = OnConflict::do_update(
            vec![foo.id()],
            (dynamic(false, foo.int_n().set(5)), dynamic(false, foo.double_n().set(1.5)))
                .into_elements()?,
        )?;
        clause.set_condition(Element::Static(foo.int_n().lt(5)?))?;
        let err = clause.check_consistency(&context).unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::AssignmentsRequired));
        assert_eq!(err.clause(), Some("do_update"));
        Ok(())
    }

    #[test]
    fn test_inactive_condition_renders_no_where() -> Result<()> {
        let foo = TabFoo::new();
        let mut clause =
            OnConflict::do_update(vec![foo.id()], foo.int_n().set(5).into_elements()?)?;
        clause.set_condition(dynamic(false, foo.int_n().lt(5)?).into())?;
        assert_eq!(
            render(&PostgresDialect, &clause)?,
            " ON CONFLICT (id) DO UPDATE SET int_n = 5"
        );
        assert!(clause.required_static_tables().is_empty());
        assert_eq!(clause.required_tables().len(), 1);
        Ok(())
    }
}
