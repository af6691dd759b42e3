//! Table references: plain tables, CTE references, sub-selects and joins

use crate::cte::CteRef;
use crate::dynamic::{Dynamic, Element};
use crate::error::{Error, Failure, Result};
use crate::expr::{Expr, IntoExpr};
use crate::schema::Table;
use crate::serialize::{Context, ToSql};
use crate::statement::SubSelect;
use crate::type_set::TableSet;
use crate::value_type::HasValueType;
use std::fmt::{self, Display};

/// Something a statement can read rows from
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    Table(Table),
    Cte(CteRef),
    SubSelect(SubSelect),
    Join(Box<Join>),
}

impl TableRef {
    /// Table identities made available to the statement
    pub fn provided_tables(&self) -> TableSet {
        match self {
            TableRef::Table(table) => TableSet::new().with(table.identity().to_string()),
            TableRef::Cte(cte) => TableSet::new().with(cte.identity().to_string()),
            TableRef::SubSelect(sub) => TableSet::new().with(sub.alias().to_string()),
            TableRef::Join(join) => join.lhs.provided_tables().union(&join.rhs.value().provided_tables()),
        }
    }

    /// Provided tables, not counting dynamically joined ones
    pub fn provided_static_tables(&self) -> TableSet {
        match self {
            TableRef::Join(join) => {
                let lhs = join.lhs.provided_static_tables();
                match &join.rhs {
                    Element::Static(rhs) => lhs.union(&rhs.provided_static_tables()),
                    Element::Dynamic { .. } => lhs,
                }
            }
            _ => self.provided_tables(),
        }
    }

    /// Provided tables whose columns may be NULL because of outer joins
    pub fn provided_optional_tables(&self) -> TableSet {
        match self {
            TableRef::Join(join) => {
                let rhs = join.rhs.value();
                match join.kind {
                    JoinType::Inner | JoinType::Cross => join
                        .lhs
                        .provided_optional_tables()
                        .union(&rhs.provided_optional_tables()),
                    JoinType::LeftOuter => join
                        .lhs
                        .provided_optional_tables()
                        .union(&rhs.provided_tables()),
                    JoinType::RightOuter => join
                        .lhs
                        .provided_tables()
                        .union(&rhs.provided_optional_tables()),
                    JoinType::FullOuter => join.lhs.provided_tables().union(&rhs.provided_tables()),
                }
            }
            _ => TableSet::new(),
        }
    }

    /// Tables a sub-select reads from its enclosing statement
    pub fn required_tables(&self) -> TableSet {
        match self {
            TableRef::Table(_) | TableRef::Cte(_) => TableSet::new(),
            TableRef::SubSelect(sub) => sub.select().unresolved_tables(),
            TableRef::Join(join) => join
                .lhs
                .required_tables()
                .union(&join.rhs.value().required_tables()),
        }
    }

    pub fn required_ctes(&self) -> TableSet {
        match self {
            TableRef::Table(_) => TableSet::new(),
            TableRef::Cte(cte) => TableSet::new().with(cte.name().to_string()),
            TableRef::SubSelect(sub) => sub.select().unresolved_ctes(),
            TableRef::Join(join) => {
                let mut ctes = join.lhs.required_ctes().union(&join.rhs.value().required_ctes());
                if let Some(condition) = &join.condition {
                    ctes = ctes.union(&condition.required_ctes());
                }
                ctes
            }
        }
    }

    /// Required CTEs, not counting dynamically joined ones
    pub fn required_static_ctes(&self) -> TableSet {
        match self {
            TableRef::Join(join) => {
                let lhs = join.lhs.required_static_ctes();
                match &join.rhs {
                    Element::Static(rhs) => {
                        let ctes = lhs.union(&rhs.required_static_ctes());
                        match &join.condition {
                            Some(condition) => ctes.union(&condition.required_ctes()),
                            None => ctes,
                        }
                    }
                    Element::Dynamic { .. } => lhs,
                }
            }
            _ => self.required_ctes(),
        }
    }
}

impl ToSql for TableRef {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        match self {
            TableRef::Table(table) => table.to_sql_string(context),
            TableRef::Cte(cte) => cte.to_sql_string(context),
            TableRef::SubSelect(sub) => sub.to_sql_string(context),
            TableRef::Join(join) => join.to_sql_string(context),
        }
    }
}

/// Join types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
}

impl Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER JOIN"),
            JoinType::LeftOuter => write!(f, "LEFT OUTER JOIN"),
            JoinType::RightOuter => write!(f, "RIGHT OUTER JOIN"),
            JoinType::FullOuter => write!(f, "FULL OUTER JOIN"),
            JoinType::Cross => write!(f, "CROSS JOIN"),
        }
    }
}

/// A completed join
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    lhs: TableRef,
    kind: JoinType,
    rhs: Element<TableRef>,
    condition: Option<Expr>,
}

impl Join {
    fn build(lhs: TableRef, kind: JoinType, rhs: Element<TableRef>, condition: Option<Expr>) -> Result<TableRef> {
        let fail = |failure| Err(Error::check("join", failure));

        let duplicates = lhs.provided_tables().intersect(&rhs.value().provided_tables());
        if !duplicates.is_empty() {
            return fail(Failure::DuplicateTableNames {
                tables: duplicates.into_vec(),
            });
        }
        for side in [&lhs, rhs.value()] {
            let dependencies = side.required_tables();
            if !dependencies.is_empty() {
                return fail(Failure::JoinTableDependencies {
                    tables: dependencies.into_vec(),
                });
            }
        }

        if let Some(condition) = &condition {
            if !condition.value_type().is_boolean() {
                return fail(Failure::NotBoolean {
                    found: condition.value_type(),
                });
            }
            if condition.contains_aggregate_function() {
                return fail(Failure::AggregateNotAllowed);
            }
            let provided = lhs.provided_tables().union(&rhs.value().provided_tables());
            if !condition.required_tables().is_subset_of(&provided) {
                return fail(Failure::JoinConditionTables);
            }
            if rhs.is_static() {
                let dynamic_only = lhs.provided_tables().difference(&lhs.provided_static_tables());
                if !condition.required_tables().is_disjoint(&dynamic_only) {
                    return fail(Failure::JoinConditionDynamicTables);
                }
            }
        }

        Ok(TableRef::Join(Box::new(Join {
            lhs,
            kind,
            rhs,
            condition,
        })))
    }

    pub fn kind(&self) -> JoinType {
        self.kind
    }
}

impl ToSql for Join {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let mut sql = self.lhs.to_sql_string(context)?;
        let rhs = match self.rhs.active_value() {
            Some(rhs) => rhs,
            None => return Ok(sql),
        };
        sql.push(' ');
        sql.push_str(&self.kind.to_string());
        sql.push(' ');
        sql.push_str(&rhs.to_sql_string(context)?);
        if let Some(condition) = &self.condition {
            sql.push_str(" ON ");
            sql.push_str(&condition.to_sql_string(context)?);
        }
        Ok(sql)
    }
}

/// Conversion into a table reference
pub trait IntoTableRef {
    fn into_table_ref(self) -> Result<TableRef>;
}

impl IntoTableRef for TableRef {
    fn into_table_ref(self) -> Result<TableRef> {
        Ok(self)
    }
}

impl IntoTableRef for Result<TableRef> {
    fn into_table_ref(self) -> Result<TableRef> {
        self
    }
}

impl IntoTableRef for Table {
    fn into_table_ref(self) -> Result<TableRef> {
        Ok(TableRef::Table(self))
    }
}

impl IntoTableRef for &Table {
    fn into_table_ref(self) -> Result<TableRef> {
        Ok(TableRef::Table(self.clone()))
    }
}

impl IntoTableRef for CteRef {
    fn into_table_ref(self) -> Result<TableRef> {
        Ok(TableRef::Cte(self))
    }
}

impl IntoTableRef for SubSelect {
    fn into_table_ref(self) -> Result<TableRef> {
        Ok(TableRef::SubSelect(self))
    }
}

impl IntoTableRef for Result<SubSelect> {
    fn into_table_ref(self) -> Result<TableRef> {
        self.map(TableRef::SubSelect)
    }
}

/// Right-hand side of a join, optionally [`dynamic`](crate::dynamic())
pub trait IntoJoinOperand {
    fn into_join_operand(self) -> Result<Element<TableRef>>;
}

impl<T: IntoTableRef> IntoJoinOperand for T {
    fn into_join_operand(self) -> Result<Element<TableRef>> {
        Ok(Element::Static(self.into_table_ref()?))
    }
}

impl<T: IntoTableRef> IntoJoinOperand for Dynamic<T> {
    fn into_join_operand(self) -> Result<Element<TableRef>> {
        let active = self.active;
        Ok(Element::Dynamic {
            active,
            value: self.value.into_table_ref()?,
        })
    }
}

/// A join waiting for its condition
#[must_use]
pub struct PendingJoin {
    lhs: Result<TableRef>,
    kind: JoinType,
    rhs: Result<Element<TableRef>>,
}

impl PendingJoin {
    pub fn on(self, condition: impl IntoExpr) -> Result<TableRef> {
        let lhs = self.lhs?;
        let rhs = self.rhs?;
        Join::build(lhs, self.kind, rhs, Some(condition.into_expr()?))
    }

    /// Join without a condition
    pub fn unconditionally(self) -> Result<TableRef> {
        Join::build(self.lhs?, self.kind, self.rhs?, None)
    }
}

/// Join operations on anything that can be a table reference
pub trait Joinable: IntoTableRef + Sized {
    fn join(self, rhs: impl IntoJoinOperand) -> PendingJoin {
        self.inner_join(rhs)
    }

    fn inner_join(self, rhs: impl IntoJoinOperand) -> PendingJoin {
        pending(self, JoinType::Inner, rhs)
    }

    fn left_outer_join(self, rhs: impl IntoJoinOperand) -> PendingJoin {
        pending(self, JoinType::LeftOuter, rhs)
    }

    fn right_outer_join(self, rhs: impl IntoJoinOperand) -> PendingJoin {
        pending(self, JoinType::RightOuter, rhs)
    }

    fn full_outer_join(self, rhs: impl IntoJoinOperand) -> PendingJoin {
        pending(self, JoinType::FullOuter, rhs)
    }

    fn cross_join(self, rhs: impl IntoJoinOperand) -> Result<TableRef> {
        pending(self, JoinType::Cross, rhs).unconditionally()
    }
}

impl<T: IntoTableRef> Joinable for T {}

fn pending(lhs: impl IntoTableRef, kind: JoinType, rhs: impl IntoJoinOperand) -> PendingJoin {
    PendingJoin {
        lhs: lhs.into_table_ref(),
        kind,
        rhs: rhs.into_join_operand(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cte::cte;
    use crate::dynamic::dynamic;
    use crate::expr::ExpressionOps;
    use crate::fixtures::{TabBar, TabFoo};
    use crate::serialize::{render, DefaultDialect};
    use crate::statement::select;

    fn names(tables: &[&str]) -> TableSet {
        tables.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_join_sql() -> Result<()> {
        let foo = TabFoo::new();
        let bar = TabBar::new();
        let join = (&foo).join(&bar).on(foo.id().eq(bar.id()))?;
        assert_eq!(
            render(&DefaultDialect, &join)?,
            "tab_foo INNER JOIN tab_bar ON tab_foo.id = tab_bar.id"
        );
        let join = (&foo).left_outer_join(&bar).unconditionally()?;
        assert_eq!(render(&DefaultDialect, &join)?, "tab_foo LEFT OUTER JOIN tab_bar");
        let join = (&foo).cross_join(&bar)?;
        assert_eq!(render(&DefaultDialect, &join)?, "tab_foo CROSS JOIN tab_bar");
        Ok(())
    }

    #[test]
    fn test_joined_joins() -> Result<()> {
        let foo = TabFoo::new();
        let bar = TabBar::new();
        let a = foo.as_("a");
        let join = (&foo)
            .full_outer_join(&bar)
            .on(foo.id().eq(bar.id()))?
            .right_outer_join(&a)
            .on(a.id().eq(bar.id()))?;
        assert_eq!(
            render(&DefaultDialect, &join)?,
            "tab_foo FULL OUTER JOIN tab_bar ON tab_foo.id = tab_bar.id \
             RIGHT OUTER JOIN tab_foo AS a ON a.id = tab_bar.id"
        );
        assert_eq!(join.provided_tables(), names(&["tab_foo", "tab_bar", "a"]));
        Ok(())
    }

    #[test]
    fn test_join_name_collision() {
        let foo = TabFoo::new();
        let err = (&foo).join(&foo).unconditionally().unwrap_err();
        assert_eq!(
            err.failure(),
            Some(&Failure::DuplicateTableNames {
                tables: vec!["tab_foo".to_string()]
            })
        );
        assert_eq!(err.clause(), Some("join"));

        let a = foo.as_("a");
        assert!((&foo).join(&a).on(foo.id().eq(a.id())).is_ok());
    }

    #[test]
    fn test_join_condition_tables() {
        let foo = TabFoo::new();
        let bar = TabBar::new();
        let a = foo.as_("a");
        let err = (&foo).join(&bar).on(a.id().eq(bar.id())).unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::JoinConditionTables));
        let err = (&foo).join(&bar).on(foo.id()).unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::NotBoolean { .. })));
    }

    #[test]
    fn test_static_join_on_dynamic_tables() -> Result<()> {
        let foo = TabFoo::new();
        let bar = TabBar::new();
        let a = foo.as_("a");
        let dynamic_join = (&foo)
            .join(dynamic(true, &bar))
            .on(foo.id().eq(bar.id()))?;
        assert_eq!(dynamic_join.provided_tables(), names(&["tab_foo", "tab_bar"]));
        assert_eq!(dynamic_join.provided_static_tables(), names(&["tab_foo"]));

        let err = dynamic_join
            .clone()
            .join(&a)
            .on(a.id().eq(bar.id()))
            .unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::JoinConditionDynamicTables));

        assert!(dynamic_join.join(dynamic(true, &a)).on(a.id().eq(bar.id())).is_ok());
        Ok(())
    }

    #[test]
    fn test_inactive_dynamic_join_is_omitted() -> Result<()> {
        let foo = TabFoo::new();
        let bar = TabBar::new();
        let join = (&foo)
            .join(dynamic(false, &bar))
            .on(foo.id().eq(bar.id()))?;
        assert_eq!(render(&DefaultDialect, &join)?, "tab_foo");
        Ok(())
    }

    #[test]
    fn test_provided_tables_grow_with_joins() -> Result<()> {
        let foo = TabFoo::new();
        let bar = TabBar::new();
        let single = (&foo).into_table_ref()?;
        let joined = (&foo).cross_join(&bar)?;
        assert!(single.provided_tables().is_subset_of(&joined.provided_tables()));
        assert!(joined.required_tables().is_empty());
        Ok(())
    }

    #[test]
    fn test_outer_joins_provide_optional_tables() -> Result<()> {
        let foo = TabFoo::new();
        let bar = TabBar::new();
        let on = || foo.id().eq(bar.id());
        let inner = (&foo).join(&bar).on(on())?;
        assert!(inner.provided_optional_tables().is_empty());
        let left = (&foo).left_outer_join(&bar).on(on())?;
        assert_eq!(left.provided_optional_tables(), names(&["tab_bar"]));
        let right = (&foo).right_outer_join(&bar).on(on())?;
        assert_eq!(right.provided_optional_tables(), names(&["tab_foo"]));
        let full = (&foo).full_outer_join(&bar).on(on())?;
        assert_eq!(full.provided_optional_tables(), names(&["tab_foo", "tab_bar"]));
        assert!(TableRef::Table(foo.table().clone()).provided_optional_tables().is_empty());
        Ok(())
    }

    #[test]
    fn test_dynamic_join_ctes_are_not_static() -> Result<()> {
        let foo = TabFoo::new();
        let x = cte("x").as_(select(foo.id())?.from(&foo))?;
        let joined = (&foo)
            .left_outer_join(dynamic(true, &x))
            .on(foo.id().eq(x.column("id")?))?;
        assert_eq!(joined.required_ctes(), names(&["x"]));
        assert!(joined.required_static_ctes().is_empty());
        let joined = (&foo).cross_join(&x)?;
        assert_eq!(joined.required_static_ctes(), names(&["x"]));
        Ok(())
    }
}
