//! Common table expressions
//!
//! `cte(name).as_(select)` names a select for use in [`with`](crate::with()).
//! Union arms added with `union_all`/`union_distinct` may read the CTE
//! itself, which makes it recursive; the base select may not.

use crate::clause::{check_union_fields, IntoUnionArm};
use crate::dynamic::Element;
use crate::error::{Error, Failure, Result};
use crate::schema::{derived_column, derived_columns, Column, HasColumns, ResultField};
use crate::serialize::{Context, ToSql};
use crate::statement::{IntoSelect, Select, Statement};
use crate::table_ref::{IntoTableRef, TableRef};
use crate::type_set::TableSet;

/// A CTE name waiting for its definition
#[derive(Debug, Clone, PartialEq)]
pub struct CteName {
    name: String,
}

/// Start a common table expression
pub fn cte(name: &str) -> CteName {
    CteName {
        name: name.to_string(),
    }
}

impl CteName {
    /// Reference to the CTE by name alone; it has no known columns
    pub fn reference(&self) -> CteRef {
        CteRef {
            name: self.name.clone(),
            alias: None,
            fields: Vec::new(),
        }
    }

    /// Define the CTE by its base select
    pub fn as_(self, base: impl IntoSelect) -> Result<Cte> {
        let base = base.into_select()?;
        if base.unresolved_ctes().contains(&self.name) {
            return Err(Error::check("cte", Failure::CteSelfReference));
        }
        let tables = base.unresolved_tables();
        if !tables.is_empty() {
            return Err(Error::check(
                "cte",
                Failure::UnknownTables {
                    tables: tables.into_vec(),
                },
            ));
        }
        base.check_consistency()?;
        let fields = base.result_fields();
        Ok(Cte {
            name: self.name,
            base: Box::new(base),
            arms: Vec::new(),
            fields,
        })
    }
}

/// One union arm of a CTE
#[derive(Debug, Clone, PartialEq)]
struct CteArm {
    distinct: bool,
    select: Element<Select>,
    reads_self: bool,
}

/// A named select, optionally a recursive union
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    name: String,
    base: Box<Select>,
    arms: Vec<CteArm>,
    fields: Vec<ResultField>,
}

impl Cte {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if an active union arm reads the CTE itself
    pub fn is_recursive(&self) -> bool {
        self.arms
            .iter()
            .any(|arm| arm.reads_self && arm.select.is_active())
    }

    pub fn union_all(self, arm: impl IntoUnionArm) -> Result<Cte> {
        self.union(false, arm)
    }

    pub fn union_distinct(self, arm: impl IntoUnionArm) -> Result<Cte> {
        self.union(true, arm)
    }

    fn union(mut self, distinct: bool, arm: impl IntoUnionArm) -> Result<Cte> {
        let arm = arm.into_union_arm()?;
        let select = arm.value();
        check_union_fields(&self.fields, &select.result_fields())?;
        let tables = select.unresolved_tables();
        if !tables.is_empty() {
            return Err(Error::check(
                "union",
                Failure::UnknownTables {
                    tables: tables.into_vec(),
                },
            ));
        }
        select.check_consistency()?;
        let reads_self = select.unresolved_ctes().contains(&self.name);
        self.arms.push(CteArm {
            distinct,
            select: arm,
            reads_self,
        });
        Ok(self)
    }

    /// CTEs this definition reads, not counting itself
    pub fn required_ctes(&self) -> TableSet {
        self.arms
            .iter()
            .fold(self.base.unresolved_ctes(), |ctes, arm| {
                ctes.union(&arm.select.value().unresolved_ctes())
            })
            .difference(&TableSet::new().with(self.name.clone()))
    }

    pub fn unresolved_tables(&self) -> TableSet {
        self.arms
            .iter()
            .fold(self.base.unresolved_tables(), |tables, arm| {
                tables.union(&arm.select.value().unresolved_tables())
            })
    }

    /// Union arms that are part of the rendered statement
    pub fn active_arms(&self) -> usize {
        self.arms.iter().filter(|arm| arm.select.is_active()).count()
    }

    pub fn result_fields(&self) -> &[ResultField] {
        &self.fields
    }

    /// One result column, qualified with the CTE name
    pub fn column(&self, name: &str) -> Result<Column> {
        derived_column(&self.name, &self.fields, name)
    }

    /// Reference for FROM and joins
    pub fn reference(&self) -> CteRef {
        CteRef {
            name: self.name.clone(),
            alias: None,
            fields: self.fields.clone(),
        }
    }

    /// Reference under another name, for self-joins
    pub fn as_(&self, alias: &str) -> CteRef {
        CteRef {
            alias: Some(alias.to_string()),
            ..self.reference()
        }
    }
}

impl HasColumns for Cte {
    fn all_columns(&self) -> Vec<Column> {
        derived_columns(&self.name, &self.fields)
    }
}

impl ToSql for Cte {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let mut body = self.base.to_sql_string(context)?;
        for arm in &self.arms {
            let select = match arm.select.active_value() {
                Some(select) => select,
                None => continue,
            };
            body.push(' ');
            body.push_str(context.dialect().union_keyword(arm.distinct));
            body.push(' ');
            body.push_str(&select.to_sql_string(context)?);
        }
        Ok(format!("{} AS ({})", context.quote(&self.name), body))
    }
}

/// A CTE used as a table
#[derive(Debug, Clone, PartialEq)]
pub struct CteRef {
    name: String,
    alias: Option<String>,
    fields: Vec<ResultField>,
}

impl CteRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name the reference is known by inside a statement
    pub fn identity(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn column(&self, name: &str) -> Result<Column> {
        derived_column(self.identity(), &self.fields, name)
    }
}

impl HasColumns for CteRef {
    fn all_columns(&self) -> Vec<Column> {
        derived_columns(self.identity(), &self.fields)
    }
}

impl ToSql for CteRef {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let name = context.quote(&self.name);
        Ok(match &self.alias {
            Some(alias) => format!("{} AS {}", name, context.quote(alias)),
            None => name,
        })
    }
}

impl IntoTableRef for &Cte {
    fn into_table_ref(self) -> Result<TableRef> {
        Ok(TableRef::Cte(self.reference()))
    }
}

impl IntoTableRef for &CteRef {
    fn into_table_ref(self) -> Result<TableRef> {
        Ok(TableRef::Cte(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::dynamic;
    use crate::expr::{value, ExpressionOps};
    use crate::fixtures::{TabBar, TabFoo};
    use crate::statement::{select, with};
    use crate::table_ref::Joinable;
    use crate::value_type::{DataType, ValueType};

    fn counter() -> Result<Cte> {
        let x = cte("x").as_(select(value(0).as_("n")))?;
        let x_ref = x.reference();
        let n = x_ref.column("n")?;
        x.union_all(
            select(n.clone().add(1)?.as_("n"))?
                .from(&x_ref)?
                .where_(n.lt(10))?,
        )
    }

    #[test]
    fn test_recursive_cte() -> Result<()> {
        let x = counter()?;
        assert!(x.is_recursive());
        assert!(x.required_ctes().is_empty());
        assert_eq!(x.active_arms(), 1);
        let statement = with(x.clone())?.select(x.column("n")?)?.from(&x)?;
        assert_eq!(
            statement.to_sql()?,
            "WITH RECURSIVE x AS (SELECT 0 AS n UNION ALL SELECT (x.n + 1) AS n FROM x \
             WHERE x.n < 10) SELECT x.n FROM x"
        );
        assert!(statement.check_prepare().is_ok());
        Ok(())
    }

    #[test]
    fn test_plain_union_is_not_recursive() -> Result<()> {
        let foo = TabFoo::new();
        let bar = TabBar::new();
        let x = cte("x")
            .as_(select(foo.id())?.from(&foo))?
            .union_distinct(select(bar.id())?.from(&bar))?;
        assert!(!x.is_recursive());
        let statement = with(x.clone())?.select(x.column("id")?)?.from(&x)?;
        assert_eq!(
            statement.to_sql()?,
            "WITH x AS (SELECT tab_foo.id FROM tab_foo UNION DISTINCT SELECT tab_bar.id FROM tab_bar) \
             SELECT x.id FROM x"
        );
        Ok(())
    }

    #[test]
    fn test_self_reference_in_base() -> Result<()> {
        let foo = TabFoo::new();
        let earlier = cte("x").as_(select(foo.id())?.from(&foo))?;
        let err = cte("x")
            .as_(select(earlier.column("id")?)?.from(&earlier))
            .unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::CteSelfReference));

        let err = cte("x")
            .as_(select(value(1).as_("a"))?.from(&cte("x").reference()))
            .unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::CteSelfReference));
        Ok(())
    }

    #[test]
    fn test_union_arm_mismatch() -> Result<()> {
        let x = cte("x").as_(select(value(0).as_("n")))?;
        let err = x
            .clone()
            .union_all(select(value("a").as_("n")))
            .unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::UnionResultMismatch));
        let err = x.union_all(select(value(1).as_("m"))).unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::UnionResultMismatch));
        Ok(())
    }

    #[test]
    fn test_cte_base_must_be_self_contained() -> Result<()> {
        let foo = TabFoo::new();
        let err = cte("x").as_(select(foo.id())).unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::UnknownTables { .. })));
        Ok(())
    }

    #[test]
    fn test_cte_alias_and_columns() -> Result<()> {
        let foo = TabFoo::new();
        let x = cte("x").as_(select((foo.id(), foo.int_n()))?.from(&foo))?;
        let a = x.as_("a");
        assert_eq!(a.identity(), "a");
        let id = a.column("id")?;
        assert_eq!(id.qualifier(), "a");
        assert_eq!(id.spec().value_type(), ValueType::of(DataType::Integral));
        assert_eq!(x.all_columns().len(), 2);

        let statement = with(x.clone())?.select(a.column("int_n")?)?.from(&a)?;
        assert_eq!(
            statement.to_sql()?,
            "WITH x AS (SELECT tab_foo.id, tab_foo.int_n FROM tab_foo) SELECT a.int_n FROM x AS a"
        );
        Ok(())
    }

    #[test]
    fn test_with_ordering() -> Result<()> {
        let foo = TabFoo::new();
        let x = cte("x").as_(select(foo.id())?.from(&foo))?;
        let y = cte("y").as_(select(x.column("id")?)?.from(&x))?;
        assert_eq!(y.required_ctes(), TableSet::new().with("x".to_string()));

        assert!(with((x.clone(), y.clone())).is_ok());
        let err = with((y.clone(), x.clone())).unwrap_err();
        assert_eq!(
            err.failure(),
            Some(&Failure::CteDependency {
                cte: "y".to_string(),
                missing: vec!["x".to_string()]
            })
        );
        let err = with((x.clone(), x.clone())).unwrap_err();
        assert!(matches!(err.failure(), Some(Failure::DuplicateCtes { .. })));

        let statement = with(y.clone())?.select(y.column("id")?)?.from(&y)?;
        let err = statement.check_prepare().unwrap_err();
        assert_eq!(
            err.failure(),
            Some(&Failure::UnknownCtes {
                ctes: vec!["x".to_string()]
            })
        );
        Ok(())
    }

    #[test]
    fn test_dynamic_cte() -> Result<()> {
        let foo = TabFoo::new();
        let x = cte("x").as_(select(foo.id())?.from(&foo))?;
        let statement = with(dynamic(false, x.clone()))?.select(foo.id())?.from(&foo)?;
        assert_eq!(statement.to_sql()?, "SELECT tab_foo.id FROM tab_foo");
        Ok(())
    }

    #[test]
    fn test_reading_a_dynamic_cte_statically() -> Result<()> {
        let foo = TabFoo::new();
        let x = cte("x").as_(select(foo.id())?.from(&foo))?;
        for active in [false, true] {
            let statement = with(dynamic(active, x.clone()))?
                .select(x.column("id")?)?
                .from(&x)?;
            let err = statement.check_prepare().unwrap_err();
            assert_eq!(
                err.failure(),
                Some(&Failure::UnknownStaticCtes {
                    ctes: vec!["x".to_string()]
                })
            );
            assert_eq!(err.clause(), Some("from"));
        }

        let statement = with(dynamic(false, x.clone()))?
            .select((foo.id(), dynamic(false, x.column("id")?.as_("x_id"))))?
            .from((&foo).left_outer_join(dynamic(false, &x)).on(foo.id().eq(x.column("id")?))?)?;
        assert!(statement.check_prepare().is_ok());
        assert_eq!(
            statement.to_sql()?,
            "SELECT tab_foo.id, NULL AS x_id FROM tab_foo"
        );
        Ok(())
    }

    #[test]
    fn test_static_cte_must_not_read_dynamic_cte() -> Result<()> {
        let foo = TabFoo::new();
        let a = cte("a").as_(select(foo.id())?.from(&foo))?;
        let b = cte("b").as_(select(a.column("id")?)?.from(&a))?;
        let err = with((dynamic(false, a.clone()), b.clone())).unwrap_err();
        assert_eq!(
            err.failure(),
            Some(&Failure::CteDynamicDependency {
                cte: "b".to_string(),
                dynamic: vec!["a".to_string()]
            })
        );
        assert_eq!(err.clause(), Some("with"));

        assert!(with((dynamic(true, a.clone()), dynamic(true, b.clone()))).is_ok());
        assert!(with((a, dynamic(false, b))).is_ok());
        Ok(())
    }

    #[test]
    fn test_inactive_recursive_arm() -> Result<()> {
        let x = cte("x").as_(select(value(0).as_("n")))?;
        let x_ref = x.reference();
        let n = x_ref.column("n")?;
        let arm = select(n.clone().add(1)?.as_("n"))?
            .from(&x_ref)?
            .where_(n.lt(10))?;

        let inactive = x.clone().union_all(dynamic(false, arm.clone()))?;
        assert!(!inactive.is_recursive());
        assert_eq!(inactive.active_arms(), 0);
        let statement = with(inactive.clone())?
            .select(inactive.column("n")?)?
            .from(&inactive)?;
        assert_eq!(
            statement.to_sql()?,
            "WITH x AS (SELECT 0 AS n) SELECT x.n FROM x"
        );

        let active = x.union_all(dynamic(true, arm))?;
        assert!(active.is_recursive());
        Ok(())
    }
}
