//! `ORDER BY` sort orders

use super::{ctes_of, rank, static_ctes_of, static_tables_of, tables_of, ClauseRules};
use crate::check::{check_grouped, StatementContext};
use crate::dynamic::{active_values, Element, IntoElement, IntoElementList};
use crate::error::{Error, Failure, Result};
use crate::expr::{Expr, SortOrder};
use crate::serialize::{join, Context, ToSql};
use crate::type_set::{has_duplicates, TableSet};

impl IntoElement<SortOrder> for SortOrder {
    fn into_element(self) -> Result<Element<SortOrder>> {
        Ok(Element::Static(self))
    }
}

impl IntoElement<SortOrder> for Result<SortOrder> {
    fn into_element(self) -> Result<Element<SortOrder>> {
        Ok(Element::Static(self?))
    }
}

impl IntoElementList<SortOrder> for SortOrder {
    fn into_elements(self) -> Result<Vec<Element<SortOrder>>> {
        Ok(vec![Element::Static(self)])
    }
}

impl IntoElementList<SortOrder> for Result<SortOrder> {
    fn into_elements(self) -> Result<Vec<Element<SortOrder>>> {
        Ok(vec![Element::Static(self?)])
    }
}

/// `ORDER BY ...`
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    entries: Vec<Element<SortOrder>>,
}

impl OrderBy {
    pub(crate) fn new(entries: Vec<Element<SortOrder>>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::check("order_by", Failure::NoArguments));
        }
        let exprs: Vec<&Expr> = entries.iter().map(|entry| entry.value().expr()).collect();
        if has_duplicates(&exprs) {
            return Err(Error::check("order_by", Failure::DuplicateArguments));
        }
        Ok(Self { entries })
    }

    fn exprs(&self) -> impl Iterator<Item = &Expr> {
        self.entries.iter().map(|entry| entry.value().expr())
    }
}

impl ClauseRules for OrderBy {
    fn name(&self) -> &'static str {
        "order_by"
    }

    fn rank(&self) -> u8 {
        rank::ORDER_BY
    }

    fn required_tables(&self) -> TableSet {
        tables_of(self.exprs())
    }

    fn required_static_tables(&self) -> TableSet {
        static_tables_of(
            self.entries
                .iter()
                .filter(|entry| entry.is_static())
                .map(|entry| entry.value().expr()),
        )
    }

    fn required_ctes(&self) -> TableSet {
        ctes_of(self.exprs())
    }

    fn required_static_ctes(&self) -> TableSet {
        static_ctes_of(
            self.entries
                .iter()
                .filter(|entry| entry.is_static())
                .map(|entry| entry.value().expr()),
        )
    }

    fn check_consistency(&self, context: &StatementContext) -> Result<()> {
        if context.has_group_by {
            let entries = self
                .entries
                .iter()
                .map(|entry| (entry.value().expr(), entry.is_static()));
            return check_grouped("order_by", entries, context);
        }
        if self.exprs().any(Expr::contains_aggregate_function) {
            return Err(Error::check("order_by", Failure::OrderByAggregates));
        }
        Ok(())
    }
}

impl ToSql for OrderBy {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let active: Vec<&SortOrder> = active_values(&self.entries).collect();
        if active.is_empty() {
            return Ok(String::new());
        }
        Ok(format!(" ORDER BY {}", join(context, active, ", ")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::dynamic;
    use crate::expr::{count, ExpressionOps};
    use crate::fixtures::TabFoo;
    use crate::serialize::{render, DefaultDialect};

    fn order_by(list: impl IntoElementList<SortOrder>) -> Result<OrderBy> {
        OrderBy::new(list.into_elements()?)
    }

    #[test]
    fn test_order_by_sql() -> Result<()> {
        let foo = TabFoo::new();
        let clause = order_by((foo.id().asc(), dynamic(true, foo.int_n().desc())))?;
        assert_eq!(
            render(&DefaultDialect, &clause)?,
            " ORDER BY tab_foo.id ASC, tab_foo.int_n DESC"
        );
        let clause = order_by(dynamic(false, foo.int_n().desc()))?;
        assert_eq!(render(&DefaultDialect, &clause)?, "");
        Ok(())
    }

    #[test]
    fn test_duplicate_sort_expressions() {
        let foo = TabFoo::new();
        let err = order_by((foo.id().asc(), foo.id().desc())).unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::DuplicateArguments));
        assert_eq!(err.clause(), Some("order_by"));
    }

    #[test]
    fn test_aggregates_need_group_by() -> Result<()> {
        let foo = TabFoo::new();
        let clause = order_by(count(foo.id())?.desc())?;
        let err = clause.check_consistency(&StatementContext::default()).unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::OrderByAggregates));
        Ok(())
    }
}
