//! `WITH` common table expressions

use super::{rank, ClauseRules};
use crate::cte::Cte;
use crate::dynamic::{active_values, static_values, Element, IntoElement, IntoElementList};
use crate::error::{Error, Failure, Result};
use crate::serialize::{join, Context, ToSql};
use crate::type_set::{has_duplicates, TableSet};

impl IntoElement<Cte> for Cte {
    fn into_element(self) -> Result<Element<Cte>> {
        Ok(Element::Static(self))
    }
}

impl IntoElement<Cte> for Result<Cte> {
    fn into_element(self) -> Result<Element<Cte>> {
        Ok(Element::Static(self?))
    }
}

impl IntoElementList<Cte> for Cte {
    fn into_elements(self) -> Result<Vec<Element<Cte>>> {
        Ok(vec![Element::Static(self)])
    }
}

impl IntoElementList<Cte> for Result<Cte> {
    fn into_elements(self) -> Result<Vec<Element<Cte>>> {
        Ok(vec![Element::Static(self?)])
    }
}

/// `WITH [RECURSIVE] a AS (...), b AS (...)`
#[derive(Debug, Clone, PartialEq)]
pub struct WithClause {
    ctes: Vec<Element<Cte>>,
}

impl WithClause {
    /// Each CTE may only use CTEs defined before it, or itself when recursive.
    /// Static CTEs must not use dynamic ones.
    pub(crate) fn new(ctes: Vec<Element<Cte>>) -> Result<Self> {
        if ctes.is_empty() {
            return Err(Error::check("with", Failure::NoArguments));
        }
        let names: Vec<&str> = ctes.iter().map(|cte| cte.value().name()).collect();
        if has_duplicates(&names) {
            let duplicates = names
                .iter()
                .enumerate()
                .filter(|(index, name)| names[..*index].contains(*name))
                .map(|(_, name)| name.to_string())
                .collect::<TableSet>()
                .into_vec();
            return Err(Error::check("with", Failure::DuplicateCtes { ctes: duplicates }));
        }
        let mut defined = TableSet::new();
        let mut defined_dynamically = TableSet::new();
        for element in &ctes {
            let cte = element.value();
            let missing = cte.required_ctes().difference(&defined);
            let missing: Vec<String> = missing
                .into_iter()
                .filter(|name| names.contains(&name.as_str()))
                .collect();
            if !missing.is_empty() {
                return Err(Error::check(
                    "with",
                    Failure::CteDependency {
                        cte: cte.name().to_string(),
                        missing,
                    },
                ));
            }
            if element.is_static() {
                let dynamic = cte.required_ctes().intersect(&defined_dynamically);
                if !dynamic.is_empty() {
                    return Err(Error::check(
                        "with",
                        Failure::CteDynamicDependency {
                            cte: cte.name().to_string(),
                            dynamic: dynamic.into_vec(),
                        },
                    ));
                }
            } else {
                defined_dynamically.insert(cte.name().to_string());
            }
            defined.insert(cte.name().to_string());
        }
        Ok(Self { ctes })
    }
}

impl ClauseRules for WithClause {
    fn name(&self) -> &'static str {
        "with"
    }

    fn rank(&self) -> u8 {
        rank::WITH
    }

    fn required_tables(&self) -> TableSet {
        self.ctes
            .iter()
            .fold(TableSet::new(), |tables, cte| tables.union(&cte.value().unresolved_tables()))
    }

    fn provided_ctes(&self) -> TableSet {
        self.ctes
            .iter()
            .map(|cte| cte.value().name().to_string())
            .collect()
    }

    fn provided_static_ctes(&self) -> TableSet {
        static_values(&self.ctes)
            .map(|cte| cte.name().to_string())
            .collect()
    }

    /// CTEs used by the definitions but defined outside this clause
    fn required_ctes(&self) -> TableSet {
        let required = self
            .ctes
            .iter()
            .fold(TableSet::new(), |ctes, cte| ctes.union(&cte.value().required_ctes()));
        required.difference(&self.provided_ctes())
    }

    fn required_static_ctes(&self) -> TableSet {
        let required = static_values(&self.ctes)
            .fold(TableSet::new(), |ctes, cte| ctes.union(&cte.required_ctes()));
        required.difference(&self.provided_ctes())
    }
}

impl ToSql for WithClause {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let active: Vec<&Cte> = active_values(&self.ctes).collect();
        if active.is_empty() {
            return Ok(String::new());
        }
        let recursive = if active.iter().any(|cte| cte.is_recursive()) {
            "RECURSIVE "
        } else {
            ""
        };
        Ok(format!("WITH {}{} ", recursive, join(context, active, ", ")?))
    }
}
