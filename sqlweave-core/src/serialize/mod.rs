//! Turning expression trees and statements into SQL text
//!
//! Every node implements [`ToSql`]. The [`Context`] carries the target
//! [`Dialect`] and collects the parameters in the order their placeholders
//! are emitted.

pub mod dialect;

pub use dialect::{DefaultDialect, Dialect, DialectKind, MySqlDialect, PostgresDialect, SqliteDialect};

use crate::error::Result;
use crate::expr::Parameter;
use serde::Serialize;

/// Serialization state for one statement
pub struct Context<'d> {
    dialect: &'d dyn Dialect,
    parameters: Vec<Parameter>,
}

impl<'d> Context<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            parameters: Vec::new(),
        }
    }

    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Register a parameter and return its placeholder text
    pub fn push_parameter(&mut self, parameter: &Parameter) -> String {
        self.parameters.push(parameter.clone());
        self.dialect.parameter_placeholder(self.parameters.len())
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn into_parameters(self) -> Vec<Parameter> {
        self.parameters
    }

    pub fn quote(&self, identifier: &str) -> String {
        self.dialect.quote_identifier(identifier)
    }
}

/// A node that can render itself as SQL
pub trait ToSql {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String>;
}

/// Render `node` with the given context
pub fn to_sql_string<T: ToSql + ?Sized>(context: &mut Context<'_>, node: &T) -> Result<String> {
    node.to_sql_string(context)
}

/// Render `node` on its own with `dialect`
pub fn render<T: ToSql + ?Sized>(dialect: &dyn Dialect, node: &T) -> Result<String> {
    let mut context = Context::new(dialect);
    node.to_sql_string(&mut context)
}

/// Render each item and join the fragments with `separator`
pub(crate) fn join<'a, T, I>(context: &mut Context<'_>, items: I, separator: &str) -> Result<String>
where
    T: ToSql + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut parts = Vec::new();
    for item in items {
        parts.push(item.to_sql_string(context)?);
    }
    Ok(parts.join(separator))
}

/// A fully serialized statement, ready to be handed to a connector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerializedStatement {
    pub sql: String,
    pub parameters: Vec<Parameter>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_type::{DataType, ValueType};

    #[test]
    fn test_parameters_are_numbered_per_dialect() {
        let id = Parameter::new("id", ValueType::of(DataType::Integral));
        let name = Parameter::new("name", ValueType::optional(DataType::Text));

        let mut context = Context::new(&DefaultDialect);
        assert_eq!(context.push_parameter(&id), "?");
        assert_eq!(context.push_parameter(&name), "?");
        assert_eq!(context.parameters().len(), 2);

        let mut context = Context::new(&PostgresDialect);
        assert_eq!(context.push_parameter(&id), "$1");
        assert_eq!(context.push_parameter(&name), "$2");
        assert_eq!(context.into_parameters(), vec![id, name]);
    }

    #[test]
    fn test_to_sql_string_collects_parameters() -> Result<()> {
        let mut context = Context::new(&PostgresDialect);
        let node = crate::expr::parameter("n", DataType::Integral);
        assert_eq!(to_sql_string(&mut context, &node)?, "$1");
        assert_eq!(to_sql_string(&mut context, &node)?, "$2");
        assert_eq!(context.parameters().len(), 2);
        Ok(())
    }

    #[test]
    fn test_serialized_statement_to_json() {
        let statement = SerializedStatement {
            sql: "SELECT 1".to_string(),
            parameters: vec![],
        };
        let json = serde_json::to_value(&statement).unwrap();
        assert_eq!(json, serde_json::json!({"sql": "SELECT 1", "parameters": []}));
    }
}
