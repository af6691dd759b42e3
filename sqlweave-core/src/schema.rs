//! Declared tables and their columns

use crate::error::{Error, Result};
use crate::serialize::{Context, ToSql};
use crate::value_type::{DataType, HasValueType, ValueType};
use serde::Serialize;
use std::sync::Arc;

/// Column declaration within a table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnSpec {
    name: Arc<str>,
    value_type: ValueType,
    has_default: bool,
    read_only: bool,
}

impl ColumnSpec {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: Arc::from(name),
            value_type: ValueType::of(data_type),
            has_default: false,
            read_only: false,
        }
    }

    /// A column of a derived table, typed after the expression it came from
    pub(crate) fn derived(name: &str, value_type: ValueType) -> Self {
        Self {
            name: Arc::from(name),
            value_type,
            has_default: false,
            read_only: true,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.value_type = self.value_type.force_optional();
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Generated columns cannot be targets of INSERT or UPDATE
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.value_type.data_type()
    }

    pub fn is_nullable(&self) -> bool {
        self.value_type.is_optional()
    }

    pub fn has_default(&self) -> bool {
        self.has_default
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// INSERT must assign this column explicitly
    pub fn is_required_for_insert(&self) -> bool {
        !self.is_nullable() && !self.has_default && !self.read_only
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }
}

/// A declared table, optionally aliased.
///
/// Cloning and aliasing share the column declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: Arc<str>,
    alias: Option<Arc<str>>,
    columns: Arc<[ColumnSpec]>,
}

impl Table {
    pub fn new(name: &str, columns: impl IntoIterator<Item = ColumnSpec>) -> Self {
        Self {
            name: Arc::from(name),
            alias: None,
            columns: columns.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name this table is known by inside a statement
    pub fn identity(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// The same table under another name
    pub fn as_(&self, alias: &str) -> Table {
        Table {
            name: Arc::clone(&self.name),
            alias: Some(Arc::from(alias)),
            columns: Arc::clone(&self.columns),
        }
    }

    pub fn column_specs(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Result<Column> {
        self.columns
            .iter()
            .find(|spec| spec.name() == name)
            .map(|spec| Column::new(self.identity(), spec.clone()))
            .ok_or_else(|| Error::column_not_found(self.identity(), name))
    }

    /// Columns that INSERT has to assign
    pub fn required_insert_columns(&self) -> Vec<Column> {
        self.columns
            .iter()
            .filter(|spec| spec.is_required_for_insert())
            .map(|spec| Column::new(self.identity(), spec.clone()))
            .collect()
    }
}

impl ToSql for Table {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        let name = context.quote(&self.name);
        Ok(match &self.alias {
            Some(alias) => format!("{} AS {}", name, context.quote(alias)),
            None => name,
        })
    }
}

/// A column bound to the table identity it is read from
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    qualifier: Arc<str>,
    spec: ColumnSpec,
}

impl Column {
    pub(crate) fn new(qualifier: &str, spec: ColumnSpec) -> Self {
        Self {
            qualifier: Arc::from(qualifier),
            spec,
        }
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Table name or alias the column is qualified with
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    pub fn spec(&self) -> &ColumnSpec {
        &self.spec
    }

    /// Render the column without its table qualifier, as in SET and INSERT lists
    pub(crate) fn unqualified_sql(&self, context: &Context<'_>) -> String {
        context.quote(self.name())
    }
}

impl HasValueType for Column {
    fn value_type(&self) -> ValueType {
        self.spec.value_type()
    }
}

impl ToSql for Column {
    fn to_sql_string(&self, context: &mut Context<'_>) -> Result<String> {
        Ok(format!(
            "{}.{}",
            context.quote(&self.qualifier),
            context.quote(self.name())
        ))
    }
}

/// Anything whose columns can be listed
pub trait HasColumns {
    fn all_columns(&self) -> Vec<Column>;
}

impl HasColumns for Table {
    fn all_columns(&self) -> Vec<Column> {
        self.columns
            .iter()
            .map(|spec| Column::new(self.identity(), spec.clone()))
            .collect()
    }
}

/// One column of a statement's result row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultField {
    pub name: String,
    pub value_type: ValueType,
}

impl ResultField {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// Columns of a derived table (sub-select or CTE) known as `identity`
pub(crate) fn derived_columns(identity: &str, fields: &[ResultField]) -> Vec<Column> {
    fields
        .iter()
        .map(|field| Column::new(identity, ColumnSpec::derived(&field.name, field.value_type)))
        .collect()
}

/// Look up one column of a derived table
pub(crate) fn derived_column(identity: &str, fields: &[ResultField], name: &str) -> Result<Column> {
    fields
        .iter()
        .find(|field| field.name == name)
        .map(|field| Column::new(identity, ColumnSpec::derived(&field.name, field.value_type)))
        .ok_or_else(|| Error::column_not_found(identity, name))
}

/// All columns of a table, CTE or sub-select, in declaration order
pub fn all_of(source: &impl HasColumns) -> Vec<Column> {
    source.all_columns()
}
