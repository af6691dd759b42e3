//! Sample schema shared by the unit tests

use crate::error::Result;
use crate::schema::{Column, ColumnSpec, HasColumns, Table};
use crate::table_ref::{IntoTableRef, TableRef};
use crate::value_type::DataType;

pub(crate) struct TabFoo(Table);

impl TabFoo {
    pub fn new() -> Self {
        TabFoo(Table::new(
            "tab_foo",
            [
                ColumnSpec::new("id", DataType::Integral).with_default(),
                ColumnSpec::new("text_nn_d", DataType::Text).with_default(),
                ColumnSpec::new("int_n", DataType::Integral).nullable(),
                ColumnSpec::new("double_n", DataType::FloatingPoint).nullable(),
                ColumnSpec::new("u_int_n", DataType::UnsignedIntegral).nullable(),
                ColumnSpec::new("bool_n", DataType::Boolean).nullable(),
                ColumnSpec::new("blob_n", DataType::Blob).nullable(),
            ],
        ))
    }

    pub fn table(&self) -> &Table {
        &self.0
    }

    pub fn as_(&self, alias: &str) -> TabFoo {
        TabFoo(self.0.as_(alias))
    }

    fn col(&self, name: &str) -> Column {
        self.0.column(name).unwrap()
    }

    pub fn id(&self) -> Column {
        self.col("id")
    }

    pub fn text_nn_d(&self) -> Column {
        self.col("text_nn_d")
    }

    pub fn int_n(&self) -> Column {
        self.col("int_n")
    }

    pub fn double_n(&self) -> Column {
        self.col("double_n")
    }

    pub fn u_int_n(&self) -> Column {
        self.col("u_int_n")
    }

    pub fn bool_n(&self) -> Column {
        self.col("bool_n")
    }

    pub fn blob_n(&self) -> Column {
        self.col("blob_n")
    }
}

pub(crate) struct TabBar(Table);

impl TabBar {
    pub fn new() -> Self {
        TabBar(Table::new(
            "tab_bar",
            [
                ColumnSpec::new("id", DataType::Integral).with_default(),
                ColumnSpec::new("text_n", DataType::Text).nullable(),
                ColumnSpec::new("bool_nn", DataType::Boolean),
                ColumnSpec::new("int_n", DataType::Integral).nullable(),
                ColumnSpec::new("computed", DataType::Integral)
                    .with_default()
                    .read_only(),
            ],
        ))
    }

    pub fn table(&self) -> &Table {
        &self.0
    }

    pub fn as_(&self, alias: &str) -> TabBar {
        TabBar(self.0.as_(alias))
    }

    fn col(&self, name: &str) -> Column {
        self.0.column(name).unwrap()
    }

    pub fn id(&self) -> Column {
        self.col("id")
    }

    pub fn text_n(&self) -> Column {
        self.col("text_n")
    }

    pub fn bool_nn(&self) -> Column {
        self.col("bool_nn")
    }

    pub fn int_n(&self) -> Column {
        self.col("int_n")
    }

    pub fn computed(&self) -> Column {
        self.col("computed")
    }
}

impl IntoTableRef for &TabFoo {
    fn into_table_ref(self) -> Result<TableRef> {
        Ok(TableRef::Table(self.0.clone()))
    }
}

impl IntoTableRef for &TabBar {
    fn into_table_ref(self) -> Result<TableRef> {
        Ok(TableRef::Table(self.0.clone()))
    }
}

impl HasColumns for TabFoo {
    fn all_columns(&self) -> Vec<Column> {
        self.0.all_columns()
    }
}
