//! SQLweave Core - schema-checked SQL statement building
//!
//! Statements are assembled from tables and columns declared at runtime.
//! Every builder call checks value types and clause consistency as it goes,
//! and finished statements serialize to the SQL of a chosen dialect.
//!
//! ```
//! use sqlweave_core::{select, ColumnSpec, DataType, ExpressionOps, Statement, Table};
//!
//! let users = Table::new(
//!     "users",
//!     [
//!         ColumnSpec::new("id", DataType::Integral),
//!         ColumnSpec::new("name", DataType::Text).nullable(),
//!     ],
//! );
//! let statement = select((users.column("id")?, users.column("name")?))?
//!     .from(&users)?
//!     .where_(users.column("id")?.gt(10))?;
//! assert_eq!(
//!     statement.to_sql()?,
//!     "SELECT users.id, users.name FROM users WHERE users.id > 10"
//! );
//! # Ok::<(), sqlweave_core::Error>(())
//! ```

pub mod check;
pub mod clause;
pub mod cte;
pub mod dynamic;
pub mod error;
pub mod executor;
pub mod expr;
pub mod operator;
pub mod schema;
pub mod serialize;
pub mod statement;
pub mod table_ref;
pub mod type_set;
pub mod value;
pub mod value_type;

#[cfg(test)]
mod fixtures;

// Re-export main types
pub use cte::{cte, Cte, CteName, CteRef};
pub use dynamic::{dynamic, Dynamic, Element, IntoElement, IntoElementList};
pub use error::{Error, Failure, Result};
pub use executor::{ConnectionPool, Executable, Prepared};
pub use expr::{
    avg, avg_distinct, case_when, count, count_all, count_distinct, declare_group_by_column,
    exists, max, min, nodes_of, not, null, parameter, sum, sum_distinct, value, Expr,
    ExpressionOps, IntoExpr, ParameterSpec, SortDirection,
};
pub use operator::{op, Operator};
pub use schema::{all_of, Column, ColumnSpec, HasColumns, ResultField, Table};
pub use serialize::{
    DefaultDialect, Dialect, DialectKind, MySqlDialect, PostgresDialect, SerializedStatement,
    SqliteDialect,
};
pub use statement::{
    delete_from, insert_into, select, update, with, Delete, Insert, Select, Statement, SubSelect,
    Update, With,
};
pub use table_ref::{IntoTableRef, JoinType, Joinable, TableRef};
pub use value::Value;
pub use value_type::{value_type_of, values_are_comparable, DataType, ValueType};
