//! Error types for sqlweave
//!
//! Build-time problems are reported as a [`Failure`], a closed set of named
//! diagnostics, wrapped in [`Error::Check`] together with the clause or
//! builder call that produced it.

use crate::value_type::ValueType;
use thiserror::Error;

/// The main error type for sqlweave operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection or execution error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A statement or expression failed one of the build-time checks
    #[error("Check failed in {clause}: {failure}")]
    Check {
        clause: &'static str,
        failure: Failure,
    },

    /// A value could not be rendered for the target dialect
    #[error("SQL generation error: {message}")]
    SqlGeneration { message: String },

    /// The statement cannot be used the way it was requested
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Column not found error
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },
}

/// Convenience Result type for sqlweave operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new check error for the given clause
    pub fn check(clause: &'static str, failure: Failure) -> Self {
        Self::Check { clause, failure }
    }

    /// Create a new SQL generation error
    pub fn sql_generation(message: impl Into<String>) -> Self {
        Self::SqlGeneration {
            message: message.into(),
        }
    }

    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create a new column not found error
    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    /// The named failure, if this is a check error
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Error::Check { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// The clause or builder call a check error is attributed to
    pub fn clause(&self) -> Option<&'static str> {
        match self {
            Error::Check { clause, .. } => Some(clause),
            _ => None,
        }
    }
}

/// Named build-time failures.
///
/// Only the first failure of a statement is ever reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    // Structural
    #[error("operator {operator} cannot be applied to {left} and {right}")]
    OperandTypes {
        operator: &'static str,
        left: ValueType,
        right: ValueType,
    },

    #[error("{operator} cannot be applied to {operand}")]
    OperandType {
        operator: &'static str,
        operand: ValueType,
    },

    #[error("{operator} must not be negative, found {value}")]
    NegativeCount { operator: &'static str, value: i64 },

    #[error("unknown operator '{symbol}'")]
    UnknownOperator { symbol: String },

    #[error("expression must be boolean, found {found}")]
    NotBoolean { found: ValueType },

    #[error("each column must have a name")]
    MissingName,

    #[error("at least one argument required")]
    NoArguments,

    #[error("at least one duplicate argument detected")]
    DuplicateArguments,

    #[error("arguments must be columns or declared group_by columns")]
    NotAGroupByColumn,

    #[error("argument must not contain aggregate functions")]
    AggregateNotAllowed,

    #[error("aggregate functions must not be nested")]
    NestedAggregates,

    #[error("over() requires an aggregate function")]
    OverRequiresAggregate,

    #[error("a sub-select used as a value must select exactly one column")]
    ScalarSubquery,

    #[error("{clause} cannot follow {after}")]
    ClauseOrder {
        clause: &'static str,
        after: &'static str,
    },

    // Referential
    #[error("at least one expression requires a table which is otherwise not known in the statement: {}", .tables.join(", "))]
    UnknownTables { tables: Vec<String> },

    #[error("at least one expression statically requires a table which is only known dynamically in the statement: {}", .tables.join(", "))]
    UnknownStaticTables { tables: Vec<String> },

    #[error("at least one common table expression is not defined in the statement: {}", .ctes.join(", "))]
    UnknownCtes { ctes: Vec<String> },

    #[error("at least one expression statically requires a common table expression which is only defined dynamically: {}", .ctes.join(", "))]
    UnknownStaticCtes { ctes: Vec<String> },

    #[error("duplicate table names detected: {}", .tables.join(", "))]
    DuplicateTableNames { tables: Vec<String> },

    #[error("table dependencies detected in join: {}", .tables.join(", "))]
    JoinTableDependencies { tables: Vec<String> },

    #[error("on() condition of a join must only use tables provided in that join")]
    JoinConditionTables,

    #[error("on() condition of a static join must not use tables provided only dynamically in that join")]
    JoinConditionDynamicTables,

    #[error("column {column} does not belong to table {table}")]
    ForeignColumn { column: String, table: String },

    // Aggregates
    #[error("selected columns must not mix aggregates and non-aggregates")]
    MixedAggregates,

    #[error("expressions must be aggregates of the group_by columns")]
    NotAggregate,

    #[error("statically added expressions must be aggregates of the static group_by columns")]
    NotStaticAggregate,

    #[error("order_by() must not contain aggregate functions without group_by()")]
    OrderByAggregates,

    // Cardinality
    #[error("at least one duplicate column detected in set()")]
    DuplicateColumns,

    #[error("set() contains assignments for columns from more than one table")]
    MultipleTables,

    #[error("column {column} cannot be assigned")]
    ReadOnlyColumn { column: String },

    #[error("cannot assign {value} to column {column} of type {column_type}")]
    AssignmentTypes {
        column: String,
        column_type: ValueType,
        value: ValueType,
    },

    #[error("values() row has {found} entries, expected {expected}")]
    RowWidth { expected: usize, found: usize },

    #[error("values() rows must not contain dynamic entries")]
    DynamicRowValue,

    #[error("duplicate common table expression names: {}", .ctes.join(", "))]
    DuplicateCtes { ctes: Vec<String> },

    #[error("common table expression {cte} depends on {} which is not defined before it", .missing.join(", "))]
    CteDependency { cte: String, missing: Vec<String> },

    #[error("static common table expression {cte} depends on dynamic {}", .dynamic.join(", "))]
    CteDynamicDependency { cte: String, dynamic: Vec<String> },

    // Completeness
    #[error("no columns selected")]
    NoColumnsSelected,

    #[error("where() or unconditionally() required")]
    WhereRequired,

    #[error("set() required")]
    AssignmentsRequired,

    #[error("set(), values() or default_values() required")]
    InsertValuesRequired,

    #[error("required columns are not assigned: {}", .columns.join(", "))]
    MissingRequiredColumns { columns: Vec<String> },

    #[error("on_conflict().do_update() requires at least one conflict target column")]
    ConflictTargetRequired,

    #[error("where() required for on_conflict().do_update()")]
    OnConflictWhereRequired,

    #[error("both arguments in a union must have the same result columns (type and name)")]
    UnionResultMismatch,

    #[error("common table expression must not self-reference in the first part; use union_all/union_distinct for recursion")]
    CteSelfReference,
}
