//! Statement execution and connection pool interface
//!
//! Statements execute against a [`ConnectionPool`] after passing the prepare
//! check. Statements without parameters run directly through [`Executable`];
//! statements with parameters go through [`Prepared`], which binds values by
//! position.

use crate::error::{Error, Result};
use crate::expr::ParameterSpec;
use crate::serialize::{Dialect, DialectKind};
use crate::statement::Statement;
use crate::value::Value;
use crate::value_type::{values_are_comparable, HasValueType};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use tracing::debug;

/// Trait for database connection pools
pub trait ConnectionPool: Send + Sync + Clone {
    /// The connection type for this pool
    type Connection;

    /// Dialect statements are serialized with for this pool
    fn dialect(&self) -> &dyn Dialect;

    /// Acquire a connection from the pool
    fn acquire(&self) -> impl Future<Output = Result<Self::Connection>> + Send;

    /// Execute a statement that returns no rows
    fn execute(&self, sql: &str, params: &[Value]) -> impl Future<Output = Result<u64>> + Send;

    fn fetch_all<T>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        T: DeserializeOwned + Send + Unpin;

    fn fetch_one<T>(&self, sql: &str, params: &[Value]) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send + Unpin;

    fn fetch_optional<T>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Option<T>>> + Send
    where
        T: DeserializeOwned + Send + Unpin;
}

/// Execution of finished statements
pub trait Executable: Statement + Sized {
    /// Run the statement and return the number of affected rows
    fn execute<P>(self, pool: &P) -> impl Future<Output = Result<u64>> + Send
    where
        P: ConnectionPool;

    fn fetch_all<T, P>(self, pool: &P) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        T: DeserializeOwned + Send + Unpin,
        P: ConnectionPool;

    fn fetch_one<T, P>(self, pool: &P) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send + Unpin,
        P: ConnectionPool;

    fn fetch_optional<T, P>(self, pool: &P) -> impl Future<Output = Result<Option<T>>> + Send
    where
        T: DeserializeOwned + Send + Unpin,
        P: ConnectionPool;

    /// Check and serialize the statement once for repeated execution
    fn prepare(&self, dialect: &dyn Dialect) -> Result<Prepared>;
}

impl<S> Executable for S
where
    S: Statement + Send + Sync,
{
    async fn execute<P>(self, pool: &P) -> Result<u64>
    where
        P: ConnectionPool,
    {
        let sql = direct_sql(&self, pool.dialect())?;
        pool.execute(&sql, &[]).await
    }

    async fn fetch_all<T, P>(self, pool: &P) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin,
        P: ConnectionPool,
    {
        let sql = direct_sql(&self, pool.dialect())?;
        pool.fetch_all(&sql, &[]).await
    }

    async fn fetch_one<T, P>(self, pool: &P) -> Result<T>
    where
        T: DeserializeOwned + Send + Unpin,
        P: ConnectionPool,
    {
        let sql = direct_sql(&self, pool.dialect())?;
        pool.fetch_one(&sql, &[]).await
    }

    async fn fetch_optional<T, P>(self, pool: &P) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin,
        P: ConnectionPool,
    {
        let sql = direct_sql(&self, pool.dialect())?;
        pool.fetch_optional(&sql, &[]).await
    }

    fn prepare(&self, dialect: &dyn Dialect) -> Result<Prepared> {
        self.check_prepare()?;
        let serialized = self.serialize(dialect)?;
        debug!(
            statement = self.kind(),
            dialect = %dialect.kind(),
            parameters = serialized.parameters.len(),
            "prepared statement"
        );
        Ok(Prepared {
            statement: self.kind(),
            dialect: dialect.kind(),
            sql: serialized.sql,
            parameters: serialized.parameters,
        })
    }
}

/// SQL of a statement executed without bound values
fn direct_sql<S: Statement + ?Sized>(statement: &S, dialect: &dyn Dialect) -> Result<String> {
    statement.check_prepare()?;
    let serialized = statement.serialize(dialect)?;
    if !serialized.parameters.is_empty() {
        return Err(Error::invalid_query(format!(
            "{} statement has {} parameters; prepare it and bind values",
            statement.kind(),
            serialized.parameters.len()
        )));
    }
    debug!(
        statement = statement.kind(),
        dialect = %dialect.kind(),
        sql = %serialized.sql,
        "executing statement"
    );
    Ok(serialized.sql)
}

/// A checked and serialized statement with positional parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prepared {
    statement: &'static str,
    dialect: DialectKind,
    sql: String,
    parameters: Vec<ParameterSpec>,
}

impl Prepared {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn dialect(&self) -> DialectKind {
        self.dialect
    }

    /// Check `values` against the parameters, position by position
    ///
    /// Each value must be comparable with its parameter's type, and NULL
    /// only binds to optional parameters.
    pub fn check_values(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.parameters.len() {
            return Err(Error::invalid_query(format!(
                "expected {} parameters, got {}",
                self.parameters.len(),
                values.len()
            )));
        }
        for (parameter, value) in self.parameters.iter().zip(values) {
            let bindable = if value.is_null() {
                parameter.value_type.is_optional()
            } else {
                values_are_comparable(parameter.value_type, value.value_type())
            };
            if !bindable {
                return Err(Error::invalid_query(format!(
                    "parameter {} of type {} cannot bind {}",
                    parameter.name,
                    parameter.value_type,
                    value.value_type()
                )));
            }
        }
        Ok(())
    }

    fn bind<P: ConnectionPool>(&self, pool: &P, values: &[Value]) -> Result<()> {
        let pool_dialect = pool.dialect().kind();
        if pool_dialect != self.dialect {
            return Err(Error::invalid_query(format!(
                "statement prepared for {} cannot run on a {} pool",
                self.dialect, pool_dialect
            )));
        }
        self.check_values(values)?;
        debug!(
            statement = self.statement,
            dialect = %self.dialect,
            sql = %self.sql,
            "executing prepared statement"
        );
        Ok(())
    }

    pub async fn execute<P: ConnectionPool>(&self, pool: &P, values: &[Value]) -> Result<u64> {
        self.bind(pool, values)?;
        pool.execute(&self.sql, values).await
    }

    pub async fn fetch_all<T, P>(&self, pool: &P, values: &[Value]) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin,
        P: ConnectionPool,
    {
        self.bind(pool, values)?;
        pool.fetch_all(&self.sql, values).await
    }

    pub async fn fetch_one<T, P>(&self, pool: &P, values: &[Value]) -> Result<T>
    where
        T: DeserializeOwned + Send + Unpin,
        P: ConnectionPool,
    {
        self.bind(pool, values)?;
        pool.fetch_one(&self.sql, values).await
    }

    pub async fn fetch_optional<T, P>(&self, pool: &P, values: &[Value]) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin,
        P: ConnectionPool,
    {
        self.bind(pool, values)?;
        pool.fetch_optional(&self.sql, values).await
    }
}

#[cfg(feature = "postgres")]
pub mod postgres {
    use super::*;
    use crate::serialize::PostgresDialect;
    use futures::TryStreamExt;
    use sqlx::postgres::{PgArguments, PgRow};
    use sqlx::query::Query;
    use sqlx::{Column, PgPool, Postgres, Row, TypeInfo};

    /// PostgreSQL connection pool wrapper
    #[derive(Clone)]
    pub struct PostgresPool {
        inner: PgPool,
    }

    impl PostgresPool {
        /// Create a new PostgreSQL pool from a connection string
        pub async fn new(database_url: &str) -> Result<Self> {
            let pool = PgPool::connect(database_url).await?;
            Ok(Self { inner: pool })
        }

        pub fn from_pool(pool: PgPool) -> Self {
            Self { inner: pool }
        }
    }

    impl ConnectionPool for PostgresPool {
        type Connection = sqlx::pool::PoolConnection<Postgres>;

        fn dialect(&self) -> &dyn Dialect {
            &PostgresDialect
        }

        async fn acquire(&self) -> Result<Self::Connection> {
            Ok(self.inner.acquire().await?)
        }

        async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
            let query = bind_values_to_query(sqlx::query(sql), params)?;
            let result = query.execute(&self.inner).await?;
            Ok(result.rows_affected())
        }

        async fn fetch_all<T>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            let query = bind_values_to_query(sqlx::query(sql), params)?;
            query
                .fetch(&self.inner)
                .map_err(Error::from)
                .and_then(|row| async move { decode_row(&row) })
                .try_collect()
                .await
        }

        async fn fetch_one<T>(&self, sql: &str, params: &[Value]) -> Result<T>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            let query = bind_values_to_query(sqlx::query(sql), params)?;
            let row = query.fetch_one(&self.inner).await?;
            decode_row(&row)
        }

        async fn fetch_optional<T>(&self, sql: &str, params: &[Value]) -> Result<Option<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            let query = bind_values_to_query(sqlx::query(sql), params)?;
            match query.fetch_optional(&self.inner).await? {
                Some(row) => decode_row(&row).map(Some),
                None => Ok(None),
            }
        }
    }

    /// Bind values to `$n` placeholders in order
    fn bind_values_to_query<'q>(
        mut query: Query<'q, Postgres, PgArguments>,
        params: &'q [Value],
    ) -> Result<Query<'q, Postgres, PgArguments>> {
        for param in params {
            query = match param {
                Value::Null => query.bind(None::<i32>),
                Value::Bool(b) => query.bind(*b),
                Value::Int(i) => query.bind(*i),
                Value::UInt(u) => {
                    let signed = i64::try_from(*u).map_err(|_| {
                        Error::sql_generation(format!("unsigned value {} exceeds BIGINT", u))
                    })?;
                    query.bind(signed)
                }
                Value::Float(f) => query.bind(*f),
                Value::Text(s) => query.bind(s.as_str()),
                Value::Blob(b) => query.bind(b.as_slice()),
                Value::Date(d) => query.bind(*d),
                Value::Time(t) => query.bind(*t),
                Value::Timestamp(ts) => query.bind(*ts),
            };
        }
        Ok(query)
    }

    fn decode_row<T: DeserializeOwned>(row: &PgRow) -> Result<T> {
        Ok(serde_json::from_value(row_to_json_value(row)?)?)
    }

    /// Row as a JSON object keyed by column name
    fn row_to_json_value(row: &PgRow) -> Result<serde_json::Value> {
        let mut object = serde_json::Map::with_capacity(row.columns().len());
        for column in row.columns() {
            let index = column.ordinal();
            let value = match column.type_info().name() {
                "BOOL" => json(row.try_get::<Option<bool>, _>(index)?),
                "INT2" => json(row.try_get::<Option<i16>, _>(index)?),
                "INT4" => json(row.try_get::<Option<i32>, _>(index)?),
                "INT8" => json(row.try_get::<Option<i64>, _>(index)?),
                "FLOAT4" => json(row.try_get::<Option<f32>, _>(index)?),
                "FLOAT8" => json(row.try_get::<Option<f64>, _>(index)?),
                "BYTEA" => json(row.try_get::<Option<Vec<u8>>, _>(index)?),
                "DATE" => json(row.try_get::<Option<chrono::NaiveDate>, _>(index)?),
                "TIME" => json(row.try_get::<Option<chrono::NaiveTime>, _>(index)?),
                "TIMESTAMP" => json(row.try_get::<Option<chrono::NaiveDateTime>, _>(index)?),
                _ => json(row.try_get::<Option<String>, _>(index)?),
            };
            object.insert(column.name().to_string(), value);
        }
        Ok(serde_json::Value::Object(object))
    }

    fn json<T: Serialize>(value: Option<T>) -> serde_json::Value {
        value
            .and_then(|v| serde_json::to_value(v).ok())
            .unwrap_or(serde_json::Value::Null)
    }

    #[cfg(test)]
    mod postgres_tests {
        use super::*;

        #[test]
        fn test_unsigned_out_of_range() {
            let params = vec![Value::UInt(u64::MAX)];
            let bound = bind_values_to_query(sqlx::query("SELECT $1"), &params);
            assert!(matches!(bound, Err(Error::SqlGeneration { .. })));
        }

        #[test]
        fn test_bind_all_value_kinds() {
            let date = chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
            let params = vec![
                Value::Null,
                Value::Bool(true),
                Value::Int(-3),
                Value::UInt(3),
                Value::Float(1.5),
                Value::Text("x".to_string()),
                Value::Blob(vec![1, 2]),
                Value::Date(date),
                Value::Timestamp(date.and_hms_opt(1, 2, 3).unwrap()),
            ];
            assert!(bind_values_to_query(sqlx::query("SELECT 1"), &params).is_ok());
        }
    }
}
