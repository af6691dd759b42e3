//! Dialect hooks for literal formats, quoting and placeholders

use crate::error::{Error, Result};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

/// The SQL flavour a statement is rendered for.
///
/// Every hook has a default implementation producing the generic output, so
/// a dialect only overrides what differs.
pub trait Dialect: Send + Sync + Debug {
    fn kind(&self) -> DialectKind;

    /// Identifiers are emitted bare unless they need quoting
    fn quote_identifier(&self, identifier: &str) -> String {
        if needs_quoting(identifier) {
            format!("\"{}\"", identifier.replace('"', "\"\""))
        } else {
            identifier.to_string()
        }
    }

    fn boolean_literal(&self, value: bool) -> String {
        if value { "1" } else { "0" }.to_string()
    }

    fn integer_literal(&self, value: i64) -> Result<String> {
        Ok(value.to_string())
    }

    fn unsigned_literal(&self, value: u64) -> Result<String> {
        Ok(value.to_string())
    }

    fn float_literal(&self, value: f64) -> Result<String> {
        if value.is_nan() {
            return Err(Error::sql_generation(
                "Serialization of NaN is not supported by this connector",
            ));
        }
        if value.is_infinite() {
            return Err(Error::sql_generation(
                "Serialization of Infinity is not supported by this connector",
            ));
        }
        Ok(format!("{:?}", value))
    }

    fn text_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    fn blob_literal(&self, value: &[u8]) -> String {
        let hex: String = value.iter().map(|byte| format!("{:02X}", byte)).collect();
        format!("x'{}'", hex)
    }

    fn date_literal(&self, value: NaiveDate) -> String {
        format!("DATE '{}'", value.format("%Y-%m-%d"))
    }

    fn time_literal(&self, value: NaiveTime) -> String {
        format!("'{}'", value.format("%H:%M:%S%.f"))
    }

    fn timestamp_literal(&self, value: NaiveDateTime) -> String {
        format!("TIMESTAMP '{}'", value.format("%Y-%m-%dT%H:%M:%S%.f"))
    }

    /// Placeholder for the parameter at `index`, counting from 1
    fn parameter_placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Text concatenation of two rendered operands
    fn concat(&self, lhs: &str, rhs: &str) -> String {
        format!("CONCAT({}, {})", lhs, rhs)
    }

    fn union_keyword(&self, distinct: bool) -> &'static str {
        if distinct {
            "UNION DISTINCT"
        } else {
            "UNION ALL"
        }
    }

    fn literal(&self, value: &Value) -> Result<String> {
        match value {
            Value::Null => Ok("NULL".to_string()),
            Value::Bool(b) => Ok(self.boolean_literal(*b)),
            Value::Int(i) => self.integer_literal(*i),
            Value::UInt(u) => self.unsigned_literal(*u),
            Value::Float(f) => self.float_literal(*f),
            Value::Text(s) => Ok(self.text_literal(s)),
            Value::Blob(b) => Ok(self.blob_literal(b)),
            Value::Date(d) => Ok(self.date_literal(*d)),
            Value::Time(t) => Ok(self.time_literal(*t)),
            Value::Timestamp(ts) => Ok(self.timestamp_literal(*ts)),
        }
    }
}

/// Keywords that no supported engine accepts as a bare identifier, sorted
const RESERVED_WORDS: &[&str] = &[
    "ALL", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST", "CHECK", "COLUMN",
    "CONSTRAINT", "CREATE", "CROSS", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP",
    "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END", "EXCEPT", "EXISTS",
    "FALSE", "FETCH", "FOR", "FOREIGN", "FROM", "FULL", "GRANT", "GROUP", "HAVING", "IN",
    "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "LEFT", "LIKE", "LIMIT", "NATURAL",
    "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER", "PRIMARY", "REFERENCES",
    "RETURNING", "RIGHT", "SELECT", "SET", "TABLE", "THEN", "TO", "TRUE", "UNION", "UNIQUE",
    "UPDATE", "USER", "USING", "VALUES", "WHEN", "WHERE", "WITH",
];

fn is_reserved_word(identifier: &str) -> bool {
    RESERVED_WORDS
        .binary_search(&identifier.to_ascii_uppercase().as_str())
        .is_ok()
}

fn needs_quoting(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    match chars.next() {
        None => true,
        Some(first) if !(first.is_ascii_alphabetic() || first == '_') => true,
        Some(_) => {
            !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') || is_reserved_word(identifier)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDialect;

impl Dialect for DefaultDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Default
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn boolean_literal(&self, value: bool) -> String {
        if value { "true" } else { "false" }.to_string()
    }

    fn float_literal(&self, value: f64) -> Result<String> {
        if value.is_nan() {
            Ok("'NaN'".to_string())
        } else if value.is_infinite() {
            Ok(if value > 0.0 { "'Infinity'" } else { "'-Infinity'" }.to_string())
        } else {
            Ok(format!("{:?}", value))
        }
    }

    fn blob_literal(&self, value: &[u8]) -> String {
        let hex: String = value.iter().map(|byte| format!("{:02x}", byte)).collect();
        format!("'\\x{}'", hex)
    }

    fn parameter_placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        if needs_quoting(identifier) {
            format!("`{}`", identifier.replace('`', "``"))
        } else {
            identifier.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    /// SQLite integers are signed 64 bit
    fn unsigned_literal(&self, value: u64) -> Result<String> {
        if value > i64::MAX as u64 {
            return Err(Error::sql_generation(format!(
                "unsigned value {} exceeds the integer range of this connector",
                value
            )));
        }
        Ok(value.to_string())
    }

    fn float_literal(&self, value: f64) -> Result<String> {
        if value.is_nan() {
            Ok("'NaN'".to_string())
        } else if value.is_infinite() {
            Ok(if value > 0.0 { "'Inf'" } else { "'-Inf'" }.to_string())
        } else {
            Ok(format!("{:?}", value))
        }
    }

    fn date_literal(&self, value: NaiveDate) -> String {
        format!("DATE('{}')", value.format("%Y-%m-%d"))
    }

    fn timestamp_literal(&self, value: NaiveDateTime) -> String {
        format!(
            "STRFTIME('%Y-%m-%d %H:%M:%f', '{}')",
            value.format("%Y-%m-%d %H:%M:%S%.f")
        )
    }

    fn concat(&self, lhs: &str, rhs: &str) -> String {
        format!("{} || {}", lhs, rhs)
    }

    fn union_keyword(&self, distinct: bool) -> &'static str {
        if distinct {
            "UNION"
        } else {
            "UNION ALL"
        }
    }
}

/// Dialect selection for configuration files and command lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Default,
    Postgres,
    MySql,
    Sqlite,
}

impl DialectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectKind::Default => "default",
            DialectKind::Postgres => "postgres",
            DialectKind::MySql => "mysql",
            DialectKind::Sqlite => "sqlite",
        }
    }

    pub fn dialect(&self) -> Box<dyn Dialect> {
        match self {
            DialectKind::Default => Box::new(DefaultDialect),
            DialectKind::Postgres => Box::new(PostgresDialect),
            DialectKind::MySql => Box::new(MySqlDialect),
            DialectKind::Sqlite => Box::new(SqliteDialect),
        }
    }
}

impl Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "default" | "generic" => Ok(DialectKind::Default),
            "postgres" | "postgresql" => Ok(DialectKind::Postgres),
            "mysql" | "mariadb" => Ok(DialectKind::MySql),
            "sqlite" => Ok(DialectKind::Sqlite),
            other => Err(Error::invalid_query(format!("unknown dialect '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_literals() {
        let d = DefaultDialect;
        assert_eq!(d.literal(&Value::Bool(true)).unwrap(), "1");
        assert_eq!(d.literal(&Value::Int(-17)).unwrap(), "-17");
        assert_eq!(d.literal(&Value::Float(1.5)).unwrap(), "1.5");
        assert_eq!(d.literal(&Value::Float(10.0)).unwrap(), "10.0");
        assert_eq!(d.literal(&Value::from("it's")).unwrap(), "'it''s'");
        assert_eq!(d.literal(&Value::Blob(vec![0x0a, 0x1b])).unwrap(), "x'0A1B'");
        assert_eq!(d.literal(&Value::Null).unwrap(), "NULL");
    }

    #[test]
    fn test_date_and_time_literals() {
        let d = DefaultDialect;
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let time = NaiveTime::from_hms_milli_opt(13, 14, 15, 500).unwrap();
        assert_eq!(d.literal(&Value::Date(day)).unwrap(), "DATE '2024-02-29'");
        assert_eq!(d.literal(&Value::Time(time)).unwrap(), "'13:14:15.500'");
        assert_eq!(
            d.literal(&Value::Timestamp(day.and_time(time))).unwrap(),
            "TIMESTAMP '2024-02-29T13:14:15.500'"
        );
        assert_eq!(SqliteDialect.date_literal(day), "DATE('2024-02-29')");
        assert_eq!(
            SqliteDialect.timestamp_literal(day.and_time(time)),
            "STRFTIME('%Y-%m-%d %H:%M:%f', '2024-02-29 13:14:15.500')"
        );
    }

    #[test]
    fn test_nan_and_infinity() {
        let err = DefaultDialect.float_literal(f64::NAN).unwrap_err();
        assert_eq!(
            err.to_string(),
            "SQL generation error: Serialization of NaN is not supported by this connector"
        );
        assert!(MySqlDialect.float_literal(f64::INFINITY).is_err());
        assert_eq!(PostgresDialect.float_literal(f64::NAN).unwrap(), "'NaN'");
        assert_eq!(
            PostgresDialect.float_literal(f64::NEG_INFINITY).unwrap(),
            "'-Infinity'"
        );
        assert_eq!(SqliteDialect.float_literal(f64::INFINITY).unwrap(), "'Inf'");
    }

    #[test]
    fn test_postgres_overrides() {
        let pg = PostgresDialect;
        assert_eq!(pg.boolean_literal(false), "false");
        assert_eq!(pg.blob_literal(&[0x0a, 0x1b]), "'\\x0a1b'");
        assert_eq!(pg.parameter_placeholder(3), "$3");
    }

    #[test]
    fn test_sqlite_unsigned_range() {
        assert_eq!(SqliteDialect.unsigned_literal(7).unwrap(), "7");
        assert!(SqliteDialect.unsigned_literal(u64::MAX).is_err());
        assert_eq!(DefaultDialect.unsigned_literal(u64::MAX).unwrap(), u64::MAX.to_string());
    }

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(DefaultDialect.quote_identifier("tab_foo"), "tab_foo");
        assert_eq!(DefaultDialect.quote_identifier("my table"), "\"my table\"");
        assert_eq!(MySqlDialect.quote_identifier("1st"), "`1st`");
    }

    #[test]
    fn test_reserved_words_are_quoted() {
        let mut sorted = RESERVED_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED_WORDS);

        assert_eq!(DefaultDialect.quote_identifier("order"), "\"order\"");
        assert_eq!(DefaultDialect.quote_identifier("Select"), "\"Select\"");
        assert_eq!(PostgresDialect.quote_identifier("user"), "\"user\"");
        assert_eq!(MySqlDialect.quote_identifier("group"), "`group`");
        assert_eq!(DefaultDialect.quote_identifier("orders"), "orders");
        assert_eq!(DefaultDialect.quote_identifier("count"), "count");
    }

    #[test]
    fn test_concat_and_union_keywords() {
        assert_eq!(DefaultDialect.concat("'a'", "'b'"), "CONCAT('a', 'b')");
        assert_eq!(SqliteDialect.concat("'a'", "'b'"), "'a' || 'b'");
        assert_eq!(DefaultDialect.union_keyword(true), "UNION DISTINCT");
        assert_eq!(SqliteDialect.union_keyword(true), "UNION");
    }

    #[test]
    fn test_dialect_kind_config() {
        assert_eq!("PostgreSQL".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!(DialectKind::MySql.to_string(), "mysql");
        assert!("oracle".parse::<DialectKind>().is_err());
        let kind: DialectKind = serde_json::from_str("\"sqlite\"").unwrap();
        assert_eq!(kind.dialect().kind(), DialectKind::Sqlite);
        assert_eq!(serde_json::to_string(&DialectKind::MySql).unwrap(), "\"mysql\"");
    }
}
