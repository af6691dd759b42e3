//! Semantic value types and the compatibility rules between them

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The semantic category of a value, without nullability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Boolean,
    Integral,
    UnsignedIntegral,
    FloatingPoint,
    /// Result of arithmetic over mixed numeric types
    Numeric,
    Text,
    Blob,
    DayPoint,
    TimeOfDay,
    TimePoint,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Integral => "integral",
            DataType::UnsignedIntegral => "unsigned_integral",
            DataType::FloatingPoint => "floating_point",
            DataType::Numeric => "numeric",
            DataType::Text => "text",
            DataType::Blob => "blob",
            DataType::DayPoint => "day_point",
            DataType::TimeOfDay => "time_of_day",
            DataType::TimePoint => "time_point",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Boolean
                | DataType::Integral
                | DataType::UnsignedIntegral
                | DataType::FloatingPoint
                | DataType::Numeric
        )
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value type of an expression node.
///
/// `Null` is the type of the bare `NULL` literal. It satisfies every type
/// predicate and is comparable with every value. `NoValue` is the bottom:
/// assignments, tables and absent clauses have it, and it is comparable with
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    NoValue,
    Null,
    Data { data_type: DataType, optional: bool },
}

impl ValueType {
    /// A non-nullable value of the given data type
    pub const fn of(data_type: DataType) -> Self {
        ValueType::Data {
            data_type,
            optional: false,
        }
    }

    /// A nullable value of the given data type
    pub const fn optional(data_type: DataType) -> Self {
        ValueType::Data {
            data_type,
            optional: true,
        }
    }

    pub fn data_type(&self) -> Option<DataType> {
        match self {
            ValueType::Data { data_type, .. } => Some(*data_type),
            _ => None,
        }
    }

    pub fn has_value(&self) -> bool {
        !matches!(self, ValueType::NoValue)
    }

    /// True for nullable types, including the null literal itself
    pub fn is_optional(&self) -> bool {
        match self {
            ValueType::Null => true,
            ValueType::Data { optional, .. } => *optional,
            ValueType::NoValue => false,
        }
    }

    pub fn remove_optional(self) -> Self {
        match self {
            ValueType::Data { data_type, .. } => ValueType::of(data_type),
            other => other,
        }
    }

    pub fn force_optional(self) -> Self {
        match self {
            ValueType::Data { data_type, .. } => ValueType::optional(data_type),
            other => other,
        }
    }

    /// Make the type optional if `nullable` holds
    pub fn optional_if(self, nullable: bool) -> Self {
        if nullable {
            self.force_optional()
        } else {
            self
        }
    }

    fn is(&self, expected: DataType) -> bool {
        match self {
            ValueType::Null => true,
            ValueType::Data { data_type, .. } => *data_type == expected,
            ValueType::NoValue => false,
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.is(DataType::Boolean)
    }

    pub fn is_integral(&self) -> bool {
        self.is(DataType::Integral)
    }

    pub fn is_unsigned_integral(&self) -> bool {
        self.is(DataType::UnsignedIntegral)
    }

    pub fn is_floating_point(&self) -> bool {
        self.is(DataType::FloatingPoint)
    }

    /// Boolean, integral, unsigned, floating point or generic numeric
    pub fn is_numeric(&self) -> bool {
        match self {
            ValueType::Null => true,
            ValueType::Data { data_type, .. } => data_type.is_numeric(),
            ValueType::NoValue => false,
        }
    }

    pub fn is_text(&self) -> bool {
        self.is(DataType::Text)
    }

    pub fn is_blob(&self) -> bool {
        self.is(DataType::Blob)
    }

    pub fn is_day_point(&self) -> bool {
        self.is(DataType::DayPoint)
    }

    pub fn is_time_point(&self) -> bool {
        self.is(DataType::TimePoint)
    }

    pub fn is_day_or_time_point(&self) -> bool {
        self.is_day_point() || self.is_time_point()
    }

    pub fn is_time_of_day(&self) -> bool {
        self.is(DataType::TimeOfDay)
    }
}

impl From<DataType> for ValueType {
    fn from(data_type: DataType) -> Self {
        ValueType::of(data_type)
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::NoValue => f.write_str("no value"),
            ValueType::Null => f.write_str("null"),
            ValueType::Data {
                data_type,
                optional: false,
            } => write!(f, "{}", data_type),
            ValueType::Data {
                data_type,
                optional: true,
            } => write!(f, "optional<{}>", data_type),
        }
    }
}

/// Anything that has a value type
pub trait HasValueType {
    fn value_type(&self) -> ValueType;
}

impl HasValueType for ValueType {
    fn value_type(&self) -> ValueType {
        *self
    }
}

/// The value type of a node
pub fn value_type_of(node: &impl HasValueType) -> ValueType {
    node.value_type()
}

pub fn remove_optional(value_type: ValueType) -> ValueType {
    value_type.remove_optional()
}

/// Whether two values may be compared, assigned to each other, or appear
/// in the same IN list or CASE result set.
pub fn values_are_comparable(lhs: ValueType, rhs: ValueType) -> bool {
    match (lhs, rhs) {
        (ValueType::NoValue, _) | (_, ValueType::NoValue) => false,
        (ValueType::Null, _) | (_, ValueType::Null) => true,
        (
            ValueType::Data { data_type: l, .. },
            ValueType::Data { data_type: r, .. },
        ) => {
            l == r
                || (l.is_numeric() && r.is_numeric())
                || (lhs.is_day_or_time_point() && rhs.is_day_or_time_point())
        }
    }
}

/// Result type of `+`, `-`, `*` and `%`: identical numeric operands keep
/// their type, anything else widens to generic numeric.
pub fn arithmetic_result(lhs: ValueType, rhs: ValueType) -> ValueType {
    let optional = lhs.is_optional() || rhs.is_optional();
    let data_type = match (lhs.data_type(), rhs.data_type()) {
        (Some(l), Some(r)) if l == r && l != DataType::Boolean => l,
        (Some(l), None) if l != DataType::Boolean => l,
        (None, Some(r)) if r != DataType::Boolean => r,
        _ => DataType::Numeric,
    };
    ValueType::of(data_type).optional_if(optional)
}

/// Result type of a comparison or logical operator
pub fn boolean_result(lhs: ValueType, rhs: ValueType) -> ValueType {
    ValueType::of(DataType::Boolean).optional_if(lhs.is_optional() || rhs.is_optional())
}
