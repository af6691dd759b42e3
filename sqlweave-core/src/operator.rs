//! SQL binary operators and their typing rules

use crate::error::{Error, Failure, Result};
use crate::value_type::{arithmetic_result, boolean_result, values_are_comparable, DataType, ValueType};
use std::fmt::{self, Display};

/// Operator families share a typing rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorFamily {
    Comparison,
    /// Comparisons that never yield NULL
    Distinction,
    Arithmetic,
    Division,
    /// Remainder of integral operands
    Modulus,
    Logical,
    Bitwise,
    Pattern,
}

/// Type-safe SQL operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operator {
    symbol: &'static str,
    family: OperatorFamily,
}

impl Operator {
    pub const EQ: Self = Operator::new("=", OperatorFamily::Comparison);
    pub const NEQ: Self = Operator::new("<>", OperatorFamily::Comparison);
    pub const LT: Self = Operator::new("<", OperatorFamily::Comparison);
    pub const LTE: Self = Operator::new("<=", OperatorFamily::Comparison);
    pub const GT: Self = Operator::new(">", OperatorFamily::Comparison);
    pub const GTE: Self = Operator::new(">=", OperatorFamily::Comparison);
    pub const IS_DISTINCT_FROM: Self = Operator::new("IS DISTINCT FROM", OperatorFamily::Distinction);
    pub const IS_NOT_DISTINCT_FROM: Self =
        Operator::new("IS NOT DISTINCT FROM", OperatorFamily::Distinction);
    pub const PLUS: Self = Operator::new("+", OperatorFamily::Arithmetic);
    pub const MINUS: Self = Operator::new("-", OperatorFamily::Arithmetic);
    pub const MULTIPLY: Self = Operator::new("*", OperatorFamily::Arithmetic);
    pub const DIVIDE: Self = Operator::new("/", OperatorFamily::Division);
    pub const MODULUS: Self = Operator::new("%", OperatorFamily::Modulus);
    pub const AND: Self = Operator::new("AND", OperatorFamily::Logical);
    pub const OR: Self = Operator::new("OR", OperatorFamily::Logical);
    pub const BIT_AND: Self = Operator::new("&", OperatorFamily::Bitwise);
    pub const BIT_OR: Self = Operator::new("|", OperatorFamily::Bitwise);
    pub const BIT_XOR: Self = Operator::new("^", OperatorFamily::Bitwise);
    pub const SHIFT_LEFT: Self = Operator::new("<<", OperatorFamily::Bitwise);
    pub const SHIFT_RIGHT: Self = Operator::new(">>", OperatorFamily::Bitwise);
    pub const LIKE: Self = Operator::new("LIKE", OperatorFamily::Pattern);

    const fn new(symbol: &'static str, family: OperatorFamily) -> Self {
        Operator { symbol, family }
    }

    /// Get the string representation of the operator
    pub fn as_str(&self) -> &'static str {
        self.symbol
    }

    pub fn family(&self) -> OperatorFamily {
        self.family
    }

    /// The value type of `lhs <op> rhs`, or the failure explaining why the
    /// operator is not applicable to these operands.
    pub fn result_type(&self, lhs: ValueType, rhs: ValueType) -> std::result::Result<ValueType, Failure> {
        let mismatch = || Failure::OperandTypes {
            operator: self.symbol,
            left: lhs,
            right: rhs,
        };
        match self.family {
            OperatorFamily::Comparison => {
                if values_are_comparable(lhs, rhs) {
                    Ok(boolean_result(lhs, rhs))
                } else {
                    Err(mismatch())
                }
            }
            OperatorFamily::Distinction => {
                if values_are_comparable(lhs, rhs) {
                    Ok(ValueType::of(DataType::Boolean))
                } else {
                    Err(mismatch())
                }
            }
            OperatorFamily::Arithmetic => {
                if lhs.is_numeric() && rhs.is_numeric() {
                    Ok(arithmetic_result(lhs, rhs))
                } else {
                    Err(mismatch())
                }
            }
            OperatorFamily::Division => {
                if lhs.is_numeric() && rhs.is_numeric() {
                    Ok(ValueType::of(DataType::FloatingPoint)
                        .optional_if(lhs.is_optional() || rhs.is_optional()))
                } else {
                    Err(mismatch())
                }
            }
            OperatorFamily::Modulus | OperatorFamily::Bitwise => {
                let integral = |t: ValueType| t.is_integral() || t.is_unsigned_integral();
                if integral(lhs) && integral(rhs) {
                    Ok(arithmetic_result(lhs, rhs))
                } else {
                    Err(mismatch())
                }
            }
            OperatorFamily::Logical => {
                if lhs.is_boolean() && rhs.is_boolean() {
                    Ok(boolean_result(lhs, rhs))
                } else {
                    Err(mismatch())
                }
            }
            OperatorFamily::Pattern => {
                if lhs.is_text() && rhs.is_text() {
                    Ok(boolean_result(lhs, rhs))
                } else {
                    Err(mismatch())
                }
            }
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Trait for types that can be converted to SQL operators
pub trait IntoOperator {
    fn into_operator(self) -> Result<Operator>;
}

impl IntoOperator for Operator {
    fn into_operator(self) -> Result<Operator> {
        Ok(self)
    }
}

/// Allow string literals for the known SQL operators
impl IntoOperator for &str {
    fn into_operator(self) -> Result<Operator> {
        let op = match self.to_ascii_uppercase().as_str() {
            "=" | "==" => Operator::EQ,
            "!=" | "<>" => Operator::NEQ,
            "<" => Operator::LT,
            "<=" => Operator::LTE,
            ">" => Operator::GT,
            ">=" => Operator::GTE,
            "IS DISTINCT FROM" => Operator::IS_DISTINCT_FROM,
            "IS NOT DISTINCT FROM" => Operator::IS_NOT_DISTINCT_FROM,
            "+" => Operator::PLUS,
            "-" => Operator::MINUS,
            "*" => Operator::MULTIPLY,
            "/" => Operator::DIVIDE,
            "%" => Operator::MODULUS,
            "AND" => Operator::AND,
            "OR" => Operator::OR,
            "&" => Operator::BIT_AND,
            "|" => Operator::BIT_OR,
            "^" => Operator::BIT_XOR,
            "<<" => Operator::SHIFT_LEFT,
            ">>" => Operator::SHIFT_RIGHT,
            "LIKE" => Operator::LIKE,
            _ => {
                return Err(Error::check(
                    "operator",
                    Failure::UnknownOperator {
                        symbol: self.to_string(),
                    },
                ))
            }
        };
        Ok(op)
    }
}

/// Convenience module for operator constants
pub mod op {
    use super::Operator;

    pub const EQ: Operator = Operator::EQ;
    pub const NEQ: Operator = Operator::NEQ;
    pub const LT: Operator = Operator::LT;
    pub const LTE: Operator = Operator::LTE;
    pub const GT: Operator = Operator::GT;
    pub const GTE: Operator = Operator::GTE;
    pub const PLUS: Operator = Operator::PLUS;
    pub const MINUS: Operator = Operator::MINUS;
    pub const MULTIPLY: Operator = Operator::MULTIPLY;
    pub const DIVIDE: Operator = Operator::DIVIDE;
    pub const MODULUS: Operator = Operator::MODULUS;
    pub const AND: Operator = Operator::AND;
    pub const OR: Operator = Operator::OR;
    pub const LIKE: Operator = Operator::LIKE;
}

#[cfg(test)]
mod tests {
    use super::*;

    const INT: ValueType = ValueType::of(DataType::Integral);
    const TEXT: ValueType = ValueType::of(DataType::Text);
    const BOOL: ValueType = ValueType::of(DataType::Boolean);

    #[test]
    fn test_operator_constants() {
        assert_eq!(Operator::GT.as_str(), ">");
        assert_eq!(Operator::NEQ.as_str(), "<>");
        assert_eq!(Operator::LIKE.as_str(), "LIKE");
        assert_eq!(Operator::DIVIDE.family(), OperatorFamily::Division);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Operator::GT), ">");
        assert_eq!(format!("{}", Operator::IS_DISTINCT_FROM), "IS DISTINCT FROM");
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(">".into_operator().unwrap(), Operator::GT);
        assert_eq!("like".into_operator().unwrap(), Operator::LIKE);
        assert_eq!("!=".into_operator().unwrap(), Operator::NEQ);
        assert_eq!("and".into_operator().unwrap(), op::AND);
    }

    #[test]
    fn test_invalid_string_conversion() {
        let err = "INVALID".into_operator().unwrap_err();
        assert_eq!(
            err.failure(),
            Some(&Failure::UnknownOperator {
                symbol: "INVALID".to_string()
            })
        );
    }

    #[test]
    fn test_comparison_typing() {
        assert_eq!(Operator::LT.result_type(INT, INT), Ok(BOOL));
        assert_eq!(
            Operator::EQ.result_type(INT, ValueType::Null),
            Ok(ValueType::optional(DataType::Boolean))
        );
        assert!(Operator::EQ.result_type(INT, TEXT).is_err());
        assert_eq!(
            Operator::IS_DISTINCT_FROM.result_type(INT, ValueType::Null),
            Ok(BOOL)
        );
    }

    #[test]
    fn test_division_yields_floating_point() {
        assert_eq!(
            Operator::DIVIDE.result_type(INT, INT),
            Ok(ValueType::of(DataType::FloatingPoint))
        );
    }

    #[test]
    fn test_logical_requires_boolean() {
        assert_eq!(Operator::AND.result_type(BOOL, BOOL), Ok(BOOL));
        assert_eq!(
            Operator::OR.result_type(BOOL, INT),
            Err(Failure::OperandTypes {
                operator: "OR",
                left: BOOL,
                right: INT
            })
        );
    }

    #[test]
    fn test_bitwise_requires_integral() {
        assert_eq!(Operator::BIT_AND.result_type(INT, INT), Ok(INT));
        assert!(Operator::BIT_OR
            .result_type(INT, ValueType::of(DataType::FloatingPoint))
            .is_err());
    }

    #[test]
    fn test_modulus_requires_integral() {
        let unsigned = ValueType::of(DataType::UnsignedIntegral);
        let float = ValueType::of(DataType::FloatingPoint);
        assert_eq!(Operator::MODULUS.result_type(INT, INT), Ok(INT));
        assert_eq!(Operator::MODULUS.result_type(unsigned, unsigned), Ok(unsigned));
        assert_eq!(
            Operator::MODULUS.result_type(INT, ValueType::optional(DataType::Integral)),
            Ok(ValueType::optional(DataType::Integral))
        );
        assert_eq!(
            Operator::MODULUS.result_type(float, INT),
            Err(Failure::OperandTypes {
                operator: "%",
                left: float,
                right: INT
            })
        );
        assert!(Operator::MODULUS.result_type(INT, float).is_err());
        assert!(Operator::MODULUS.result_type(BOOL, INT).is_err());
        assert_eq!(Operator::PLUS.result_type(float, INT).map(|t| t.is_numeric()), Ok(true));
    }

    #[test]
    fn test_like_requires_text() {
        assert_eq!(Operator::LIKE.result_type(TEXT, TEXT), Ok(BOOL));
        assert!(Operator::LIKE.result_type(TEXT, INT).is_err());
    }
}
