//! Token kinds and lazily materialized numeric values.

use core::fmt;

use bigdecimal::{BigDecimal, ToPrimitive};
use num_bigint::BigInt;

/// One unit of the token grammar.
///
/// "No token yet" and "end of stream" are both represented by `None` at the
/// [`TokenStream`](crate::TokenStream) level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Token {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName,
    String,
    Integer,
    Float,
    True,
    False,
    Null,
    EmbeddedBinary,
}

impl Token {
    #[must_use]
    pub fn is_struct_start(self) -> bool {
        matches!(self, Self::StartObject | Self::StartArray)
    }

    #[must_use]
    pub fn is_struct_end(self) -> bool {
        matches!(self, Self::EndObject | Self::EndArray)
    }

    #[must_use]
    pub fn is_scalar_value(self) -> bool {
        matches!(
            self,
            Self::String
                | Self::Integer
                | Self::Float
                | Self::True
                | Self::False
                | Self::Null
                | Self::EmbeddedBinary
        )
    }

    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Fixed textual representation, for tokens that have one.
    #[must_use]
    pub fn as_static_str(self) -> Option<&'static str> {
        match self {
            Self::StartObject => Some("{"),
            Self::EndObject => Some("}"),
            Self::StartArray => Some("["),
            Self::EndArray => Some("]"),
            Self::True => Some("true"),
            Self::False => Some("false"),
            Self::Null => Some("null"),
            _ => None,
        }
    }
}

/// Narrowest representation a numeric token fits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberType {
    Int,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
}

/// A materialized numeric value.
///
/// Integers are widened progressively: a value that fits in `i32` is `Int`,
/// then `Long`, then `BigInteger`.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Int(i32),
    Long(i64),
    BigInteger(BigInt),
    Float(f32),
    Double(f64),
    BigDecimal(BigDecimal),
}

impl Number {
    #[must_use]
    pub fn number_type(&self) -> NumberType {
        match self {
            Self::Int(_) => NumberType::Int,
            Self::Long(_) => NumberType::Long,
            Self::BigInteger(_) => NumberType::BigInteger,
            Self::Float(_) => NumberType::Float,
            Self::Double(_) => NumberType::Double,
            Self::BigDecimal(_) => NumberType::BigDecimal,
        }
    }

    #[must_use]
    pub fn is_integral(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Long(_) | Self::BigInteger(_))
    }

    /// Builds the narrowest integer variant for `value`.
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        match i32::try_from(value) {
            Ok(v) => Self::Int(v),
            Err(_) => Self::Long(value),
        }
    }

    /// Builds the narrowest integer variant for `value`.
    #[must_use]
    pub fn from_big_integer(value: BigInt) -> Self {
        match i64::try_from(&value) {
            Ok(v) => Self::from_i64(v),
            Err(_) => Self::BigInteger(value),
        }
    }

    /// Exact conversion to `i64`. Floating values convert only when they are
    /// integral and in range.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            Self::BigInteger(v) => i64::try_from(v).ok(),
            Self::Float(v) => integral_f64(f64::from(*v)).map(|v| v as i64),
            Self::Double(v) => integral_f64(*v).map(|v| v as i64),
            Self::BigDecimal(v) => {
                if v.is_integer() {
                    v.to_i64()
                } else {
                    None
                }
            }
        }
    }

    /// Conversion to `f64`; may lose precision for big values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(&self) -> f64 {
        match self {
            Self::Long(v) => *v as f64,
            Self::Int(v) => f64::from(*v),
            Self::BigInteger(v) => v.to_f64().unwrap_or(f64::NAN),
            Self::Float(v) => f64::from(*v),
            Self::Double(v) => *v,
            Self::BigDecimal(v) => v.to_f64().unwrap_or(f64::NAN),
        }
    }

    /// Conversion to an arbitrary-precision integer, for integral values.
    #[must_use]
    pub fn to_big_integer(&self) -> Option<BigInt> {
        match self {
            Self::Int(v) => Some(BigInt::from(*v)),
            Self::Long(v) => Some(BigInt::from(*v)),
            Self::BigInteger(v) => Some(v.clone()),
            Self::BigDecimal(v) if v.is_integer() => Some(v.with_scale(0).into_bigint_and_exponent().0),
            Self::Float(_) | Self::Double(_) | Self::BigDecimal(_) => {
                self.to_i64().map(BigInt::from)
            }
        }
    }

    /// Conversion to an arbitrary-precision decimal. Binary floating values
    /// convert through their shortest round-trip text.
    #[must_use]
    pub fn to_big_decimal(&self) -> Option<BigDecimal> {
        match self {
            Self::Int(v) => Some(BigDecimal::from(*v)),
            Self::Long(v) => Some(BigDecimal::from(*v)),
            Self::BigInteger(v) => Some(BigDecimal::from(v.clone())),
            Self::Float(v) if v.is_finite() => format!("{v:?}").parse().ok(),
            Self::Double(v) if v.is_finite() => format!("{v:?}").parse().ok(),
            Self::Float(_) | Self::Double(_) => None,
            Self::BigDecimal(v) => Some(v.clone()),
        }
    }
}

fn integral_f64(v: f64) -> Option<f64> {
    // 2^63 is exactly representable; anything at or above it overflows i64.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if v.fract() == 0.0 && v >= -LIMIT && v < LIMIT {
        Some(v)
    } else {
        None
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::BigInteger(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Double(v) => write!(f, "{v:?}"),
            Self::BigDecimal(v) => write!(f, "{v}"),
        }
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Self::from_i64(v)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<BigInt> for Number {
    fn from(v: BigInt) -> Self {
        Self::from_big_integer(v)
    }
}

impl From<BigDecimal> for Number {
    fn from(v: BigDecimal) -> Self {
        Self::BigDecimal(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_widening() {
        assert_eq!(Number::from_i64(7), Number::Int(7));
        assert_eq!(
            Number::from_i64(i64::from(i32::MAX) + 1),
            Number::Long(2_147_483_648)
        );
        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        assert_eq!(
            Number::from_big_integer(big.clone()).number_type(),
            NumberType::BigInteger
        );
        assert_eq!(
            Number::from_big_integer(BigInt::from(-5)),
            Number::Int(-5)
        );
    }

    #[test]
    fn integral_conversions() {
        assert_eq!(Number::Double(42.0).to_i64(), Some(42));
        assert_eq!(Number::Double(42.5).to_i64(), None);
        assert_eq!(Number::Double(1e300).to_i64(), None);
        let d: BigDecimal = "12.000".parse().unwrap();
        assert_eq!(Number::BigDecimal(d).to_i64(), Some(12));
    }

    #[test]
    fn display_uses_round_trip_forms() {
        assert_eq!(Number::Double(1.0).to_string(), "1.0");
        assert_eq!(Number::Double(0.1).to_string(), "0.1");
        assert_eq!(Number::Float(0.5).to_string(), "0.5");
        assert_eq!(Number::Long(-9_000_000_000).to_string(), "-9000000000");
    }
}
