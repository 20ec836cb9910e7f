use serde::{Serialize, Serializer};
use std::fmt;

/// A numeric leaf value.
///
/// Integers that fit in `i64` are always stored as `Int`, so a value has a
/// single representation no matter where it came from (a typed array, parsed
/// text or a Rust primitive). `UInt` only holds values above `i64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer larger than `i64::MAX`.
    UInt(u64),
    /// IEEE-754 double.
    Float(f64),
}

impl Number {
    /// Creates a number from an unsigned integer, preferring `Int` when it fits.
    pub fn from_u64(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => Number::Int(v),
            Err(_) => Number::UInt(value),
        }
    }

    /// Returns the value as a double, possibly losing precision.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(v) => v as f64,
            Number::UInt(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    /// Returns the value as an `i64` if it is an integer in range.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true unless this is a NaN or infinite float.
    pub fn is_finite(&self) -> bool {
        match self {
            Number::Float(v) => v.is_finite(),
            _ => true,
        }
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Number {
                fn from(value: $t) -> Self {
                    Number::Int(i64::from(value))
                }
            }
        )*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Number {
                fn from(value: $t) -> Self {
                    Number::from_u64(value as u64)
                }
            }
        )*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<isize> for Number {
    fn from(value: isize) -> Self {
        Number::Int(value as i64)
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::Float(f64::from(value))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Number::Int(v) => serializer.serialize_i64(v),
            Number::UInt(v) => serializer.serialize_u64(v),
            Number::Float(v) if v.is_finite() => serializer.serialize_f64(v),
            Number::Float(v) => Err(serde::ser::Error::custom(format!(
                "non-finite number {v} has no textual representation"
            ))),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            Number::UInt(v) => write!(f, "{v}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}
