//! Runtime value types: raw wire values and decoded field values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BaseType;

/// A field value exactly as read off the wire, before any profile-driven
/// interpretation.
///
/// The variant preserves the field's base type so that invalid-sentinel
/// checks and promotion can be applied later without consulting the
/// definition again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    Enum(u8),
    SInt8(i8),
    UInt8(u8),
    SInt16(i16),
    UInt16(u16),
    SInt32(i32),
    UInt32(u32),
    String(String),
    Float32(f32),
    Float64(f64),
    UInt8z(u8),
    UInt16z(u16),
    UInt32z(u32),
    Byte(u8),
    SInt64(i64),
    UInt64(u64),
    UInt64z(u64),
    Array(Vec<RawValue>),
}

impl RawValue {
    /// The base type this value was read as, `None` for arrays.
    pub fn base_type(&self) -> Option<BaseType> {
        match self {
            RawValue::Enum(_) => Some(BaseType::Enum),
            RawValue::SInt8(_) => Some(BaseType::SInt8),
            RawValue::UInt8(_) => Some(BaseType::UInt8),
            RawValue::SInt16(_) => Some(BaseType::SInt16),
            RawValue::UInt16(_) => Some(BaseType::UInt16),
            RawValue::SInt32(_) => Some(BaseType::SInt32),
            RawValue::UInt32(_) => Some(BaseType::UInt32),
            RawValue::String(_) => Some(BaseType::String),
            RawValue::Float32(_) => Some(BaseType::Float32),
            RawValue::Float64(_) => Some(BaseType::Float64),
            RawValue::UInt8z(_) => Some(BaseType::UInt8z),
            RawValue::UInt16z(_) => Some(BaseType::UInt16z),
            RawValue::UInt32z(_) => Some(BaseType::UInt32z),
            RawValue::Byte(_) => Some(BaseType::Byte),
            RawValue::SInt64(_) => Some(BaseType::SInt64),
            RawValue::UInt64(_) => Some(BaseType::UInt64),
            RawValue::UInt64z(_) => Some(BaseType::UInt64z),
            RawValue::Array(_) => None,
        }
    }

    /// Whether this value holds its base type's invalid sentinel.
    ///
    /// Floats compare by bit pattern (the float sentinel is a NaN, which
    /// never compares equal to itself numerically). An array is never
    /// invalid as a whole; masking applies element-wise.
    pub fn is_invalid(&self) -> bool {
        match self {
            RawValue::Enum(v) | RawValue::UInt8(v) | RawValue::Byte(v) => *v == 0xFF,
            RawValue::SInt8(v) => *v == i8::MAX,
            RawValue::SInt16(v) => *v == i16::MAX,
            RawValue::UInt16(v) => *v == u16::MAX,
            RawValue::SInt32(v) => *v == i32::MAX,
            RawValue::UInt32(v) => *v == u32::MAX,
            RawValue::String(v) => v.is_empty(),
            RawValue::Float32(v) => v.to_bits() == u32::MAX,
            RawValue::Float64(v) => v.to_bits() == u64::MAX,
            RawValue::UInt8z(v) => *v == 0,
            RawValue::UInt16z(v) => *v == 0,
            RawValue::UInt32z(v) => *v == 0,
            RawValue::SInt64(v) => *v == i64::MAX,
            RawValue::UInt64(v) => *v == u64::MAX,
            RawValue::UInt64z(v) => *v == 0,
            RawValue::Array(_) => false,
        }
    }

    /// The value as a signed 64-bit integer, when it is an integer that fits.
    ///
    /// Used for sub-field reference comparisons, which are defined over raw
    /// integer values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Enum(v) | RawValue::UInt8(v) | RawValue::UInt8z(v) | RawValue::Byte(v) => {
                Some(i64::from(*v))
            }
            RawValue::SInt8(v) => Some(i64::from(*v)),
            RawValue::SInt16(v) => Some(i64::from(*v)),
            RawValue::UInt16(v) | RawValue::UInt16z(v) => Some(i64::from(*v)),
            RawValue::SInt32(v) => Some(i64::from(*v)),
            RawValue::UInt32(v) | RawValue::UInt32z(v) => Some(i64::from(*v)),
            RawValue::SInt64(v) => Some(*v),
            RawValue::UInt64(v) | RawValue::UInt64z(v) => i64::try_from(*v).ok(),
            RawValue::String(_)
            | RawValue::Float32(_)
            | RawValue::Float64(_)
            | RawValue::Array(_) => None,
        }
    }

    /// Promote to a decoded value: integers widen to 64 bits, floats to
    /// `f64`, arrays promote element-wise.
    pub fn promote(&self) -> DecodedValue {
        match self {
            RawValue::Enum(v) | RawValue::UInt8(v) | RawValue::UInt8z(v) | RawValue::Byte(v) => {
                DecodedValue::UInt(u64::from(*v))
            }
            RawValue::SInt8(v) => DecodedValue::SInt(i64::from(*v)),
            RawValue::SInt16(v) => DecodedValue::SInt(i64::from(*v)),
            RawValue::UInt16(v) | RawValue::UInt16z(v) => DecodedValue::UInt(u64::from(*v)),
            RawValue::SInt32(v) => DecodedValue::SInt(i64::from(*v)),
            RawValue::UInt32(v) | RawValue::UInt32z(v) => DecodedValue::UInt(u64::from(*v)),
            RawValue::SInt64(v) => DecodedValue::SInt(*v),
            RawValue::UInt64(v) | RawValue::UInt64z(v) => DecodedValue::UInt(*v),
            RawValue::Float32(v) => DecodedValue::Float(f64::from(*v)),
            RawValue::Float64(v) => DecodedValue::Float(*v),
            RawValue::String(v) => DecodedValue::String(v.clone()),
            RawValue::Array(values) => {
                DecodedValue::Array(values.iter().map(RawValue::promote).collect())
            }
        }
    }
}

/// A fully decoded field value.
///
/// A tagged sum rather than a class hierarchy: null (masked invalid),
/// 64-bit integers, doubles, strings, profile enum labels, calendar
/// timestamps, and sequences of the preceding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecodedValue {
    Null,
    SInt(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Label(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<DecodedValue>),
}

impl DecodedValue {
    /// Whether this is the null marker (masked invalid sentinel).
    pub fn is_null(&self) -> bool {
        matches!(self, DecodedValue::Null)
    }

    /// Whether the value is numeric: null, a number, or an array of
    /// numbers-or-null.
    pub fn is_numeric(&self) -> bool {
        match self {
            DecodedValue::Null
            | DecodedValue::SInt(_)
            | DecodedValue::UInt(_)
            | DecodedValue::Float(_) => true,
            DecodedValue::Array(values) => values.iter().all(DecodedValue::is_numeric),
            DecodedValue::String(_) | DecodedValue::Label(_) | DecodedValue::Timestamp(_) => false,
        }
    }

    /// The value as `f64`, when numeric and non-null.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DecodedValue::SInt(v) => Some(*v as f64),
            DecodedValue::UInt(v) => Some(*v as f64),
            DecodedValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a signed 64-bit integer, when it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DecodedValue::SInt(v) => Some(*v),
            DecodedValue::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// The enum label or string content, when textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecodedValue::String(v) | DecodedValue::Label(v) => Some(v),
            _ => None,
        }
    }
}
