use std::fmt::Display;

use serde::{Serialize, Serializer};

/// A named value attached to a log record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new<K: Into<String>, V: Into<FieldValue>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Typed value of a [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Json(serde_json::Value),
    /// A value that could not be serialized, with the reason.
    Invalid(String),
}

/// Captures any serializable value as structured JSON.
///
/// Never fails: a value that cannot be serialized becomes [`FieldValue::Invalid`]
/// and is rendered as a placeholder string in its own field.
pub fn any<T: Serialize + ?Sized>(value: &T) -> FieldValue {
    match serde_json::to_value(value) {
        Ok(value) => FieldValue::Json(value),
        Err(err) => FieldValue::Invalid(err.to_string()),
    }
}

/// Captures the `Display` rendering of a value.
pub fn display<T: Display + ?Sized>(value: &T) -> FieldValue {
    FieldValue::Str(value.to_string())
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Str(s) => serializer.serialize_str(s),
            FieldValue::Int(i) => serializer.serialize_i64(*i),
            FieldValue::Uint(u) => serializer.serialize_u64(*u),
            FieldValue::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            FieldValue::Float(f) if f.is_nan() => serializer.serialize_str("NaN"),
            FieldValue::Float(f) if *f > 0.0 => serializer.serialize_str("+Inf"),
            FieldValue::Float(_) => serializer.serialize_str("-Inf"),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Json(value) => value.serialize(serializer),
            FieldValue::Invalid(reason) => {
                serializer.serialize_str(&format!("<unencodable: {reason}>"))
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Str(value.clone())
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(value: $t) -> Self {
                FieldValue::Int(value as i64)
            }
        })*
    };
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(value: $t) -> Self {
                FieldValue::Uint(value as u64)
            }
        })*
    };
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(value as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::Json(value)
    }
}
