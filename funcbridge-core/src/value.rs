//! # Native value space
//!
//! The wire protocol carries every value as a `TypedData` tagged union. On
//! the runtime side we decode it exactly once, at the boundary, into a
//! [`Value`] and match exhaustively from there: there is no "which variant
//! is set" ambiguity past the converter layer.
use serde_json::Value as JsonValue;

/// A runtime-native value decoded from, or destined for, the wire.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// No variant was set on the wire: the absent/null value.
    Unset,
    /// A string that did not parse as JSON (or that JSON parsing was
    /// disabled for).
    String(String),
    /// Parsed JSON: objects, arrays, numbers, booleans, and strings the
    /// host tagged (or that happened to parse) as JSON.
    Json(JsonValue),
    /// An opaque byte buffer.
    Bytes(Vec<u8>),
    BytesList(Vec<Vec<u8>>),
    StringList(Vec<String>),
    DoubleList(Vec<f64>),
    IntList(Vec<i64>),
}

impl Value {
    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset)
    }

    /// The string form, for values that have one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Json(JsonValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The `serde_json` view of this value, used where binding data must be
    /// a JSON document (trigger metadata, timer payloads). Byte buffers
    /// become arrays of numbers; `Unset` becomes `null`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Unset => JsonValue::Null,
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Json(v) => v.clone(),
            Value::Bytes(b) => JsonValue::Array(b.iter().map(|b| JsonValue::from(*b)).collect()),
            Value::BytesList(list) => JsonValue::Array(
                list.iter()
                    .map(|b| JsonValue::Array(b.iter().map(|b| JsonValue::from(*b)).collect()))
                    .collect(),
            ),
            Value::StringList(list) => {
                JsonValue::Array(list.iter().cloned().map(JsonValue::String).collect())
            }
            Value::DoubleList(list) => {
                JsonValue::Array(list.iter().map(|d| JsonValue::from(*d)).collect())
            }
            Value::IntList(list) => {
                JsonValue::Array(list.iter().map(|i| JsonValue::from(*i)).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        Value::Json(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}
