//! # Typed-data converter
//!
//! Bidirectional mapping between the wire `TypedData` tagged union and the
//! native [`Value`] space, plus the nullable-scalar encoders used by the
//! strongly-typed HTTP fields.
//!
//! ## Conversion policy
//!
//! * Decoding is lenient: a string that fails to parse as JSON comes back
//!   as the raw string, never as an error.
//! * Encoding into a strongly-typed wire field is strict: a value of the
//!   wrong native type is a programming error and fails with
//!   [`ConversionError::TypeMismatch`], naming the field.
use crate::value::Value;
use funcbridge_proto::messages::{
    CollectionBytes, CollectionDouble, CollectionSInt64, CollectionString, NullableBool,
    NullableDouble, NullableString, NullableTimestamp, TypedData, typed_data::Data,
};
use serde_json::Value as JsonValue;

/// Failures raised by the converter layer.
///
/// These are validation-style errors: they are thrown synchronously at the
/// point of conversion and propagate to the caller, surfacing as an
/// invocation failure. Lifecycle misuse (double completion, late logging)
/// is deliberately *not* represented here, that is reported through the
/// log stream instead.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error(
        "A '{expected}' type was expected instead of a '{actual}' type. Cannot parse value of '{property}'"
    )]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
        property: String,
    },
    #[error(
        "The HTTP response must be an 'object' type that can include properties such as 'body', 'statusCode', and 'headers'"
    )]
    InvalidResponseShape,
    #[error("Failed to serialize value to JSON: '{0}'")]
    Serialization(#[from] serde_json::Error),
}

/// Decodes `TypedData` into a native [`Value`], attempting to JSON-parse
/// string variants.
///
/// Parse failures are swallowed: the raw string is returned unchanged.
/// An unset union decodes to [`Value::Unset`].
pub fn from_typed_data(typed: Option<&TypedData>) -> Value {
    decode(typed, true)
}

pub(crate) fn decode(typed: Option<&TypedData>, convert_string_to_json: bool) -> Value {
    match typed.and_then(|t| t.data.as_ref()) {
        None => Value::Unset,
        Some(Data::String(s)) | Some(Data::Json(s)) => {
            if convert_string_to_json {
                match serde_json::from_str::<JsonValue>(s) {
                    Ok(parsed) => Value::Json(parsed),
                    Err(_) => Value::String(s.clone()),
                }
            } else {
                Value::String(s.clone())
            }
        }
        Some(Data::Bytes(b)) | Some(Data::Stream(b)) => Value::Bytes(b.clone()),
        // Structured HTTP payloads are the HTTP converter's concern.
        Some(Data::Http(_)) => Value::Unset,
        Some(Data::Int(i)) => Value::Json(JsonValue::from(*i)),
        Some(Data::Double(d)) => Value::Json(JsonValue::from(*d)),
        Some(Data::CollectionBytes(c)) => Value::BytesList(c.bytes.clone()),
        Some(Data::CollectionString(c)) => Value::StringList(c.string.clone()),
        Some(Data::CollectionDouble(c)) => Value::DoubleList(c.double.clone()),
        Some(Data::CollectionSint64(c)) => Value::IntList(c.sint64.clone()),
    }
}

/// Encodes a native [`Value`] into `TypedData`.
///
/// Strings map to the string variant, byte buffers to the bytes variant,
/// integral numbers to the sint64 variant, non-integral numbers to the
/// double variant. Any other JSON value is stringified into the json
/// variant. List values keep their collection variants.
pub fn to_typed_data(value: &Value) -> Result<TypedData, ConversionError> {
    let data = match value {
        Value::Unset => return Ok(TypedData::default()),
        Value::String(s) => Data::String(s.clone()),
        Value::Bytes(b) => Data::Bytes(b.clone()),
        Value::Json(JsonValue::String(s)) => Data::String(s.clone()),
        Value::Json(JsonValue::Number(n)) => number_to_data(n),
        Value::Json(other) => Data::Json(serde_json::to_string(other)?),
        Value::BytesList(list) => Data::CollectionBytes(CollectionBytes { bytes: list.clone() }),
        Value::StringList(list) => {
            Data::CollectionString(CollectionString { string: list.clone() })
        }
        Value::DoubleList(list) => {
            Data::CollectionDouble(CollectionDouble { double: list.clone() })
        }
        Value::IntList(list) => Data::CollectionSint64(CollectionSInt64 { sint64: list.clone() }),
    };
    Ok(TypedData::new(data))
}

fn number_to_data(n: &serde_json::Number) -> Data {
    if let Some(i) = n.as_i64() {
        return Data::Int(i);
    }
    let f = n.as_f64().unwrap_or(f64::NAN);
    // Whole-valued doubles count as integers, matching the host's contract.
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Data::Int(f as i64)
    } else {
        Data::Double(f)
    }
}

/// Encodes a boolean into the nullable wire wrapper.
///
/// Absent input yields absent output; a present non-boolean fails with a
/// [`ConversionError::TypeMismatch`] naming `property`.
pub fn to_nullable_bool(
    value: Option<&JsonValue>,
    property: &str,
) -> Result<Option<NullableBool>, ConversionError> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Bool(b)) => Ok(Some(NullableBool { value: Some(*b) })),
        Some(other) => Err(type_mismatch("boolean", other, property)),
    }
}

/// Encodes a number, or a string that parses as one, into the nullable
/// double wrapper.
pub fn to_nullable_double(
    value: Option<&JsonValue>,
    property: &str,
) -> Result<Option<NullableDouble>, ConversionError> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => Ok(Some(NullableDouble { value: n.as_f64() })),
        Some(JsonValue::String(s)) => match s.trim().parse::<f64>() {
            Ok(parsed) => Ok(Some(NullableDouble {
                value: Some(parsed),
            })),
            Err(_) => Err(type_mismatch("number", &JsonValue::String(s.clone()), property)),
        },
        Some(other) => Err(type_mismatch("number", other, property)),
    }
}

/// Encodes a string into the nullable wire wrapper.
pub fn to_nullable_string(
    value: Option<&JsonValue>,
    property: &str,
) -> Result<Option<NullableString>, ConversionError> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(NullableString {
            value: Some(s.clone()),
        })),
        Some(other) => Err(type_mismatch("string", other, property)),
    }
}

/// Like [`to_nullable_string`] but for wire fields that require a present,
/// possibly empty string: absent input becomes `""` instead of absent.
pub fn to_rpc_string(value: Option<&JsonValue>, property: &str) -> Result<String, ConversionError> {
    match value {
        None | Some(JsonValue::Null) => Ok(String::new()),
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(other) => Err(type_mismatch("string", other, property)),
    }
}

/// Encodes an epoch-milliseconds number or an RFC 3339 date string into the
/// nullable timestamp wrapper, rounding to whole seconds.
///
/// Invalid or non-positive instants are silently dropped (absent output),
/// not reported. The host treats an absent timestamp as "not set", and
/// raising here would turn previously accepted responses into invocation
/// failures, so the drop is kept for wire compatibility.
pub fn to_nullable_timestamp(
    value: Option<&JsonValue>,
    property: &str,
) -> Result<Option<NullableTimestamp>, ConversionError> {
    let millis = match value {
        None | Some(JsonValue::Null) => return Ok(None),
        Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(JsonValue::String(s)) => match chrono::DateTime::parse_from_rfc3339(s) {
            Ok(parsed) => parsed.timestamp_millis() as f64,
            Err(_) => {
                return Err(type_mismatch("number or Date", &JsonValue::String(s.clone()), property));
            }
        },
        Some(other) => return Err(type_mismatch("number or Date", other, property)),
    };

    if millis.is_finite() && millis > 0.0 {
        Ok(Some(NullableTimestamp {
            value: Some(prost_types::Timestamp {
                seconds: (millis / 1000.0).round() as i64,
                nanos: 0,
            }),
        }))
    } else {
        Ok(None)
    }
}

fn type_mismatch(expected: &'static str, actual: &JsonValue, property: &str) -> ConversionError {
    ConversionError::TypeMismatch {
        expected,
        actual: json_type_name(actual),
        property: property.to_string(),
    }
}

pub(crate) fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
