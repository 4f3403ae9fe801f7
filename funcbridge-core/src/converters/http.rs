//! # HTTP message converter
//!
//! Specializes the typed-data converter for the structured HTTP shapes:
//! request body decoding (with its byte-to-string backward-compatibility
//! quirk), the nullable-map fallback policy for headers/query/params, and
//! the response and cookie encoders.
use super::typed_data::{
    ConversionError, decode, to_nullable_bool, to_nullable_double, to_nullable_string,
    to_nullable_timestamp, to_rpc_string, to_typed_data,
};
use crate::http::response::ResponseData;
use crate::value::Value;
use funcbridge_proto::messages::{
    NullableString, RpcHttp, RpcHttpCookie, TypedData, rpc_http_cookie::SameSite, typed_data::Data,
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Decodes an HTTP body into its native form.
///
/// Bytes are special-cased to their UTF-8 string representation instead of
/// an opaque buffer, preserving the behavior earlier hosts shipped with.
/// Everything else goes through the typed-data decoder with JSON parsing
/// enabled.
pub fn from_rpc_http_body(body: Option<&TypedData>) -> Value {
    match body.and_then(|b| b.data.as_ref()) {
        Some(Data::Bytes(bytes)) | Some(Data::Stream(bytes)) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        _ => decode(body, true),
    }
}

/// Decodes an HTTP body into its raw string form: JSON parsing disabled,
/// bytes forced to UTF-8. Guarantees a string whenever body data exists.
pub fn from_rpc_http_raw_body(body: Option<&TypedData>) -> Option<String> {
    match from_rpc_http_body_raw(body) {
        Value::Unset => None,
        Value::String(s) => Some(s),
        other => serde_json::to_string(&other.to_json()).ok(),
    }
}

fn from_rpc_http_body_raw(body: Option<&TypedData>) -> Value {
    match body.and_then(|b| b.data.as_ref()) {
        Some(Data::Bytes(bytes)) | Some(Data::Stream(bytes)) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        _ => decode(body, false),
    }
}

/// Collapses the nullable/legacy pair of wire maps into one plain mapping.
///
/// Prefers the nullable map when it has entries (absent wrapper values
/// become empty strings, never null); otherwise falls back to the legacy
/// non-nullable map; otherwise yields an empty map.
pub fn from_nullable_mapping(
    nullable_mapping: &HashMap<String, NullableString>,
    original_mapping: &HashMap<String, String>,
) -> HashMap<String, String> {
    if !nullable_mapping.is_empty() {
        nullable_mapping
            .iter()
            .map(|(k, v)| (k.clone(), v.value.clone().unwrap_or_default()))
            .collect()
    } else {
        original_mapping.clone()
    }
}

/// Encodes a structured HTTP response into the `http` variant of
/// `TypedData`.
///
/// Header values are coerced to strings (null values dropped), cookies go
/// through the cookie encoder, the status is stringified and the body is
/// encoded with the typed-data encoder.
pub fn to_rpc_http(response: &ResponseData) -> Result<TypedData, ConversionError> {
    let http = RpcHttp {
        headers: coerce_headers(&response.headers),
        cookies: to_rpc_http_cookie_list(&response.cookies)?,
        status_code: response
            .status_code
            .as_ref()
            .map(stringify)
            .unwrap_or_default(),
        body: match &response.body {
            Value::Unset => None,
            body => Some(Box::new(to_typed_data(body)?)),
        },
        enable_content_negotiation: response.enable_content_negotiation,
        ..Default::default()
    };
    Ok(TypedData::new(Data::Http(Box::new(http))))
}

fn coerce_headers(headers: &HashMap<String, JsonValue>) -> HashMap<String, String> {
    headers
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), stringify(v)))
        .collect()
}

fn stringify(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Encodes the `Set-Cookie` entries of an outgoing response (RFC 6265).
pub fn to_rpc_http_cookie_list(cookies: &[JsonValue]) -> Result<Vec<RpcHttpCookie>, ConversionError> {
    cookies.iter().map(to_rpc_http_cookie).collect()
}

fn to_rpc_http_cookie(cookie: &JsonValue) -> Result<RpcHttpCookie, ConversionError> {
    let field = |name: &str| cookie.get(name).filter(|v| !v.is_null());

    // SameSite is a one-off enum resolution; unrecognized values fall back
    // to the wire default.
    let same_site = match field("sameSite").and_then(JsonValue::as_str) {
        Some(s) => match s.to_lowercase().as_str() {
            "lax" => SameSite::Lax,
            "strict" => SameSite::Strict,
            "none" => SameSite::ExplicitNone,
            _ => SameSite::None,
        },
        None => SameSite::None,
    };

    Ok(RpcHttpCookie {
        name: to_rpc_string(field("name"), "cookie.name")?,
        value: to_rpc_string(field("value"), "cookie.value")?,
        domain: to_nullable_string(field("domain"), "cookie.domain")?,
        path: to_nullable_string(field("path"), "cookie.path")?,
        expires: to_nullable_timestamp(field("expires"), "cookie.expires")?,
        secure: to_nullable_bool(field("secure"), "cookie.secure")?,
        http_only: to_nullable_bool(field("httpOnly"), "cookie.httpOnly")?,
        same_site: same_site as i32,
        max_age: to_nullable_double(field("maxAge"), "cookie.maxAge")?,
    })
}
