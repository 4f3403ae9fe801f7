//! # Binding data normalization
//!
//! Trigger metadata arrives with host-side (PascalCase) keys; runtime
//! convention is camelCase. The normalization pass lower-cases the first
//! character of every key, recursing into plain objects but leaving arrays
//! alone. The same pass is applied to timer-trigger payloads, a legacy
//! quirk earlier workers shipped with.
use super::typed_data::from_typed_data;
use funcbridge_proto::messages::InvocationRequest;
use serde_json::{Map, Value as JsonValue};

/// Builds the normalized binding-data mapping for one invocation:
/// the invocation id plus every trigger-metadata entry, decoded and
/// key-normalized.
pub fn normalized_binding_data(request: &InvocationRequest) -> Map<String, JsonValue> {
    let mut data = Map::new();
    data.insert(
        "invocationId".to_string(),
        JsonValue::String(request.invocation_id.clone()),
    );
    for (key, typed) in &request.trigger_metadata {
        let value = from_typed_data(Some(typed)).to_json();
        data.insert(camel_case_key(key), convert_keys_to_camel_case(&value));
    }
    data
}

/// Recursively lower-cases the first character of every object key.
/// Arrays and scalars pass through unchanged.
pub fn convert_keys_to_camel_case(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (camel_case_key(k), convert_keys_to_camel_case(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn camel_case_key(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
