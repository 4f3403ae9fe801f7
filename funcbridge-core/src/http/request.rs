//! Immutable view over an inbound HTTP trigger payload.
use crate::converters::http::{from_nullable_mapping, from_rpc_http_body, from_rpc_http_raw_body};
use crate::value::Value;
use funcbridge_proto::messages::RpcHttp;
use std::collections::HashMap;

/// An inbound HTTP request, decoded once at construction.
///
/// Header, query and param maps are collapsed from the wire's
/// nullable/legacy pairs. `body` is the typed, JSON-decoded body;
/// `raw_body` is the same data forced to string form (bytes as UTF-8,
/// no JSON decoding).
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub original_url: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub params: HashMap<String, String>,
    pub body: Value,
    pub raw_body: Option<String>,
}

impl Request {
    pub fn new(http: &RpcHttp) -> Self {
        Self {
            method: http.method.clone(),
            url: http.url.clone(),
            original_url: http.url.clone(),
            headers: from_nullable_mapping(&http.nullable_headers, &http.headers),
            query: from_nullable_mapping(&http.nullable_query, &http.query),
            params: from_nullable_mapping(&http.nullable_params, &http.params),
            body: from_rpc_http_body(http.body.as_deref()),
            raw_body: from_rpc_http_raw_body(http.body.as_deref()),
        }
    }

    /// Case-insensitive header lookup (keys are stored lower-cased by the
    /// host).
    pub fn get(&self, field: &str) -> Option<&str> {
        self.headers.get(&field.to_lowercase()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funcbridge_proto::messages::{TypedData, typed_data::Data};
    use serde_json::json;

    #[test]
    fn decodes_request_shape() {
        let http = RpcHttp {
            method: "POST".to_string(),
            url: "/api/items".to_string(),
            headers: HashMap::from([("content-type".to_string(), "application/json".to_string())]),
            body: Some(Box::new(TypedData::new(Data::Json(
                "{\"id\":7}".to_string(),
            )))),
            ..Default::default()
        };

        let request = Request::new(&http);
        assert_eq!(request.method, "POST");
        assert_eq!(request.original_url, "/api/items");
        assert_eq!(request.body, Value::Json(json!({"id": 7})));
        assert_eq!(request.raw_body, Some("{\"id\":7}".to_string()));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let http = RpcHttp {
            headers: HashMap::from([("x-token".to_string(), "abc".to_string())]),
            ..Default::default()
        };
        let request = Request::new(&http);
        assert_eq!(request.get("X-Token"), Some("abc"));
        assert_eq!(request.get("missing"), None);
    }
}
