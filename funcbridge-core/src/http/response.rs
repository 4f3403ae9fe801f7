//! Mutable, chainable view over an outgoing HTTP response.
use super::{header, media_type};
use crate::converters::typed_data::ConversionError;
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The structured data of an outgoing HTTP response.
///
/// Known fields are typed; arbitrary extra header values stay in the
/// explicit `headers` map rather than on an open-ended object.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseData {
    /// A string or number, stringified at encode time.
    pub status_code: Option<JsonValue>,
    pub headers: HashMap<String, JsonValue>,
    pub cookies: Vec<JsonValue>,
    pub body: Value,
    pub enable_content_negotiation: bool,
}

impl Default for ResponseData {
    fn default() -> Self {
        Self {
            status_code: None,
            headers: HashMap::new(),
            cookies: Vec::new(),
            body: Value::Unset,
            enable_content_negotiation: false,
        }
    }
}

impl ResponseData {
    /// Interprets a loosely-typed binding value as a response shape.
    ///
    /// Anything but a JSON object fails with
    /// [`ConversionError::InvalidResponseShape`]: arrays and scalars
    /// cannot carry `body`/`statusCode`/`headers` fields.
    pub fn from_value(value: &Value) -> Result<Self, ConversionError> {
        let Value::Json(JsonValue::Object(map)) = value else {
            return Err(ConversionError::InvalidResponseShape);
        };

        let not_null = |v: &&JsonValue| !v.is_null();
        // `statusCode` wins over the `status` alias, checked in that order.
        let status_code = map
            .get("statusCode")
            .filter(not_null)
            .or_else(|| map.get("status").filter(not_null))
            .cloned();

        let headers = match map.get("headers") {
            Some(JsonValue::Object(headers)) => headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => HashMap::new(),
        };

        let cookies = match map.get("cookies") {
            Some(JsonValue::Array(cookies)) => cookies.clone(),
            _ => Vec::new(),
        };

        Ok(Self {
            status_code,
            headers,
            cookies,
            body: map
                .get("body")
                .filter(not_null)
                .map(|b| Value::Json(b.clone()))
                .unwrap_or(Value::Unset),
            enable_content_negotiation: map
                .get("enableContentNegotiation")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
        })
    }
}

type DoneFn = Arc<dyn Fn() + Send + Sync>;

/// The chainable response builder handed to user code.
///
/// All mutators lower-case header keys. [`Response::end`] (and its `send`
/// alias) fires the invocation's completion callback, so everything set
/// afterwards is invisible to the host.
#[derive(Clone)]
pub struct Response {
    data: Arc<Mutex<ResponseData>>,
    done: DoneFn,
}

impl Response {
    pub(crate) fn new(data: Arc<Mutex<ResponseData>>, done: DoneFn) -> Self {
        Self { data, done }
    }

    /// Sets a header under its lower-cased key.
    pub fn set(&mut self, field: &str, val: impl Into<JsonValue>) -> &mut Self {
        self.data
            .lock()
            .unwrap()
            .headers
            .insert(field.to_lowercase(), val.into());
        self
    }

    /// Alias for [`Response::set`].
    pub fn header(&mut self, field: &str, val: impl Into<JsonValue>) -> &mut Self {
        self.set(field, val)
    }

    /// Reads a header back under its lower-cased key.
    pub fn get(&self, field: &str) -> Option<JsonValue> {
        self.data
            .lock()
            .unwrap()
            .headers
            .get(&field.to_lowercase())
            .cloned()
    }

    /// Alias for [`Response::get`].
    pub fn get_header(&self, field: &str) -> Option<JsonValue> {
        self.get(field)
    }

    pub fn remove_header(&mut self, field: &str) -> &mut Self {
        self.data
            .lock()
            .unwrap()
            .headers
            .remove(&field.to_lowercase());
        self
    }

    pub fn status(&mut self, code: impl Into<JsonValue>) -> &mut Self {
        self.data.lock().unwrap().status_code = Some(code.into());
        self
    }

    pub fn body(&mut self, body: impl Into<Value>) -> &mut Self {
        self.data.lock().unwrap().body = body.into();
        self
    }

    /// Appends a `Set-Cookie` entry.
    pub fn cookie(&mut self, cookie: JsonValue) -> &mut Self {
        self.data.lock().unwrap().cookies.push(cookie);
        self
    }

    /// Finalizes the response: an explicit body overwrites the stored one,
    /// a content-type default is applied, and the completion callback
    /// fires.
    pub fn end(&mut self, body: Option<Value>) -> &mut Self {
        {
            let mut data = self.data.lock().unwrap();
            if let Some(body) = body {
                data.body = body;
            }
            set_default_content_type(&mut data);
        }
        (self.done)();
        self
    }

    /// Alias for [`Response::end`].
    pub fn send(&mut self, body: Option<Value>) -> &mut Self {
        self.end(body)
    }

    /// Sets the JSON content type, then sends `body`.
    pub fn json(&mut self, body: impl Into<Value>) -> &mut Self {
        self.set(header::CONTENT_TYPE, media_type::JSON);
        self.send(Some(body.into()))
    }

    /// Sets the status, then ends with no body.
    pub fn send_status(&mut self, code: impl Into<JsonValue>) -> &mut Self {
        self.status(code);
        self.end(None)
    }

    pub(crate) fn data(&self) -> ResponseData {
        self.data.lock().unwrap().clone()
    }
}

// A byte-buffer body with no explicit content type defaults to the
// octet-stream media type; user-set headers always win.
fn set_default_content_type(data: &mut ResponseData) {
    if data.body.is_unset() || data.headers.contains_key(header::CONTENT_TYPE) {
        return;
    }
    if matches!(data.body, Value::Bytes(_)) {
        data.headers.insert(
            header::CONTENT_TYPE.to_string(),
            JsonValue::String(media_type::OCTET_STREAM.to_string()),
        );
    }
}
