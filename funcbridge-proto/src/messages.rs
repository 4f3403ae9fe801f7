//! Protocol messages exchanged over the host's event stream.
//!
//! Tag numbers follow the host's published schema and must not be changed.
//! Nullable scalar wrappers (`NullableString` and friends) encode an
//! `optional` field, which is wire-identical to the single-variant `oneof`
//! the host declares them with.
use std::collections::HashMap;

/// The envelope multiplexed over the bidirectional event stream.
///
/// Every protocol interaction, in either direction, is one of these.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamingMessage {
    /// Used by the host to correlate responses with requests.
    #[prost(string, tag = "1")]
    pub request_id: String,
    #[prost(
        oneof = "streaming_message::Content",
        tags = "2, 4, 5, 8, 9, 12, 13, 16, 17, 20, 25, 26"
    )]
    pub content: Option<streaming_message::Content>,
}

pub mod streaming_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Content {
        #[prost(message, tag = "2")]
        RpcLog(super::RpcLog),
        #[prost(message, tag = "4")]
        InvocationRequest(super::InvocationRequest),
        #[prost(message, tag = "5")]
        InvocationResponse(super::InvocationResponse),
        #[prost(message, tag = "8")]
        FunctionLoadRequest(super::FunctionLoadRequest),
        #[prost(message, tag = "9")]
        FunctionLoadResponse(super::FunctionLoadResponse),
        #[prost(message, tag = "12")]
        WorkerStatusRequest(super::WorkerStatusRequest),
        #[prost(message, tag = "13")]
        WorkerStatusResponse(super::WorkerStatusResponse),
        #[prost(message, tag = "16")]
        WorkerInitResponse(super::WorkerInitResponse),
        #[prost(message, tag = "17")]
        WorkerInitRequest(super::WorkerInitRequest),
        #[prost(message, tag = "20")]
        StartStream(super::StartStream),
        #[prost(message, tag = "25")]
        FunctionEnvironmentReloadRequest(super::FunctionEnvironmentReloadRequest),
        #[prost(message, tag = "26")]
        FunctionEnvironmentReloadResponse(super::FunctionEnvironmentReloadResponse),
    }
}

impl StreamingMessage {
    /// Builds an envelope carrying `content`, correlated to `request_id`.
    pub fn new(request_id: impl Into<String>, content: streaming_message::Content) -> Self {
        Self {
            request_id: request_id.into(),
            content: Some(content),
        }
    }

    /// Builds an uncorrelated envelope (logs, stream handshake).
    pub fn of(content: streaming_message::Content) -> Self {
        Self {
            request_id: String::new(),
            content: Some(content),
        }
    }
}

/// First message sent by the worker, identifying itself to the host.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StartStream {
    #[prost(string, tag = "2")]
    pub worker_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkerInitRequest {
    #[prost(string, tag = "1")]
    pub host_version: String,
    #[prost(map = "string, string", tag = "2")]
    pub capabilities: HashMap<String, String>,
    #[prost(map = "string, string", tag = "3")]
    pub log_categories: HashMap<String, String>,
    #[prost(string, tag = "4")]
    pub worker_directory: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkerInitResponse {
    #[prost(string, tag = "1")]
    pub worker_version: String,
    #[prost(map = "string, string", tag = "2")]
    pub capabilities: HashMap<String, String>,
    #[prost(message, optional, tag = "3")]
    pub result: Option<StatusResult>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkerStatusRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkerStatusResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FunctionLoadRequest {
    /// Host-assigned id under which the function is later invoked.
    #[prost(string, tag = "1")]
    pub function_id: String,
    #[prost(message, optional, tag = "2")]
    pub metadata: Option<RpcFunctionMetadata>,
    #[prost(bool, tag = "3")]
    pub managed_dependency_enabled: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FunctionLoadResponse {
    #[prost(string, tag = "1")]
    pub function_id: String,
    #[prost(message, optional, tag = "2")]
    pub result: Option<StatusResult>,
}

/// Static function metadata sent by the host at load time.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcFunctionMetadata {
    #[prost(string, tag = "1")]
    pub directory: String,
    #[prost(string, tag = "2")]
    pub script_file: String,
    #[prost(string, tag = "3")]
    pub entry_point: String,
    #[prost(string, tag = "4")]
    pub name: String,
    #[prost(map = "string, message", tag = "6")]
    pub bindings: HashMap<String, BindingInfo>,
}

/// One declared data slot of a function (name is the map key in
/// [`RpcFunctionMetadata::bindings`]).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BindingInfo {
    #[prost(string, tag = "2")]
    pub r#type: String,
    #[prost(enumeration = "binding_info::Direction", tag = "3")]
    pub direction: i32,
    #[prost(enumeration = "binding_info::DataType", tag = "4")]
    pub data_type: i32,
}

pub mod binding_info {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Direction {
        In = 0,
        Out = 1,
        Inout = 2,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum DataType {
        Undefined = 0,
        String = 1,
        Binary = 2,
        Stream = 3,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InvocationRequest {
    #[prost(string, tag = "1")]
    pub invocation_id: String,
    #[prost(string, tag = "2")]
    pub function_id: String,
    /// Ordered: declaration order of the function's input bindings.
    #[prost(message, repeated, tag = "3")]
    pub input_data: Vec<ParameterBinding>,
    #[prost(map = "string, message", tag = "4")]
    pub trigger_metadata: HashMap<String, TypedData>,
    #[prost(message, optional, tag = "5")]
    pub trace_context: Option<RpcTraceContext>,
    #[prost(message, optional, tag = "6")]
    pub retry_context: Option<RetryContext>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InvocationResponse {
    #[prost(string, tag = "1")]
    pub invocation_id: String,
    #[prost(message, repeated, tag = "2")]
    pub output_data: Vec<ParameterBinding>,
    #[prost(message, optional, tag = "3")]
    pub result: Option<StatusResult>,
    #[prost(message, optional, tag = "4")]
    pub return_value: Option<TypedData>,
}

/// A named value crossing the boundary in either direction.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ParameterBinding {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub data: Option<TypedData>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcTraceContext {
    #[prost(string, tag = "1")]
    pub trace_parent: String,
    #[prost(string, tag = "2")]
    pub trace_state: String,
    #[prost(map = "string, string", tag = "3")]
    pub attributes: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RetryContext {
    #[prost(int32, tag = "1")]
    pub retry_count: i32,
    #[prost(int32, tag = "2")]
    pub max_retry_count: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StatusResult {
    #[prost(enumeration = "status_result::Status", tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub result: String,
    #[prost(message, optional, tag = "3")]
    pub exception: Option<RpcException>,
    #[prost(message, repeated, tag = "4")]
    pub logs: Vec<RpcLog>,
}

pub mod status_result {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Status {
        Failure = 0,
        Success = 1,
        Cancelled = 2,
    }
}

impl StatusResult {
    pub fn success() -> Self {
        Self {
            status: status_result::Status::Success as i32,
            ..Default::default()
        }
    }

    pub fn failure(exception: RpcException) -> Self {
        Self {
            status: status_result::Status::Failure as i32,
            exception: Some(exception),
            ..Default::default()
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcException {
    #[prost(string, tag = "1")]
    pub stack_trace: String,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(string, tag = "3")]
    pub source: String,
}

/// A log entry streamed from the worker to the host.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcLog {
    /// Set when the entry is tied to one function invocation.
    #[prost(string, tag = "1")]
    pub invocation_id: String,
    #[prost(string, tag = "2")]
    pub category: String,
    #[prost(int32, tag = "3")]
    pub level: i32,
    #[prost(string, tag = "4")]
    pub message: String,
    #[prost(string, tag = "5")]
    pub event_id: String,
    #[prost(message, optional, tag = "6")]
    pub exception: Option<RpcException>,
    #[prost(enumeration = "rpc_log::RpcLogCategory", tag = "8")]
    pub log_category: i32,
}

pub mod rpc_log {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Level {
        Trace = 0,
        Debug = 1,
        Information = 2,
        Warning = 3,
        Error = 4,
        Critical = 5,
        None = 6,
    }

    /// Whether an entry originates from user code or from the worker itself.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum RpcLogCategory {
        User = 0,
        System = 1,
    }
}

impl RpcLog {
    pub fn level(&self) -> rpc_log::Level {
        rpc_log::Level::try_from(self.level).unwrap_or(rpc_log::Level::None)
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FunctionEnvironmentReloadRequest {
    #[prost(map = "string, string", tag = "1")]
    pub environment_variables: HashMap<String, String>,
    #[prost(string, tag = "2")]
    pub function_app_directory: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FunctionEnvironmentReloadResponse {
    #[prost(message, optional, tag = "3")]
    pub result: Option<StatusResult>,
}

/// The tagged union carrying any value across the host/runtime boundary.
///
/// At most one variant is set; an unset union represents an absent value.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TypedData {
    #[prost(oneof = "typed_data::Data", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11")]
    pub data: Option<typed_data::Data>,
}

pub mod typed_data {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Data {
        #[prost(string, tag = "1")]
        String(String),
        /// A string the host already knows to be JSON.
        #[prost(string, tag = "2")]
        Json(String),
        #[prost(bytes, tag = "3")]
        Bytes(Vec<u8>),
        #[prost(bytes, tag = "4")]
        Stream(Vec<u8>),
        #[prost(message, tag = "5")]
        Http(Box<super::RpcHttp>),
        #[prost(sint64, tag = "6")]
        Int(i64),
        #[prost(double, tag = "7")]
        Double(f64),
        #[prost(message, tag = "8")]
        CollectionBytes(super::CollectionBytes),
        #[prost(message, tag = "9")]
        CollectionString(super::CollectionString),
        #[prost(message, tag = "10")]
        CollectionDouble(super::CollectionDouble),
        #[prost(message, tag = "11")]
        CollectionSint64(super::CollectionSInt64),
    }
}

impl TypedData {
    pub fn new(data: typed_data::Data) -> Self {
        Self { data: Some(data) }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CollectionBytes {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub bytes: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CollectionString {
    #[prost(string, repeated, tag = "1")]
    pub string: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CollectionDouble {
    #[prost(double, repeated, tag = "1")]
    pub double: Vec<f64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CollectionSInt64 {
    #[prost(sint64, repeated, tag = "1")]
    pub sint64: Vec<i64>,
}

/// A structured HTTP request or response crossing the boundary.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcHttp {
    #[prost(string, tag = "1")]
    pub method: String,
    #[prost(string, tag = "2")]
    pub url: String,
    /// Legacy non-nullable header map, kept for backward compatibility.
    #[prost(map = "string, string", tag = "3")]
    pub headers: HashMap<String, String>,
    #[prost(message, optional, boxed, tag = "4")]
    pub body: Option<Box<TypedData>>,
    #[prost(map = "string, string", tag = "10")]
    pub params: HashMap<String, String>,
    #[prost(string, tag = "12")]
    pub status_code: String,
    #[prost(map = "string, string", tag = "15")]
    pub query: HashMap<String, String>,
    #[prost(bool, tag = "16")]
    pub enable_content_negotiation: bool,
    #[prost(message, optional, boxed, tag = "17")]
    pub raw_body: Option<Box<TypedData>>,
    #[prost(message, repeated, tag = "19")]
    pub cookies: Vec<RpcHttpCookie>,
    #[prost(map = "string, message", tag = "20")]
    pub nullable_headers: HashMap<String, NullableString>,
    #[prost(map = "string, message", tag = "21")]
    pub nullable_params: HashMap<String, NullableString>,
    #[prost(map = "string, message", tag = "22")]
    pub nullable_query: HashMap<String, NullableString>,
}

/// One `Set-Cookie` entry on an outgoing HTTP response (RFC 6265).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcHttpCookie {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub value: String,
    #[prost(message, optional, tag = "3")]
    pub domain: Option<NullableString>,
    #[prost(message, optional, tag = "4")]
    pub path: Option<NullableString>,
    #[prost(message, optional, tag = "5")]
    pub expires: Option<NullableTimestamp>,
    #[prost(message, optional, tag = "6")]
    pub secure: Option<NullableBool>,
    #[prost(message, optional, tag = "7")]
    pub http_only: Option<NullableBool>,
    #[prost(enumeration = "rpc_http_cookie::SameSite", tag = "8")]
    pub same_site: i32,
    #[prost(message, optional, tag = "9")]
    pub max_age: Option<NullableDouble>,
}

pub mod rpc_http_cookie {
    /// Wire values are part of the host contract and must not be renumbered.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum SameSite {
        None = 0,
        Lax = 1,
        Strict = 2,
        ExplicitNone = 3,
    }
}

/// Optional string distinguishing "absent" from "empty".
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NullableString {
    #[prost(string, optional, tag = "1")]
    pub value: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NullableBool {
    #[prost(bool, optional, tag = "1")]
    pub value: Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NullableDouble {
    #[prost(double, optional, tag = "1")]
    pub value: Option<f64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NullableTimestamp {
    #[prost(message, optional, tag = "1")]
    pub value: Option<::prost_types::Timestamp>,
}
