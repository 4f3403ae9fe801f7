//! # Invocation context
//!
//! Assembles the per-invocation execution context from an inbound request
//! and the function's static metadata: decoded bindings, normalized
//! binding data, trace data, the leveled logger and the completion
//! callback.
//!
//! ## Lifecycle
//!
//! A context is built once per invocation, mutated freely while user code
//! runs (bindings map, response facade), and completes exactly once. The
//! completion gate delivers the result to the sink at most once; every
//! later completion attempt and every post-completion log call is degraded
//! to a System-category diagnostic instead of an error. These happen in
//! user-code timing windows where failing would be unrecoverable.
use crate::BoxError;
use crate::converters::binding_data::{convert_keys_to_camel_case, normalized_binding_data};
use crate::converters::typed_data::from_typed_data;
use crate::function_info::{BindingDefinition, FunctionInfo};
use crate::http::request::Request;
use crate::http::response::{Response, ResponseData};
use crate::value::Value;
use funcbridge_proto::messages::{
    InvocationRequest, RetryContext, RpcTraceContext,
    rpc_log::{Level, RpcLogCategory},
    typed_data::Data,
};
use serde_json::{Map, Value as JsonValue, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Delivers one log entry to the host; the sink owns transport and
/// formatting, this layer decides level, category, content and timing.
pub type LogCallback = Arc<dyn Fn(Level, RpcLogCategory, String) + Send + Sync>;

/// Receives the invocation outcome exactly once.
pub type ResultCallback = Box<dyn FnOnce(Option<BoxError>, InvocationResult) + Send>;

const DOUBLE_DONE_MSG: &str =
    "Error: 'done' has already been called. Please check your script for extraneous calls to 'done'.";
const PROMISE_MIX_MSG: &str =
    "Error: Choose either to return a promise or call 'done'. Do not use both in your script.";

/// W3C trace data propagated by the host; empty when the request carried
/// none.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TraceContext {
    pub trace_parent: String,
    pub trace_state: String,
    pub attributes: HashMap<String, String>,
}

impl From<Option<&RpcTraceContext>> for TraceContext {
    fn from(trace: Option<&RpcTraceContext>) -> Self {
        match trace {
            Some(trace) => Self {
                trace_parent: trace.trace_parent.clone(),
                trace_state: trace.trace_state.clone(),
                attributes: trace.attributes.clone(),
            },
            None => Self::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExecutionContext {
    pub invocation_id: String,
    pub function_name: String,
    pub function_directory: String,
    pub retry_context: Option<RetryContext>,
}

/// One slot of the bindings map. Decoded once, matched exhaustively at
/// output-encoding time.
#[derive(Clone, Debug, PartialEq)]
pub enum BindingSlot {
    Value(Value),
    HttpRequest(Arc<Request>),
    HttpResponse(ResponseData),
}

impl From<Value> for BindingSlot {
    fn from(value: Value) -> Self {
        BindingSlot::Value(value)
    }
}

/// The bindings map. Insertion order is preserved: it mirrors the
/// declaration order of the request's input bindings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    entries: Vec<(String, BindingSlot)>,
}

impl Bindings {
    pub fn insert(&mut self, name: &str, slot: BindingSlot) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = slot,
            None => self.entries.push((name.to_string(), slot)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&BindingSlot> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindingSlot)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What the completion gate hands the result sink.
#[derive(Debug)]
pub struct InvocationResult {
    pub return_value: Option<Value>,
    pub bindings: Bindings,
}

struct Completion {
    completed: bool,
    via_promise: bool,
    sink: Option<ResultCallback>,
}

struct ContextInner {
    invocation_id: String,
    execution_context: ExecutionContext,
    trace_context: TraceContext,
    binding_data: Map<String, JsonValue>,
    binding_definitions: Vec<BindingDefinition>,
    info: Arc<FunctionInfo>,
    log_callback: LogCallback,
    bindings: Mutex<Bindings>,
    request: Option<Arc<Request>>,
    response: Option<Arc<Mutex<ResponseData>>>,
    completion: Mutex<Completion>,
}

/// The per-invocation context handed to user code. Cheap to clone; all
/// clones share one underlying invocation state.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    pub fn invocation_id(&self) -> &str {
        &self.inner.invocation_id
    }

    pub fn execution_context(&self) -> &ExecutionContext {
        &self.inner.execution_context
    }

    pub fn trace_context(&self) -> &TraceContext {
        &self.inner.trace_context
    }

    /// Normalized binding data: trigger metadata plus, for HTTP triggers,
    /// the backward-compatible `sys` block and query/header backfill.
    pub fn binding_data(&self) -> &Map<String, JsonValue> {
        &self.inner.binding_data
    }

    pub fn binding_definitions(&self) -> &[BindingDefinition] {
        &self.inner.binding_definitions
    }

    pub fn bindings(&self) -> MutexGuard<'_, Bindings> {
        self.inner.bindings.lock().unwrap()
    }

    /// Convenience clone of one binding slot.
    pub fn binding(&self, name: &str) -> Option<BindingSlot> {
        self.bindings().get(name).cloned()
    }

    pub fn set_binding(&self, name: &str, value: Value) {
        self.bindings().insert(name, BindingSlot::Value(value));
    }

    /// The HTTP request facade, present when an HTTP-triggered input
    /// exists.
    pub fn req(&self) -> Option<Arc<Request>> {
        self.inner.request.clone()
    }

    /// The HTTP response facade, present when an HTTP input exists.
    /// Ending the response completes the invocation.
    pub fn res(&self) -> Option<Response> {
        let data = self.inner.response.clone()?;
        let ctx = self.clone();
        Some(Response::new(data, Arc::new(move || ctx.complete(None, None, false))))
    }

    /// The invocation-scoped logger.
    pub fn log(&self) -> Logger {
        Logger {
            inner: self.inner.clone(),
        }
    }

    /// Signals that the invocation has finished.
    ///
    /// Only the first completion is honored; later calls emit a
    /// System-category Error diagnostic and are otherwise no-ops.
    pub fn done(&self, err: Option<BoxError>, result: Option<Value>) {
        self.complete(err, result, false);
    }

    pub(crate) fn complete(&self, err: Option<BoxError>, result: Option<Value>, via_promise: bool) {
        let sink;
        let snapshot;
        {
            let mut completion = self.inner.completion.lock().unwrap();
            if completion.completed {
                // The message depends on how the second completion arrived.
                let message = if via_promise {
                    PROMISE_MIX_MSG
                } else {
                    DOUBLE_DONE_MSG
                };
                (self.inner.log_callback)(
                    Level::Error,
                    RpcLogCategory::System,
                    message.to_string(),
                );
                return;
            }
            completion.completed = true;
            completion.via_promise = via_promise;
            sink = completion.sink.take();

            let mut bindings = self.inner.bindings.lock().unwrap();
            // An HTTP output binding user code never set is satisfied from
            // the response facade.
            if let (Some(output_name), Some(response)) =
                (self.inner.info.http_output_name(), &self.inner.response)
            {
                if bindings.get(output_name).is_none() {
                    let data = response.lock().unwrap().clone();
                    bindings.insert(output_name, BindingSlot::HttpResponse(data));
                }
            }
            snapshot = bindings.clone();
        }

        if let Some(sink) = sink {
            sink(
                err,
                InvocationResult {
                    return_value: result,
                    bindings: snapshot,
                },
            );
        }
    }
}

/// The invocation logger: directly callable at Information level via
/// [`Logger::log`], with named leveled methods. All entries carry the
/// User category; logging after completion additionally emits one
/// System-category Warning entry first, every time.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<ContextInner>,
}

impl Logger {
    pub fn log(&self, message: impl Into<String>) {
        self.write(Level::Information, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.write(Level::Error, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.write(Level::Warning, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.write(Level::Information, message.into());
    }

    pub fn verbose(&self, message: impl Into<String>) {
        self.write(Level::Trace, message.into());
    }

    fn write(&self, level: Level, message: String) {
        if self.inner.completion.lock().unwrap().completed {
            let warning = format!(
                "Warning: Unexpected call to 'log' on the context object after function \
                 execution has completed. Please check for asynchronous calls that are not \
                 awaited or calls to 'done' made before function execution completes. \
                 Function name: {}. Invocation Id: {}.",
                self.inner.execution_context.function_name, self.inner.invocation_id
            );
            (self.inner.log_callback)(Level::Warning, RpcLogCategory::System, warning);
        }
        (self.inner.log_callback)(level, RpcLogCategory::User, message);
    }
}

/// Builds the context and the positional inputs for one invocation.
///
/// Every named input binding with data is decoded and stored both in the
/// bindings map and, in encounter order, in the returned inputs sequence.
/// HTTP payloads become the request facade; a binding matching the
/// declared timer-trigger name goes through the camelCase normalization
/// pass instead of the standard decoder.
pub fn create_context_and_inputs(
    info: Arc<FunctionInfo>,
    request: &InvocationRequest,
    log_callback: LogCallback,
    result_callback: ResultCallback,
) -> (Context, Vec<BindingSlot>) {
    let mut bindings = Bindings::default();
    let mut inputs = Vec::new();
    let mut http_input: Option<Arc<Request>> = None;

    for binding in &request.input_data {
        let Some(data) = &binding.data else { continue };
        if binding.name.is_empty() {
            continue;
        }

        let slot = match &data.data {
            Some(Data::Http(http)) => {
                let req = Arc::new(Request::new(http));
                if http_input.is_some() {
                    // More than one HTTP input is not a supported shape;
                    // the last one iterated wins.
                    tracing::debug!(binding = %binding.name, "replacing earlier http input");
                }
                http_input = Some(req.clone());
                BindingSlot::HttpRequest(req)
            }
            _ if info.timer_trigger_name() == Some(binding.name.as_str()) => {
                // Timer payload keys are camelCased, a quirk kept from
                // earlier workers.
                let decoded = from_typed_data(Some(data)).to_json();
                BindingSlot::Value(Value::Json(convert_keys_to_camel_case(&decoded)))
            }
            _ => BindingSlot::Value(from_typed_data(Some(data))),
        };

        bindings.insert(&binding.name, slot.clone());
        inputs.push(slot);
    }

    let mut binding_data = normalized_binding_data(request);
    let response = http_input.as_ref().map(|_| Arc::new(Mutex::new(ResponseData::default())));

    if let Some(req) = &http_input {
        // Kept for backwards compatibility with what hosts used to send.
        binding_data.insert(
            "sys".to_string(),
            json!({
                "methodName": info.name,
                "utcNow": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                "randGuid": uuid::Uuid::new_v4().to_string(),
            }),
        );
        if !binding_data.contains_key("query") {
            binding_data.insert("query".to_string(), string_map_to_json(&req.query));
        }
        if !binding_data.contains_key("headers") {
            binding_data.insert("headers".to_string(), string_map_to_json(&req.headers));
        }
    }

    let invocation_id = request.invocation_id.clone();
    let execution_context = ExecutionContext {
        invocation_id: invocation_id.clone(),
        function_name: info.name.clone(),
        function_directory: info.directory.clone(),
        retry_context: request.retry_context.clone(),
    };

    let context = Context {
        inner: Arc::new(ContextInner {
            invocation_id,
            execution_context,
            trace_context: TraceContext::from(request.trace_context.as_ref()),
            binding_data,
            binding_definitions: info.binding_definitions(),
            info,
            log_callback,
            bindings: Mutex::new(bindings),
            request: http_input,
            response,
            completion: Mutex::new(Completion {
                completed: false,
                via_promise: false,
                sink: Some(result_callback),
            }),
        }),
    };

    (context, inputs)
}

fn string_map_to_json(map: &HashMap<String, String>) -> JsonValue {
    JsonValue::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect(),
    )
}
