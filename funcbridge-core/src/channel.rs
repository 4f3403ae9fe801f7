//! Dispatch loop between the host's event stream and worker state.
//!
//! One channel owns one event stream: it consumes inbound envelopes,
//! answers lifecycle requests inline, and spawns a task per invocation.
//! Responses and log entries go out through a shared unbounded sender so
//! an invocation can interleave logs with other traffic without holding
//! the dispatch loop.
use crate::BoxError;
use crate::context::{
    BindingSlot, InvocationResult, LogCallback, ResultCallback, create_context_and_inputs,
};
use crate::converters::http::to_rpc_http;
use crate::converters::typed_data::{ConversionError, to_typed_data};
use crate::environment::Environment;
use crate::function_info::FunctionInfo;
use crate::http::response::ResponseData;
use crate::registry::{FunctionRegistry, Handler, HandlerOutcome};
use funcbridge_proto::messages::{
    FunctionEnvironmentReloadRequest, FunctionEnvironmentReloadResponse, FunctionLoadRequest,
    FunctionLoadResponse, InvocationRequest, InvocationResponse, ParameterBinding, RpcException,
    RpcLog, StatusResult, StreamingMessage, TypedData, WorkerInitResponse, WorkerStatusResponse,
    rpc_log::{Level, RpcLogCategory},
    streaming_message::Content,
};
use std::collections::HashMap;
use std::pin::pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The transport dropped the outbound receiver.
    #[error("outbound event stream closed")]
    OutboundClosed,
}

#[derive(Clone)]
struct LoadedFunction {
    info: Arc<FunctionInfo>,
    handler: Handler,
}

/// Worker-side endpoint of one event stream.
pub struct WorkerChannel {
    worker_id: String,
    registry: FunctionRegistry,
    environment: Arc<dyn Environment>,
    loaded: HashMap<String, LoadedFunction>,
    outbound: mpsc::UnboundedSender<StreamingMessage>,
}

impl WorkerChannel {
    pub fn new(
        worker_id: impl Into<String>,
        registry: FunctionRegistry,
        environment: Arc<dyn Environment>,
        outbound: mpsc::UnboundedSender<StreamingMessage>,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            registry,
            environment,
            loaded: HashMap::new(),
            outbound,
        }
    }

    /// Consumes the inbound stream until the host closes it.
    pub async fn run<S>(mut self, inbound: S) -> Result<(), ChannelError>
    where
        S: Stream<Item = StreamingMessage>,
    {
        let mut inbound = pin!(inbound);
        while let Some(message) = inbound.next().await {
            self.dispatch(message)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, message: StreamingMessage) -> Result<(), ChannelError> {
        let request_id = message.request_id;
        match message.content {
            Some(Content::WorkerInitRequest(_)) => self.worker_init(request_id),
            Some(Content::WorkerStatusRequest(_)) => self.worker_status(request_id),
            Some(Content::FunctionLoadRequest(request)) => self.function_load(request_id, request),
            Some(Content::InvocationRequest(request)) => self.invoke(request_id, request),
            Some(Content::FunctionEnvironmentReloadRequest(request)) => {
                self.environment_reload(request_id, request)
            }
            other => self.log_system(
                Level::Error,
                format!(
                    "Worker {} had no handler for message '{}'",
                    self.worker_id,
                    message_kind(other.as_ref())
                ),
            ),
        }
    }

    fn worker_init(&self, request_id: String) -> Result<(), ChannelError> {
        self.send(StreamingMessage::new(
            request_id,
            Content::WorkerInitResponse(WorkerInitResponse {
                worker_version: env!("CARGO_PKG_VERSION").to_string(),
                capabilities: HashMap::new(),
                result: Some(StatusResult::success()),
            }),
        ))
    }

    fn worker_status(&self, request_id: String) -> Result<(), ChannelError> {
        self.send(StreamingMessage::new(
            request_id,
            Content::WorkerStatusResponse(WorkerStatusResponse {}),
        ))
    }

    fn function_load(
        &mut self,
        request_id: String,
        request: FunctionLoadRequest,
    ) -> Result<(), ChannelError> {
        let function_id = request.function_id;
        let result = match &request.metadata {
            Some(metadata) => match self.registry.get(&metadata.name) {
                Some(handler) => {
                    let info = Arc::new(FunctionInfo::new(metadata));
                    self.loaded
                        .insert(function_id.clone(), LoadedFunction { info, handler });
                    StatusResult::success()
                }
                None => StatusResult::failure(RpcException {
                    message: format!(
                        "Worker was unable to load function '{}': no function is registered under that name",
                        metadata.name
                    ),
                    ..Default::default()
                }),
            },
            None => StatusResult::failure(RpcException {
                message: "Function load request carried no metadata".to_string(),
                ..Default::default()
            }),
        };
        self.send(StreamingMessage::new(
            request_id,
            Content::FunctionLoadResponse(FunctionLoadResponse {
                function_id,
                result: Some(result),
            }),
        ))
    }

    fn invoke(&self, request_id: String, request: InvocationRequest) -> Result<(), ChannelError> {
        let Some(function) = self.loaded.get(&request.function_id).cloned() else {
            return self.send(StreamingMessage::new(
                request_id,
                Content::InvocationResponse(InvocationResponse {
                    invocation_id: request.invocation_id,
                    result: Some(StatusResult::failure(RpcException {
                        message: format!(
                            "Worker could not find function with id '{}'",
                            request.function_id
                        ),
                        ..Default::default()
                    })),
                    ..Default::default()
                }),
            ));
        };

        let invocation_id = request.invocation_id.clone();
        let log_outbound = self.outbound.clone();
        let log_invocation_id = invocation_id.clone();
        let log_callback: LogCallback = Arc::new(move |level, category, message| {
            // A closed transport also fails the response send; logs are
            // best effort.
            let _ = log_outbound.send(StreamingMessage::of(Content::RpcLog(RpcLog {
                invocation_id: log_invocation_id.clone(),
                level: level as i32,
                log_category: category as i32,
                message,
                ..Default::default()
            })));
        });

        let outbound = self.outbound.clone();
        let info = function.info.clone();
        let result_callback: ResultCallback = Box::new(move |err, result| {
            let response = encode_invocation_response(&info, invocation_id, err, result);
            let _ = outbound.send(StreamingMessage::new(
                request_id,
                Content::InvocationResponse(response),
            ));
        });

        let (context, inputs) =
            create_context_and_inputs(function.info, &request, log_callback, result_callback);
        let handler = function.handler;
        tokio::spawn(async move {
            match handler(context.clone(), inputs).await {
                Ok(HandlerOutcome::Return(value)) => context.complete(None, value, true),
                Ok(HandlerOutcome::Explicit) => {}
                Err(err) => context.complete(Some(err), None, true),
            }
        });
        Ok(())
    }

    fn environment_reload(
        &self,
        request_id: String,
        request: FunctionEnvironmentReloadRequest,
    ) -> Result<(), ChannelError> {
        self.log_system(
            Level::Information,
            format!(
                "Reloading environment variables. Found {} variables to reload.",
                request.environment_variables.len()
            ),
        )?;
        self.environment.reload(&request.environment_variables);

        let result = if request.function_app_directory.is_empty() {
            StatusResult::success()
        } else {
            self.log_system(
                Level::Information,
                format!(
                    "Changing current working directory to {}",
                    request.function_app_directory
                ),
            )?;
            match self
                .environment
                .change_directory(&request.function_app_directory)
            {
                Ok(()) => StatusResult::success(),
                Err(err) => StatusResult::failure(RpcException {
                    message: err.to_string(),
                    ..Default::default()
                }),
            }
        };

        self.send(StreamingMessage::new(
            request_id,
            Content::FunctionEnvironmentReloadResponse(FunctionEnvironmentReloadResponse {
                result: Some(result),
            }),
        ))
    }

    fn log_system(&self, level: Level, message: String) -> Result<(), ChannelError> {
        self.send(StreamingMessage::of(Content::RpcLog(RpcLog {
            level: level as i32,
            log_category: RpcLogCategory::System as i32,
            message,
            ..Default::default()
        })))
    }

    fn send(&self, message: StreamingMessage) -> Result<(), ChannelError> {
        self.outbound
            .send(message)
            .map_err(|_| ChannelError::OutboundClosed)
    }
}

/// Turns an invocation outcome into the wire response.
///
/// A handler error wins over any bindings: Failure result, no output
/// data. Output encoding failures degrade the same way.
fn encode_invocation_response(
    info: &FunctionInfo,
    invocation_id: String,
    err: Option<BoxError>,
    result: InvocationResult,
) -> InvocationResponse {
    if let Some(err) = err {
        return InvocationResponse {
            invocation_id,
            result: Some(StatusResult::failure(RpcException {
                message: err.to_string(),
                stack_trace: format!("{err:?}"),
                ..Default::default()
            })),
            ..Default::default()
        };
    }

    match encode_outputs(info, &result) {
        Ok((output_data, return_value)) => InvocationResponse {
            invocation_id,
            output_data,
            result: Some(StatusResult::success()),
            return_value,
        },
        Err(err) => InvocationResponse {
            invocation_id,
            result: Some(StatusResult::failure(RpcException {
                message: err.to_string(),
                ..Default::default()
            })),
            ..Default::default()
        },
    }
}

fn encode_outputs(
    info: &FunctionInfo,
    result: &InvocationResult,
) -> Result<(Vec<ParameterBinding>, Option<TypedData>), ConversionError> {
    let mut output_data = Vec::new();
    for (name, _) in info.output_bindings() {
        let Some(slot) = result.bindings.get(name) else {
            continue;
        };
        let data = match slot {
            // A plain value in the HTTP output slot is interpreted as a
            // response shape, not passed through as typed data.
            BindingSlot::Value(value) if info.http_output_name() == Some(name) => {
                to_rpc_http(&ResponseData::from_value(value)?)?
            }
            BindingSlot::Value(value) => to_typed_data(value)?,
            BindingSlot::HttpResponse(data) => to_rpc_http(data)?,
            // An input facade never encodes as an output.
            BindingSlot::HttpRequest(_) => continue,
        };
        output_data.push(ParameterBinding {
            name: name.to_string(),
            data: Some(data),
        });
    }

    let return_value = match &result.return_value {
        Some(value) if !value.is_unset() => Some(to_typed_data(value)?),
        _ => None,
    };
    Ok((output_data, return_value))
}

fn message_kind(content: Option<&Content>) -> &'static str {
    match content {
        None => "undefined",
        Some(Content::RpcLog(_)) => "rpcLog",
        Some(Content::InvocationRequest(_)) => "invocationRequest",
        Some(Content::InvocationResponse(_)) => "invocationResponse",
        Some(Content::FunctionLoadRequest(_)) => "functionLoadRequest",
        Some(Content::FunctionLoadResponse(_)) => "functionLoadResponse",
        Some(Content::WorkerStatusRequest(_)) => "workerStatusRequest",
        Some(Content::WorkerStatusResponse(_)) => "workerStatusResponse",
        Some(Content::WorkerInitRequest(_)) => "workerInitRequest",
        Some(Content::WorkerInitResponse(_)) => "workerInitResponse",
        Some(Content::StartStream(_)) => "startStream",
        Some(Content::FunctionEnvironmentReloadRequest(_)) => "functionEnvironmentReloadRequest",
        Some(Content::FunctionEnvironmentReloadResponse(_)) => "functionEnvironmentReloadResponse",
    }
}
