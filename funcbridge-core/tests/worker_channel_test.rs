use funcbridge_core::channel::WorkerChannel;
use funcbridge_core::environment::Environment;
use funcbridge_core::registry::{FunctionRegistry, HandlerOutcome};
use funcbridge_core::value::Value;
use funcbridge_proto::messages::{
    BindingInfo, InvocationRequest, ParameterBinding, RpcFunctionMetadata, RpcHttp,
    FunctionEnvironmentReloadRequest, FunctionLoadRequest, StreamingMessage, TypedData,
    WorkerInitRequest, WorkerStatusRequest, binding_info::Direction,
    rpc_log::{Level, RpcLogCategory},
    status_result::Status,
    streaming_message::Content,
    typed_data::Data,
};
use serde_json::json;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Records reloads and directory changes instead of touching the process.
#[derive(Default)]
struct RecordingEnvironment {
    reloads: Mutex<Vec<HashMap<String, String>>>,
    directories: Mutex<Vec<String>>,
}

impl Environment for RecordingEnvironment {
    fn reload(&self, variables: &HashMap<String, String>) {
        self.reloads.lock().unwrap().push(variables.clone());
    }

    fn change_directory(&self, directory: &str) -> io::Result<()> {
        self.directories.lock().unwrap().push(directory.to_string());
        Ok(())
    }
}

/// Both ends of a worker channel, seen from the host's side.
struct TestHost {
    to_worker: mpsc::UnboundedSender<StreamingMessage>,
    from_worker: mpsc::UnboundedReceiver<StreamingMessage>,
}

impl TestHost {
    fn send(&self, request_id: &str, content: Content) {
        self.to_worker
            .send(StreamingMessage::new(request_id, content))
            .expect("worker dropped its inbound stream");
    }

    async fn recv(&mut self) -> StreamingMessage {
        tokio::time::timeout(Duration::from_secs(5), self.from_worker.recv())
            .await
            .expect("timed out waiting for a worker message")
            .expect("worker dropped its outbound stream")
    }
}

fn spawn_channel(registry: FunctionRegistry, environment: Arc<dyn Environment>) -> TestHost {
    let (host_tx, worker_rx) = mpsc::unbounded_channel();
    let (worker_tx, host_rx) = mpsc::unbounded_channel();
    let channel = WorkerChannel::new("workerId", registry, environment, worker_tx);
    tokio::spawn(async move {
        let _ = channel.run(UnboundedReceiverStream::new(worker_rx)).await;
    });
    TestHost {
        to_worker: host_tx,
        from_worker: host_rx,
    }
}

fn http_metadata() -> RpcFunctionMetadata {
    RpcFunctionMetadata {
        name: "httpFunc".to_string(),
        directory: "/funcs/httpFunc".to_string(),
        bindings: HashMap::from([
            (
                "req".to_string(),
                BindingInfo {
                    r#type: "httpTrigger".to_string(),
                    direction: Direction::In as i32,
                    data_type: 0,
                },
            ),
            (
                "res".to_string(),
                BindingInfo {
                    r#type: "http".to_string(),
                    direction: Direction::Out as i32,
                    data_type: 0,
                },
            ),
        ]),
        ..Default::default()
    }
}

fn http_invocation(invocation_id: &str, function_id: &str) -> InvocationRequest {
    InvocationRequest {
        invocation_id: invocation_id.to_string(),
        function_id: function_id.to_string(),
        input_data: vec![ParameterBinding {
            name: "req".to_string(),
            data: Some(TypedData::new(Data::Http(Box::new(RpcHttp {
                method: "GET".to_string(),
                url: "/api/test".to_string(),
                query: HashMap::from([("name".to_string(), "world".to_string())]),
                ..Default::default()
            })))),
        }],
        ..Default::default()
    }
}

#[tokio::test]
async fn worker_init_reports_version_and_success() {
    let mut host = spawn_channel(
        FunctionRegistry::new(),
        Arc::new(RecordingEnvironment::default()),
    );

    host.send("init-1", Content::WorkerInitRequest(WorkerInitRequest::default()));
    let message = host.recv().await;

    assert_eq!(message.request_id, "init-1");
    let Some(Content::WorkerInitResponse(response)) = message.content else {
        panic!("expected a worker init response, got {:?}", message.content);
    };
    assert!(!response.worker_version.is_empty());
    assert_eq!(response.result.unwrap().status(), Status::Success);
}

#[tokio::test]
async fn worker_status_roundtrips_the_request_id() {
    let mut host = spawn_channel(
        FunctionRegistry::new(),
        Arc::new(RecordingEnvironment::default()),
    );

    host.send("status-1", Content::WorkerStatusRequest(WorkerStatusRequest::default()));
    let message = host.recv().await;

    assert_eq!(message.request_id, "status-1");
    assert!(matches!(
        message.content,
        Some(Content::WorkerStatusResponse(_))
    ));
}

#[tokio::test]
async fn environment_reload_logs_count_then_replies_success() {
    let environment = Arc::new(RecordingEnvironment::default());
    let mut host = spawn_channel(FunctionRegistry::new(), environment.clone());

    host.send(
        "id",
        Content::FunctionEnvironmentReloadRequest(FunctionEnvironmentReloadRequest {
            environment_variables: HashMap::from([
                ("hello".to_string(), "world".to_string()),
                ("SystemDrive".to_string(), "Q:".to_string()),
            ]),
            function_app_directory: String::new(),
        }),
    );

    let log = host.recv().await;
    let Some(Content::RpcLog(log)) = log.content else {
        panic!("expected the reload log first");
    };
    assert_eq!(
        log.message,
        "Reloading environment variables. Found 2 variables to reload."
    );
    assert_eq!(log.level(), Level::Information);
    assert_eq!(log.log_category(), RpcLogCategory::System);

    let response = host.recv().await;
    assert_eq!(response.request_id, "id");
    let Some(Content::FunctionEnvironmentReloadResponse(response)) = response.content else {
        panic!("expected a reload response");
    };
    assert_eq!(response.result.unwrap().status(), Status::Success);

    let reloads = environment.reloads.lock().unwrap();
    assert_eq!(reloads.len(), 1);
    assert_eq!(reloads[0].get("hello").map(String::as_str), Some("world"));
}

#[tokio::test]
async fn environment_reload_changes_directory_when_requested() {
    let environment = Arc::new(RecordingEnvironment::default());
    let mut host = spawn_channel(FunctionRegistry::new(), environment.clone());

    host.send(
        "id",
        Content::FunctionEnvironmentReloadRequest(FunctionEnvironmentReloadRequest {
            environment_variables: HashMap::new(),
            function_app_directory: "/".to_string(),
        }),
    );

    let reload_log = host.recv().await;
    let Some(Content::RpcLog(reload_log)) = reload_log.content else {
        panic!("expected the reload log first");
    };
    assert_eq!(
        reload_log.message,
        "Reloading environment variables. Found 0 variables to reload."
    );

    let cwd_log = host.recv().await;
    let Some(Content::RpcLog(cwd_log)) = cwd_log.content else {
        panic!("expected the directory change log");
    };
    assert_eq!(cwd_log.message, "Changing current working directory to /");
    assert_eq!(cwd_log.log_category(), RpcLogCategory::System);

    let response = host.recv().await;
    assert!(matches!(
        response.content,
        Some(Content::FunctionEnvironmentReloadResponse(_))
    ));
    assert_eq!(
        environment.directories.lock().unwrap().as_slice(),
        ["/".to_string()]
    );
}

#[tokio::test]
async fn unhandled_message_logs_a_system_error() {
    let mut host = spawn_channel(
        FunctionRegistry::new(),
        Arc::new(RecordingEnvironment::default()),
    );

    host.to_worker
        .send(StreamingMessage {
            request_id: "id".to_string(),
            content: None,
        })
        .unwrap();

    let log = host.recv().await;
    let Some(Content::RpcLog(log)) = log.content else {
        panic!("expected a system error log");
    };
    assert_eq!(
        log.message,
        "Worker workerId had no handler for message 'undefined'"
    );
    assert_eq!(log.level(), Level::Error);
    assert_eq!(log.log_category(), RpcLogCategory::System);
}

#[tokio::test]
async fn loading_an_unregistered_function_fails() {
    let mut host = spawn_channel(
        FunctionRegistry::new(),
        Arc::new(RecordingEnvironment::default()),
    );

    host.send(
        "load-1",
        Content::FunctionLoadRequest(FunctionLoadRequest {
            function_id: "fn-1".to_string(),
            metadata: Some(http_metadata()),
            managed_dependency_enabled: false,
        }),
    );

    let message = host.recv().await;
    let Some(Content::FunctionLoadResponse(response)) = message.content else {
        panic!("expected a function load response");
    };
    assert_eq!(response.function_id, "fn-1");
    let result = response.result.unwrap();
    assert_eq!(result.status(), Status::Failure);
    assert!(result.exception.unwrap().message.contains("httpFunc"));
}

#[tokio::test]
async fn http_invocation_through_the_response_facade() {
    let mut registry = FunctionRegistry::new();
    registry.register("httpFunc", |context, _inputs| async move {
        let request = context.req().expect("http function gets a request facade");
        let name = request.query.get("name").cloned().unwrap_or_default();
        context
            .res()
            .expect("http function gets a response facade")
            .status(200)
            .json(json!({ "hello": name }));
        Ok(HandlerOutcome::Explicit)
    });
    let mut host = spawn_channel(registry, Arc::new(RecordingEnvironment::default()));

    host.send(
        "load-1",
        Content::FunctionLoadRequest(FunctionLoadRequest {
            function_id: "fn-1".to_string(),
            metadata: Some(http_metadata()),
            managed_dependency_enabled: false,
        }),
    );
    let load = host.recv().await;
    let Some(Content::FunctionLoadResponse(load)) = load.content else {
        panic!("expected a function load response");
    };
    assert_eq!(load.result.unwrap().status(), Status::Success);

    host.send(
        "invoke-1",
        Content::InvocationRequest(http_invocation("inv-1", "fn-1")),
    );
    let message = host.recv().await;
    assert_eq!(message.request_id, "invoke-1");
    let Some(Content::InvocationResponse(response)) = message.content else {
        panic!("expected an invocation response");
    };
    assert_eq!(response.invocation_id, "inv-1");
    assert_eq!(response.result.unwrap().status(), Status::Success);

    let output = response
        .output_data
        .iter()
        .find(|binding| binding.name == "res")
        .expect("http output binding present");
    let Some(Data::Http(http)) = output.data.as_ref().and_then(|d| d.data.as_ref()) else {
        panic!("expected http output data");
    };
    assert_eq!(http.status_code, "200");
    assert_eq!(
        http.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
    let Some(Data::Json(body)) = http.body.as_ref().and_then(|b| b.data.as_ref()) else {
        panic!("expected a json body");
    };
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(body).unwrap(),
        json!({ "hello": "world" })
    );
}

#[tokio::test]
async fn returned_value_becomes_the_return_value() {
    let mut registry = FunctionRegistry::new();
    registry.register("plainFunc", |_context, _inputs| async move {
        Ok(HandlerOutcome::Return(Some(Value::Json(json!({ "n": 1 })))))
    });
    let mut host = spawn_channel(registry, Arc::new(RecordingEnvironment::default()));

    host.send(
        "load-1",
        Content::FunctionLoadRequest(FunctionLoadRequest {
            function_id: "fn-2".to_string(),
            metadata: Some(RpcFunctionMetadata {
                name: "plainFunc".to_string(),
                ..Default::default()
            }),
            managed_dependency_enabled: false,
        }),
    );
    host.recv().await;

    host.send(
        "invoke-1",
        Content::InvocationRequest(InvocationRequest {
            invocation_id: "inv-2".to_string(),
            function_id: "fn-2".to_string(),
            ..Default::default()
        }),
    );
    let message = host.recv().await;
    let Some(Content::InvocationResponse(response)) = message.content else {
        panic!("expected an invocation response");
    };
    assert_eq!(response.result.unwrap().status(), Status::Success);
    let Some(Data::Json(value)) = response.return_value.as_ref().and_then(|d| d.data.as_ref())
    else {
        panic!("expected a json return value");
    };
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(value).unwrap(),
        json!({ "n": 1 })
    );
}

#[tokio::test]
async fn handler_logs_carry_the_invocation_id() {
    let mut registry = FunctionRegistry::new();
    registry.register("loggingFunc", |context, _inputs| async move {
        context.log().info("about to finish");
        Ok(HandlerOutcome::Return(None))
    });
    let mut host = spawn_channel(registry, Arc::new(RecordingEnvironment::default()));

    host.send(
        "load-1",
        Content::FunctionLoadRequest(FunctionLoadRequest {
            function_id: "fn-3".to_string(),
            metadata: Some(RpcFunctionMetadata {
                name: "loggingFunc".to_string(),
                ..Default::default()
            }),
            managed_dependency_enabled: false,
        }),
    );
    host.recv().await;

    host.send(
        "invoke-1",
        Content::InvocationRequest(InvocationRequest {
            invocation_id: "inv-3".to_string(),
            function_id: "fn-3".to_string(),
            ..Default::default()
        }),
    );

    let log = host.recv().await;
    let Some(Content::RpcLog(log)) = log.content else {
        panic!("expected the handler log before the response");
    };
    assert_eq!(log.invocation_id, "inv-3");
    assert_eq!(log.message, "about to finish");
    assert_eq!(log.level(), Level::Information);
    assert_eq!(log.log_category(), RpcLogCategory::User);

    let message = host.recv().await;
    assert!(matches!(
        message.content,
        Some(Content::InvocationResponse(_))
    ));
}

#[tokio::test]
async fn invoking_an_unloaded_function_fails() {
    let mut host = spawn_channel(
        FunctionRegistry::new(),
        Arc::new(RecordingEnvironment::default()),
    );

    host.send(
        "invoke-1",
        Content::InvocationRequest(InvocationRequest {
            invocation_id: "inv-4".to_string(),
            function_id: "missing".to_string(),
            ..Default::default()
        }),
    );
    let message = host.recv().await;
    let Some(Content::InvocationResponse(response)) = message.content else {
        panic!("expected an invocation response");
    };
    let result = response.result.unwrap();
    assert_eq!(result.status(), Status::Failure);
    assert!(result.exception.unwrap().message.contains("missing"));
}

#[tokio::test]
async fn failing_handler_produces_a_failure_result() {
    let mut registry = FunctionRegistry::new();
    registry.register("failingFunc", |_context, _inputs| async move {
        Err("database unavailable".into())
    });
    let mut host = spawn_channel(registry, Arc::new(RecordingEnvironment::default()));

    host.send(
        "load-1",
        Content::FunctionLoadRequest(FunctionLoadRequest {
            function_id: "fn-5".to_string(),
            metadata: Some(RpcFunctionMetadata {
                name: "failingFunc".to_string(),
                ..Default::default()
            }),
            managed_dependency_enabled: false,
        }),
    );
    host.recv().await;

    host.send(
        "invoke-1",
        Content::InvocationRequest(InvocationRequest {
            invocation_id: "inv-5".to_string(),
            function_id: "fn-5".to_string(),
            ..Default::default()
        }),
    );
    let message = host.recv().await;
    let Some(Content::InvocationResponse(response)) = message.content else {
        panic!("expected an invocation response");
    };
    let result = response.result.unwrap();
    assert_eq!(result.status(), Status::Failure);
    assert_eq!(result.exception.unwrap().message, "database unavailable");
    assert!(response.output_data.is_empty());
}
