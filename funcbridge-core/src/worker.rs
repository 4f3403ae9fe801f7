//! Top-level worker lifecycle: dial the host, send the `StartStream`
//! handshake, then hand the stream to the channel until the host closes
//! it.
use crate::channel::{ChannelError, WorkerChannel};
use crate::environment::{Environment, SystemEnvironment};
use crate::grpc::client::{ClientConnectError, EventStreamError, HostClient};
use crate::registry::FunctionRegistry;
use funcbridge_proto::messages::{StartStream, StreamingMessage, streaming_message::Content};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{StreamExt, wrappers::UnboundedReceiverStream};

#[derive(thiserror::Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Connect(#[from] ClientConnectError),
    #[error(transparent)]
    EventStream(#[from] EventStreamError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// A language worker: an id, a set of registered functions and the
/// environment it mutates on reload requests.
pub struct Worker {
    worker_id: String,
    registry: FunctionRegistry,
    environment: Arc<dyn Environment>,
}

impl Worker {
    pub fn new(worker_id: impl Into<String>, registry: FunctionRegistry) -> Self {
        Self {
            worker_id: worker_id.into(),
            registry,
            environment: Arc::new(SystemEnvironment),
        }
    }

    pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = environment;
        self
    }

    /// Connects to the host at `uri` and serves the event stream until
    /// the host closes it.
    pub async fn run(self, uri: &str) -> Result<(), WorkerError> {
        let mut client = HostClient::connect(uri).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(StreamingMessage::of(Content::StartStream(StartStream {
            worker_id: self.worker_id.clone(),
        })))
        .map_err(|_| ChannelError::OutboundClosed)?;

        let inbound = client
            .event_stream(UnboundedReceiverStream::new(rx))
            .await?;
        let inbound = inbound.filter_map(|element| match element {
            Ok(message) => Some(message),
            Err(status) => {
                tracing::warn!(%status, "dropping failed event stream element");
                None
            }
        });

        let channel = WorkerChannel::new(self.worker_id, self.registry, self.environment, tx);
        channel.run(inbound).await?;
        Ok(())
    }
}
