//! # Host client
//!
//! Opens the bidirectional `EventStream` call against the function host.
//! The host side is the gRPC server; the worker dials in, sends its
//! handshake as the first stream element, and everything afterwards is
//! multiplexed [`StreamingMessage`] envelopes in both directions.
use crate::BoxError;
use funcbridge_proto::{EVENT_STREAM_PATH, messages::StreamingMessage};
use futures_util::Stream;
use http::uri::PathAndQuery;
use tonic::Streaming;
use tonic::transport::{Channel, Endpoint};
use tonic_prost::ProstCodec;

#[derive(thiserror::Error, Debug)]
pub enum ClientConnectError {
    #[error("Invalid host endpoint '{uri}': '{source}'")]
    InvalidEndpoint {
        uri: String,
        source: tonic::transport::Error,
    },
    #[error("Failed to connect to host at '{uri}': '{source}'")]
    ConnectFailed {
        uri: String,
        source: tonic::transport::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum EventStreamError {
    #[error("Internal error, the client was not ready: '{0}'")]
    ClientNotReady(#[source] BoxError),
    #[error("Host rejected the event stream: '{0}'")]
    Rejected(#[source] tonic::Status),
}

/// Connection to one function host.
pub struct HostClient {
    client: tonic::client::Grpc<Channel>,
}

impl HostClient {
    /// Dials the host over plain HTTP/2.
    pub async fn connect(uri: &str) -> Result<Self, ClientConnectError> {
        let endpoint = Endpoint::from_shared(uri.to_string()).map_err(|source| {
            ClientConnectError::InvalidEndpoint {
                uri: uri.to_string(),
                source,
            }
        })?;
        let channel =
            endpoint
                .connect()
                .await
                .map_err(|source| ClientConnectError::ConnectFailed {
                    uri: uri.to_string(),
                    source,
                })?;
        Ok(Self::new(channel))
    }

    pub fn new(channel: Channel) -> Self {
        Self {
            client: tonic::client::Grpc::new(channel),
        }
    }

    /// Opens the event stream.
    ///
    /// `outbound` must yield the `StartStream` handshake first; the host
    /// ignores the stream otherwise.
    pub async fn event_stream(
        &mut self,
        outbound: impl Stream<Item = StreamingMessage> + Send + 'static,
    ) -> Result<Streaming<StreamingMessage>, EventStreamError> {
        self.client
            .ready()
            .await
            .map_err(|e| EventStreamError::ClientNotReady(e.into()))?;

        let codec: ProstCodec<StreamingMessage, StreamingMessage> = ProstCodec::default();
        let path = PathAndQuery::from_static(EVENT_STREAM_PATH);
        let response = self
            .client
            .streaming(tonic::Request::new(outbound), path, codec)
            .await
            .map_err(EventStreamError::Rejected)?;
        Ok(response.into_inner())
    }
}
