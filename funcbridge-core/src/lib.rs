//! # Funcbridge Core
//!
//! `funcbridge-core` is the in-process adapter between a function host and
//! Rust function code. It speaks the host's binary event-stream protocol
//! over gRPC and turns wire-level invocations into typed calls with an
//! honest data model on this side of the boundary.
//!
//! ## Key Components
//!
//! * **[`Worker`]:** The main entry point. Dials the host, performs the
//!   stream handshake and serves the event stream until the host closes it.
//! * **[`FunctionRegistry`]:** Maps function names to async handlers. The
//!   host binds its metadata to these registrations at load time.
//! * **[`Context`]:** The per-invocation facade handed to handlers:
//!   decoded bindings, normalized binding data, HTTP request/response
//!   facades, a leveled logger and the one-shot completion gate.
//! * **[`Value`]:** The tagged union every payload decodes into. What came
//!   off the wire is always distinguishable from what was interpreted.
//!
//! ## Wire types
//!
//! The protocol messages live in the companion `funcbridge-proto` crate and
//! are re-exported here so consumers use compatible versions.
pub mod channel;
pub mod context;
pub mod converters;
pub mod environment;
pub mod function_info;
pub mod grpc;
pub mod http;
pub mod registry;
pub mod value;
pub mod worker;

// Re-exports
pub use funcbridge_proto as proto;

pub use channel::WorkerChannel;
pub use context::Context;
pub use function_info::FunctionInfo;
pub use registry::{FunctionRegistry, HandlerOutcome};
pub use value::Value;
pub use worker::Worker;

/// Type alias for the standard boxed error used at handler and callback
/// boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
