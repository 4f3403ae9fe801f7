//! # Funcbridge Proto
//!
//! Wire message definitions for the worker protocol spoken between a
//! function-execution host and this runtime adapter.
//!
//! The schema is owned by the host and is fixed: every message, field tag
//! and enum value here must stay byte-compatible with the host's published
//! protocol. Because the schema never changes at runtime, the messages are
//! written by hand with `prost` derives instead of being generated through a
//! `build.rs` step. This keeps the build hermetic (no `protoc` required)
//! while producing the exact same wire encoding as generated code would.
//!
//! ## Layout
//!
//! * **[`messages`]**: all protocol messages and their nested enums, mirroring
//!   the host's `.proto` layout (`StreamingMessage` envelope, `TypedData`
//!   tagged union, HTTP shapes, nullable scalar wrappers, log and status
//!   messages).
//! * **[`EVENT_STREAM_PATH`]**: the full gRPC method path of the bidirectional
//!   event stream the worker opens against the host.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost` and `prost-types` so that consumers use
//! compatible versions of the underlying dependencies.
pub mod messages;

// Re-exports
pub use prost;
pub use prost_types;

/// Full gRPC method path of the host's bidirectional event stream.
///
/// The worker opens exactly one call to this method per process lifetime and
/// multiplexes every protocol message over it.
pub const EVENT_STREAM_PATH: &str = "/AzureFunctionsRpcMessages.FunctionRpc/EventStream";
