//! gRPC transport to the function host.
pub mod client;
