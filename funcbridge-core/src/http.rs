//! # HTTP facades
//!
//! Native views over the wire's structured HTTP payloads: an immutable
//! [`request::Request`] decoded from an inbound trigger and a mutable,
//! chainable [`response::Response`] builder wired to the invocation's
//! completion callback.
pub mod request;
pub mod response;

pub(crate) mod header {
    pub const CONTENT_TYPE: &str = "content-type";
}

pub(crate) mod media_type {
    pub const JSON: &str = "application/json";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}
