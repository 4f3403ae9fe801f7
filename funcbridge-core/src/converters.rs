//! # Wire <-> native converters
//!
//! This module contains the schema-driven conversion layer between the
//! host's `TypedData` tagged-union wire format and the runtime's native
//! value space.
//!
//! * **[`typed_data`]**: the general bidirectional mapping, plus the
//!   nullable-scalar encoders the HTTP shapes rely on.
//! * **[`http`]**: the HTTP specialization with its body decoding quirks,
//!   the nullable-map fallback policy, and response/cookie encoding.
//! * **[`binding_data`]**: normalized binding data and the camelCase key pass
//!   applied to timer-trigger payloads.
pub mod binding_data;
pub mod http;
pub mod typed_data;
