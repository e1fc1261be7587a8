//! HTTP layer.
//!
//! # Data Flow
//! ```text
//! Dispatcher call:
//!     → request.rs (headers, credentials, body, file payloads)
//!     → transport.rs (one network round trip)
//!     → response.rs (status, headers, JSON-or-text body)
//!     → back to the dispatcher for classification
//! ```
//!
//! # Design Decisions
//! - The transport is a trait so the dispatcher can be driven without a network
//! - Proxy and timeouts are transport concerns, set once at construction
//! - Headers are built once per call and reused across attempts

pub mod request;
pub mod response;
pub mod transport;

pub use request::{Credentials, FilePayload, OutgoingRequest, RequestBody, RequestOptions};
pub use response::{RawResponse, ResponseBody};
pub use transport::{ReqwestTransport, Transport, TransportError};
