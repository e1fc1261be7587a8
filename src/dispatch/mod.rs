//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Caller → Dispatcher::request(route, options)
//!     → ratelimit (gate, bucket lock)
//!     → http (build, send)
//!     → outcome.rs (classify the response)
//!     → dispatcher.rs (sleep / retry / return / fail)
//! ```
//!
//! # Design Decisions
//! - Classification is a pure function, separate from the I/O loop
//! - 429 re-sends do not consume the attempt budget; 500/502 and
//!   connection resets do
//! - Cancellation is not a feature: a dropped call releases its bucket
//!   (honouring any deferral) but does not abort a scheduled release

pub mod dispatcher;
pub mod outcome;

pub use dispatcher::Dispatcher;
pub use outcome::{classify, Outcome};
