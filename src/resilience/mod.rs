//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Response or transport error from one attempt:
//!     → retries.rs (does this failure consume an attempt, is another allowed)
//!     → backoff.rs (how long to wait before the next attempt)
//! ```

pub mod backoff;
pub mod retries;

pub use retries::RetryPolicy;
