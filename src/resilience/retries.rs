//! Retry policy.
//!
//! # Design Decisions
//! - Only 500/502 responses and connection resets consume attempts
//! - Legitimate 429s re-send without consuming attempts, so sustained rate
//!   limiting never fails a call on its own
//! - No backoff after the final attempt

use std::time::Duration;

use crate::config::RetryConfig;
use crate::http::TransportError;
use crate::resilience::backoff::server_error_backoff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_secs: u64,
    step_secs: u64,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_secs: config.server_error_base_secs,
            step_secs: config.server_error_step_secs,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt follows `attempt` (0-based).
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }

    /// Backoff after a server error on `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        server_error_backoff(attempt, self.base_secs, self.step_secs)
    }

    /// Whether a transport failure on `attempt` should be retried.
    pub fn retries_transport_error(&self, attempt: u32, err: &TransportError) -> bool {
        err.is_connection_reset() && self.has_next(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}
