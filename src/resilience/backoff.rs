//! Linear backoff for transient server errors.

use std::time::Duration;

/// Delay before retrying after a 500/502 on `attempt` (0-based).
///
/// `base + attempt * step` seconds: with the defaults 1, 3, 5, 7, ...
pub fn server_error_backoff(attempt: u32, base_secs: u64, step_secs: u64) -> Duration {
    let step = step_secs.saturating_mul(u64::from(attempt));
    Duration::from_secs(base_secs.saturating_add(step))
}
