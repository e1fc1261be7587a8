//! Response classification.
//!
//! A pure mapping from one response to what the dispatcher does next. No I/O,
//! no sleeping: the driver in `dispatcher.rs` acts on the returned outcome.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::FatalKind;
use crate::http::ResponseBody;
use crate::ratelimit::headers::VIA;
use crate::resilience::RetryPolicy;

/// What to do after a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx: hand the body to the caller.
    Success,
    /// Legitimate 429: wait, then re-send without consuming an attempt.
    RetryAfter { delay: Duration, global: bool },
    /// 500/502: wait, then retry, consuming an attempt.
    Backoff(Duration),
    /// Surface an error immediately.
    Fatal(FatalKind),
}

/// Decide the outcome of a response received on `attempt` (0-based).
pub fn classify(
    status: StatusCode,
    headers: &HeaderMap,
    body: &ResponseBody,
    attempt: u32,
    policy: &RetryPolicy,
) -> Outcome {
    if status.is_success() {
        return Outcome::Success;
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            // A 429 that did not come through the edge proxy is not a real
            // rate limit.
            if !headers.contains_key(VIA) {
                return Outcome::Fatal(FatalKind::RateLimited);
            }
            match retry_after(headers, body) {
                Some((delay, global)) => Outcome::RetryAfter { delay, global },
                None => Outcome::Fatal(FatalKind::RateLimited),
            }
        }
        StatusCode::INTERNAL_SERVER_ERROR | StatusCode::BAD_GATEWAY => {
            Outcome::Backoff(policy.backoff(attempt))
        }
        StatusCode::FORBIDDEN => Outcome::Fatal(FatalKind::Forbidden),
        StatusCode::NOT_FOUND => Outcome::Fatal(FatalKind::NotFound),
        StatusCode::SERVICE_UNAVAILABLE => Outcome::Fatal(FatalKind::ServerError),
        _ => Outcome::Fatal(FatalKind::Http),
    }
}

/// Cooldown and scope from a 429.
///
/// The body's `retry_after` is in milliseconds. The `Retry-After` header
/// (seconds) is only consulted when the body does not carry one.
fn retry_after(headers: &HeaderMap, body: &ResponseBody) -> Option<(Duration, bool)> {
    let json = body.as_json();
    let global = json
        .and_then(|v| v.get("global"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let seconds = json
        .and_then(|v| v.get("retry_after"))
        .and_then(Value::as_f64)
        .map(|ms| ms / 1000.0)
        .or_else(|| {
            headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok())
        })?;

    Duration::try_from_secs_f64(seconds.max(0.0))
        .ok()
        .map(|delay| (delay, global))
}
