//! Rate-limit header parsing.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderMap;

pub const REMAINING: &str = "x-ratelimit-remaining";
pub const RESET: &str = "x-ratelimit-reset";
pub const RESET_AFTER: &str = "x-ratelimit-reset-after";
pub const BUCKET: &str = "x-ratelimit-bucket";
/// Present on responses that passed through the platform's edge proxy.
pub const VIA: &str = "via";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// True when the bucket has no requests left in the current window.
pub fn is_exhausted(headers: &HeaderMap) -> bool {
    header(headers, REMAINING) == Some("0")
}

/// Bucket id announced by the platform, if any.
pub fn bucket_hash(headers: &HeaderMap) -> Option<&str> {
    header(headers, BUCKET)
}

/// Delay until the bucket resets.
///
/// Uses `X-Ratelimit-Reset-After` unless `use_clock` is set or the header is
/// missing, in which case `X-Ratelimit-Reset` is compared against the local
/// clock. Returns `None` when neither header yields a usable value.
pub fn reset_delay(headers: &HeaderMap, use_clock: bool) -> Option<Duration> {
    reset_delay_at(headers, use_clock, SystemTime::now())
}

/// [`reset_delay`] against an explicit wall-clock reading.
pub fn reset_delay_at(headers: &HeaderMap, use_clock: bool, now: SystemTime) -> Option<Duration> {
    let reset_after = header(headers, RESET_AFTER).and_then(|v| v.trim().parse::<f64>().ok());

    let seconds = match reset_after {
        Some(after) if !use_clock => after,
        _ => {
            let reset = header(headers, RESET)?.trim().parse::<f64>().ok()?;
            let now = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64();
            reset - now
        }
    };

    Duration::try_from_secs_f64(seconds.max(0.0)).ok()
}
