//! Deferred bucket release.
//!
//! A [`BucketGuard`] owns the bucket lock for the duration of a call. When
//! the call ends (or the future is dropped) the lock is released exactly
//! once: immediately, or by a timer task if the bucket was reported
//! exhausted.

use tokio::runtime::Handle;
use tokio::sync::OwnedMutexGuard;
use tokio::time::{sleep_until, Instant};

use crate::observability::metrics;

#[derive(Debug)]
pub struct BucketGuard {
    guard: Option<OwnedMutexGuard<()>>,
    bucket: String,
    release_at: Option<Instant>,
}

impl BucketGuard {
    pub fn new(guard: OwnedMutexGuard<()>, bucket: impl Into<String>) -> Self {
        Self {
            guard: Some(guard),
            bucket: bucket.into(),
            release_at: None,
        }
    }

    /// Keep the bucket locked until `deadline`. The latest deadline wins.
    pub fn defer_until(&mut self, deadline: Instant) {
        self.release_at = Some(match self.release_at {
            Some(current) => current.max(deadline),
            None => deadline,
        });
    }

    pub fn release_at(&self) -> Option<Instant> {
        self.release_at
    }

    /// Release now, or hand the lock to a timer if deferred.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };

        let deadline = match self.release_at {
            Some(deadline) if deadline > Instant::now() => deadline,
            _ => {
                drop(guard);
                return;
            }
        };

        match Handle::try_current() {
            Ok(handle) => {
                metrics::record_deferred_unlock();
                tracing::debug!(
                    bucket = %self.bucket,
                    delay_ms = (deadline - Instant::now()).as_millis() as u64,
                    "Holding exhausted bucket until reset"
                );
                let bucket = std::mem::take(&mut self.bucket);
                handle.spawn(async move {
                    sleep_until(deadline).await;
                    drop(guard);
                    tracing::trace!(bucket = %bucket, "Deferred bucket lock released");
                });
            }
            Err(_) => drop(guard),
        }
    }
}

impl Drop for BucketGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}
