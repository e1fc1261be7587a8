//! Bucket lock registry.
//!
//! One exclusive lock per rate-limit bucket, created on first use and kept
//! for the lifetime of the registry. Cardinality is bounded by the number of
//! distinct buckets the dispatcher exercises, so there is no eviction.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::observability::metrics;

/// Maps bucket keys to their locks.
#[derive(Debug, Clone, Default)]
pub struct BucketLocks {
    inner: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl BucketLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock for `bucket`, created if this is the first time it is seen.
    pub fn lock_for(&self, bucket: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.inner.get(bucket) {
            return lock.value().clone();
        }

        let lock = self
            .inner
            .entry(bucket.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        metrics::record_bucket_count(self.inner.len());
        tracing::trace!(bucket = %bucket, "Created bucket lock");
        lock
    }

    /// Wait for exclusive use of `bucket`.
    ///
    /// The guard is owned so it can outlive the call that acquired it when
    /// the release has to be deferred.
    pub async fn acquire(&self, bucket: &str) -> OwnedMutexGuard<()> {
        self.lock_for(bucket).lock_owned().await
    }

    /// Number of distinct buckets seen.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
