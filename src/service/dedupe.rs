//! In-flight deduplication of identical lookups.
//!
//! The first caller for a key spawns the work and publishes a shared handle;
//! later callers for the same key await that handle. The record is removed by
//! a guard owned by the spawned task, so removal happens on success, failure,
//! panic and cancellation alike.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::debug;

use super::CoalesceError;

type SharedWork<T> = Shared<BoxFuture<'static, Result<T, CoalesceError>>>;

struct Record<T: Clone> {
    id: u64,
    pending: SharedWork<T>,
}

/// Removes its record when dropped, unless the key was already reclaimed.
struct RecordGuard<T: Clone> {
    records: Arc<DashMap<String, Record<T>>>,
    key: String,
    id: u64,
}

impl<T: Clone> Drop for RecordGuard<T> {
    fn drop(&mut self) {
        self.records.remove_if(&self.key, |_, record| record.id == self.id);
    }
}

/// Per-key coalescing of concurrent work.
pub struct InFlight<T: Clone> {
    records: Arc<DashMap<String, Record<T>>>,
    next_id: AtomicU64,
}

impl<T> InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Runs `work` once per concurrent burst of callers sharing `key`.
    ///
    /// Every caller of a burst receives a clone of the same outcome. The work
    /// runs on its own task, so dropping a caller does not cancel it.
    ///
    /// # Errors
    ///
    /// Returns [`CoalesceError`] when the work panicked or was cancelled.
    pub async fn coalesce<F>(&self, key: &str, work: F) -> Result<T, CoalesceError>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let pending = match self.records.entry(key.to_string()) {
            Entry::Occupied(record) => {
                debug!(key, "joining in-flight work");
                record.get().pending.clone()
            }
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let guard = RecordGuard {
                    records: Arc::clone(&self.records),
                    key: key.to_string(),
                    id,
                };
                let handle = tokio::spawn(async move {
                    let _guard = guard;
                    work.await
                });
                let pending = async move {
                    handle
                        .await
                        .map_err(|error| CoalesceError::from_join(&error))
                }
                .boxed()
                .shared();
                slot.insert(Record {
                    id,
                    pending: pending.clone(),
                });
                debug!(key, "started in-flight work");
                pending
            }
        };
        pending.await
    }

    /// Keys currently being worked on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true if `key` has a record.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }
}

impl<T> Default for InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> std::fmt::Debug for InFlight<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlight")
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}
