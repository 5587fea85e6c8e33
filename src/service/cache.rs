//! TTL-bounded link cache.
//!
//! Expiry is lazy: freshness is checked on access and a stale entry is evicted
//! the moment it is observed. Failed results are never stored.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::models::LinkResult;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: LinkResult,
    inserted_at: Instant,
}

/// Query key → last successful lookup.
#[derive(Debug)]
pub struct LinkCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl LinkCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Returns the cached result if it is younger than the TTL.
    pub fn get(&self, key: &str) -> Option<LinkResult> {
        if let Some(entry) = self.entries.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                debug!(key, "link cache hit");
                return Some(entry.value.clone());
            }
            // Release the read guard before taking the shard write lock.
            drop(entry);
            // A concurrent put may have refreshed the key meanwhile.
            self.entries
                .remove_if(key, |_, entry| entry.inserted_at.elapsed() >= self.ttl);
            debug!(key, "link cache entry expired");
        }
        None
    }

    /// Stores a successful result; failures are ignored.
    pub fn put(&self, key: &str, value: LinkResult) {
        if !value.success {
            debug!(key, "not caching failed lookup");
            return;
        }
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Entries currently held, including stale ones not yet observed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
