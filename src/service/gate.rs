//! Two-tier admission control: lookups and downloads have separate ceilings.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::GateError;

/// Independent counting gates for lookup-class and download-class work.
///
/// Callers wait without timeout for a slot; the returned permit releases the
/// slot when dropped.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    lookups: Arc<Semaphore>,
    downloads: Arc<Semaphore>,
    lookup_ceiling: usize,
    download_ceiling: usize,
}

impl ConcurrencyGate {
    /// Creates both gates.
    #[must_use]
    pub fn new(lookup_ceiling: usize, download_ceiling: usize) -> Self {
        Self {
            lookups: Arc::new(Semaphore::new(lookup_ceiling)),
            downloads: Arc::new(Semaphore::new(download_ceiling)),
            lookup_ceiling,
            download_ceiling,
        }
    }

    /// Waits for a lookup slot.
    ///
    /// # Errors
    ///
    /// Returns [`GateError`] if the gate was closed.
    pub async fn admit_lookup(&self) -> Result<OwnedSemaphorePermit, GateError> {
        Arc::clone(&self.lookups)
            .acquire_owned()
            .await
            .map_err(|_| GateError("lookup"))
    }

    /// Waits for a download slot.
    ///
    /// # Errors
    ///
    /// Returns [`GateError`] if the gate was closed.
    pub async fn admit_download(&self) -> Result<OwnedSemaphorePermit, GateError> {
        Arc::clone(&self.downloads)
            .acquire_owned()
            .await
            .map_err(|_| GateError("download"))
    }

    /// Configured lookup ceiling.
    #[must_use]
    pub fn lookup_ceiling(&self) -> usize {
        self.lookup_ceiling
    }

    /// Configured download ceiling.
    #[must_use]
    pub fn download_ceiling(&self) -> usize {
        self.download_ceiling
    }

    /// Free lookup slots right now.
    #[must_use]
    pub fn available_lookups(&self) -> usize {
        self.lookups.available_permits()
    }

    /// Free download slots right now.
    #[must_use]
    pub fn available_downloads(&self) -> usize {
        self.downloads.available_permits()
    }
}
