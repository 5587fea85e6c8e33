//! Error types for the service layer.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::fetch::FetchError;
use crate::resolver::KnownAppsError;

/// Failures that abort service construction.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration values are out of range.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The download directory could not be created.
    #[error("cannot create download directory {path}: {source}")]
    DownloadDir {
        /// The directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The known-app table could not be loaded.
    #[error(transparent)]
    KnownApps(#[from] KnownAppsError),

    /// The HTTP client could not be built.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl StartupError {
    /// Creates a download-directory error.
    pub fn download_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DownloadDir {
            path: path.into(),
            source,
        }
    }
}

/// Shared in-flight work ended without producing a value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoalesceError {
    /// The work panicked.
    #[error("shared work panicked")]
    Panicked,

    /// The work was cancelled, e.g. by runtime shutdown.
    #[error("shared work was cancelled")]
    Cancelled,
}

impl CoalesceError {
    pub(crate) fn from_join(error: &tokio::task::JoinError) -> Self {
        if error.is_panic() {
            Self::Panicked
        } else {
            Self::Cancelled
        }
    }
}

/// An admission gate was closed while a caller waited.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("{0} gate closed")]
pub struct GateError(pub &'static str);
