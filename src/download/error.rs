//! Error types for the download module.
//!
//! The `Display` text of every variant is the human-readable message returned
//! to API and CLI callers.

use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors surfaced by a lookup or a full download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Every resolution strategy missed.
    #[error("app not found")]
    AppNotFound {
        /// The query that could not be resolved.
        query: String,
    },

    /// The app page had no recognizable download link.
    #[error("download link not found")]
    LinkNotFound {
        /// The resolved app page.
        page_url: String,
    },

    /// The file request answered with a non-2xx status.
    #[error("download failed: HTTP {status}")]
    HttpStatus {
        /// The file URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Network-level error while requesting or streaming the file.
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The file URL.
        url: String,
        /// The underlying fetch error.
        #[source]
        source: FetchError,
    },

    /// The file request or a body chunk did not arrive in time.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The file URL.
        url: String,
    },

    /// File system error while writing the download.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates an "app not found" error.
    pub fn app_not_found(query: impl Into<String>) -> Self {
        Self::AppNotFound {
            query: query.into(),
        }
    }

    /// Creates a "download link not found" error.
    pub fn link_not_found(page_url: impl Into<String>) -> Self {
        Self::LinkNotFound {
            page_url: page_url.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Maps a fetch failure, keeping timeouts distinct.
    pub fn fetch(url: impl Into<String>, source: FetchError) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the failure was a miss rather than a transport or IO fault.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AppNotFound { .. } | Self::LinkNotFound { .. })
    }
}

// No From impls: every variant needs a url or path the source error lacks.
