//! Service configuration: ceilings, cache TTL, paths and the mirror origin.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::download::constants::DEFAULT_DOWNLOAD_DIR;
use crate::mirror::{DEFAULT_MIRROR_URL, Mirror};

/// Smallest accepted ceiling or TTL.
const MIN_VALUE: u64 = 1;

/// Largest accepted concurrency ceiling.
pub const MAX_CEILING: usize = 100_000;

/// Default number of concurrently admitted lookups.
pub const DEFAULT_LOOKUP_CEILING: usize = 200;

/// Default number of concurrently admitted downloads.
pub const DEFAULT_DOWNLOAD_CEILING: usize = 10;

/// Default link-cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 900;

/// Default server listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8001";

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A concurrency ceiling is out of range.
    #[error("invalid {name} ceiling {value}: must be between {MIN_VALUE} and {MAX_CEILING}")]
    InvalidCeiling {
        /// Which ceiling.
        name: &'static str,
        /// The rejected value.
        value: usize,
    },

    /// The cache TTL is zero.
    #[error("invalid cache TTL {value}s: must be at least {MIN_VALUE}s")]
    InvalidTtl {
        /// The rejected value in seconds.
        value: u64,
    },

    /// The mirror origin is not an absolute URL.
    #[error("invalid mirror URL {url}: {source}")]
    InvalidMirror {
        /// The rejected URL.
        url: String,
        /// The parse error.
        #[source]
        source: url::ParseError,
    },
}

/// Everything needed to build an `ApkService`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Lookup-class admission ceiling.
    pub lookup_ceiling: usize,
    /// Download-class admission ceiling.
    pub download_ceiling: usize,
    /// Link-cache time-to-live.
    pub cache_ttl: Duration,
    /// Directory downloads are written to; created at startup.
    pub download_dir: PathBuf,
    /// Mirror origin.
    pub mirror_url: String,
    /// Known-app table replacing the built-in one.
    pub known_apps_path: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            lookup_ceiling: DEFAULT_LOOKUP_CEILING,
            download_ceiling: DEFAULT_DOWNLOAD_CEILING,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            mirror_url: DEFAULT_MIRROR_URL.to_string(),
            known_apps_path: None,
        }
    }
}

impl ServiceConfig {
    /// Checks ranges and the mirror URL.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ceiling("lookup", self.lookup_ceiling)?;
        validate_ceiling("download", self.download_ceiling)?;
        if self.cache_ttl.as_secs() < MIN_VALUE {
            return Err(ConfigError::InvalidTtl {
                value: self.cache_ttl.as_secs(),
            });
        }
        self.mirror()?;
        Ok(())
    }

    /// Parses the configured mirror origin.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMirror`] when the URL does not parse.
    pub fn mirror(&self) -> Result<Mirror, ConfigError> {
        Mirror::new(&self.mirror_url).map_err(|source| ConfigError::InvalidMirror {
            url: self.mirror_url.clone(),
            source,
        })
    }
}

fn validate_ceiling(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value < 1 || value > MAX_CEILING {
        return Err(ConfigError::InvalidCeiling { name, value });
    }
    Ok(())
}
