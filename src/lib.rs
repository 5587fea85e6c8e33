//! apkgrab core library
//!
//! Resolves a human-supplied app name or reverse-domain package identifier to
//! a package file hosted on an app-store mirror, extracts a direct file URL
//! from the mirror's HTML and streams the file to disk. The serving layer adds
//! a TTL link cache, in-flight deduplication and two admission ceilings.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`query`] - Query normalization shared by every stage
//! - [`mirror`] - Mirror origin and URL absolutization
//! - [`fetch`] - Browser-like HTTP access to the mirror
//! - [`resolver`] - Ordered name → app page strategies
//! - [`extract`] - Download-link patterns over the download page
//! - [`download`] - Lookup pipeline and streamed file transfer
//! - [`service`] - Cache, dedupe, admission gates and result conversion
//! - [`server`] - HTTP API on top of the service

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod extract;
pub mod fetch;
pub mod mirror;
pub mod models;
pub mod query;
pub mod resolver;
pub mod server;
pub mod service;

#[cfg(test)]
pub mod test_support;

// Re-export commonly used types
pub use config::{ConfigError, ServiceConfig};
pub use download::{DownloadError, DownloadedFile, Downloader};
pub use extract::LinkExtractor;
pub use fetch::{FetchError, HttpFetcher, PageFetcher};
pub use mirror::Mirror;
pub use models::{ContentType, DownloadDescriptor, DownloadResult, HealthStatus, LinkResult};
pub use query::Query;
pub use resolver::{KnownApps, ResolverRegistry, build_default_resolver_registry};
pub use service::{ApkService, StartupError};
