//! Package acquisition: lookup, filename derivation and streamed transfer.
//!
//! # Features
//!
//! - Streaming downloads through a fixed-size write buffer, so memory use does
//!   not grow with file size
//! - Filename from `Content-Disposition`, or synthesized from the query
//! - Extension forced to match the detected package type
//! - Atomic placement: bytes land in a unique `.part` file that is renamed on success
//! - Structured errors whose messages are safe to return to callers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use apkgrab_core::download::Downloader;
//! use apkgrab_core::extract::LinkExtractor;
//! use apkgrab_core::fetch::{HttpFetcher, PageFetcher};
//! use apkgrab_core::mirror::Mirror;
//! use apkgrab_core::query::Query;
//! use apkgrab_core::resolver::{KnownApps, ResolverTimeouts, build_default_resolver_registry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new()?);
//! let mirror = Mirror::default();
//! let registry = build_default_resolver_registry(
//!     Arc::clone(&fetcher),
//!     mirror.clone(),
//!     Arc::new(KnownApps::builtin()?),
//!     ResolverTimeouts::default(),
//! );
//! let extractor = LinkExtractor::new(Arc::clone(&fetcher), mirror);
//! let downloader = Downloader::new(fetcher, Arc::new(registry), extractor, "downloads");
//! let file = downloader.download(&Query::new("whatsapp")).await?;
//! println!("Downloaded: {}", file.path.display());
//! # Ok(())
//! # }
//! ```

pub mod constants;
mod downloader;
mod error;
pub mod filename;

pub use downloader::{DownloadedFile, Downloader};
pub use error::DownloadError;
