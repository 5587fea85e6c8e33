//! Query resolution: turning an app name or package id into a mirror app page.
//!
//! Resolution is an ordered list of strategies, each returning a page or
//! nothing. The [`ResolverRegistry`] tries them in priority order and stops at
//! the first hit; a strategy that misses or hits a transport error simply lets
//! the next one run.
//!
//! # Architecture
//!
//! - [`Resolver`] - Async trait that individual strategies implement
//! - [`ResolverRegistry`] - Priority-ordered collection with the dispatch loop
//! - [`KnownAppResolver`] - Static name → package table, probed on the mirror
//! - [`PackageIdResolver`] - Direct page guesses for reverse-domain identifiers
//! - [`SlugResolver`] - Direct page guess from the query slug
//! - [`SearchResolver`] - Mirror full-text search fallback
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use apkgrab_core::fetch::HttpFetcher;
//! use apkgrab_core::mirror::Mirror;
//! use apkgrab_core::query::Query;
//! use apkgrab_core::resolver::{KnownApps, ResolverTimeouts, build_default_resolver_registry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = build_default_resolver_registry(
//!     Arc::new(HttpFetcher::new()?),
//!     Mirror::default(),
//!     Arc::new(KnownApps::builtin()?),
//!     ResolverTimeouts::default(),
//! );
//! if let Some(app) = registry.resolve(&Query::new("whatsapp")).await {
//!     println!("App page: {}", app.page_url);
//! }
//! # Ok(())
//! # }
//! ```

mod known_app;
mod known_apps;
mod package_id;
mod registry;
mod search;
mod slug;
pub(crate) mod utils;

pub use known_app::KnownAppResolver;
pub use known_apps::{KnownApps, KnownAppsError};
pub use package_id::PackageIdResolver;
pub use registry::ResolverRegistry;
pub use search::{SEARCH_RESULT_PATTERNS, SearchResolver, result_card_link, title_block_link};
pub use slug::SlugResolver;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::fetch::PageFetcher;
use crate::mirror::Mirror;
use crate::models::ResolvedApp;
use crate::query::Query;

/// Timeout for known-app and package-id page probes.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for the slug page probe.
pub const SLUG_PROBE_TIMEOUT: Duration = Duration::from_secs(8);

/// Timeout for mirror search requests.
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Text a guessed page must contain to count as an app page.
pub const APP_PAGE_MARKER: &str = "download";

/// Per-strategy request timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverTimeouts {
    /// Known-app and package-id probes.
    pub probe: Duration,
    /// Slug probe.
    pub slug_probe: Duration,
    /// Search request.
    pub search: Duration,
}

impl Default for ResolverTimeouts {
    fn default() -> Self {
        Self {
            probe: PROBE_TIMEOUT,
            slug_probe: SLUG_PROBE_TIMEOUT,
            search: SEARCH_TIMEOUT,
        }
    }
}

/// Builds the default strategy chain.
///
/// Order is deterministic: known-app table, package-id guesses, slug guess,
/// then search.
#[must_use]
pub fn build_default_resolver_registry(
    fetcher: Arc<dyn PageFetcher>,
    mirror: Mirror,
    known_apps: Arc<KnownApps>,
    timeouts: ResolverTimeouts,
) -> ResolverRegistry {
    let mut registry = ResolverRegistry::new();
    registry.register(Box::new(KnownAppResolver::new(
        Arc::clone(&fetcher),
        mirror.clone(),
        known_apps,
        timeouts.probe,
    )));
    registry.register(Box::new(PackageIdResolver::new(
        Arc::clone(&fetcher),
        mirror.clone(),
        timeouts.probe,
    )));
    registry.register(Box::new(SlugResolver::new(
        Arc::clone(&fetcher),
        mirror.clone(),
        timeouts.slug_probe,
    )));
    registry.register(Box::new(SearchResolver::new(
        fetcher,
        mirror,
        timeouts.search,
    )));
    registry
}

/// Priority level for strategy ordering.
///
/// Derives `Ord` so that `Specialized < General < Fallback` for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResolverPriority {
    /// Curated data (known-app table).
    Specialized = 0,
    /// Direct page guesses.
    General = 1,
    /// Full-text search.
    Fallback = 2,
}

/// A single resolution strategy.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via `Box<dyn Resolver>`.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Strategy name used in logs (e.g., "known-app", "search").
    fn name(&self) -> &str;

    /// Strategy priority.
    fn priority(&self) -> ResolverPriority;

    /// Returns true if this strategy applies to the query at all.
    fn can_handle(&self, query: &Query) -> bool;

    /// Attempts to find an app page; `None` lets the next strategy run.
    async fn resolve(&self, query: &Query) -> Option<ResolvedApp>;
}
