//! Known-app strategy: curated name → package table, confirmed by a probe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::fetch::PageFetcher;
use crate::mirror::Mirror;
use crate::models::ResolvedApp;
use crate::query::Query;

use super::utils::probe;
use super::{KnownApps, Resolver, ResolverPriority};

/// Resolves well-known app names through the [`KnownApps`] table.
///
/// The candidate page is `{mirror}/{slug}/{package}`; it is accepted on any
/// 2xx answer within the probe timeout.
pub struct KnownAppResolver {
    fetcher: Arc<dyn PageFetcher>,
    mirror: Mirror,
    table: Arc<KnownApps>,
    timeout: Duration,
}

impl KnownAppResolver {
    /// Creates the strategy.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        mirror: Mirror,
        table: Arc<KnownApps>,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            mirror,
            table,
            timeout,
        }
    }

    /// The page this strategy would probe for `query`, if the table knows it.
    #[must_use]
    pub fn candidate(&self, query: &Query) -> Option<String> {
        let package = self.table.get(query.key())?;
        Some(self.mirror.page_url(&[&query.slug(), package]))
    }
}

#[async_trait]
impl Resolver for KnownAppResolver {
    fn name(&self) -> &'static str {
        "known-app"
    }

    fn priority(&self) -> ResolverPriority {
        ResolverPriority::Specialized
    }

    fn can_handle(&self, query: &Query) -> bool {
        self.table.get(query.key()).is_some()
    }

    #[tracing::instrument(skip(self), fields(query = %query))]
    async fn resolve(&self, query: &Query) -> Option<ResolvedApp> {
        let url = self.candidate(query)?;
        debug!(url = %url, "probing known-app page");
        if probe(self.fetcher.as_ref(), &url, self.timeout, None).await {
            Some(ResolvedApp::new(url))
        } else {
            None
        }
    }
}
