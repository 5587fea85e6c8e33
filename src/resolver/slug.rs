//! Slug strategy: the app page guessed straight from the query text.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::fetch::PageFetcher;
use crate::mirror::Mirror;
use crate::models::ResolvedApp;
use crate::query::Query;

use super::utils::probe;
use super::{APP_PAGE_MARKER, Resolver, ResolverPriority};

/// Probes `{mirror}/{slug}`, e.g. `https://apkpure.com/clash-of-clans`.
pub struct SlugResolver {
    fetcher: Arc<dyn PageFetcher>,
    mirror: Mirror,
    timeout: Duration,
}

impl SlugResolver {
    /// Creates the strategy.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>, mirror: Mirror, timeout: Duration) -> Self {
        Self {
            fetcher,
            mirror,
            timeout,
        }
    }
}

#[async_trait]
impl Resolver for SlugResolver {
    fn name(&self) -> &'static str {
        "slug"
    }

    fn priority(&self) -> ResolverPriority {
        ResolverPriority::General
    }

    // Only single path segments; anything else would probe an unrelated page.
    fn can_handle(&self, query: &Query) -> bool {
        !query.is_empty() && !query.key().contains(['/', '?', '#'])
    }

    #[tracing::instrument(skip(self), fields(query = %query))]
    async fn resolve(&self, query: &Query) -> Option<ResolvedApp> {
        let url = self.mirror.page_url(&[&query.slug()]);
        probe(
            self.fetcher.as_ref(),
            &url,
            self.timeout,
            Some(APP_PAGE_MARKER),
        )
        .await
        .then(|| ResolvedApp::new(url))
    }
}
