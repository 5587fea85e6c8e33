//! Direct page guesses for reverse-domain package identifiers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::fetch::PageFetcher;
use crate::mirror::Mirror;
use crate::models::ResolvedApp;
use crate::query::Query;

use super::utils::probe;
use super::{APP_PAGE_MARKER, Resolver, ResolverPriority};

/// Guesses app pages from an identifier such as `org.telegram.messenger`.
pub struct PackageIdResolver {
    fetcher: Arc<dyn PageFetcher>,
    mirror: Mirror,
    timeout: Duration,
}

impl PackageIdResolver {
    /// Creates the strategy.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>, mirror: Mirror, timeout: Duration) -> Self {
        Self {
            fetcher,
            mirror,
            timeout,
        }
    }

    /// Candidate pages in probe order: `{last}/{id}` then `{id with dashes}/{id}`.
    #[must_use]
    pub fn candidates(&self, query: &Query) -> Vec<String> {
        let id = query.trimmed();
        let Some(last) = id.rsplit('.').next() else {
            return Vec::new();
        };
        let dashed = id.replace('.', "-");
        vec![
            self.mirror.page_url(&[last, id]),
            self.mirror.page_url(&[&dashed, id]),
        ]
    }
}

#[async_trait]
impl Resolver for PackageIdResolver {
    fn name(&self) -> &'static str {
        "package-id"
    }

    fn priority(&self) -> ResolverPriority {
        ResolverPriority::General
    }

    fn can_handle(&self, query: &Query) -> bool {
        query.looks_like_package_id()
    }

    #[tracing::instrument(skip(self), fields(query = %query))]
    async fn resolve(&self, query: &Query) -> Option<ResolvedApp> {
        for url in self.candidates(query) {
            debug!(url = %url, "probing package-id page");
            if probe(
                self.fetcher.as_ref(),
                &url,
                self.timeout,
                Some(APP_PAGE_MARKER),
            )
            .await
            {
                return Some(ResolvedApp::new(url));
            }
        }
        None
    }
}
