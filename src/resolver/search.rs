//! Search fallback: the mirror's full-text search, scraped for the first result.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use crate::fetch::PageFetcher;
use crate::mirror::Mirror;
use crate::models::ResolvedApp;
use crate::query::Query;

use super::utils::{compile_static_regex, first_capture};
use super::{Resolver, ResolverPriority};

static RESULT_CARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"<a[^>]*href="(/[^"]+/[^"]+)"[^>]*class="[^"]*first-info[^"]*""#)
});

static TITLE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)<div[^>]*class="[^"]*title[^"]*"[^>]*>.*?<a[^>]*href="(/[^"]+)""#)
});

/// Primary pattern: an anchor tagged with the result-card class.
#[must_use]
pub fn result_card_link(html: &str) -> Option<String> {
    first_capture(html, &RESULT_CARD_RE)
}

/// Secondary pattern: the first anchor inside a title block.
#[must_use]
pub fn title_block_link(html: &str) -> Option<String> {
    first_capture(html, &TITLE_BLOCK_RE)
}

/// Search-result patterns in priority order.
pub const SEARCH_RESULT_PATTERNS: &[fn(&str) -> Option<String>] =
    &[result_card_link, title_block_link];

/// Queries `{mirror}/search?q=...` and takes the first result link.
pub struct SearchResolver {
    fetcher: Arc<dyn PageFetcher>,
    mirror: Mirror,
    timeout: Duration,
}

impl SearchResolver {
    /// Creates the strategy.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>, mirror: Mirror, timeout: Duration) -> Self {
        Self {
            fetcher,
            mirror,
            timeout,
        }
    }

    /// Absolute URL of the first result in a search page, if any.
    #[must_use]
    pub fn first_result(&self, html: &str) -> Option<String> {
        SEARCH_RESULT_PATTERNS
            .iter()
            .find_map(|pattern| pattern(html))
            .and_then(|link| self.mirror.absolutize(&link))
    }
}

#[async_trait]
impl Resolver for SearchResolver {
    fn name(&self) -> &'static str {
        "search"
    }

    fn priority(&self) -> ResolverPriority {
        ResolverPriority::Fallback
    }

    fn can_handle(&self, query: &Query) -> bool {
        !query.is_empty()
    }

    #[tracing::instrument(skip(self), fields(query = %query))]
    async fn resolve(&self, query: &Query) -> Option<ResolvedApp> {
        let url = self.mirror.search_url(query.trimmed());
        let page = match self.fetcher.fetch_page(&url, self.timeout).await {
            Ok(page) => page,
            Err(error) => {
                warn!(url = %url, error = %error, "search request failed");
                return None;
            }
        };
        if !page.is_success() {
            debug!(url = %url, status = page.status, "search rejected");
            return None;
        }
        let hit = self.first_result(&page.body);
        if hit.is_none() {
            debug!(url = %url, "search returned no recognizable result");
        }
        hit.map(ResolvedApp::new)
    }
}
