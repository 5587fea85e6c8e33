//! Download-link extraction from an app's `/download` sub-page.
//!
//! Extraction is a short, ordered list of pure pattern functions over the
//! page text. The first pattern that matches wins; the captured value is
//! absolutized against the mirror and classified as plain or bundle.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::fetch::PageFetcher;
use crate::mirror::Mirror;
use crate::models::DownloadDescriptor;
use crate::resolver::utils::first_capture;

/// Timeout for the download sub-page fetch.
pub const DOWNLOAD_PAGE_TIMEOUT: Duration = Duration::from_secs(8);

fn case_insensitive(pattern: &str) -> Regex {
    regex::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

static BUNDLE_CDN_RE: LazyLock<Regex> =
    LazyLock::new(|| case_insensitive(r#"href="(https://d\.apkpure\.com/b/XAPK/[^"]+)""#));

static PLAIN_CDN_RE: LazyLock<Regex> =
    LazyLock::new(|| case_insensitive(r#"href="(https://d\.apkpure\.com/b/APK/[^"]+)""#));

static DATA_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| case_insensitive(r#"data-dt-file="([^"]+)""#));

static GENERIC_CDN_RE: LazyLock<Regex> =
    LazyLock::new(|| case_insensitive(r#""(https://download\.apkpure\.com/[^"]+)""#));

/// Direct CDN link to a bundle package.
#[must_use]
pub fn bundle_cdn_link(html: &str) -> Option<String> {
    first_capture(html, &BUNDLE_CDN_RE)
}

/// Direct CDN link to a plain package.
#[must_use]
pub fn plain_cdn_link(html: &str) -> Option<String> {
    first_capture(html, &PLAIN_CDN_RE)
}

/// File reference carried by an inline `data-dt-file` attribute.
#[must_use]
pub fn data_file_attribute(html: &str) -> Option<String> {
    first_capture(html, &DATA_FILE_RE)
}

/// Any quoted URL on the generic download host.
#[must_use]
pub fn generic_cdn_link(html: &str) -> Option<String> {
    first_capture(html, &GENERIC_CDN_RE)
}

/// Link patterns in priority order.
pub const LINK_PATTERNS: &[fn(&str) -> Option<String>] = &[
    bundle_cdn_link,
    plain_cdn_link,
    data_file_attribute,
    generic_cdn_link,
];

/// Finds the first matching raw link in a download page.
#[must_use]
pub fn find_link(html: &str) -> Option<String> {
    LINK_PATTERNS.iter().find_map(|pattern| pattern(html))
}

/// Fetches download pages and pulls a direct file URL out of them.
#[derive(Clone)]
pub struct LinkExtractor {
    fetcher: Arc<dyn PageFetcher>,
    mirror: Mirror,
    timeout: Duration,
}

impl LinkExtractor {
    /// Creates an extractor with the default download-page timeout.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>, mirror: Mirror) -> Self {
        Self {
            fetcher,
            mirror,
            timeout: DOWNLOAD_PAGE_TIMEOUT,
        }
    }

    /// Overrides the download-page timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parses an already fetched download page.
    #[must_use]
    pub fn parse(&self, html: &str) -> Option<DownloadDescriptor> {
        let raw = find_link(html)?;
        let url = self.mirror.absolutize(&raw)?;
        Some(DownloadDescriptor::from_url(url))
    }

    /// Fetches `{page_url}/download` and extracts a direct file link.
    ///
    /// Non-2xx answers, transport failures and pages without a recognizable
    /// link all yield `None`.
    #[tracing::instrument(skip(self))]
    pub async fn extract(&self, page_url: &str) -> Option<DownloadDescriptor> {
        let url = format!("{}/download", page_url.trim_end_matches('/'));
        let page = match self.fetcher.fetch_page(&url, self.timeout).await {
            Ok(page) => page,
            Err(error) => {
                warn!(url = %url, error = %error, "download page fetch failed");
                return None;
            }
        };
        if !page.is_success() {
            debug!(url = %url, status = page.status, "download page rejected");
            return None;
        }
        let descriptor = self.parse(&page.body);
        match &descriptor {
            Some(found) => info!(
                url = %found.url,
                content_type = %found.content_type,
                "download link extracted"
            ),
            None => debug!(url = %url, "no download link pattern matched"),
        }
        descriptor
    }
}

impl std::fmt::Debug for LinkExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkExtractor")
            .field("mirror", &self.mirror)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
