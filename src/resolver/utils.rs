//! Shared helpers for resolver strategies: static regexes and page probes.

use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::fetch::PageFetcher;

/// Compiles a regex at static init; panics on invalid pattern.
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Returns the first capture of `regex` in `html`, trimmed.
#[must_use]
pub fn first_capture(html: &str, regex: &Regex) -> Option<String> {
    regex
        .captures(html)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|value| !value.is_empty())
}

/// Requests `url` and reports whether it is a usable app page.
///
/// A page is usable when it answers 2xx and, if `marker` is given, its body
/// mentions the marker. Transport failures are logged and count as unusable.
pub async fn probe(
    fetcher: &dyn PageFetcher,
    url: &str,
    timeout: Duration,
    marker: Option<&str>,
) -> bool {
    match fetcher.fetch_page(url, timeout).await {
        Ok(page) if page.is_success() => {
            let accepted = marker.is_none_or(|marker| page.mentions(marker));
            debug!(url, accepted, "probe answered 2xx");
            accepted
        }
        Ok(page) => {
            debug!(url, status = page.status, "probe rejected");
            false
        }
        Err(error) => {
            warn!(url, error = %error, "probe failed");
            false
        }
    }
}
