//! Mirror origin handling: building page URLs and absolutizing scraped links.

use url::Url;

/// Default app-store mirror origin.
pub const DEFAULT_MIRROR_URL: &str = "https://apkpure.com";

/// The app-store mirror all page URLs are built against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirror {
    base: Url,
}

impl Mirror {
    /// Creates a mirror from an origin URL such as `https://apkpure.com`.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when `base` is not an absolute URL.
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(base.trim_end_matches('/'))?;
        Ok(Self { base })
    }

    /// The mirror origin without a trailing slash.
    #[must_use]
    pub fn origin(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Builds `{origin}/{segment}/{segment}...` from raw path segments.
    ///
    /// Segments are inserted verbatim; callers pass slugs and package ids that
    /// are already path-safe.
    #[must_use]
    pub fn page_url(&self, segments: &[&str]) -> String {
        let mut url = self.origin().to_string();
        for segment in segments {
            url.push('/');
            url.push_str(segment.trim_matches('/'));
        }
        url
    }

    /// Builds the mirror search URL for free text, form-encoding the query.
    #[must_use]
    pub fn search_url(&self, text: &str) -> String {
        let mut url = self.base.clone();
        url.set_path("/search");
        url.query_pairs_mut().clear().append_pair("q", text.trim());
        url.to_string()
    }

    /// Resolves a scraped link against the mirror origin.
    #[must_use]
    pub fn absolutize(&self, value: &str) -> Option<String> {
        absolutize_url(value, &self.base)
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Self {
            base: Url::parse(DEFAULT_MIRROR_URL)
                .unwrap_or_else(|e| panic!("invalid default mirror '{DEFAULT_MIRROR_URL}': {e}")),
        }
    }
}

/// Resolves a possibly relative URL string against a base URL.
///
/// Returns the value as-is if it already starts with `http://` or `https://`;
/// normalizes `//...` to `https:...`; otherwise joins with `base_url`.
#[must_use]
pub fn absolutize_url(value: &str, base_url: &Url) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        return Some(value.to_string());
    }
    if value.starts_with("//") {
        return Some(format!("https:{value}"));
    }
    base_url.join(value).ok().map(|url| url.to_string())
}
