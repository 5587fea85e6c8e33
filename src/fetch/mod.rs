//! Upstream fetch boundary.
//!
//! Everything that talks to the mirror goes through [`PageFetcher`]: resolvers
//! and the link extractor use [`PageFetcher::fetch_page`] for small HTML pages,
//! the downloader uses [`PageFetcher::fetch_file`] for streamed package bodies.
//! [`HttpFetcher`] is the production implementation on top of reqwest.

mod error;
mod http;

pub use error::FetchError;
pub use http::{BROWSER_USER_AGENT, HttpFetcher};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

/// A fully buffered page response.
#[derive(Debug, Clone)]
pub struct Page {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl Page {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if the page text mentions `needle`, ignoring ASCII case.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.body
            .to_ascii_lowercase()
            .contains(&needle.to_ascii_lowercase())
    }
}

/// A streamed file response.
pub struct FileResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw `Content-Disposition` header, when present.
    pub content_disposition: Option<String>,
    /// Body chunks in arrival order.
    pub body: BoxStream<'static, Result<Bytes, FetchError>>,
}

impl FileResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for FileResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileResponse")
            .field("status", &self.status)
            .field("content_disposition", &self.content_disposition)
            .finish_non_exhaustive()
    }
}

/// Browser-emulating HTTP access to the mirror.
///
/// Implementations must surface anti-automation challenges either by passing
/// them transparently or as ordinary non-2xx responses.
///
/// # Object Safety
///
/// This trait uses `async_trait` so it can be shared as `Arc<dyn PageFetcher>`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and buffers the body as text.
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<Page, FetchError>;

    /// Starts a streamed GET of `url`; the body is consumed by the caller.
    async fn fetch_file(&self, url: &str, timeout: Duration) -> Result<FileResponse, FetchError>;
}
