//! reqwest-backed [`PageFetcher`] with a desktop-browser request profile.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_DISPOSITION, CONTENT_LENGTH, HeaderMap, HeaderValue,
};
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::{debug, instrument, warn};

use super::{FetchError, FileResponse, Page, PageFetcher};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Desktop Chrome User-Agent sent on every mirror request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// HTTP fetcher for mirror pages and package files.
///
/// Created once per process and shared; the underlying client pools
/// connections and keeps cookies set by the mirror across requests.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds the fetcher with the browser request profile.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] when the reqwest client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        let client = build_client()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;
        debug!(status, bytes = body.len(), "page fetched");

        Ok(Page { status, body })
    }

    #[instrument(level = "debug", skip(self), fields(url = %url))]
    async fn fetch_file(&self, url: &str, timeout: Duration) -> Result<FileResponse, FetchError> {
        // The timeout bounds time-to-headers only; the body is streamed
        // afterwards under the caller's per-chunk idle limit.
        let response = tokio::time::timeout(timeout, self.client.get(url).send())
            .await
            .map_err(|_| FetchError::timeout(url))?
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status().as_u16();
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        debug!(status, ?content_length, "file response received");

        let owned_url = url.to_string();
        let body = response
            .bytes_stream()
            .map_err(move |e| FetchError::from_reqwest(owned_url.as_str(), e))
            .boxed();

        Ok(FileResponse {
            status,
            content_disposition,
            body,
        })
    }
}

fn build_client() -> Result<Client, FetchError> {
    // Some sandboxed hosts panic while reading system proxy settings; retry
    // with environment proxies only.
    match catch_unwind(AssertUnwindSafe(|| base_builder().build())) {
        Ok(result) => result.map_err(FetchError::ClientBuild),
        Err(_) => {
            warn!("HTTP client builder panicked loading system proxy settings; using env proxies");
            apply_env_proxy_fallback(base_builder().no_proxy())
                .build()
                .map_err(FetchError::ClientBuild)
        }
    }
}

fn base_builder() -> ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .cookie_store(true)
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    let https = first_env(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]);
    if let Some(proxy) = https
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    let http = first_env(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]);
    if let Some(proxy) = http
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn first_env(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_page_returns_status_and_body() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/whatsapp/com.whatsapp"))
            .and(header_regex("user-agent", "Chrome/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Download</html>"))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let page = fetcher
            .fetch_page(
                &format!("{}/whatsapp/com.whatsapp", mock_server.uri()),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert!(page.is_success());
        assert!(page.mentions("download"));
    }

    #[tokio::test]
    async fn test_fetch_page_non_2xx_is_not_an_error() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let page = fetcher
            .fetch_page(
                &format!("{}/missing", mock_server.uri()),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(page.status, 404);
        assert!(!page.is_success());
    }

    #[tokio::test]
    async fn test_fetch_page_times_out() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let result = fetcher
            .fetch_page(
                &format!("{}/slow", mock_server.uri()),
                Duration::from_millis(200),
            )
            .await;

        assert!(
            matches!(result, Err(FetchError::Timeout { .. })),
            "Expected timeout, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn test_fetch_file_exposes_disposition_and_streams_body() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/files/app.apk"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Disposition", r#"attachment; filename="App.apk""#)
                    .set_body_bytes(vec![7_u8; 4096]),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let mut response = fetcher
            .fetch_file(
                &format!("{}/files/app.apk", mock_server.uri()),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(
            response.content_disposition.as_deref(),
            Some(r#"attachment; filename="App.apk""#)
        );
        let mut total = 0_usize;
        while let Some(chunk) = response.body.next().await {
            total += chunk.unwrap().len();
        }
        assert_eq!(total, 4096);
    }
}
