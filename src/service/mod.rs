//! Request wiring: admission, caching, deduplication and result conversion.
//!
//! [`ApkService`] is built once at startup and shared by every request path.
//! It never returns a Rust error to its callers; every outcome, including a
//! panic inside shared work, becomes a structured [`LinkResult`] or
//! [`DownloadResult`].

mod cache;
mod dedupe;
mod error;
mod gate;

pub use cache::LinkCache;
pub use dedupe::InFlight;
pub use error::{CoalesceError, GateError, StartupError};
pub use gate::ConcurrencyGate;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::download::Downloader;
use crate::extract::LinkExtractor;
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::models::{DownloadResult, HealthStatus, LinkResult};
use crate::query::Query;
use crate::resolver::{KnownApps, ResolverTimeouts, build_default_resolver_registry};

/// Message for a missing or blank query.
pub const MISSING_PACKAGE_MESSAGE: &str = "package parameter is required";

/// Message for faults that must not leak to callers.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Process-wide service state.
#[derive(Debug)]
pub struct ApkService {
    downloader: Arc<Downloader>,
    cache: Arc<LinkCache>,
    in_flight: InFlight<LinkResult>,
    gate: ConcurrencyGate,
}

impl ApkService {
    /// Builds the service with the production HTTP fetcher.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] for invalid configuration, an uncreatable
    /// download directory, an unloadable known-app table or an HTTP client
    /// that cannot be built.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, StartupError> {
        config.validate()?;
        let known_apps = KnownApps::load(config.known_apps_path.as_deref())?;
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new()?);
        Self::new(config, fetcher, known_apps)
    }

    /// Builds the service around a given fetcher and known-app table.
    ///
    /// Creates the download directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] for invalid configuration or an uncreatable
    /// download directory.
    pub fn new(
        config: &ServiceConfig,
        fetcher: Arc<dyn PageFetcher>,
        known_apps: KnownApps,
    ) -> Result<Self, StartupError> {
        config.validate()?;
        std::fs::create_dir_all(&config.download_dir)
            .map_err(|e| StartupError::download_dir(&config.download_dir, e))?;

        let mirror = config.mirror()?;
        let registry = build_default_resolver_registry(
            Arc::clone(&fetcher),
            mirror.clone(),
            Arc::new(known_apps),
            ResolverTimeouts::default(),
        );
        let extractor = LinkExtractor::new(Arc::clone(&fetcher), mirror);
        let downloader = Downloader::new(
            fetcher,
            Arc::new(registry),
            extractor,
            config.download_dir.clone(),
        );

        info!(
            lookup_ceiling = config.lookup_ceiling,
            download_ceiling = config.download_ceiling,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            download_dir = %config.download_dir.display(),
            mirror = %config.mirror_url,
            "service ready"
        );

        Ok(Self {
            downloader: Arc::new(downloader),
            cache: Arc::new(LinkCache::new(config.cache_ttl)),
            in_flight: InFlight::new(),
            gate: ConcurrencyGate::new(config.lookup_ceiling, config.download_ceiling),
        })
    }

    /// Current health snapshot.
    #[must_use]
    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            lookup_ceiling: self.gate.lookup_ceiling(),
            download_ceiling: self.gate.download_ceiling(),
            cached_links: self.cache.len(),
            in_flight: self.in_flight.len(),
        }
    }

    /// Link-only lookup: gated, cached and deduplicated per normalized query.
    #[tracing::instrument(skip(self))]
    pub async fn link(&self, package: &str) -> LinkResult {
        let query = Query::new(package);
        if query.is_empty() {
            return LinkResult::failure(None, MISSING_PACKAGE_MESSAGE);
        }

        let _permit = match self.gate.admit_lookup().await {
            Ok(permit) => permit,
            Err(error) => {
                warn!(error = %error, "lookup not admitted");
                return LinkResult::failure(Some(query.trimmed()), INTERNAL_ERROR_MESSAGE);
            }
        };

        if let Some(hit) = self.cache.get(query.key()) {
            return hit;
        }

        let key = query.key().to_string();
        let work = lookup_work(
            Arc::clone(&self.downloader),
            Arc::clone(&self.cache),
            query.clone(),
        );
        match self.in_flight.coalesce(&key, work).await {
            Ok(result) => result,
            Err(error) => {
                warn!(error = %error, "shared lookup failed");
                LinkResult::failure(Some(query.trimmed()), INTERNAL_ERROR_MESSAGE)
            }
        }
    }

    /// Full download: gated by the download ceiling, never cached or shared.
    #[tracing::instrument(skip(self))]
    pub async fn download(&self, package: &str) -> DownloadResult {
        let query = Query::new(package);
        if query.is_empty() {
            return DownloadResult::failure(None, MISSING_PACKAGE_MESSAGE);
        }

        let _permit = match self.gate.admit_download().await {
            Ok(permit) => permit,
            Err(error) => {
                warn!(error = %error, "download not admitted");
                return DownloadResult::failure(Some(query.trimmed()), INTERNAL_ERROR_MESSAGE);
            }
        };

        match self.downloader.download(&query).await {
            Ok(file) => DownloadResult {
                success: true,
                package: Some(query.trimmed().to_string()),
                file_path: Some(file.path),
                filename: Some(file.filename),
                size_bytes: Some(file.size_bytes),
                content_type: Some(file.content_type),
                error: None,
            },
            Err(error) if error.is_not_found() => {
                info!(error = %error, "nothing to download");
                DownloadResult::failure(Some(query.trimmed()), error.to_string())
            }
            Err(error) => {
                warn!(error = %error, "download failed");
                DownloadResult::failure(Some(query.trimmed()), error.to_string())
            }
        }
    }

    /// The admission gates.
    #[must_use]
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }
}

/// The shared unit of work behind a link lookup.
///
/// Re-checks the cache first, since a previous burst may have filled it
/// between the caller's check and its registration. A successful result is
/// cached before the in-flight record is released.
async fn lookup_work(
    downloader: Arc<Downloader>,
    cache: Arc<LinkCache>,
    query: Query,
) -> LinkResult {
    if let Some(hit) = cache.get(query.key()) {
        return hit;
    }
    let result = match downloader.lookup(&query).await {
        Ok(descriptor) => LinkResult::found(query.trimmed(), descriptor),
        Err(error) => {
            debug!(error = %error, "lookup missed");
            LinkResult::failure(Some(query.trimmed()), error.to_string())
        }
    };
    cache.put(query.key(), result.clone());
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use futures_util::{StreamExt, stream};
    use tempfile::TempDir;
    use tokio_test::{assert_pending, task};

    use super::*;
    use crate::fetch::{FetchError, FileResponse, Page};
    use crate::models::ContentType;

    /// Canned pages keyed by URL; unknown URLs answer 404.
    ///
    /// File bodies stall after their first chunk when `stall_files` is set;
    /// otherwise file requests time out.
    struct CannedFetcher {
        pages: HashMap<String, String>,
        page_delay: Duration,
        stall_files: bool,
        requests: AtomicUsize,
        file_requests: AtomicUsize,
        log: Mutex<Vec<String>>,
    }

    impl Default for CannedFetcher {
        fn default() -> Self {
            Self {
                pages: HashMap::new(),
                page_delay: Duration::from_millis(10),
                stall_files: false,
                requests: AtomicUsize::new(0),
                file_requests: AtomicUsize::new(0),
                log: Mutex::new(Vec::new()),
            }
        }
    }

    impl CannedFetcher {
        fn with_page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        fn with_page_delay(mut self, delay: Duration) -> Self {
            self.page_delay = delay;
            self
        }

        fn with_stalled_files(mut self) -> Self {
            self.stall_files = true;
            self
        }
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch_page(&self, url: &str, _timeout: Duration) -> Result<Page, FetchError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.log.lock().unwrap().push(url.to_string());
            tokio::time::sleep(self.page_delay).await;
            Ok(match self.pages.get(url) {
                Some(body) => Page {
                    status: 200,
                    body: body.clone(),
                },
                None => Page {
                    status: 404,
                    body: String::new(),
                },
            })
        }

        async fn fetch_file(
            &self,
            url: &str,
            _timeout: Duration,
        ) -> Result<FileResponse, FetchError> {
            self.file_requests.fetch_add(1, Ordering::SeqCst);
            if !self.stall_files {
                return Err(FetchError::timeout(url));
            }
            Ok(FileResponse {
                status: 200,
                content_disposition: None,
                body: stream::iter(vec![Ok(Bytes::from_static(b"PK"))])
                    .chain(stream::pending())
                    .boxed(),
            })
        }
    }

    fn whatsapp_fetcher() -> CannedFetcher {
        CannedFetcher::default()
            .with_page("https://apkpure.com/whatsapp/com.whatsapp", "<html/>")
            .with_page(
                "https://apkpure.com/whatsapp/com.whatsapp/download",
                r#"<a href="https://d.apkpure.com/b/APK/com.whatsapp?version=latest">Download</a>"#,
            )
    }

    fn service(fetcher: Arc<CannedFetcher>, dir: &TempDir) -> ApkService {
        service_with_ceilings(fetcher, dir, 200, 10)
    }

    fn service_with_ceilings(
        fetcher: Arc<CannedFetcher>,
        dir: &TempDir,
        lookup_ceiling: usize,
        download_ceiling: usize,
    ) -> ApkService {
        let config = ServiceConfig {
            download_dir: dir.path().join("downloads"),
            lookup_ceiling,
            download_ceiling,
            ..ServiceConfig::default()
        };
        ApkService::new(
            &config,
            fetcher,
            KnownApps::from_pairs([("whatsapp", "com.whatsapp")]),
        )
        .unwrap()
    }

    async fn wait_until(condition: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_success_is_cached() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(whatsapp_fetcher());
        let service = service(Arc::clone(&fetcher), &dir);

        let first = service.link("WhatsApp").await;
        assert!(first.success);
        assert_eq!(first.content_type, Some(ContentType::Apk));
        let requests = fetcher.requests.load(Ordering::SeqCst);

        let second = service.link("  whatsapp").await;
        assert_eq!(second, first);
        assert_eq!(fetcher.requests.load(Ordering::SeqCst), requests);
        assert_eq!(service.health().cached_links, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_failure_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(CannedFetcher::default());
        let service = service(Arc::clone(&fetcher), &dir);

        let first = service.link("completely-unknown-xyz").await;
        assert!(!first.success);
        assert_eq!(first.error.as_deref(), Some("app not found"));
        let requests = fetcher.requests.load(Ordering::SeqCst);

        let _ = service.link("completely-unknown-xyz").await;
        assert!(fetcher.requests.load(Ordering::SeqCst) > requests);
        assert_eq!(service.health().cached_links, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_links_share_one_resolution() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(whatsapp_fetcher());
        let service = service(Arc::clone(&fetcher), &dir);

        let (a, b) = tokio::join!(service.link("whatsapp"), service.link("WHATSAPP"));

        assert_eq!(a, b);
        let log = fetcher.log.lock().unwrap();
        let probes = log
            .iter()
            .filter(|url| url.ends_with("/whatsapp/com.whatsapp"))
            .count();
        assert_eq!(probes, 1);
    }

    #[tokio::test]
    async fn test_blank_package_is_rejected_without_fetching() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(CannedFetcher::default());
        let service = service(Arc::clone(&fetcher), &dir);

        let link = service.link("   ").await;
        let download = service.download("").await;

        assert_eq!(link.error.as_deref(), Some(MISSING_PACKAGE_MESSAGE));
        assert_eq!(download.error.as_deref(), Some(MISSING_PACKAGE_MESSAGE));
        assert_eq!(fetcher.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_failure_surfaces_transport_message() {
        let dir = TempDir::new().unwrap();
        let service = service(Arc::new(whatsapp_fetcher()), &dir);

        let result = service.download("whatsapp").await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("timeout"));
        assert_eq!(service.gate().available_downloads(), 10);
    }

    #[tokio::test]
    async fn test_download_holds_its_slot_while_lookups_proceed() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(whatsapp_fetcher().with_stalled_files());
        let service = Arc::new(service_with_ceilings(Arc::clone(&fetcher), &dir, 200, 1));

        let first = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.download("whatsapp").await }
        });
        wait_until(|| fetcher.file_requests.load(Ordering::SeqCst) == 1).await;
        assert_eq!(service.gate().available_downloads(), 0);

        let mut second = task::spawn(service.download("whatsapp"));
        assert_pending!(second.poll());

        let link = service.link("whatsapp").await;
        assert!(link.success);
        assert_pending!(second.poll());
        assert_eq!(fetcher.file_requests.load(Ordering::SeqCst), 1);

        first.abort();
        assert!(first.await.unwrap_err().is_cancelled());
        assert!(second.is_woken());
        drop(second);
        assert_eq!(service.gate().available_downloads(), 1);
        assert_eq!(
            std::fs::read_dir(dir.path().join("downloads")).unwrap().count(),
            0
        );
    }

    #[tokio::test]
    async fn test_link_holds_its_slot_for_the_whole_lookup() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(whatsapp_fetcher().with_page_delay(Duration::from_secs(60)));
        let service = Arc::new(service_with_ceilings(Arc::clone(&fetcher), &dir, 1, 10));

        let first = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.link("whatsapp").await }
        });
        wait_until(|| fetcher.requests.load(Ordering::SeqCst) == 1).await;
        assert_eq!(service.gate().available_lookups(), 0);

        let mut second = task::spawn(service.link("signal"));
        assert_pending!(second.poll());
        assert_eq!(fetcher.requests.load(Ordering::SeqCst), 1);

        first.abort();
        let _ = first.await;
        assert!(second.is_woken());
    }

    #[test]
    fn test_new_creates_download_directory() {
        let dir = TempDir::new().unwrap();
        let _service = service(Arc::new(CannedFetcher::default()), &dir);
        assert!(dir.path().join("downloads").is_dir());
    }

    #[test]
    fn test_uncreatable_download_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let config = ServiceConfig {
            download_dir: blocker.join("downloads"),
            ..ServiceConfig::default()
        };

        let err = ApkService::new(
            &config,
            Arc::new(CannedFetcher::default()),
            KnownApps::default(),
        )
        .unwrap_err();

        assert!(matches!(err, StartupError::DownloadDir { .. }));
    }

    #[test]
    fn test_health_reports_ceilings() {
        let dir = TempDir::new().unwrap();
        let health = service(Arc::new(CannedFetcher::default()), &dir).health();
        assert_eq!(health.status, "ok");
        assert_eq!(health.lookup_ceiling, 200);
        assert_eq!(health.download_ceiling, 10);
        assert_eq!(health.in_flight, 0);
    }
}
