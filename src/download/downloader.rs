//! The acquisition pipeline: resolve, extract, then stream the file to disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use crate::extract::LinkExtractor;
use crate::fetch::{FileResponse, PageFetcher};
use crate::models::{ContentType, DownloadDescriptor};
use crate::query::Query;
use crate::resolver::ResolverRegistry;

use super::DownloadError;
use super::constants::{CHUNK_SIZE, FILE_TIMEOUT, PART_PREFIX, PART_SUFFIX};
use super::filename::resolve_filename;

static PART_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Partial transfer file, removed on drop unless kept.
///
/// Covers errors and cancellation of the transfer future alike.
struct PartFile {
    path: PathBuf,
    keep: bool,
}

impl PartFile {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Call once the file has been renamed into place.
    fn keep(mut self) {
        self.keep = true;
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed partial file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "could not remove partial file"),
        }
    }
}

/// A package written to the download directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Final path of the file.
    pub path: PathBuf,
    /// Final filename.
    pub filename: String,
    /// Bytes written.
    pub size_bytes: u64,
    /// Package type of the file.
    pub content_type: ContentType,
}

/// Orchestrates resolution, link extraction and the streamed file transfer.
pub struct Downloader {
    fetcher: Arc<dyn PageFetcher>,
    registry: Arc<ResolverRegistry>,
    extractor: LinkExtractor,
    download_dir: PathBuf,
    file_timeout: Duration,
}

impl Downloader {
    /// Creates a downloader writing into `download_dir`.
    ///
    /// The directory is expected to exist; see `ApkService::from_config`.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        registry: Arc<ResolverRegistry>,
        extractor: LinkExtractor,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            registry,
            extractor,
            download_dir: download_dir.into(),
            file_timeout: FILE_TIMEOUT,
        }
    }

    /// Overrides the header and per-chunk timeout of file transfers.
    #[must_use]
    pub fn with_file_timeout(mut self, timeout: Duration) -> Self {
        self.file_timeout = timeout;
        self
    }

    /// Resolves `query` to a direct file link without downloading it.
    ///
    /// # Errors
    ///
    /// [`DownloadError::AppNotFound`] when no strategy finds an app page,
    /// [`DownloadError::LinkNotFound`] when the page has no usable link.
    #[tracing::instrument(skip(self), fields(query = %query))]
    pub async fn lookup(&self, query: &Query) -> Result<DownloadDescriptor, DownloadError> {
        let app = self
            .registry
            .resolve(query)
            .await
            .ok_or_else(|| DownloadError::app_not_found(query.raw()))?;
        self.extractor
            .extract(&app.page_url)
            .await
            .ok_or_else(|| DownloadError::link_not_found(app.page_url))
    }

    /// Resolves `query` and writes the package into the download directory.
    ///
    /// # Errors
    ///
    /// Lookup errors as for [`Self::lookup`]; transport errors carrying the
    /// observed status; [`DownloadError::Io`] for local write failures.
    #[tracing::instrument(skip(self), fields(query = %query))]
    pub async fn download(&self, query: &Query) -> Result<DownloadedFile, DownloadError> {
        let descriptor = self.lookup(query).await?;
        self.fetch_to_disk(query, &descriptor).await
    }

    /// Streams an already resolved file into the download directory.
    ///
    /// # Errors
    ///
    /// See [`Self::download`].
    pub async fn fetch_to_disk(
        &self,
        query: &Query,
        descriptor: &DownloadDescriptor,
    ) -> Result<DownloadedFile, DownloadError> {
        let url = descriptor.url.as_str();
        let response = self
            .fetcher
            .fetch_file(url, self.file_timeout)
            .await
            .map_err(|e| DownloadError::fetch(url, e))?;
        if !response.is_success() {
            return Err(DownloadError::http_status(url, response.status));
        }

        let filename = resolve_filename(
            response.content_disposition.as_deref(),
            query,
            descriptor.content_type,
        );
        let final_path = self.download_dir.join(&filename);
        let part = PartFile::new(self.part_path());
        debug!(path = %part.path().display(), "streaming into partial file");

        let written = self.stream_to_file(response, url, part.path()).await?;

        if let Err(source) = tokio::fs::rename(part.path(), &final_path).await {
            warn!(path = %final_path.display(), error = %source, "could not move download into place");
            return Err(DownloadError::io(final_path, source));
        }
        part.keep();

        info!(
            path = %final_path.display(),
            bytes = written,
            content_type = %descriptor.content_type,
            "download complete"
        );
        Ok(DownloadedFile {
            path: final_path,
            filename,
            size_bytes: written,
            content_type: descriptor.content_type,
        })
    }

    fn part_path(&self) -> PathBuf {
        let sequence = PART_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        self.download_dir.join(format!(
            "{PART_PREFIX}{}-{sequence}{PART_SUFFIX}",
            std::process::id()
        ))
    }

    /// Streams the body to `path`, returning bytes written.
    async fn stream_to_file(
        &self,
        response: FileResponse,
        url: &str,
        path: &Path,
    ) -> Result<u64, DownloadError> {
        let file = File::create(path)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
        let mut body = response.body;
        let mut bytes_written: u64 = 0;

        loop {
            let next = tokio::time::timeout(self.file_timeout, body.next())
                .await
                .map_err(|_| DownloadError::timeout(url))?;
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk.map_err(|e| DownloadError::fetch(url, e))?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| DownloadError::io(path, e))?;
            bytes_written += chunk.len() as u64;
        }

        writer
            .flush()
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        Ok(bytes_written)
    }
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("registry", &self.registry)
            .field("extractor", &self.extractor)
            .field("download_dir", &self.download_dir)
            .field("file_timeout", &self.file_timeout)
            .finish_non_exhaustive()
    }
}
