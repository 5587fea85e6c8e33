//! Constants for the download module (timeouts, chunking).

use std::time::Duration;

/// Time allowed for the file response headers, and for each body chunk after that.
pub const FILE_TIMEOUT: Duration = Duration::from_secs(180);

/// Write buffer size; bounds the bytes held in memory per transfer.
pub const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Suffix of in-progress transfer files.
pub const PART_SUFFIX: &str = ".part";

/// Prefix of in-progress transfer files; part names never embed the final filename.
pub const PART_PREFIX: &str = ".apkgrab-";

/// Directory downloads land in when none is configured.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
