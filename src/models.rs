//! Data model shared by the pipeline, the cache and the API payloads.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Android package format of a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Plain single-file package.
    Apk,
    /// Bundle: a base package plus split packages.
    Xapk,
}

impl ContentType {
    /// Marker whose presence in a download URL identifies a bundle.
    pub const BUNDLE_MARKER: &'static str = "xapk";

    /// Classifies a download URL: bundle iff it contains the bundle marker,
    /// ignoring case.
    #[must_use]
    pub fn classify(url: &str) -> Self {
        if url.to_ascii_lowercase().contains(Self::BUNDLE_MARKER) {
            Self::Xapk
        } else {
            Self::Apk
        }
    }

    /// Canonical file extension, including the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Apk => ".apk",
            Self::Xapk => ".xapk",
        }
    }

    /// Extensions accepted as already matching this type.
    #[must_use]
    pub fn accepted_extensions(self) -> &'static [&'static str] {
        match self {
            Self::Apk => &[".apk"],
            Self::Xapk => &[".xapk", ".apks"],
        }
    }

    /// Stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Apk => "apk",
            Self::Xapk => "xapk",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reachable app detail page on the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedApp {
    /// Absolute page URL.
    pub page_url: String,
}

impl ResolvedApp {
    /// Creates a resolved app from its page URL.
    #[must_use]
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
        }
    }
}

/// A direct, absolute file URL and its package type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadDescriptor {
    /// Absolute file URL.
    pub url: String,
    /// Package type inferred from the URL shape.
    pub content_type: ContentType,
}

impl DownloadDescriptor {
    /// Builds a descriptor, classifying the content type from the URL.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let content_type = ContentType::classify(&url);
        Self { url, content_type }
    }
}

/// Link-only response and cache payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResult {
    /// Whether a direct link was found.
    pub success: bool,
    /// The query as supplied by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Direct file URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Package type of `url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    /// Human-readable failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LinkResult {
    /// Successful lookup.
    #[must_use]
    pub fn found(package: impl Into<String>, descriptor: DownloadDescriptor) -> Self {
        Self {
            success: true,
            package: Some(package.into()),
            url: Some(descriptor.url),
            content_type: Some(descriptor.content_type),
            error: None,
        }
    }

    /// Failed lookup with a user-facing message.
    #[must_use]
    pub fn failure(package: Option<&str>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            package: package.map(std::string::ToString::to_string),
            url: None,
            content_type: None,
            error: Some(error.into()),
        }
    }
}

/// Full-download response payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResult {
    /// Whether the file was written.
    pub success: bool,
    /// The query as supplied by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Path of the written file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    /// Final filename.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Bytes written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Package type of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    /// Human-readable failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadResult {
    /// Failed download with a user-facing message.
    #[must_use]
    pub fn failure(package: Option<&str>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            package: package.map(std::string::ToString::to_string),
            file_path: None,
            filename: None,
            size_bytes: None,
            content_type: None,
            error: Some(error.into()),
        }
    }
}

/// Health endpoint payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Always `"ok"` while the process serves requests.
    pub status: String,
    /// Maximum concurrently admitted lookups.
    pub lookup_ceiling: usize,
    /// Maximum concurrently admitted downloads.
    pub download_ceiling: usize,
    /// Entries currently held by the link cache (including not-yet-observed stale ones).
    pub cached_links: usize,
    /// Lookups currently being resolved.
    pub in_flight: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_classify_bundle_marker_any_case() {
        assert_eq!(
            ContentType::classify("https://d.apkpure.com/b/XAPK/com.app?version=latest"),
            ContentType::Xapk
        );
        assert_eq!(
            ContentType::classify("https://cdn.example/file.xApK"),
            ContentType::Xapk
        );
        assert_eq!(
            ContentType::classify("https://d.apkpure.com/b/APK/com.whatsapp"),
            ContentType::Apk
        );
    }

    #[test]
    fn test_link_result_serializes_camel_case_without_empty_fields() {
        let result = LinkResult::found(
            "WhatsApp",
            DownloadDescriptor::from_url("https://d.apkpure.com/b/APK/com.whatsapp"),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["package"], "WhatsApp");
        assert_eq!(json["contentType"], "apk");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_download_result_failure_carries_error_only() {
        let result = DownloadResult::failure(Some("x"), "app not found");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "app not found");
        assert!(json.get("filePath").is_none());
        assert!(json.get("sizeBytes").is_none());
    }

    #[test]
    fn test_bundle_accepts_apks_extension() {
        assert!(ContentType::Xapk.accepted_extensions().contains(&".apks"));
        assert!(!ContentType::Apk.accepted_extensions().contains(&".xapk"));
    }
}
