//! Query normalization shared by resolution, caching, and deduplication.
//!
//! A [`Query`] keeps the caller's original text (used when synthesizing
//! filenames) next to a normalized key (lower-cased and trimmed) that the
//! cache, the in-flight table and the known-app lookup all agree on.

use std::fmt;

/// An app name or reverse-domain package identifier supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    raw: String,
    key: String,
}

impl Query {
    /// Creates a query from raw caller input.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let key = normalize_key(&raw);
        Self { raw, key }
    }

    /// Original input, casing preserved.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Original input with surrounding whitespace removed.
    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.raw.trim()
    }

    /// Normalized key used for cache, dedupe and known-app lookups.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true if the query has no content after trimming.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    /// Returns true if the query looks like a reverse-domain package identifier
    /// (two or more non-empty dot-separated segments, no whitespace).
    #[must_use]
    pub fn looks_like_package_id(&self) -> bool {
        let trimmed = self.trimmed();
        if trimmed.chars().any(char::is_whitespace) {
            return false;
        }
        let segments: Vec<&str> = trimmed.split('.').collect();
        segments.len() >= 2 && segments.iter().all(|segment| !segment.is_empty())
    }

    /// URL slug form of the normalized key (spaces become `-`).
    #[must_use]
    pub fn slug(&self) -> String {
        self.key.replace(' ', "-")
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Lower-cases and trims raw input into a lookup key.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}
