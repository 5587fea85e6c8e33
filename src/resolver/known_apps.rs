//! Known-app table: well-known app names mapped to store package identifiers.
//!
//! The table is deployment data. A built-in copy ships with the crate
//! (`data/known_apps.json`) and can be replaced by a JSON file of the same
//! shape: `{ "app name": "package.identifier", ... }`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::query::normalize_key;

const BUILTIN_TABLE: &str = include_str!("../../data/known_apps.json");

/// Errors loading a known-app table.
#[derive(Debug, Error)]
pub enum KnownAppsError {
    /// The table file could not be read.
    #[error("cannot read known-app table {path}: {source}")]
    Read {
        /// The table path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The table is not a JSON object of string to string.
    #[error("invalid known-app table {origin}: {source}")]
    Parse {
        /// Where the table came from (path or "built-in").
        origin: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Normalized app name → package identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownApps {
    entries: HashMap<String, String>,
}

impl KnownApps {
    /// The table shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns [`KnownAppsError::Parse`] if the embedded table is malformed.
    pub fn builtin() -> Result<Self, KnownAppsError> {
        Self::from_json(BUILTIN_TABLE, "built-in")
    }

    /// Loads a table from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`KnownAppsError`] when the file is unreadable or malformed.
    pub fn from_file(path: &Path) -> Result<Self, KnownAppsError> {
        let text = std::fs::read_to_string(path).map_err(|source| KnownAppsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, &path.display().to_string())
    }

    /// Loads `path` when given, otherwise the built-in table.
    ///
    /// # Errors
    ///
    /// Returns [`KnownAppsError`] when the selected table cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<Self, KnownAppsError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    /// Parses a JSON object table; keys are normalized like queries.
    ///
    /// # Errors
    ///
    /// Returns [`KnownAppsError::Parse`] for anything but a string-to-string object.
    pub fn from_json(text: &str, origin: &str) -> Result<Self, KnownAppsError> {
        let raw: HashMap<String, String> =
            serde_json::from_str(text).map_err(|source| KnownAppsError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        let table = Self::from_pairs(raw);
        debug!(origin, entries = table.len(), "known-app table loaded");
        Ok(table)
    }

    /// Builds a table from name/package pairs.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .filter_map(|(name, package)| {
                let name = normalize_key(name.as_ref());
                let package: String = package.into();
                (!name.is_empty() && !package.is_empty()).then_some((name, package))
            })
            .collect();
        Self { entries }
    }

    /// Looks up a normalized key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_table_parses() {
        let table = KnownApps::builtin().unwrap();
        assert_eq!(table.get("whatsapp"), Some("com.whatsapp"));
        assert_eq!(table.get("spotify"), Some("com.spotify.music"));
        assert_eq!(table.get("clash of clans"), Some("com.supercell.clashofclans"));
    }

    #[test]
    fn test_keys_are_normalized() {
        let table = KnownApps::from_pairs([("  Signal ", "org.thoughtcrime.securesms")]);
        assert_eq!(table.get("signal"), Some("org.thoughtcrime.securesms"));
    }

    #[test]
    fn test_empty_entries_are_dropped() {
        let table = KnownApps::from_pairs([("", "com.a"), ("b", "")]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_from_file_replaces_builtin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apps.json");
        std::fs::write(&path, r#"{"Signal": "org.thoughtcrime.securesms"}"#).unwrap();

        let table = KnownApps::load(Some(&path)).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("whatsapp"), None);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = KnownApps::from_json("[1, 2]", "test").unwrap_err();
        assert!(matches!(err, KnownAppsError::Parse { .. }));
        assert!(err.to_string().contains("test"));
    }

    #[test]
    fn test_from_file_missing_is_read_error() {
        let err = KnownApps::from_file(Path::new("/nonexistent/apps.json")).unwrap_err();
        assert!(matches!(err, KnownAppsError::Read { .. }));
    }
}
