//! Filename derivation for downloaded packages.
//!
//! A server-provided `Content-Disposition` name is preferred; otherwise the
//! name is synthesized from the query. Either way the extension is forced to
//! agree with the detected [`ContentType`].

use std::path::{Component, Path};

use crate::models::ContentType;
use crate::query::Query;

/// Derives the final, filesystem-safe filename for a download.
#[must_use]
pub fn resolve_filename(
    content_disposition: Option<&str>,
    query: &Query,
    content_type: ContentType,
) -> String {
    let name = content_disposition
        .and_then(parse_content_disposition)
        .map(|name| sanitize_filename(&name))
        .filter(|name| has_stem(name))
        .unwrap_or_else(|| synthesize_filename(query, content_type));
    enforce_extension(&name, content_type)
}

/// A name made only of an extension (`.apk`) or filler characters has no stem.
fn has_stem(name: &str) -> bool {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    !stem.trim_matches(['_', '.']).is_empty()
}

/// `{query with spaces as underscores}{extension}`.
#[must_use]
pub fn synthesize_filename(query: &Query, content_type: ContentType) -> String {
    let stem = sanitize_filename(&query.trimmed().replace(' ', "_"));
    format!("{stem}{}", content_type.extension())
}

/// Rewrites the extension unless it is already accepted for `content_type`.
///
/// The last `.suffix` is replaced; a name without a dot gets the extension
/// appended.
#[must_use]
pub fn enforce_extension(name: &str, content_type: ContentType) -> String {
    let lower = name.to_ascii_lowercase();
    if content_type
        .accepted_extensions()
        .iter()
        .any(|ext| lower.ends_with(ext))
    {
        return name.to_string();
    }
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    format!("{stem}{}", content_type.extension())
}

/// Extracts the filename from a `Content-Disposition` header value.
///
/// Handles quoted, single-quoted and bare `filename=` values and prefers the
/// RFC 5987 `filename*=UTF-8''...` form when present.
#[must_use]
pub fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + "filename*=".len()..].trim();
        if let Some((_, encoded)) = value.split_once("''") {
            let encoded = encoded.split(';').next().unwrap_or_default().trim();
            if let Ok(decoded) = urlencoding::decode(encoded)
                && !decoded.is_empty()
            {
                return Some(decoded.into_owned());
            }
        }
    }

    let pos = header.find("filename=")?;
    let value = header[pos + "filename=".len()..].trim_start();
    let name = match value.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let inner = &value[1..];
            inner.split(quote).next().unwrap_or_default()
        }
        _ => value.split(';').next().unwrap_or_default().trim(),
    };
    (!name.is_empty()).then(|| name.to_string())
}

/// Replaces characters that are invalid on common filesystems and neutralizes
/// dot segments such as `..`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }
    if is_plain_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

fn is_plain_segment(name: &str) -> bool {
    Path::new(name)
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
}
