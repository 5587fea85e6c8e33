//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use apkgrab_core::{ApkService, ServiceConfig};
use tempfile::TempDir;

/// Builds a service whose mirror is `mirror_url`, writing into a fresh temp dir.
pub fn service_for(mirror_url: &str) -> (ApkService, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = ServiceConfig {
        download_dir: dir.path().join("downloads"),
        mirror_url: mirror_url.to_string(),
        ..ServiceConfig::default()
    };
    let service = ApkService::from_config(&config).unwrap();
    (service, dir)
}
