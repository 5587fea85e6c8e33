//! HTTP API: `/health`, `/link?package=` and `/download?package=`.
//!
//! Every response is HTTP 200 with a JSON payload; `success` carries the
//! outcome. Request work runs on its own task so a disconnecting client does
//! not cancel a lookup or a transfer midway.

use std::future::Future;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::models::{DownloadResult, HealthStatus, LinkResult};
use crate::service::{ApkService, INTERNAL_ERROR_MESSAGE, MISSING_PACKAGE_MESSAGE};

/// Query string of the link and download endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PackageParams {
    /// App name or package identifier.
    pub package: Option<String>,
}

impl PackageParams {
    fn into_package(params: Result<Query<Self>, QueryRejection>) -> Option<String> {
        params
            .ok()
            .and_then(|Query(params)| params.package)
            .filter(|package| !package.trim().is_empty())
    }
}

/// Builds the API router.
pub fn router(service: Arc<ApkService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/link", get(link))
        .route("/download", get(download))
        .with_state(service)
}

/// Serves the API on `listener` until `shutdown` resolves, then drains
/// in-flight requests.
///
/// # Errors
///
/// Returns the underlying IO error if the server fails.
pub async fn serve<S>(
    listener: TcpListener,
    service: Arc<ApkService>,
    shutdown: S,
) -> std::io::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}

/// Runs `work` on its own task; a panic becomes `on_fault()`.
pub async fn run_detached<T, F>(work: F, on_fault: impl FnOnce() -> T) -> T
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(value) => value,
        Err(e) => {
            error!(error = %e, "request task failed");
            on_fault()
        }
    }
}

async fn health(State(service): State<Arc<ApkService>>) -> Json<HealthStatus> {
    Json(service.health())
}

async fn link(
    State(service): State<Arc<ApkService>>,
    params: Result<Query<PackageParams>, QueryRejection>,
) -> Json<LinkResult> {
    let Some(package) = PackageParams::into_package(params) else {
        return Json(LinkResult::failure(None, MISSING_PACKAGE_MESSAGE));
    };
    let fallback = package.clone();
    let result = run_detached(async move { service.link(&package).await }, move || {
        LinkResult::failure(Some(fallback.trim()), INTERNAL_ERROR_MESSAGE)
    })
    .await;
    Json(result)
}

async fn download(
    State(service): State<Arc<ApkService>>,
    params: Result<Query<PackageParams>, QueryRejection>,
) -> Json<DownloadResult> {
    let Some(package) = PackageParams::into_package(params) else {
        return Json(DownloadResult::failure(None, MISSING_PACKAGE_MESSAGE));
    };
    let fallback = package.clone();
    let result = run_detached(async move { service.download(&package).await }, move || {
        DownloadResult::failure(Some(fallback.trim()), INTERNAL_ERROR_MESSAGE)
    })
    .await;
    Json(result)
}
