//! Network API entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use apkgrab_core::config::{
    DEFAULT_BIND_ADDR, DEFAULT_CACHE_TTL_SECS, DEFAULT_DOWNLOAD_CEILING, DEFAULT_LOOKUP_CEILING,
};
use apkgrab_core::download::constants::DEFAULT_DOWNLOAD_DIR;
use apkgrab_core::mirror::DEFAULT_MIRROR_URL;
use apkgrab_core::server::{serve, shutdown_signal};
use apkgrab_core::{ApkService, ServiceConfig};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Serve app lookups and downloads over HTTP.
#[derive(Parser, Debug)]
#[command(name = "apkgrab-server")]
#[command(author, version, about)]
struct ServerArgs {
    /// Listen address
    #[arg(long, env = "APKGRAB_BIND", default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// Maximum concurrently admitted link lookups
    #[arg(long, env = "SCRAPER_SERVER_CONCURRENCY", default_value_t = DEFAULT_LOOKUP_CEILING)]
    lookup_concurrency: usize,

    /// Maximum concurrently admitted downloads
    #[arg(long, env = "SCRAPER_SERVER_DOWNLOAD_CONCURRENCY", default_value_t = DEFAULT_DOWNLOAD_CEILING)]
    download_concurrency: usize,

    /// Link cache TTL in seconds
    #[arg(long, env = "LINK_CACHE_TTL", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    cache_ttl: u64,

    /// Directory downloads are written to
    #[arg(short = 'o', long, env = "APKGRAB_DOWNLOAD_DIR", default_value = DEFAULT_DOWNLOAD_DIR)]
    output_dir: PathBuf,

    /// Mirror origin URL
    #[arg(long, env = "APKGRAB_MIRROR_URL", default_value = DEFAULT_MIRROR_URL)]
    mirror: String,

    /// JSON file replacing the built-in known-app table
    #[arg(long, env = "APKGRAB_KNOWN_APPS")]
    known_apps: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    quiet: bool,
}

impl ServerArgs {
    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            lookup_ceiling: self.lookup_concurrency,
            download_ceiling: self.download_concurrency,
            cache_ttl: Duration::from_secs(self.cache_ttl),
            download_dir: self.output_dir.clone(),
            mirror_url: self.mirror.clone(),
            known_apps_path: self.known_apps.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();

    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "server arguments parsed");

    let service = ApkService::from_config(&args.service_config())
        .context("failed to initialize service")?;
    let listener = TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;

    serve(listener, Arc::new(service), shutdown_signal())
        .await
        .context("server error")?;
    info!("server stopped");
    Ok(())
}
