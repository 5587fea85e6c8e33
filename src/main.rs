//! CLI entry point: resolve one query and print one JSON result line.

use std::process::ExitCode;

use anyhow::{Context, Result};
use apkgrab_core::{ApkService, LinkResult, ServiceConfig};
use clap::Parser;
use tracing::debug;

mod cli;

use cli::Args;

/// Printed when no query argument is given.
const NO_QUERY_MESSAGE: &str = "no app name supplied";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
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
    // stdout carries the JSON result only.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let Some(query) = args.query() else {
        print_json(&LinkResult::failure(None, NO_QUERY_MESSAGE))?;
        return Ok(ExitCode::FAILURE);
    };

    let config = ServiceConfig {
        download_dir: args.output_dir.clone(),
        mirror_url: args.mirror.clone(),
        known_apps_path: args.known_apps.clone(),
        ..ServiceConfig::default()
    };
    let service = ApkService::from_config(&config).context("failed to start")?;

    if args.link_only {
        print_json(&service.link(query).await)?;
    } else {
        print_json(&service.download(query).await)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value).context("failed to serialize result")?;
    println!("{line}");
    Ok(())
}
