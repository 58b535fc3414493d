use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod client;
mod collect;
mod config;
mod error;
mod metrics;
mod models;
mod publish;
mod scheduler;

use client::HttpStatsClient;
use config::Args;
use metrics::RequestTimings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries only payloads.
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    // ── 1. Validate configuration ───────────────────────────────
    let config = args.into_config()?;

    // ── 2. Build the HTTP client ────────────────────────────────
    let timings = Arc::new(RequestTimings::new());
    let client = HttpStatsClient::new(&config.client, Arc::clone(&timings))?;
    info!(target_url = client.base_url(), "stats client ready");

    // ── 3. Collect ──────────────────────────────────────────────
    match config.interval {
        None => scheduler::run_once(&client, &config.collect, &timings, config.pretty).await,
        Some(period) => {
            scheduler::run_every(period, &client, &config.collect, &timings, config.pretty).await
        }
    }
}
