//! fping-exporter - ICMP latency and packet-loss exporter
//!
//! Periodically probes a runtime-managed target list with batched ICMP
//! echoes and exposes the aggregated statistics for Prometheus scraping.

use anyhow::{Context, Result};
use clap::Parser;
use fping_exporter::{app::App, cli::Cli, config::Config};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli).context("failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate().context("invalid configuration")?;

    info!("fping-exporter starting up");
    info!("fping binary: {}", config.probe.fping_path.display());
    info!(
        "probe: {} packets, {}ms per-packet timeout, every {}s",
        config.probe.packet_count,
        config.probe.per_packet_timeout_ms,
        config.probe.interval_seconds
    );
    info!("target file: {}", config.targets.file.display());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app = App::builder(config).build(shutdown_rx).await?;
    info!(
        "serving metrics on http://{}/metrics, management API on http://{}",
        app.metrics_addr(),
        app.api_addr()
    );

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, shutting down");
    shutdown_tx
        .send(true)
        .context("failed to send shutdown signal")?;

    app.run().await
}
