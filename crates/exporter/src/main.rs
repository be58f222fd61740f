//! Resource Exporter - container resource request/limit exporter
//!
//! Periodically lists every pod in the cluster and exposes each
//! container's CPU and memory requests and limits as Prometheus gauges.

use anyhow::{Context, Result};
use clap::Parser;
use exporter_lib::{
    client::{create_client, ClientSource},
    server, Exporter, Lifecycle, ResourceMetrics,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let cli = config::Cli::parse();
    let lifecycle = Lifecycle::new();
    info!(version = EXPORTER_VERSION, "Starting resource-exporter");

    let config = config::ExporterConfig::load(&cli)?;
    info!(
        kube_context = %config.kube_context,
        scrape_interval_secs = config.scrape_interval_secs,
        listen_port = config.listen_port,
        "Exporter configured"
    );

    let source = ClientSource::from_context(&config.kube_context);
    let client = create_client(&source)
        .await
        .context("Failed to create Kubernetes client")?;

    let metrics = ResourceMetrics::new().context("Failed to register metrics")?;
    let listener = server::bind(config.listen_port).await?;

    let exporter = Exporter::new(
        Arc::new(client),
        metrics,
        config.scrape_interval(),
        lifecycle,
    );
    exporter.run(listener, shutdown_signal()).await;

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on SIGINT
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Interrupt signal received"),
        Err(e) => {
            error!(error = %e, "Failed to listen for interrupt signal");
            std::future::pending::<()>().await;
        }
    }
}
