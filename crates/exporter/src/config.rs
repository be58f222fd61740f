//! Exporter configuration

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_SCRAPE_INTERVAL_SECS: i64 = 3600;
const DEFAULT_LISTEN_PORT: i64 = 8080;

/// Export container resource requests and limits as Prometheus gauges
#[derive(Debug, Default, Parser)]
#[command(name = "resource-exporter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Kubernetes context to use when running locally (leave empty for in-cluster configuration)
    #[arg(long = "kube.context", value_name = "CONTEXT")]
    pub kube_context: Option<String>,

    /// The scrape interval in seconds [default: 3600]
    #[arg(long = "scrape.interval", value_name = "SECONDS")]
    pub scrape_interval: Option<u64>,
}

/// Exporter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    /// Kubeconfig context; empty selects in-cluster credentials
    pub kube_context: String,

    /// Seconds between pod list polls
    pub scrape_interval_secs: u64,

    /// Port of the metrics server
    pub listen_port: u16,
}

impl ExporterConfig {
    /// Load configuration from defaults, `EXPORTER_*` environment and flags
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::load_with_environment(cli, config::Environment::with_prefix("EXPORTER"))
    }

    /// Load configuration layering `environment` under the flags
    pub fn load_with_environment(cli: &Cli, environment: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .set_default("kube_context", "")?
            .set_default("scrape_interval_secs", DEFAULT_SCRAPE_INTERVAL_SECS)?
            .set_default("listen_port", DEFAULT_LISTEN_PORT)?
            .add_source(environment)
            .set_override_option("kube_context", cli.kube_context.clone())?
            .set_override_option(
                "scrape_interval_secs",
                cli.scrape_interval.map(|secs| secs.to_string()),
            )?
            .build()
            .context("Failed to build configuration")?;

        let loaded: ExporterConfig = config
            .try_deserialize()
            .context("Invalid configuration")?;

        if loaded.scrape_interval_secs == 0 {
            anyhow::bail!("scrape interval must be at least one second");
        }

        Ok(loaded)
    }

    pub fn scrape_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval_secs)
    }
}
