//! Polling loop
//!
//! Runs one poll immediately, then one per tick of a fixed-interval timer.
//! Cycles never overlap and an in-progress cycle is never cancelled.

use super::{pod_resources, PodLister};
use crate::metrics::ResourceMetrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Counts from one successful poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub pods: usize,
    pub containers: usize,
}

/// Periodically copies declared pod resources into the gauge registry
pub struct Poller {
    lister: Arc<dyn PodLister>,
    metrics: ResourceMetrics,
    interval: Duration,
}

impl Poller {
    pub fn new(lister: Arc<dyn PodLister>, metrics: ResourceMetrics, interval: Duration) -> Self {
        Self {
            lister,
            metrics,
            interval,
        }
    }

    /// Run a single poll cycle
    ///
    /// A failed list call is logged and the cycle is abandoned; gauges keep
    /// their previous values and `None` is returned.
    pub async fn run_once(&self) -> Option<PollSummary> {
        let start = Instant::now();

        let pods = match self.lister.list_pods().await {
            Ok(pods) => pods,
            Err(e) => {
                let error = format!("{e:#}");
                error!(error = %error, "Failed to list pods, skipping poll cycle");
                return None;
            }
        };

        let mut summary = PollSummary {
            pods: pods.len(),
            containers: 0,
        };

        for pod in &pods {
            for resources in pod_resources(pod) {
                self.metrics.record(&resources);
                summary.containers += 1;
            }
        }

        debug!(
            pods = summary.pods,
            containers = summary.containers,
            elapsed_ms = start.elapsed().as_millis(),
            "Poll cycle complete"
        );

        Some(summary)
    }

    /// Poll until `shutdown` fires or its sender is dropped
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting pod resource poller"
        );

        // First tick completes immediately
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    info!("Shutting down pod resource poller");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_once().await;
                }
            }
        }
    }
}
