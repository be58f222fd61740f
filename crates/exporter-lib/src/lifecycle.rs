//! Process lifecycle: wires the poller and the metrics server together
//!
//! ```text
//! Starting -> Running -> Draining -> Stopped
//! ```
//!
//! The poller runs in a background task and the server in the caller's
//! task. When the shutdown future resolves the poller is told to stop (an
//! in-progress poll still completes) and the server drains in-flight
//! requests without a timeout.

use crate::metrics::ResourceMetrics;
use crate::poller::{PodLister, Poller};
use crate::server::{self, AppState};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tracing::{error, info};

/// Lifecycle states, in the only order they are entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Starting,
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Observable lifecycle state shared across tasks
#[derive(Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<LifecycleState>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LifecycleState::Starting);
        Self { tx: Arc::new(tx) }
    }

    pub fn state(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// Move forward to `next`; moving backwards is ignored
    pub fn transition(&self, next: LifecycleState) {
        let mut previous = None;
        self.tx.send_if_modified(|state| {
            if next > *state {
                previous = Some(*state);
                *state = next;
                true
            } else {
                false
            }
        });

        if let Some(from) = previous {
            info!(from = %from, to = %next, "Lifecycle transition");
        }
    }
}

/// The assembled exporter: one poller plus one metrics server
pub struct Exporter {
    poller: Poller,
    metrics: ResourceMetrics,
    lifecycle: Lifecycle,
}

impl Exporter {
    pub fn new(
        lister: Arc<dyn PodLister>,
        metrics: ResourceMetrics,
        interval: Duration,
        lifecycle: Lifecycle,
    ) -> Self {
        let poller = Poller::new(lister, metrics.clone(), interval);
        Self {
            poller,
            metrics,
            lifecycle,
        }
    }

    /// Run until `shutdown` resolves and the server has drained
    ///
    /// Server errors are logged, not returned; the lifecycle always ends in
    /// [`LifecycleState::Stopped`].
    pub async fn run<F>(self, listener: TcpListener, shutdown: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Exporter {
            poller,
            metrics,
            lifecycle,
        } = self;

        let (shutdown_tx, poller_shutdown) = broadcast::channel(1);
        let poller_handle = tokio::spawn(poller.run(poller_shutdown));

        let drain = {
            let lifecycle = lifecycle.clone();
            let shutdown_tx = shutdown_tx.clone();
            async move {
                shutdown.await;
                lifecycle.transition(LifecycleState::Draining);
                let _ = shutdown_tx.send(());
            }
        };

        let state = Arc::new(AppState::new(metrics));
        lifecycle.transition(LifecycleState::Running);

        if let Err(e) = server::serve(listener, state, drain).await {
            error!(error = %e, "Metrics server exited unexpectedly");
        }

        // Covers the server exiting on its own
        lifecycle.transition(LifecycleState::Draining);
        let _ = shutdown_tx.send(());

        if let Err(e) = poller_handle.await {
            error!(error = %e, "Poller task failed");
        }

        lifecycle.transition(LifecycleState::Stopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_starts_in_starting() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Starting);
    }

    #[test]
    fn test_lifecycle_moves_forward_only() {
        let lifecycle = Lifecycle::new();

        lifecycle.transition(LifecycleState::Running);
        lifecycle.transition(LifecycleState::Draining);
        lifecycle.transition(LifecycleState::Running);

        assert_eq!(lifecycle.state(), LifecycleState::Draining);

        lifecycle.transition(LifecycleState::Stopped);
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[test]
    fn test_lifecycle_clones_share_state() {
        let lifecycle = Lifecycle::new();
        let observer = lifecycle.clone();
        let rx = lifecycle.subscribe();

        lifecycle.transition(LifecycleState::Running);

        assert_eq!(observer.state(), LifecycleState::Running);
        assert_eq!(*rx.borrow(), LifecycleState::Running);
    }

    #[test]
    fn test_lifecycle_state_display() {
        assert_eq!(LifecycleState::Draining.to_string(), "draining");
        assert_eq!(LifecycleState::Stopped.to_string(), "stopped");
    }
}
