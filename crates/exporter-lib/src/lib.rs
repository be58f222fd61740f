//! Exporter library for container resource requests and limits
//!
//! This crate provides the core functionality for:
//! - Building a Kubernetes client from in-cluster or kubeconfig credentials
//! - Polling pods and parsing their resource quantities
//! - Holding the results as Prometheus gauges
//! - Serving the gauges over HTTP with graceful shutdown

pub mod client;
pub mod lifecycle;
pub mod metrics;
pub mod models;
pub mod poller;
pub mod quantity;
pub mod server;

pub use client::{create_client, ClientError, ClientSource};
pub use lifecycle::{Exporter, Lifecycle, LifecycleState};
pub use metrics::{ResourceFamily, ResourceLabels, ResourceMetrics};
pub use models::*;
pub use poller::{PodLister, PollSummary, Poller};
pub use quantity::{Quantity, QuantityError};
pub use server::{AppState, ServeError};
