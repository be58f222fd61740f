//! HTTP endpoint serving the gauge registry in Prometheus text format

use crate::metrics::ResourceMetrics;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::future::Future;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Path the registry is exposed on
pub const METRICS_PATH: &str = "/metrics";

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub metrics: ResourceMetrics,
}

impl AppState {
    pub fn new(metrics: ResourceMetrics) -> Self {
        Self { metrics }
    }
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(METRICS_PATH, get(metrics))
        .with_state(state)
}

/// Bind the listener on all interfaces
pub async fn bind(port: u16) -> Result<TcpListener, ServeError> {
    let addr = format!("0.0.0.0:{}", port);

    let bound = TcpListener::bind(&addr).await;
    bound.map_err(|source| ServeError::Bind { addr, source })
}

/// Serve until `shutdown` resolves, then drain in-flight requests
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Starting metrics server");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServeError::Serve)
}
