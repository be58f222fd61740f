//! Integration tests for the metrics endpoint

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use exporter_lib::{
    server::{create_router, AppState},
    ContainerResources, ResourceMetrics,
};
use std::sync::Arc;
use tower::ServiceExt;

fn setup_test_app() -> (axum::Router, ResourceMetrics) {
    let metrics = ResourceMetrics::new().unwrap();
    let state = Arc::new(AppState::new(metrics.clone()));
    (create_router(state), metrics)
}

fn web_app() -> ContainerResources {
    ContainerResources {
        namespace: "prod".to_string(),
        pod_name: "web-1".to_string(),
        container_name: "app".to_string(),
        cpu_request_millicores: 500,
        cpu_limit_millicores: 1000,
        memory_request_bytes: 268_435_456,
        memory_limit_bytes: 536_870_912,
    }
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_metrics_empty_before_first_poll() {
    let (app, _metrics) = setup_test_app();

    let (status, content_type, body) = get(app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().contains("text/plain"));
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_metrics_returns_prometheus_format() {
    let (app, metrics) = setup_test_app();
    metrics.record(&web_app());

    let (status, content_type, body) = get(app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/plain; version=0.0.4"));

    assert!(body.contains("container_resources_cpu_milli"));
    assert!(body.contains("container_resources_memory_bytes"));
    assert!(body.contains(
        r#"container_resources_cpu_milli{container_name="app",namespace="prod",pod_name="web-1",type="request"} 500"#
    ));
    assert!(body.contains(
        r#"container_resources_memory_bytes{container_name="app",namespace="prod",pod_name="web-1",type="request"} 268435456"#
    ));
    assert!(body.contains(
        r#"container_resources_cpu_milli{container_name="app",namespace="prod",pod_name="web-1",type="limit"} 1000"#
    ));
    assert!(body.contains(
        r#"container_resources_memory_bytes{container_name="app",namespace="prod",pod_name="web-1",type="limit"} 536870912"#
    ));
}

#[tokio::test]
async fn test_metrics_reflects_latest_values() {
    let (app, metrics) = setup_test_app();
    metrics.record(&web_app());
    metrics.record(&ContainerResources {
        cpu_request_millicores: 750,
        ..web_app()
    });

    let (_, _, body) = get(app, "/metrics").await;

    assert!(body.contains(
        r#"container_resources_cpu_milli{container_name="app",namespace="prod",pod_name="web-1",type="request"} 750"#
    ));
    assert!(!body.contains(
        r#"container_resources_cpu_milli{container_name="app",namespace="prod",pod_name="web-1",type="request"} 500"#
    ));
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let (app, _metrics) = setup_test_app();

    let (status, _, _) = get(app, "/healthz").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_to_metrics_is_rejected() {
    let (app, _metrics) = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
