//! Integration tests for the worker's health and metrics endpoint

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tradesignal::core::http::{create_router, AppState, HealthCheck, SERVICE_NAME};
use tradesignal::metrics::Metrics;

fn server() -> (TestServer, Arc<Metrics>) {
    let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
    let app = create_router(AppState::new(metrics.clone()));
    (TestServer::new(app).expect("start test server"), metrics)
}

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let (server, _) = server();
    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], SERVICE_NAME);
    assert!(body["uptime_seconds"].as_u64().is_some());
}

struct Switch {
    up: AtomicBool,
}

#[async_trait]
impl HealthCheck for Switch {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn is_healthy(&self) -> bool {
        self.up.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn health_follows_dependency_state() {
    let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
    let database = Arc::new(Switch {
        up: AtomicBool::new(true),
    });
    let app = create_router(AppState::new(metrics).with_check(database.clone()));
    let server = TestServer::new(app).expect("start test server");

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"], true);

    database.up.store(false, Ordering::SeqCst);

    let response = server.get("/health").expect_failure().await;
    assert_eq!(response.status_code(), 503);
    let body: Value = response.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["database"], false);
}

#[tokio::test]
async fn metrics_endpoint_exposes_job_counters() {
    let (server, metrics) = server();
    metrics.jobs_processed_total.inc_by(3);
    metrics.queue_connected.set(1.0);

    let response = server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let text = response.text();
    assert!(text.contains("jobs_processed_total 3"));
    assert!(text.contains("queue_connected 1"));
    assert!(text.contains("emails_sent_total 0"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (server, _) = server();
    let response = server.get("/jobs").expect_failure().await;
    assert_eq!(response.status_code(), 404);
}
