//! Health and metrics endpoint for the worker process

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

use crate::metrics::Metrics;

pub const SERVICE_NAME: &str = "tradesignal-worker";

/// A dependency whose state is reported by `/health`
#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &'static str;

    async fn is_healthy(&self) -> bool;
}

#[derive(Clone)]
pub struct AppState {
    pub checks: Vec<Arc<dyn HealthCheck>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
}

impl AppState {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            checks: Vec::new(),
            metrics,
            start_time: Arc::new(Instant::now()),
        }
    }

    pub fn with_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }
}

/// 200 when every check passes, 503 otherwise
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let mut checks = Map::new();
    let mut healthy = true;
    for check in &state.checks {
        let ok = check.is_healthy().await;
        if !ok {
            warn!(check = check.name(), "Health check failed");
        }
        healthy &= ok;
        checks.insert(check.name().to_string(), Value::Bool(ok));
    }

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "checks": checks,
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "service": SERVICE_NAME
    });
    (status, Json(body))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                    .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                    .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
            ),
        )
        .with_state(state)
}

pub async fn start_server(port: u16, state: AppState) -> Result<(), std::io::Error> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "Ops endpoint listening on port {}", port);
    axum::serve(listener, app).await
}
