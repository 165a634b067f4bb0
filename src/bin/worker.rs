//! TradeSignal Worker
//!
//! Processes email jobs from the Redis queue. Configuration or connectivity
//! problems stop the process at startup; failures inside a job never do.

use dotenvy::dotenv;
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, error, info, warn};
use tradesignal::config::Config;
use tradesignal::core::http::{start_server, AppState};
use tradesignal::core::runtime::WorkerRuntime;
use tradesignal::db::{Database, PostgresTaskStore, PostgresUserStore};
use tradesignal::jobs::{connect_storage, Dispatcher, JobContext};
use tradesignal::logging;
use tradesignal::mail::build_mailer;
use tradesignal::metrics::Metrics;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    let config = Config::from_env()?;
    logging::init_logging(&config.environment);

    info!("Starting TradeSignal Worker");
    info!(environment = %config.environment, "Environment");

    let metrics = Arc::new(Metrics::new()?);

    info!("Initializing Postgres connection...");
    let database = Arc::new(
        Database::connect(&config.database_url)
            .await?
            .with_status_gauge(metrics.database_connected.clone()),
    );
    let tasks = PostgresTaskStore::new(database.clone()).await?;
    let users = PostgresUserStore::new(database.clone()).await?;
    match users.columns("User").await {
        Ok(columns) => debug!(columns = ?columns, "User table columns"),
        Err(e) => warn!(error = %e, "Failed to read User table columns"),
    }
    info!("Postgres connected");

    let mailer = build_mailer(&config.mail)?;

    info!("Initializing Apalis Redis storage...");
    let storage = connect_storage(&config.redis_url).await?;
    metrics.queue_connected.set(1.0);
    info!("Apalis Redis storage initialized");

    let job_context = Arc::new(JobContext::new(
        Arc::new(tasks),
        Arc::new(users),
        mailer,
        Some(metrics.clone()),
    ));
    let dispatcher = Arc::new(Dispatcher::standard(job_context));

    let runtime = WorkerRuntime::new(dispatcher, storage).with_config(&config.worker);
    let worker_handle = runtime.start()?;

    let server_handle = if config.metrics_port > 0 {
        let state = AppState::new(metrics.clone()).with_check(database.clone());
        let port = config.metrics_port;
        Some(tokio::spawn(async move {
            if let Err(e) = start_server(port, state).await {
                error!(error = %e, "Ops endpoint stopped");
            }
        }))
    } else {
        None
    };

    info!("Worker started, waiting for shutdown signal...");
    signal::ctrl_c().await?;

    info!("Shutting down worker...");
    worker_handle.abort();
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Worker stopped");

    Ok(())
}
