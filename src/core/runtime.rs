//! Apalis worker setup for email jobs

use crate::config::{WorkerConfig, DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BACKOFF};
use crate::error::QueueError;
use crate::jobs::dispatch::{handle_envelope, Dispatcher};
use crate::jobs::types::JobEnvelope;
use apalis::layers::retry::backoff::{ExponentialBackoff, ExponentialBackoffMaker, MakeBackoff};
use apalis::layers::retry::{BackoffRetryPolicy, HasherRng, RetryPolicy};
use apalis::prelude::*;
use apalis_redis::RedisStorage;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const WORKER_NAME: &str = "email-worker";

/// Upper bound for a single retry delay
pub const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(60);

/// Share of each delay added as random jitter
const RETRY_JITTER: f64 = 0.2;

pub type JobRetryPolicy = BackoffRetryPolicy<ExponentialBackoff>;

/// Retry policy re-running a failed job up to `max_retries` times.
///
/// The first retry waits `base_delay`, each further one twice as long plus
/// jitter, capped at [`MAX_RETRY_BACKOFF`].
pub fn retry_policy(max_retries: usize, base_delay: Duration) -> Result<JobRetryPolicy, QueueError> {
    let max_delay = MAX_RETRY_BACKOFF.max(base_delay);
    let mut maker = ExponentialBackoffMaker::new(
        base_delay,
        max_delay,
        RETRY_JITTER,
        HasherRng::default(),
    )
    .map_err(|e| QueueError::RetryPolicy(e.to_string()))?;

    Ok(RetryPolicy::retries(max_retries).with_backoff(maker.make_backoff()))
}

/// Worker pool pulling envelopes from Redis and handing them to the dispatcher
pub struct WorkerRuntime {
    dispatcher: Arc<Dispatcher>,
    storage: RedisStorage<JobEnvelope>,
    concurrency: usize,
    max_retries: usize,
    retry_backoff: Duration,
}

impl WorkerRuntime {
    pub fn new(dispatcher: Arc<Dispatcher>, storage: RedisStorage<JobEnvelope>) -> Self {
        Self {
            dispatcher,
            storage,
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    pub fn with_config(self, config: &WorkerConfig) -> Self {
        self.with_concurrency(config.concurrency)
            .with_max_retries(config.max_retries)
            .with_retry_backoff(config.retry_backoff)
    }

    /// Set the number of jobs processed in parallel (default 10)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set how often a retryable failure is re-run before the job is given up
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Start the worker and return its handle for shutdown
    pub fn start(&self) -> Result<tokio::task::JoinHandle<()>, QueueError> {
        let policy = retry_policy(self.max_retries, self.retry_backoff)?;

        info!(
            concurrency = self.concurrency,
            max_retries = self.max_retries,
            retry_backoff_ms = self.retry_backoff.as_millis() as u64,
            task_types = ?self.dispatcher.task_types(),
            "WorkerRuntime: starting {} with concurrency {}",
            WORKER_NAME,
            self.concurrency
        );

        let storage = self.storage.clone();
        let dispatcher = self.dispatcher.clone();
        let concurrency = self.concurrency;

        Ok(tokio::spawn(async move {
            let worker = WorkerBuilder::new(WORKER_NAME)
                .enable_tracing()
                .retry(policy)
                .concurrency(concurrency)
                .data(dispatcher)
                .backend(storage)
                .build_fn(handle_envelope);

            info!("WorkerRuntime: {} started", WORKER_NAME);
            worker.run().await;
        }))
    }
}
