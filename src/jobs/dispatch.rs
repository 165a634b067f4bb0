//! Task-type routing for queued jobs
//!
//! The [`Dispatcher`] maps task-type strings to handlers once at startup.
//! Every envelope pulled from the queue is routed by its type, its payload is
//! decoded into the handler's payload type, and the result is classified:
//! delivered, dropped (never retried), or failed back to the queue for retry.

use crate::error::JobError;
use crate::jobs::context::JobContext;
use crate::jobs::handlers;
use crate::jobs::types::{
    JobEnvelope, SignalEmailPayload, WelcomeEmailPayload, TYPE_SIGNAL_EMAIL, TYPE_WELCOME_EMAIL,
};
use crate::metrics::Metrics;
use apalis::prelude::Data;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), JobError>> + Send>>;
type Handler = Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

/// Result of processing one envelope
#[derive(Debug)]
pub enum JobOutcome {
    Delivered,
    /// Acknowledged without delivery; retrying would not help
    Dropped(JobError),
    /// Failed back to the queue so its retry policy can run it again
    Retry(JobError),
}

#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<&'static str, Handler>,
    metrics: Option<Arc<Metrics>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with the welcome-email and signal-email handlers registered
    pub fn standard(ctx: Arc<JobContext>) -> Self {
        let welcome_ctx = ctx.clone();
        let signal_ctx = ctx.clone();

        Self::new()
            .with_metrics(ctx.metrics.clone())
            .register(TYPE_WELCOME_EMAIL, move |payload: WelcomeEmailPayload| {
                handlers::handle_welcome_email(welcome_ctx.clone(), payload)
            })
            .register(TYPE_SIGNAL_EMAIL, move |payload: SignalEmailPayload| {
                handlers::handle_signal_email(signal_ctx.clone(), payload)
            })
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<Metrics>>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Bind `task_type` to a handler taking a decoded payload of type `P`.
    ///
    /// Registering the same task type twice replaces the earlier handler.
    pub fn register<P, F, Fut>(mut self, task_type: &'static str, handler: F) -> Self
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: Handler = Arc::new(move |payload: Value| {
            let handler = handler.clone();
            Box::pin(async move {
                let decoded: P = serde_json::from_value(payload).map_err(|source| {
                    JobError::BadPayload {
                        task_type: task_type.to_string(),
                        source,
                    }
                })?;
                handler(decoded).await
            }) as HandlerFuture
        });

        if self.handlers.insert(task_type, erased).is_some() {
            warn!(task_type, "Dispatcher: replaced existing handler");
        }
        self
    }

    /// Registered task types, sorted
    pub fn task_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Route a payload to the handler registered for `task_type`
    pub async fn dispatch(&self, task_type: &str, payload: Value) -> Result<(), JobError> {
        let handler = self
            .handlers
            .get(task_type)
            .ok_or_else(|| JobError::UnknownTaskType(task_type.to_string()))?;
        handler(payload).await
    }

    /// Dispatch an envelope, then classify, log and count the outcome
    pub async fn process(&self, envelope: JobEnvelope) -> JobOutcome {
        let start = Instant::now();
        let task_type = envelope.task_type;

        let outcome = match self.dispatch(&task_type, envelope.payload).await {
            Ok(()) => {
                debug!(task_type = %task_type, "Dispatcher: job delivered");
                JobOutcome::Delivered
            }
            Err(e) if e.is_retryable() => {
                error!(task_type = %task_type, error = %e, "Dispatcher: job failed, will retry");
                JobOutcome::Retry(e)
            }
            Err(e) => {
                warn!(task_type = %task_type, error = %e, "Dispatcher: job dropped");
                JobOutcome::Dropped(e)
            }
        };

        if let Some(ref metrics) = self.metrics {
            metrics
                .job_duration_seconds
                .observe(start.elapsed().as_secs_f64());
            match outcome {
                JobOutcome::Delivered => metrics.jobs_processed_total.inc(),
                JobOutcome::Dropped(_) => metrics.jobs_dropped_total.inc(),
                JobOutcome::Retry(_) => metrics.jobs_failed_total.inc(),
            }
        }

        outcome
    }
}

/// Apalis entry point for envelopes pulled from the Redis queue
///
/// Only retryable failures are reported to apalis as errors; dropped jobs are
/// acknowledged so the queue does not run them again.
pub async fn handle_envelope(
    job: JobEnvelope,
    dispatcher: Data<Arc<Dispatcher>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match dispatcher.process(job).await {
        JobOutcome::Delivered | JobOutcome::Dropped(_) => Ok(()),
        JobOutcome::Retry(e) => Err(Box::new(e)),
    }
}
