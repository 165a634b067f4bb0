//! Enqueueing email jobs onto the Redis queue

use crate::error::QueueError;
use crate::jobs::types::{
    JobEnvelope, JobPayload, SignalEmailPayload, WelcomeEmailPayload, QUEUE_NAMESPACE,
};
use apalis::prelude::*;
use apalis_redis::RedisStorage;
use tracing::debug;

/// Connect to Redis and open the shared envelope storage
pub async fn connect_storage(redis_url: &str) -> Result<RedisStorage<JobEnvelope>, QueueError> {
    let conn = apalis_redis::connect(redis_url.to_string())
        .await
        .map_err(|e| QueueError::Connect(e.to_string()))?;
    let config = apalis_redis::Config::default().set_namespace(QUEUE_NAMESPACE);
    Ok(RedisStorage::new_with_config(conn, config))
}

/// Pushes job envelopes for the worker to pick up
#[derive(Clone)]
pub struct JobProducer {
    storage: RedisStorage<JobEnvelope>,
}

impl JobProducer {
    pub fn new(storage: RedisStorage<JobEnvelope>) -> Self {
        Self { storage }
    }

    pub async fn connect(redis_url: &str) -> Result<Self, QueueError> {
        Ok(Self::new(connect_storage(redis_url).await?))
    }

    pub async fn enqueue_welcome_email(&self, payload: WelcomeEmailPayload) -> Result<(), QueueError> {
        self.enqueue(JobPayload::WelcomeEmail(payload)).await
    }

    pub async fn enqueue_signal_email(&self, payload: SignalEmailPayload) -> Result<(), QueueError> {
        self.enqueue(JobPayload::SignalEmail(payload)).await
    }

    pub async fn enqueue(&self, payload: JobPayload) -> Result<(), QueueError> {
        self.enqueue_envelope(payload.into_envelope()?).await
    }

    /// Push a raw envelope; its task type is not checked against registered handlers
    pub async fn enqueue_envelope(&self, envelope: JobEnvelope) -> Result<(), QueueError> {
        let task_type = envelope.task_type.clone();
        let mut storage = self.storage.clone();
        storage.push(envelope).await.map_err(|e| QueueError::Enqueue {
            task_type: task_type.clone(),
            message: e.to_string(),
        })?;

        debug!(task_type = %task_type, "JobProducer: enqueued job");
        Ok(())
    }
}
