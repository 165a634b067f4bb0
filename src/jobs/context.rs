//! Job context for dependency injection

use crate::db::{TaskRepository, UserRepository};
use crate::mail::Mailer;
use crate::metrics::Metrics;
use std::sync::Arc;

/// Shared, read-only dependencies handed to every job handler
///
/// Handlers running concurrently share these; nothing here is mutated per job.
pub struct JobContext {
    pub tasks: Arc<dyn TaskRepository>,
    pub users: Arc<dyn UserRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub metrics: Option<Arc<Metrics>>,
}

impl JobContext {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
        mailer: Arc<dyn Mailer>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            tasks,
            users,
            mailer,
            metrics,
        }
    }
}
