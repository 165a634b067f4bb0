//! Error types for the worker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to connect to the database: {0}")]
    Connect(#[source] tokio_postgres::Error),

    #[error("{0} table does not exist")]
    MissingTable(String),

    #[error("Failed to {action}: {source}")]
    Query {
        action: &'static str,
        #[source]
        source: tokio_postgres::Error,
    },
}

impl StoreError {
    pub(crate) fn query(action: &'static str) -> impl FnOnce(tokio_postgres::Error) -> Self {
        move |source| StoreError::Query { action, source }
    }
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Failed to connect to Redis: {0}")]
    Connect(String),

    #[error("Failed to encode {task_type} payload: {source}")]
    Encode {
        task_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to enqueue {task_type} job: {message}")]
    Enqueue {
        task_type: String,
        message: String,
    },

    #[error("Invalid retry policy: {0}")]
    RetryPolicy(String),
}

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Mail provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Mail transport error: {message}")]
    Transport { message: String, transient: bool },
}

impl MailError {
    /// Whether sending the same message again later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            MailError::Transport { transient, .. } => *transient,
            MailError::Rejected { status, .. } => *status == 429 || *status >= 500,
            MailError::InvalidAddress { .. } | MailError::Build(_) => false,
        }
    }
}

/// Outcome of a single job that did not complete successfully
#[derive(Error, Debug)]
pub enum JobError {
    #[error("No handler registered for task type '{0}'")]
    UnknownTaskType(String),

    #[error("Malformed {task_type} payload: {source}")]
    BadPayload {
        task_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{entity} {id} not found")]
    MissingRecord { entity: &'static str, id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Mail(#[from] MailError),
}

impl JobError {
    /// Retryable jobs are failed back to the queue; everything else is dropped.
    pub fn is_retryable(&self) -> bool {
        match self {
            JobError::Store(_) => true,
            JobError::Mail(e) => e.is_transient(),
            JobError::UnknownTaskType(_)
            | JobError::BadPayload { .. }
            | JobError::MissingRecord { .. } => false,
        }
    }
}
