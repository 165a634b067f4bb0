//! Email job queue: payload types, dispatch and handlers

pub mod context;
pub mod dispatch;
pub mod handlers;
pub mod producer;
pub mod types;

pub use context::JobContext;
pub use dispatch::{handle_envelope, Dispatcher, JobOutcome};
pub use producer::{connect_storage, JobProducer};
pub use types::{
    JobEnvelope, JobPayload, SignalEmailPayload, WelcomeEmailPayload, TYPE_SIGNAL_EMAIL,
    TYPE_WELCOME_EMAIL,
};
