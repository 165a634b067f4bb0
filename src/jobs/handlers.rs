//! Email job handlers
//!
//! Each handler validates its payload, gathers whatever records it needs and
//! hands a [`Notification`] to the configured mailer. Incomplete payloads are
//! dropped quietly: the producer had nothing useful to send.

use crate::error::JobError;
use crate::jobs::context::JobContext;
use crate::jobs::types::{SignalEmailPayload, WelcomeEmailPayload};
use crate::mail::{Notification, Recipient};
use chrono::DateTime;
use std::sync::Arc;
use tracing::{debug, info};

const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Send the welcome email to a newly registered user
pub async fn handle_welcome_email(
    ctx: Arc<JobContext>,
    payload: WelcomeEmailPayload,
) -> Result<(), JobError> {
    if !payload.is_complete() {
        debug!(?payload, "WelcomeEmailJob: incomplete payload, skipping");
        return Ok(());
    }

    info!(
        user_name = %payload.user_name,
        user_email = %payload.user_email,
        "WelcomeEmailJob: sending welcome email to {}",
        payload.user_email
    );

    let recipient = Recipient::new(&payload.user_name, &payload.user_email);
    let notification = Notification::Welcome {
        user_name: payload.user_name,
        confirm_url: payload.confirm_url,
    };
    ctx.mailer.send(&recipient, &notification).await?;

    if let Some(ref metrics) = ctx.metrics {
        metrics.emails_sent_total.inc();
    }
    Ok(())
}

/// Notify a task's owner about a new trade signal
///
/// Looks up the task, then its owner, and mails the owner. A task or user that
/// no longer exists fails the job with [`JobError::MissingRecord`].
pub async fn handle_signal_email(
    ctx: Arc<JobContext>,
    payload: SignalEmailPayload,
) -> Result<(), JobError> {
    if !payload.is_complete() {
        debug!(?payload, "SignalEmailJob: incomplete payload, skipping");
        return Ok(());
    }

    info!(task_id = payload.task_id, "SignalEmailJob: sending signal email for task {}", payload.task_id);

    let task = ctx
        .tasks
        .get_by_id(payload.task_id)
        .await?
        .ok_or_else(|| JobError::MissingRecord {
            entity: "task",
            id: payload.task_id.to_string(),
        })?;

    let user = ctx
        .users
        .get_by_id(&task.user_id)
        .await?
        .ok_or_else(|| JobError::MissingRecord {
            entity: "user",
            id: task.user_id.clone(),
        })?;

    let event_time = format_event_time(payload.event_time);

    info!(
        task_id = task.id,
        user_email = %user.email,
        symbol = %task.stock,
        event_time = %event_time,
        signal = %payload.signal,
        strategy = %payload.strategy,
        "SignalEmailJob: {} signal on {} for {}",
        payload.signal,
        task.stock,
        user.email
    );

    let recipient = Recipient::new(user.name, user.email);
    let notification = Notification::Signal {
        symbol: task.stock,
        time: event_time,
        signal: payload.signal,
        strategy: payload.strategy,
    };
    ctx.mailer.send(&recipient, &notification).await?;

    if let Some(ref metrics) = ctx.metrics {
        metrics.emails_sent_total.inc();
    }
    Ok(())
}

/// Render unix seconds as `YYYY-MM-DD HH:MM:SS` in UTC
pub fn format_event_time(unix_seconds: i64) -> String {
    DateTime::from_timestamp(unix_seconds, 0)
        .map(|t| t.format(EVENT_TIME_FORMAT).to_string())
        .unwrap_or_else(|| unix_seconds.to_string())
}
