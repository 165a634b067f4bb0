//! Unit tests for the email job handlers

use crate::test_utils::{user, Harness};
use tradesignal::db::TaskRepository;
use tradesignal::error::JobError;
use tradesignal::jobs::handlers::{handle_signal_email, handle_welcome_email};
use tradesignal::jobs::{SignalEmailPayload, WelcomeEmailPayload};
use tradesignal::mail::Notification;
use tradesignal::models::NewTask;

fn signal_payload(task_id: i32) -> SignalEmailPayload {
    SignalEmailPayload {
        task_id,
        event_time: 1_709_303_400,
        signal: "BUY".into(),
        strategy: "macd-cross".into(),
    }
}

#[tokio::test]
async fn welcome_email_goes_to_the_new_user() {
    let harness = Harness::new();

    handle_welcome_email(
        harness.context.clone(),
        WelcomeEmailPayload {
            user_name: "Ada".into(),
            user_email: "ada@example.com".into(),
            confirm_url: "https://tradesignal.app/confirm/abc".into(),
        },
    )
    .await
    .unwrap();

    let sent = harness.mailer.sent();
    assert_eq!(sent.len(), 1);
    let (to, notification) = &sent[0];
    assert_eq!(to.name, "Ada");
    assert_eq!(to.email, "ada@example.com");
    assert_eq!(
        notification,
        &Notification::Welcome {
            user_name: "Ada".into(),
            confirm_url: "https://tradesignal.app/confirm/abc".into(),
        }
    );
    assert_eq!(harness.metrics.emails_sent_total.get(), 1);
}

#[tokio::test]
async fn welcome_email_with_missing_field_is_skipped() {
    let harness = Harness::new();

    let result = handle_welcome_email(
        harness.context.clone(),
        WelcomeEmailPayload {
            user_name: "Ada".into(),
            user_email: String::new(),
            confirm_url: "https://tradesignal.app/confirm/abc".into(),
        },
    )
    .await;

    assert!(result.is_ok());
    assert!(harness.mailer.sent().is_empty());
    assert_eq!(harness.metrics.emails_sent_total.get(), 0);
}

#[tokio::test]
async fn signal_email_goes_to_the_task_owner() {
    let harness = Harness::new();
    harness.users.add(user("user-1", "Ada", "ada@example.com"));
    harness.users.add(user("user-2", "Grace", "grace@example.com"));
    let task = harness
        .tasks
        .insert(NewTask::new("user-2", "AAPL", "1d", "macd", "rsi", "running"))
        .await
        .unwrap();

    handle_signal_email(harness.context.clone(), signal_payload(task.id))
        .await
        .unwrap();

    let sent = harness.mailer.sent();
    assert_eq!(sent.len(), 1);
    let (to, notification) = &sent[0];
    assert_eq!(to.email, "grace@example.com");
    assert_eq!(
        notification,
        &Notification::Signal {
            symbol: "AAPL".into(),
            time: "2024-03-01 14:30:00".into(),
            signal: "BUY".into(),
            strategy: "macd-cross".into(),
        }
    );
}

#[tokio::test]
async fn signal_email_with_zero_event_time_is_skipped() {
    let harness = Harness::new();
    let mut payload = signal_payload(1);
    payload.event_time = 0;

    handle_signal_email(harness.context.clone(), payload)
        .await
        .unwrap();
    assert!(harness.mailer.sent().is_empty());
}

#[tokio::test]
async fn signal_email_for_missing_task_sends_nothing() {
    let harness = Harness::new();
    harness.users.add(user("user-1", "Ada", "ada@example.com"));

    let err = handle_signal_email(harness.context.clone(), signal_payload(42))
        .await
        .unwrap_err();

    match err {
        JobError::MissingRecord { entity, id } => {
            assert_eq!(entity, "task");
            assert_eq!(id, "42");
        }
        other => panic!("expected missing task, got {:?}", other),
    }
    assert!(harness.mailer.sent().is_empty());
}

#[tokio::test]
async fn signal_email_for_missing_owner_sends_nothing() {
    let harness = Harness::new();
    let task = harness
        .tasks
        .insert(NewTask::new("ghost", "BTCUSDT", "4h", "ema", "ema", "running"))
        .await
        .unwrap();

    let err = handle_signal_email(harness.context.clone(), signal_payload(task.id))
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::MissingRecord { entity: "user", ref id } if id == "ghost"));
    assert!(!err.is_retryable());
    assert!(harness.mailer.sent().is_empty());
}
