//! Unit tests for task and user records

use chrono::NaiveDate;
use serde_json::json;
use tradesignal::models::{NewTask, User, STATUS_RUNNING};

#[test]
fn new_task_takes_server_assigned_fields() {
    let timestamp = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap();
    let task = NewTask::new("user-1", "AAPL", "1d", "macd", "rsi", STATUS_RUNNING).into_task(7, timestamp);

    assert_eq!(task.id, 7);
    assert_eq!(task.user_id, "user-1");
    assert_eq!(task.stock, "AAPL");
    assert_eq!(task.timestamp, timestamp);
    assert!(task.is_running());
}

#[test]
fn stopped_task_is_not_running() {
    let task = NewTask::new("user-1", "AAPL", "1d", "macd", "rsi", "stopped")
        .into_task(1, chrono::Utc::now().naive_utc());
    assert!(!task.is_running());
}

#[test]
fn user_password_is_never_serialized() {
    let user = User {
        id: "user-1".into(),
        name: "Ada".into(),
        email: "ada@example.com".into(),
        password: "$2b$10$hash".into(),
        email_verified: None,
        image: Some("https://cdn.example.com/ada.png".into()),
    };

    let value = serde_json::to_value(&user).unwrap();
    assert!(value.get("password").is_none());
    assert_eq!(value["email"], "ada@example.com");

    let decoded: User = serde_json::from_value(json!({
        "id": "user-2",
        "name": "Grace",
        "email": "grace@example.com",
        "email_verified": "2024-03-01 14:30:00",
        "image": null
    }))
    .unwrap();
    assert_eq!(decoded.password, "");
    assert_eq!(decoded.email_verified.as_deref(), Some("2024-03-01 14:30:00"));
}
