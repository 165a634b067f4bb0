//! Job types carried on the email queue

use crate::error::QueueError;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const TYPE_WELCOME_EMAIL: &str = "email:welcome";
pub const TYPE_SIGNAL_EMAIL: &str = "email:signal";

/// Redis namespace shared by producers and the worker
pub const QUEUE_NAMESPACE: &str = "tradesignal:jobs";

/// Request to greet a freshly registered user
///
/// Missing or null fields decode as empty strings; the handler drops such jobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WelcomeEmailPayload {
    #[serde(rename = "UserName")]
    pub user_name: String,
    #[serde(rename = "UserEmail")]
    pub user_email: String,
    #[serde(rename = "ConfirmURL")]
    pub confirm_url: String,
}

impl WelcomeEmailPayload {
    pub fn is_complete(&self) -> bool {
        !self.user_name.is_empty() && !self.user_email.is_empty() && !self.confirm_url.is_empty()
    }
}

/// Request to notify a task's owner about a new trade signal
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalEmailPayload {
    #[serde(rename = "TaskID")]
    pub task_id: i32,
    /// Unix seconds
    #[serde(rename = "EventTime")]
    pub event_time: i64,
    #[serde(rename = "Signal")]
    pub signal: String,
    #[serde(rename = "Strategy")]
    pub strategy: String,
}

impl SignalEmailPayload {
    pub fn is_complete(&self) -> bool {
        self.task_id != 0 && self.event_time != 0 && !self.signal.is_empty() && !self.strategy.is_empty()
    }
}

impl<'de> Deserialize<'de> for WelcomeEmailPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = WireFields::deserialize(deserializer)?;
        let payload = Self {
            user_name: fields.take("UserName"),
            user_email: fields.take("UserEmail"),
            confirm_url: fields.take("ConfirmURL"),
        };
        fields.finish(payload)
    }
}

impl<'de> Deserialize<'de> for SignalEmailPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = WireFields::deserialize(deserializer)?;
        let payload = Self {
            task_id: fields.take("TaskID"),
            event_time: fields.take("EventTime"),
            signal: fields.take("Signal"),
            strategy: fields.take("Strategy"),
        };
        fields.finish(payload)
    }
}

/// Payload object decoded the way the producers' JSON decoder does.
///
/// Keys match exactly first, then case-insensitively. A missing key or a
/// `null` value leaves the field at its zero value.
struct WireFields {
    fields: Map<String, Value>,
    error: Option<String>,
}

impl<'de> Deserialize<'de> for WireFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Option::<Map<String, Value>>::deserialize(deserializer)?;
        Ok(Self {
            fields: fields.unwrap_or_default(),
            error: None,
        })
    }
}

impl WireFields {
    /// Decode `name`, remembering the first failure for [`WireFields::finish`]
    fn take<T: DeserializeOwned + Default>(&mut self, name: &str) -> T {
        let key = if self.fields.contains_key(name) {
            Some(name.to_string())
        } else {
            self.fields.keys().find(|k| k.eq_ignore_ascii_case(name)).cloned()
        };

        match key.and_then(|k| self.fields.remove(&k)) {
            None | Some(Value::Null) => T::default(),
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                self.error.get_or_insert_with(|| format!("field {}: {}", name, e));
                T::default()
            }),
        }
    }

    fn finish<T, E: de::Error>(self, value: T) -> Result<T, E> {
        match self.error {
            Some(message) => Err(E::custom(message)),
            None => Ok(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobPayload {
    WelcomeEmail(WelcomeEmailPayload),
    SignalEmail(SignalEmailPayload),
}

impl JobPayload {
    pub fn task_type(&self) -> &'static str {
        match self {
            JobPayload::WelcomeEmail(_) => TYPE_WELCOME_EMAIL,
            JobPayload::SignalEmail(_) => TYPE_SIGNAL_EMAIL,
        }
    }

    pub fn into_envelope(self) -> Result<JobEnvelope, QueueError> {
        let task_type = self.task_type();
        let payload = match self {
            JobPayload::WelcomeEmail(p) => serde_json::to_value(p),
            JobPayload::SignalEmail(p) => serde_json::to_value(p),
        }
        .map_err(|source| QueueError::Encode { task_type, source })?;

        Ok(JobEnvelope {
            task_type: task_type.to_string(),
            payload,
        })
    }
}

/// Unit of work stored on the queue: a task type and its JSON payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub task_type: String,
    pub payload: Value,
}
