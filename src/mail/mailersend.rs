//! MailerSend hosted API transport

use super::{Mailer, Notification, NotificationKind, Recipient, Sender};
use crate::config::ApiMailConfig;
use crate::error::MailError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub struct MailerSendMailer {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    welcome_template_id: String,
    signal_template_id: String,
    sender: Sender,
}

#[derive(Debug, Serialize)]
struct Contact<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    email: &'a str,
    data: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    from: Contact<'a>,
    to: Vec<Contact<'a>>,
    subject: &'a str,
    template_id: &'a str,
    personalization: Vec<Personalization<'a>>,
}

impl MailerSendMailer {
    pub fn new(config: &ApiMailConfig, sender: Sender) -> Result<Self, MailError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MailError::Build(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/email", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            welcome_template_id: config.welcome_template_id.clone(),
            signal_template_id: config.signal_template_id.clone(),
            sender,
        })
    }

    fn template_id(&self, kind: NotificationKind) -> &str {
        match kind {
            NotificationKind::Welcome => &self.welcome_template_id,
            NotificationKind::Signal => &self.signal_template_id,
        }
    }
}

#[async_trait]
impl Mailer for MailerSendMailer {
    async fn send(&self, to: &Recipient, notification: &Notification) -> Result<(), MailError> {
        to.address()?;

        let request = EmailRequest {
            from: Contact {
                email: &self.sender.email,
                name: &self.sender.name,
            },
            to: vec![Contact {
                email: &to.email,
                name: &to.name,
            }],
            subject: notification.subject(),
            template_id: self.template_id(notification.kind()),
            personalization: vec![Personalization {
                email: &to.email,
                data: notification.variables(),
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| MailError::Transport {
                message: e.to_string(),
                transient: !e.is_builder(),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(
                status = status.as_u16(),
                template_id = request.template_id,
                "MailerSend accepted message"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "MailerSend rejected message");
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
