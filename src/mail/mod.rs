//! Transactional email: composition and delivery
//!
//! A [`Notification`] describes what to tell the user. Each [`Mailer`]
//! decides how: the MailerSend transport fills a server-side template with
//! the notification's variables, the SMTP transport renders HTML locally.

pub mod mailersend;
pub mod smtp;
pub mod templates;

pub use mailersend::MailerSendMailer;
pub use smtp::SmtpMailer;

use crate::config::{MailConfig, MailTransport};
use crate::error::MailError;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const WELCOME_SUBJECT: &str = "Welcome to TradeSignal";
pub const SIGNAL_SUBJECT: &str = "New Signal from TradeSignal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

impl Recipient {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub(crate) fn address(&self) -> Result<lettre::Address, MailError> {
        parse_address(&self.email)
    }
}

/// Identity used in the From header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub email: String,
}

impl From<&MailConfig> for Sender {
    fn from(config: &MailConfig) -> Self {
        Self {
            name: config.sender_name.clone(),
            email: config.sender_email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Welcome {
        user_name: String,
        confirm_url: String,
    },
    Signal {
        symbol: String,
        /// Event time, already formatted for display
        time: String,
        signal: String,
        strategy: String,
    },
}

/// Which provider template a notification uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Welcome,
    Signal,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::Welcome { .. } => NotificationKind::Welcome,
            Notification::Signal { .. } => NotificationKind::Signal,
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Notification::Welcome { .. } => WELCOME_SUBJECT,
            Notification::Signal { .. } => SIGNAL_SUBJECT,
        }
    }

    /// Substitution data for provider-side templates
    pub fn variables(&self) -> Map<String, Value> {
        let value = match self {
            Notification::Welcome {
                user_name,
                confirm_url,
            } => json!({
                "name": user_name,
                "confirm_url": confirm_url,
            }),
            Notification::Signal {
                symbol,
                time,
                signal,
                strategy,
            } => json!({
                "symbol": symbol,
                "time": time,
                "signal": signal,
                "strategy": strategy,
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Outbound email channel
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &Recipient, notification: &Notification) -> Result<(), MailError>;
}

/// Build the mailer selected by the configuration
pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    let sender = Sender::from(config);
    parse_address(&sender.email)?;

    let mailer: Arc<dyn Mailer> = match &config.transport {
        MailTransport::Api(api) => Arc::new(MailerSendMailer::new(api, sender)?),
        MailTransport::Smtp(smtp) => Arc::new(SmtpMailer::new(smtp, sender)?),
    };
    Ok(mailer)
}

fn parse_address(email: &str) -> Result<lettre::Address, MailError> {
    email.trim().parse().map_err(|e: lettre::address::AddressError| {
        MailError::InvalidAddress {
            address: email.to_string(),
            reason: e.to_string(),
        }
    })
}
