//! SMTP relay transport with locally rendered HTML

use super::templates::{self, Branding};
use super::{Mailer, Notification, Recipient, Sender};
use crate::config::SmtpMailConfig;
use crate::error::MailError;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    branding: Branding,
}

impl SmtpMailer {
    pub fn new(config: &SmtpMailConfig, sender: Sender) -> Result<Self, MailError> {
        let from = Mailbox::new(Some(sender.name.clone()), super::parse_address(&sender.email)?);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Build(format!("SMTP relay {}: {}", config.host, e)))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            branding: Branding {
                product_name: config.product_name.clone(),
                product_link: config.product_link.clone(),
            },
        })
    }

    fn build_message(&self, to: &Recipient, notification: &Notification) -> Result<Message, MailError> {
        let to_mailbox = Mailbox::new(Some(to.name.clone()), to.address()?);
        let rendered = templates::render(to, notification, &self.branding);

        Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(notification.subject())
            .multipart(MultiPart::alternative_plain_html(rendered.text, rendered.html))
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &Recipient, notification: &Notification) -> Result<(), MailError> {
        let message = self.build_message(to, notification)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport {
                transient: !e.is_permanent(),
                message: e.to_string(),
            })?;

        debug!(code = %response.code(), "SMTP relay accepted message");
        Ok(())
    }
}
