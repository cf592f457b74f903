//! Contact email delivery

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use super::OutgoingEmail;
use crate::config::ContactConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mail provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers contact emails to the site owner
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Writes submissions to the log instead of sending them.
/// Used when no mail provider is configured.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            subject = %email.subject,
            reply_to = %email.reply_to,
            "[Contact Form] {}",
            email.text.trim_end()
        );
        Ok(())
    }
}

/// Sends through the Resend HTTP API
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
    to: String,
}

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: &'a str,
    reply_to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl ResendMailer {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let payload = ResendPayload {
            from: &self.from,
            to: &self.to,
            reply_to: &email.reply_to,
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("Contact email accepted by provider ({})", status);
        Ok(())
    }
}

/// Pick the mailer for a configuration: Resend when both an API key and a
/// recipient are set, the log otherwise.
pub fn build_mailer(config: &ContactConfig) -> Arc<dyn Mailer> {
    match (&config.api_key, &config.to) {
        (Some(key), Some(to)) if !key.is_empty() && !to.is_empty() => {
            tracing::info!("Contact emails go to {} via {}", to, config.api_url);
            Arc::new(ResendMailer::new(&config.api_url, key, &config.from, to))
        }
        _ => {
            tracing::info!("No mail provider configured, contact messages will be logged");
            Arc::new(LogMailer)
        }
    }
}
