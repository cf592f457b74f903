//! Contact form handling: validation, email composition, delivery and rate limiting

mod mailer;
mod rate_limit;

pub use mailer::{build_mailer, LogMailer, MailError, Mailer, ResendMailer};
pub use rate_limit::FixedWindowLimiter;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::content::html_escape;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_EMAIL_CHARS: usize = 200;
pub const MAX_MESSAGE_CHARS: usize = 5000;

/// Contact form body as posted by the client.
///
/// Fields stay untyped so that a non-string value is reported as an invalid
/// field rather than an unreadable body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
}

/// Validation failures, one per field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("Name is required (max 100 characters)")]
    Name,
    #[error("A valid email is required")]
    Email,
    #[error("Message is required (max 5000 characters)")]
    Message,
}

/// A validated, trimmed contact submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Email ready for a [`Mailer`]; sender and recipient belong to the mailer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub reply_to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl ContactRequest {
    /// Check every field in order and return the trimmed submission.
    ///
    /// Length limits apply to the raw value, before trimming.
    pub fn validate(&self) -> Result<ContactMessage, ContactError> {
        let name = as_str(&self.name)
            .filter(|n| !n.trim().is_empty() && n.chars().count() <= MAX_NAME_CHARS)
            .ok_or(ContactError::Name)?;

        let email = as_str(&self.email)
            .filter(|e| e.contains('@') && e.chars().count() <= MAX_EMAIL_CHARS)
            .ok_or(ContactError::Email)?;

        let message = as_str(&self.message)
            .filter(|m| !m.trim().is_empty() && m.chars().count() <= MAX_MESSAGE_CHARS)
            .ok_or(ContactError::Message)?;

        Ok(ContactMessage {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            message: message.trim().to_string(),
        })
    }
}

fn as_str(value: &Option<Value>) -> Option<&str> {
    value.as_ref().and_then(Value::as_str)
}

impl ContactMessage {
    /// Compose the notification email for the site owner
    pub fn to_email(&self, site_title: &str) -> OutgoingEmail {
        let name = html_escape(&self.name);
        let email = html_escape(&self.email);
        let message = html_escape(&self.message);
        let title = html_escape(site_title);

        let html = format!(
            r#"<div style="font-family: Georgia, serif; max-width: 520px; margin: 0 auto; padding: 40px 24px;">
  <h1 style="font-weight: 300; letter-spacing: 0.2em; font-size: 16px; text-align: center;">{title}</h1>
  <p style="font-size: 12px; letter-spacing: 0.1em; text-transform: uppercase;">New Contact Message</p>
  <table style="width: 100%; border-collapse: collapse;">
    <tr><td style="padding: 8px 0; width: 70px; vertical-align: top;">Name</td><td style="padding: 8px 0;">{name}</td></tr>
    <tr><td style="padding: 8px 0; vertical-align: top;">Email</td><td style="padding: 8px 0;"><a href="mailto:{email}">{email}</a></td></tr>
    <tr><td style="padding: 8px 0; vertical-align: top;">Message</td><td style="padding: 8px 0; white-space: pre-wrap;">{message}</td></tr>
  </table>
  <p style="font-size: 11px; text-align: center;">Sent via the {title} contact form</p>
</div>"#
        );

        let text = format!(
            "Name: {}\nEmail: {}\n\n{}\n",
            self.name, self.email, self.message
        );

        OutgoingEmail {
            reply_to: self.email.clone(),
            subject: format!("Contact: {}", self.name),
            html,
            text,
        }
    }
}
