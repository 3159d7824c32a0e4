use std::time::Duration;

use log::*;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MailError {
    #[error("Could not reach the mail relay. {0}")]
    RelayUnavailable(String),
    #[error("The mail relay rejected the message with status {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("The mailer is misconfigured. {0}")]
    Configuration(String),
}

#[allow(async_fn_in_trait)]
pub trait MailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Writes messages to the log instead of sending them. The default when no mail relay is configured.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl MailSender for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        info!("✉️ [log mailer] To: {to} | Subject: {subject}");
        debug!("✉️ [log mailer] {body}");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Hands messages to an HTTP mail relay as `{from, to, subject, text}` JSON.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    relay_url: String,
    from: String,
    client: Client,
}

impl HttpMailer {
    pub fn new<S: Into<String>>(relay_url: S, from: S) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| MailError::Configuration(e.to_string()))?;
        Ok(Self { relay_url: relay_url.into(), from: from.into(), client })
    }
}

impl MailSender for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let message = RelayMessage { from: &self.from, to, subject, text: body };
        trace!("✉️ Posting message for {to} to {}", self.relay_url);
        let response = self
            .client
            .post(&self.relay_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| MailError::RelayUnavailable(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(MailError::Rejected { status, message })
        }
    }
}

/// The mailer chosen at start-up.
#[derive(Debug, Clone)]
pub enum AnyMailer {
    Log(LogMailer),
    Http(HttpMailer),
}

impl AnyMailer {
    /// Uses the HTTP relay when a URL is given, and the log mailer otherwise.
    pub fn from_settings(relay_url: Option<&str>, from: &str) -> Self {
        match relay_url {
            Some(url) => match HttpMailer::new(url, from) {
                Ok(mailer) => {
                    info!("✉️ Enrollment emails will be sent through {url}");
                    Self::Http(mailer)
                },
                Err(e) => {
                    warn!("✉️ Could not set up the mail relay ({e}). Emails will only be logged.");
                    Self::Log(LogMailer)
                },
            },
            None => {
                info!("✉️ No mail relay is configured. Emails will only be logged.");
                Self::Log(LogMailer)
            },
        }
    }
}

impl MailSender for AnyMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        match self {
            AnyMailer::Log(m) => m.send(to, subject, body).await,
            AnyMailer::Http(m) => m.send(to, subject, body).await,
        }
    }
}
