//! Outgoing mail through a transactional email provider

use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the provider API key
pub const API_KEY_VAR: &str = "RESEND_API_KEY";
/// Environment variable holding the destination address
pub const TO_VAR: &str = "CONTACT_TO";
/// Environment variable holding the source address
pub const FROM_VAR: &str = "CONTACT_FROM";

/// Email provider failures
#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Request to email provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Email provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// A message ready to hand to the provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub reply_to: String,
    pub html: String,
    pub headers: BTreeMap<String, String>,
}

/// Something that can deliver an [`OutgoingEmail`]
pub trait Mailer: Send + Sync + 'static {
    fn send(&self, email: &OutgoingEmail) -> impl Future<Output = Result<(), MailerError>> + Send;
}

/// Secrets and addresses read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub api_key: String,
    pub to: String,
    pub from: String,
}

impl MailSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup; blank values count as missing
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Some(Self {
            api_key: get(API_KEY_VAR)?,
            to: get(TO_VAR)?,
            from: get(FROM_VAR)?,
        })
    }
}

/// Resend HTTP API client
pub struct ResendMailer {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl ResendMailer {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, MailerError> {
        let http = Client::builder()
            .user_agent(concat!("folio-rs/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        let res = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }

        let body = res.text().await.unwrap_or_default();
        Err(MailerError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
