//! Request-validate-dispatch flow for contact submissions

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

use super::mailer::{MailSettings, Mailer, OutgoingEmail, ResendMailer};
use super::submission::{ContactSubmission, SpamReason};
use super::ContactError;
use crate::config::{ContactConfig, SiteConfig};
use crate::helpers::html_escape;

/// What happened to an accepted submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Sent,
    /// Reported to the client as success, never sent
    Dropped(SpamReason),
}

/// Per-request facts the handler needs besides the payload
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub ip: String,
    pub received_at: DateTime<Utc>,
}

impl RequestInfo {
    pub fn now(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            received_at: Utc::now(),
        }
    }
}

/// A configured mailer and the addresses it sends between
pub struct MailRoute<M> {
    pub mailer: M,
    pub to: String,
    pub from: String,
}

/// Contact endpoint logic, independent of the HTTP layer
pub struct ContactHandler<M> {
    policy: ContactConfig,
    site_name: String,
    site_host: String,
    route: Option<MailRoute<M>>,
}

impl ContactHandler<ResendMailer> {
    /// Build a handler backed by Resend, configured from the environment.
    ///
    /// Missing settings leave the handler unconfigured; every valid submission
    /// then fails closed with [`ContactError::NotConfigured`].
    pub fn from_env(config: &SiteConfig) -> Self {
        let route = match MailSettings::from_env() {
            Some(settings) => {
                match ResendMailer::new(&config.contact.provider_url, &settings.api_key) {
                    Ok(mailer) => Some(MailRoute {
                        mailer,
                        to: settings.to,
                        from: settings.from,
                    }),
                    Err(e) => {
                        tracing::error!("Failed to build email client: {}", e);
                        None
                    }
                }
            }
            None => {
                tracing::warn!(
                    "Contact email is not configured; set {}, {} and {}",
                    super::mailer::API_KEY_VAR,
                    super::mailer::TO_VAR,
                    super::mailer::FROM_VAR
                );
                None
            }
        };
        Self::new(config, route)
    }
}

impl<M: Mailer> ContactHandler<M> {
    pub fn new(config: &SiteConfig, route: Option<MailRoute<M>>) -> Self {
        Self {
            policy: config.contact.clone(),
            site_name: config
                .contact
                .site_name
                .clone()
                .unwrap_or_else(|| config.title.clone()),
            site_host: config.host().to_string(),
            route,
        }
    }

    /// Whether a mail route is available
    pub fn is_configured(&self) -> bool {
        self.route.is_some()
    }

    #[cfg(test)]
    pub(crate) fn mailer(&self) -> Option<&M> {
        self.route.as_ref().map(|route| &route.mailer)
    }

    /// Screen one submission and dispatch it
    pub async fn handle(
        &self,
        submission: &ContactSubmission,
        info: &RequestInfo,
    ) -> Result<ContactOutcome, ContactError> {
        let now_ms = info.received_at.timestamp_millis();
        if let Some(reason) = submission.screen(&self.policy, now_ms)? {
            tracing::info!(ip = %info.ip, ?reason, "Dropping contact submission");
            return Ok(ContactOutcome::Dropped(reason));
        }

        let Some(route) = &self.route else {
            tracing::warn!("Contact submission rejected: email service not configured");
            return Err(ContactError::NotConfigured);
        };

        let email = self.compose(route, submission, info);
        if let Err(e) = route.mailer.send(&email).await {
            tracing::error!(ip = %info.ip, "Email provider error: {}", e);
            return Err(ContactError::Provider(e));
        }

        tracing::info!(ip = %info.ip, "Contact message forwarded");
        Ok(ContactOutcome::Sent)
    }

    fn compose(
        &self,
        route: &MailRoute<M>,
        submission: &ContactSubmission,
        info: &RequestInfo,
    ) -> OutgoingEmail {
        let sender = submission.email.trim();
        let html = format!(
            r#"<div style="font-family: ui-sans-serif, system-ui, sans-serif;">
  <h2>Website contact</h2>
  <p><strong>From:</strong> {}</p>
  <pre style="white-space: pre-wrap; font: inherit; background:#f6f6f6; padding:12px; border-radius:8px;">{}</pre>
  <hr />
  <small>IP: {} &bull; {}</small>
</div>"#,
            html_escape(sender),
            html_escape(&submission.message),
            html_escape(&info.ip),
            info.received_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        );

        OutgoingEmail {
            from: route.from.clone(),
            to: route.to.clone(),
            subject: format!("{} contact from {}", self.site_name, sender),
            reply_to: sender.to_string(),
            html,
            headers: BTreeMap::from([("X-Website".to_string(), self.site_host.clone())]),
        }
    }
}
