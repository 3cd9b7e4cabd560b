//! Contact form payload and its checks

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ContactError;
use crate::config::ContactConfig;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(
        r"^[A-Za-z0-9_'+\-]+(\.[A-Za-z0-9_'+\-]+)*@([A-Za-z0-9]([A-Za-z0-9\-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$"
    )
    .unwrap();
}

/// JSON body posted by the contact form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub email: String,
    pub message: String,
    /// Hidden field, left empty by people
    #[serde(default)]
    pub honeypot: String,
    pub human: bool,
    /// Milliseconds since the Unix epoch when the form was rendered
    #[serde(default)]
    pub form_start: Option<i64>,
}

/// Why a submission was accepted without being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamReason {
    Honeypot,
    TooFast,
}

impl ContactSubmission {
    /// Run every check in order. `now_ms` is the server clock in Unix milliseconds.
    ///
    /// Malformed fields and a missing human confirmation are errors. A filled
    /// honeypot or a form completed faster than `min_elapsed_ms` yields the
    /// [`SpamReason`] the message should be silently dropped for.
    pub fn screen(
        &self,
        policy: &ContactConfig,
        now_ms: i64,
    ) -> Result<Option<SpamReason>, ContactError> {
        self.validate_fields(policy)?;

        if !self.honeypot.trim().is_empty() {
            return Ok(Some(SpamReason::Honeypot));
        }

        if !self.human {
            return Err(ContactError::Invalid(
                "Please confirm you're human.".to_string(),
            ));
        }

        match self.form_start {
            Some(start) if start > 0 && now_ms - start < policy.min_elapsed_ms => {
                Ok(Some(SpamReason::TooFast))
            }
            _ => Ok(None),
        }
    }

    /// Email and message shape
    fn validate_fields(&self, policy: &ContactConfig) -> Result<(), ContactError> {
        let email = self.email.trim();
        if email.chars().count() > policy.email_max_chars || !EMAIL_RE.is_match(email) {
            return Err(ContactError::Invalid(
                "Please enter a valid email address.".to_string(),
            ));
        }

        let length = self.message.chars().count();
        if length < policy.message_min_chars {
            return Err(ContactError::Invalid(format!(
                "Message must be at least {} characters.",
                policy.message_min_chars
            )));
        }
        if length > policy.message_max_chars {
            return Err(ContactError::Invalid(format!(
                "Message must be at most {} characters.",
                policy.message_max_chars
            )));
        }

        Ok(())
    }
}
