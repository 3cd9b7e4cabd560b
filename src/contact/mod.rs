//! Contact form handling: validation, spam heuristics and mail dispatch

mod handler;
pub mod mailer;
mod submission;

use thiserror::Error;

pub use handler::{ContactHandler, ContactOutcome, MailRoute, RequestInfo};
pub use mailer::{MailSettings, Mailer, MailerError, OutgoingEmail, ResendMailer};
pub use submission::{ContactSubmission, SpamReason};

#[cfg(test)]
pub(crate) use handler::tests::{handler_with, RecordingMailer};

/// Contact endpoint failures
#[derive(Error, Debug)]
pub enum ContactError {
    /// The payload is malformed or fails a precondition
    #[error("{0}")]
    Invalid(String),

    #[error("Email service not configured")]
    NotConfigured,

    #[error("Email provider error")]
    Provider(#[source] MailerError),
}
