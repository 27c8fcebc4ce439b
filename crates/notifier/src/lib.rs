//! Delivery collaborators for the dispatch engine.
//!
//! Each channel that performs real delivery gets a narrow, object-safe sender
//! trait so actors can hold `Arc<dyn ...>` and tests can swap in fakes:
//! - Email via the Resend HTTP API ([`email::ResendEmailSender`])
//! - SMS via the Twilio messages endpoint ([`sms::TwilioSmsSender`])
//!
//! Senders make a single attempt. Retries and dead-lettering are out of scope.

pub mod email;
pub mod sms;

use async_trait::async_trait;
use thiserror::Error;

pub use email::ResendEmailSender;
pub use sms::TwilioSmsSender;

/// Errors returned by a delivery attempt.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl NotifierError {
    /// Provider answered with a non-success status. Logged at `warn` for every channel.
    pub(crate) fn rejected(channel: &str, to: &str, status: u16, body: String) -> Self {
        tracing::warn!(channel, to, status, "Message rejected by provider");
        Self::Rejected { status, body }
    }
}

/// Sends one email. `html_payload` is wrapped into an HTML body by the sender.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        to: &str,
        from: &str,
        html_payload: &str,
        subject: &str,
    ) -> Result<bool, NotifierError>;
}

/// Sends one SMS.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, from: &str, payload: &str) -> Result<bool, NotifierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_keeps_status_and_body() {
        let err = NotifierError::rejected("sms", "+15550001", 400, "bad number".to_string());
        assert!(matches!(
            &err,
            NotifierError::Rejected { status: 400, body } if body == "bad number"
        ));
        assert_eq!(
            err.to_string(),
            "provider rejected message with status 400: bad number"
        );
    }
}
