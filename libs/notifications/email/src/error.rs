//! Error types for outbound email delivery.
//!
//! None of these reach callers of `NotificationDispatcher::send_email`; they
//! are logged where they occur.

use thiserror::Error;

/// Result type for delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Errors that can occur while building, queueing or sending an email.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// No credential available for the provider
    #[error("{0} not configured")]
    ConfigurationMissing(String),

    /// Network or HTTP-level failure before a response was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status
    #[error("Provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Message failed validation (no recipients, blank sender)
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Dispatch queue stayed full past the enqueue timeout
    #[error("Notification queue is full")]
    QueueFull,

    /// Worker pool has been shut down
    #[error("Notification queue is closed")]
    QueueClosed,
}

impl DeliveryError {
    /// Whether the failure is a missing credential.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigurationMissing(_))
    }

    /// Map a provider HTTP status to the taxonomy.
    pub(crate) fn rejected(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let body = match status {
            429 => format!("rate limit exceeded: {}", body),
            401 | 403 => format!("authentication failed: {}", body),
            _ => body,
        };
        Self::Rejected { status, body }
    }
}

impl From<eyre::Report> for DeliveryError {
    fn from(err: eyre::Report) -> Self {
        Self::Transport(err.to_string())
    }
}
