//! Email provider implementations

pub mod mock;
pub mod sendgrid;

pub use mock::MockEmailProvider;
pub use sendgrid::{SendGridChannel, SENDGRID_API_URL};

use crate::error::DeliveryResult;
use crate::models::OutboundMessage;
use async_trait::async_trait;

/// Result of a successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    /// HTTP status returned by the provider
    pub status: u16,
    /// Provider-specific message ID
    pub message_id: String,
}

/// Trait for email providers used by the dispatcher's workers.
///
/// One call is one best-effort attempt; implementations do not retry.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Send an email
    async fn send(&self, message: &OutboundMessage) -> DeliveryResult<SendOutcome>;

    /// Get provider name
    fn name(&self) -> &'static str;
}
