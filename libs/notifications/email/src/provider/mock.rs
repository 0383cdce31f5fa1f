//! Mock email provider for testing

use super::{EmailProvider, SendOutcome};
use crate::error::{DeliveryError, DeliveryResult};
use crate::models::OutboundMessage;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
enum Behaviour {
    Succeed,
    Fail(String),
    Unconfigured,
}

/// Mock email provider that captures sent messages
#[derive(Clone)]
pub struct MockEmailProvider {
    sent_messages: Arc<Mutex<Vec<OutboundMessage>>>,
    attempts: Arc<AtomicUsize>,
    behaviour: Behaviour,
    delay: Option<Duration>,
}

impl MockEmailProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        Self {
            sent_messages: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(AtomicUsize::new(0)),
            behaviour: Behaviour::Succeed,
            delay: None,
        }
    }

    /// Create a mock provider that always fails
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            behaviour: Behaviour::Fail(message.into()),
            ..Self::new()
        }
    }

    /// Create a mock provider that behaves as if no credential were set
    pub fn unconfigured() -> Self {
        Self {
            behaviour: Behaviour::Unconfigured,
            ..Self::new()
        }
    }

    /// Sleep before answering each send
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all successfully sent messages
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent_messages.lock().await.clone()
    }

    /// Get the count of successfully sent messages
    pub async fn sent_count(&self) -> usize {
        self.sent_messages.lock().await.len()
    }

    /// Number of send calls, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Check if a message was sent to a specific address
    pub async fn was_sent_to(&self, address: &str) -> bool {
        self.sent_messages
            .lock()
            .await
            .iter()
            .any(|m| m.recipients().iter().any(|r| r == address))
    }
}

impl Default for MockEmailProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, message: &OutboundMessage) -> DeliveryResult<SendOutcome> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behaviour {
            Behaviour::Succeed => {
                self.sent_messages.lock().await.push(message.clone());
                Ok(SendOutcome {
                    status: 202,
                    message_id: format!("mock-{}", message.id()),
                })
            }
            Behaviour::Fail(reason) => Err(DeliveryError::Transport(reason.clone())),
            Behaviour::Unconfigured => Err(DeliveryError::ConfigurationMissing(
                "Mock API key".to_string(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
