//! SendGrid delivery channel
//!
//! Sends emails via the SendGrid v3 HTTP API. The same channel serves the
//! dispatcher (async transport) and the error-alert sink (blocking
//! transport); credential lookup, payload construction and response
//! handling are shared.

use crate::config::MailConfig;
use crate::credential::{CredentialSource, DeliveryCredential, EnvCredentialSource};
use crate::error::{DeliveryError, DeliveryResult};
use crate::models::OutboundMessage;
use crate::provider::{EmailProvider, SendOutcome};
use crate::transport::{BlockingHttpTransport, HttpReply, HttpTransport, LazyBlockingClient};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// SendGrid API endpoint
pub const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

const CREDENTIAL_NAME: &str = "SendGrid API key";

/// SendGrid request payload
#[derive(Debug, Serialize)]
struct SendGridRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: EmailAddress<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<EmailAddress<'a>>,
}

#[derive(Debug, Serialize)]
struct EmailAddress<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

impl<'a> SendGridRequest<'a> {
    fn from_message(message: &'a OutboundMessage) -> Self {
        // SendGrid requires text/plain to precede text/html.
        let mut content = Vec::with_capacity(2);
        if !message.text_body().is_empty() {
            content.push(Content {
                content_type: "text/plain",
                value: message.text_body(),
            });
        }
        content.push(Content {
            content_type: "text/html",
            value: message.html_body(),
        });

        Self {
            personalizations: vec![Personalization {
                to: message
                    .recipients()
                    .iter()
                    .map(|email| EmailAddress { email })
                    .collect(),
            }],
            from: EmailAddress {
                email: message.sender(),
            },
            subject: message.subject(),
            content,
        }
    }
}

/// Delivery channel for SendGrid, generic over the HTTP transport.
pub struct SendGridChannel<T> {
    credentials: Arc<dyn CredentialSource>,
    endpoint: String,
    transport: T,
}

impl SendGridChannel<reqwest::Client> {
    /// Async channel backed by `reqwest::Client`.
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        Self::with_transport(credentials, reqwest::Client::new())
    }

    /// Async channel using the key variable and endpoint from `config`.
    pub fn from_config(config: &MailConfig) -> Self {
        Self::new(Arc::new(EnvCredentialSource::new(&config.api_key_var)))
            .with_endpoint(&config.api_url)
    }
}

impl SendGridChannel<LazyBlockingClient> {
    /// Blocking channel for use outside an async context.
    pub fn blocking(credentials: Arc<dyn CredentialSource>) -> Self {
        Self::with_transport(credentials, LazyBlockingClient::new())
    }
}

impl<T> SendGridChannel<T> {
    pub fn with_transport(credentials: Arc<dyn CredentialSource>, transport: T) -> Self {
        Self {
            credentials,
            endpoint: SENDGRID_API_URL.to_string(),
            transport,
        }
    }

    /// Override the send endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Resolve the credential and build the payload. Fails before any I/O
    /// when the credential is missing.
    fn prepare(
        &self,
        message: &OutboundMessage,
    ) -> DeliveryResult<(DeliveryCredential, serde_json::Value)> {
        let credential = self
            .credentials
            .resolve()
            .ok_or_else(|| DeliveryError::ConfigurationMissing(CREDENTIAL_NAME.to_string()))?;

        let payload = serde_json::to_value(SendGridRequest::from_message(message))
            .map_err(|e| DeliveryError::InvalidMessage(e.to_string()))?;

        debug!(
            message_id = %message.id(),
            recipients = message.recipients().len(),
            subject = %message.subject(),
            "Sending email via SendGrid"
        );

        Ok((credential, payload))
    }

    fn interpret(
        message: &OutboundMessage,
        reply: eyre::Result<HttpReply>,
    ) -> DeliveryResult<SendOutcome> {
        let reply = reply?;

        if reply.is_success() {
            Ok(SendOutcome {
                status: reply.status,
                message_id: reply
                    .message_id
                    .unwrap_or_else(|| message.id().to_string()),
            })
        } else {
            Err(DeliveryError::rejected(reply.status, reply.body))
        }
    }
}

impl<T: HttpTransport> SendGridChannel<T> {
    /// One best-effort send.
    pub async fn deliver(&self, message: &OutboundMessage) -> DeliveryResult<SendOutcome> {
        let (credential, payload) = self.prepare(message)?;
        let reply = self
            .transport
            .post_json(&self.endpoint, credential.api_key(), &payload)
            .await;
        Self::interpret(message, reply)
    }
}

impl<T: BlockingHttpTransport> SendGridChannel<T> {
    /// One best-effort send, blocking the current thread.
    pub fn deliver_blocking(&self, message: &OutboundMessage) -> DeliveryResult<SendOutcome> {
        let (credential, payload) = self.prepare(message)?;
        let reply = self
            .transport
            .post_json(&self.endpoint, credential.api_key(), &payload);
        Self::interpret(message, reply)
    }
}

#[async_trait]
impl<T: HttpTransport> EmailProvider for SendGridChannel<T> {
    async fn send(&self, message: &OutboundMessage) -> DeliveryResult<SendOutcome> {
        self.deliver(message).await
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}
