use crate::error::{DeliveryError, DeliveryResult};
use serde::Serialize;
use uuid::Uuid;

/// Ordered list of recipient addresses.
///
/// Built from a single address or any sequence of addresses; entries are
/// trimmed and blank ones dropped, order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Recipients(Vec<String>);

impl Recipients {
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            addresses
                .into_iter()
                .map(|a| a.as_ref().trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for Recipients {
    fn from(address: &str) -> Self {
        Self::new([address])
    }
}

impl From<String> for Recipients {
    fn from(address: String) -> Self {
        Self::new([address])
    }
}

impl From<&String> for Recipients {
    fn from(address: &String) -> Self {
        Self::new([address])
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addresses: Vec<String>) -> Self {
        Self::new(addresses)
    }
}

impl From<Vec<&str>> for Recipients {
    fn from(addresses: Vec<&str>) -> Self {
        Self::new(addresses)
    }
}

impl From<&[String]> for Recipients {
    fn from(addresses: &[String]) -> Self {
        Self::new(addresses)
    }
}

impl From<&[&str]> for Recipients {
    fn from(addresses: &[&str]) -> Self {
        Self::new(addresses)
    }
}

impl<const N: usize> From<[&str; N]> for Recipients {
    fn from(addresses: [&str; N]) -> Self {
        Self::new(addresses)
    }
}

/// Email message handed to a delivery channel.
///
/// Fields are private: a message cannot be changed once built.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    id: Uuid,
    subject: String,
    sender: String,
    recipients: Recipients,
    text_body: String,
    html_body: String,
}

impl OutboundMessage {
    /// Build a message. Fails when no recipient remains after
    /// normalization or the sender is blank.
    pub fn new(
        subject: impl Into<String>,
        sender: impl Into<String>,
        recipients: impl Into<Recipients>,
        text_body: impl Into<String>,
        html_body: impl Into<String>,
    ) -> DeliveryResult<Self> {
        let recipients = recipients.into();
        if recipients.is_empty() {
            return Err(DeliveryError::InvalidMessage(
                "at least one recipient is required".to_string(),
            ));
        }

        let sender = sender.into().trim().to_string();
        if sender.is_empty() {
            return Err(DeliveryError::InvalidMessage(
                "sender address is required".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            subject: subject.into(),
            sender,
            recipients,
            text_body: text_body.into(),
            html_body: html_body.into(),
        })
    }

    /// Correlation id for logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn recipients(&self) -> &Recipients {
        &self.recipients
    }

    pub fn text_body(&self) -> &str {
        &self.text_body
    }

    pub fn html_body(&self) -> &str {
        &self.html_body
    }
}
