//! Delivery credentials.
//!
//! Credentials are resolved on every send attempt and never cached, so a
//! rotated key is picked up without a restart.

use std::fmt;

/// Default environment variable holding the SendGrid API key.
pub const SENDGRID_API_KEY_VAR: &str = "SENDGRID_API_KEY";

/// API key authorizing calls to the email provider.
#[derive(Clone, PartialEq, Eq)]
pub struct DeliveryCredential {
    api_key: String,
}

impl DeliveryCredential {
    /// Returns `None` for a blank key.
    pub fn new(api_key: impl Into<String>) -> Option<Self> {
        let api_key = api_key.into().trim().to_string();
        (!api_key.is_empty()).then_some(Self { api_key })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for DeliveryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryCredential")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Where a credential comes from.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialSource: Send + Sync {
    /// Look the credential up now. `None` means "not configured".
    fn resolve(&self) -> Option<DeliveryCredential>;
}

/// Reads the key from an environment variable at call time.
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    var: String,
}

impl EnvCredentialSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvCredentialSource {
    fn default() -> Self {
        Self::new(SENDGRID_API_KEY_VAR)
    }
}

impl CredentialSource for EnvCredentialSource {
    fn resolve(&self) -> Option<DeliveryCredential> {
        core_config::env_non_empty(&self.var).and_then(DeliveryCredential::new)
    }
}

/// Fixed credential supplied at construction.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialSource(Option<DeliveryCredential>);

impl StaticCredentialSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self(DeliveryCredential::new(api_key))
    }

    /// A source that never yields a credential.
    pub fn missing() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredentialSource {
    fn resolve(&self) -> Option<DeliveryCredential> {
        self.0.clone()
    }
}
