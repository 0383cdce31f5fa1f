//! Google credential loading
//!
//! Lookup order:
//! 1. `GOOGLE_CREDENTIALS`: the credential JSON itself
//! 2. the file named by `GOOGLE_APPLICATION_CREDENTIALS`
//! 3. the gcloud well-known file,
//!    `$HOME/.config/gcloud/application_default_credentials.json`
//!
//! Both `service_account` keys and `authorized_user` (gcloud login)
//! credentials are accepted.

use crate::error::{TranslationError, TranslationResult};
use core_config::env_non_empty;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const GOOGLE_CREDENTIALS_VAR: &str = "GOOGLE_CREDENTIALS";
pub const GOOGLE_APPLICATION_CREDENTIALS_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Google OAuth2 token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Credential data, tagged by the `type` field of the JSON.
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GoogleCredentials {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

/// Service account key structure (from Google JSON key file)
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    /// RSA private key in PEM format
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// Refresh-token credential written by `gcloud auth application-default login`.
#[derive(Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

impl GoogleCredentials {
    pub fn from_json(raw: &str) -> TranslationResult<Self> {
        serde_json::from_str(raw).map_err(|e| {
            TranslationError::ClientConstruction(format!("invalid credential JSON: {}", e))
        })
    }

    pub fn from_file(path: &Path) -> TranslationResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TranslationError::ClientConstruction(format!(
                "cannot read credential file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&raw)
    }

    /// Resolve credentials from the environment.
    pub fn from_env() -> TranslationResult<Self> {
        if let Some(raw) = env_non_empty(GOOGLE_CREDENTIALS_VAR) {
            return Self::from_json(&raw);
        }

        let path = env_non_empty(GOOGLE_APPLICATION_CREDENTIALS_VAR)
            .map(PathBuf::from)
            .or_else(well_known_file)
            .ok_or_else(|| {
                TranslationError::ClientConstruction("no Google credentials found".to_string())
            })?;

        Self::from_file(&path)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ServiceAccount(_) => "service_account",
            Self::AuthorizedUser(_) => "authorized_user",
        }
    }
}

impl fmt::Debug for GoogleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceAccount(key) => f
                .debug_struct("ServiceAccount")
                .field("client_email", &key.client_email)
                .field("private_key", &"<redacted>")
                .finish(),
            Self::AuthorizedUser(user) => f
                .debug_struct("AuthorizedUser")
                .field("client_id", &user.client_id)
                .field("refresh_token", &"<redacted>")
                .finish(),
        }
    }
}

/// gcloud application-default credential file, if `HOME` is set.
fn well_known_file() -> Option<PathBuf> {
    env_non_empty("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("gcloud")
            .join("application_default_credentials.json")
    })
}
