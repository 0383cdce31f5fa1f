//! OAuth2 access tokens for Google APIs.

use crate::credentials::{GoogleCredentials, GOOGLE_TOKEN_URL};
use crate::error::{TranslationError, TranslationResult};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const TRANSLATE_SCOPE: &str = "https://www.googleapis.com/auth/cloud-translation";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens closer than this to expiry are refreshed.
const EXPIRY_MARGIN_SECS: i64 = 60;

enum Grant {
    JwtBearer {
        client_email: String,
        key: EncodingKey,
    },
    RefreshToken {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at > now + EXPIRY_MARGIN_SECS
    }
}

/// JWT claims for the service-account assertion
#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Token response from Google OAuth2
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Fetches and caches access tokens for one credential.
pub struct TokenProvider {
    grant: Grant,
    token_url: String,
    http: Client,
    cache: Arc<RwLock<Option<CachedToken>>>,
}

impl TokenProvider {
    /// Validate the credential and prepare the grant. A service-account key
    /// that is not a valid RSA PEM fails here, before any request.
    pub fn new(credentials: GoogleCredentials, http: Client) -> TranslationResult<Self> {
        let (grant, token_url) = match credentials {
            GoogleCredentials::ServiceAccount(key) => {
                let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
                    .map_err(|e| {
                        TranslationError::ClientConstruction(format!(
                            "invalid service account private key: {}",
                            e
                        ))
                    })?;
                (
                    Grant::JwtBearer {
                        client_email: key.client_email,
                        key: encoding_key,
                    },
                    key.token_uri,
                )
            }
            GoogleCredentials::AuthorizedUser(user) => (
                Grant::RefreshToken {
                    client_id: user.client_id,
                    client_secret: user.client_secret,
                    refresh_token: user.refresh_token,
                },
                GOOGLE_TOKEN_URL.to_string(),
            ),
        };

        Ok(Self {
            grant,
            token_url,
            http,
            cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Get a valid access token, refreshing if necessary
    pub async fn access_token(&self) -> TranslationResult<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_fresh(Utc::now().timestamp()) {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let token = self.fetch().await?;

        let mut cache = self.cache.write().await;
        *cache = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Utc::now().timestamp() + token.expires_in,
        });

        Ok(token.access_token)
    }

    async fn fetch(&self) -> TranslationResult<TokenResponse> {
        let request = match &self.grant {
            Grant::JwtBearer { client_email, key } => {
                let assertion = self.assertion(client_email, key, Utc::now().timestamp())?;
                debug!(grant = "jwt-bearer", "Requesting Google access token");
                self.http
                    .post(&self.token_url)
                    .form(&[
                        ("grant_type", JWT_BEARER_GRANT),
                        ("assertion", assertion.as_str()),
                    ])
            }
            Grant::RefreshToken {
                client_id,
                client_secret,
                refresh_token,
            } => {
                debug!(grant = "refresh_token", "Requesting Google access token");
                self.http.post(&self.token_url).form(&[
                    ("grant_type", "refresh_token"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("refresh_token", refresh_token.as_str()),
                ])
            }
        };

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        response.json::<TokenResponse>().await.map_err(|e| {
            TranslationError::MalformedResponse(format!("token response: {}", e))
        })
    }

    fn assertion(
        &self,
        client_email: &str,
        key: &EncodingKey,
        now: i64,
    ) -> TranslationResult<String> {
        let claims = JwtClaims {
            iss: client_email,
            scope: TRANSLATE_SCOPE,
            aud: &self.token_url,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, key).map_err(|e| {
            TranslationError::ClientConstruction(format!("cannot sign assertion: {}", e))
        })
    }
}
