//! Translation provider client.

use crate::error::{TranslationError, TranslationResult};
use crate::token::TokenProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One piece of text to translate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub source_language: String,
    pub dest_language: String,
}

impl TranslationRequest {
    pub fn new(
        text: impl Into<String>,
        source_language: impl Into<String>,
        dest_language: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            dest_language: dest_language.into(),
        }
    }

    /// Source language to pass to the provider; `None` when it equals the
    /// target so the provider detects it.
    pub fn source_hint(&self) -> Option<&str> {
        if self.source_language == self.dest_language {
            None
        } else {
            Some(&self.source_language)
        }
    }
}

/// A client able to translate text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult<String>;
}

/// Translate v2 request body
#[derive(Debug, Serialize)]
struct TranslateBody<'a> {
    q: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

impl<'a> TranslateBody<'a> {
    fn from_request(request: &'a TranslationRequest) -> Self {
        Self {
            q: &request.text,
            target: &request.dest_language,
            format: "text",
            source: request.source_hint(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

fn parse_response(body: &str) -> TranslationResult<String> {
    let response: TranslateResponse = serde_json::from_str(body)
        .map_err(|e| TranslationError::MalformedResponse(e.to_string()))?;

    response
        .data
        .translations
        .into_iter()
        .next()
        .map(|t| t.translated_text)
        .ok_or_else(|| TranslationError::MalformedResponse("no translations returned".to_string()))
}

/// Google Cloud Translation v2 client
pub struct GoogleTranslateClient {
    http: Client,
    api_url: String,
    tokens: TokenProvider,
}

impl GoogleTranslateClient {
    pub fn new(http: Client, api_url: impl Into<String>, tokens: TokenProvider) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            tokens,
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslateClient {
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult<String> {
        let token = self.tokens.access_token().await?;

        debug!(
            source = ?request.source_hint(),
            target = %request.dest_language,
            chars = request.text.chars().count(),
            "Translating text"
        );

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(token)
            .json(&TranslateBody::from_request(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TranslationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }
}
