//! Failure-tolerant translation entry point.

use crate::client::{GoogleTranslateClient, TranslationRequest, Translator};
use crate::config::TranslationConfig;
use crate::credentials::GoogleCredentials;
use crate::error::{TranslationError, TranslationResult};
use crate::token::TokenProvider;
use reqwest::Client;
use std::sync::Arc;
use tracing::{error, warn};

/// Builds a translation client on demand.
#[cfg_attr(test, mockall::automock)]
pub trait ClientFactory: Send + Sync {
    fn build(&self) -> TranslationResult<Arc<dyn Translator>>;
}

/// Builds [`GoogleTranslateClient`]s from the credentials found in the
/// environment at call time.
pub struct GoogleClientFactory {
    http: Client,
    api_url: String,
}

impl GoogleClientFactory {
    pub fn new(config: &TranslationConfig) -> Self {
        Self {
            http: Client::new(),
            api_url: config.api_url.clone(),
        }
    }
}

impl ClientFactory for GoogleClientFactory {
    fn build(&self) -> TranslationResult<Arc<dyn Translator>> {
        let credentials = GoogleCredentials::from_env()?;
        let tokens = TokenProvider::new(credentials, self.http.clone())?;

        Ok(Arc::new(GoogleTranslateClient::new(
            self.http.clone(),
            &self.api_url,
            tokens,
        )))
    }
}

/// Text to translate, as a string or UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextInput {
    Text(String),
    Bytes(Vec<u8>),
}

impl TextInput {
    pub fn into_text(self) -> TranslationResult<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Bytes(bytes) => {
                String::from_utf8(bytes).map_err(|e| TranslationError::Decoding(e.to_string()))
            }
        }
    }
}

impl From<&str> for TextInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for TextInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&[u8]> for TextInput {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for TextInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// User-facing strings returned instead of a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackMessages {
    pub not_configured: &'static str,
    pub failed: &'static str,
}

impl FallbackMessages {
    pub const EN: Self = Self {
        not_configured: "Error: the translation service is not configured.",
        failed: "Error: the translation service failed.",
    };

    pub const ES: Self = Self {
        not_configured: "Error: el servicio de traducción no está configurado.",
        failed: "Error: el servicio de traducción falló.",
    };

    pub const RO: Self = Self {
        not_configured: "Eroare: serviciul de traducere nu este configurat.",
        failed: "Eroare: serviciul de traducere a eșuat.",
    };

    /// Strings for `locale` (`es`, `es-MX` and `es_MX` all map to Spanish);
    /// anything unknown gets English.
    pub fn for_locale(locale: &str) -> Self {
        let language = locale
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match language.as_str() {
            "es" => Self::ES,
            "ro" => Self::RO,
            _ => Self::EN,
        }
    }
}

/// Wraps the translation provider so callers always get displayable text.
pub struct TranslationGateway {
    factory: Arc<dyn ClientFactory>,
    locale: String,
}

impl TranslationGateway {
    pub fn new(factory: Arc<dyn ClientFactory>, config: &TranslationConfig) -> Self {
        Self {
            factory,
            locale: config.locale.clone(),
        }
    }

    /// Gateway backed by Google Cloud Translation.
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(Arc::new(GoogleClientFactory::new(config)), config)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Translate `text`, answering failures in the configured UI locale.
    pub async fn translate_text(
        &self,
        text: impl Into<TextInput>,
        source_language: &str,
        dest_language: &str,
    ) -> String {
        self.translate_text_localized(text, source_language, dest_language, &self.locale)
            .await
    }

    /// Translate `text`, answering failures in `locale`.
    ///
    /// Never fails: a missing client yields the "not configured" string, any
    /// other problem the "failed" string.
    pub async fn translate_text_localized(
        &self,
        text: impl Into<TextInput>,
        source_language: &str,
        dest_language: &str,
        locale: &str,
    ) -> String {
        let fallback = FallbackMessages::for_locale(locale);

        let translator = match self.factory.build() {
            Ok(translator) => translator,
            Err(err) => {
                warn!(error = %err, "Translation client unavailable");
                return fallback.not_configured.to_string();
            }
        };

        match self
            .translate_with(translator.as_ref(), text.into(), source_language, dest_language)
            .await
        {
            Ok(translated) => translated,
            Err(err) => {
                error!(
                    error = %err,
                    source = %source_language,
                    target = %dest_language,
                    "Translation failed"
                );
                fallback.failed.to_string()
            }
        }
    }

    async fn translate_with(
        &self,
        translator: &dyn Translator,
        text: TextInput,
        source_language: &str,
        dest_language: &str,
    ) -> TranslationResult<String> {
        let request = TranslationRequest::new(text.into_text()?, source_language, dest_language);
        translator.translate(&request).await
    }
}
