//! Translation configuration.

use core_config::{ConfigError, FromEnv, env_list, env_or_default};

/// Google Cloud Translation v2 endpoint
pub const TRANSLATE_API_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Languages the UI is offered in.
pub const DEFAULT_LANGUAGES: [&str; 3] = ["en", "es", "ro"];

#[derive(Debug, Clone)]
pub struct TranslationConfig {
    /// UI locale used to pick fallback strings
    pub locale: String,
    /// Supported UI languages
    pub languages: Vec<String>,
    /// Translation endpoint
    pub api_url: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            languages: DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            api_url: TRANSLATE_API_URL.to_string(),
        }
    }
}

impl TranslationConfig {
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn supports(&self, locale: &str) -> bool {
        self.languages.iter().any(|l| l.eq_ignore_ascii_case(locale))
    }
}

impl FromEnv for TranslationConfig {
    /// Reads `TRANSLATION_LOCALE` (default `en`) and `LANGUAGES`
    /// (comma-separated, default `en,es,ro`). The locale must be one of the
    /// languages.
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mut languages = env_list("LANGUAGES");
        if languages.is_empty() {
            languages = defaults.languages;
        }

        let config = Self {
            locale: env_or_default("TRANSLATION_LOCALE", &defaults.locale),
            languages,
            api_url: defaults.api_url,
        };

        if !config.supports(&config.locale) {
            return Err(ConfigError::Invalid {
                key: "TRANSLATION_LOCALE".to_string(),
                details: format!(
                    "'{}' is not one of {}",
                    config.locale,
                    config.languages.join(",")
                ),
            });
        }

        Ok(config)
    }
}
