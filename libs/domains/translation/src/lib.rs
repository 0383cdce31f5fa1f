//! Translation Domain
//!
//! Translates user content through Google Cloud Translation while never
//! failing the caller: when no client can be built or the provider errors,
//! a localized fallback string is returned instead.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │ TranslationGateway │  ← decodes input, picks fallback strings
//! └─────────┬──────────┘
//!           │ ClientFactory::build (per call)
//! ┌─────────▼──────────┐
//! │ GoogleTranslateClient │  ← Translate v2 REST
//! └─────────┬──────────┘
//!           │
//! ┌─────────▼──────────┐
//! │   TokenProvider    │  ← service account JWT or refresh token
//! └────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use core_config::FromEnv;
//! use domain_translation::{TranslationConfig, TranslationGateway};
//!
//! let gateway = TranslationGateway::from_config(&TranslationConfig::from_env()?);
//! let text = gateway.translate_text("hola", "es", "en").await;
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod token;

pub use client::{GoogleTranslateClient, TranslationRequest, Translator};
pub use config::{TranslationConfig, TRANSLATE_API_URL};
pub use credentials::GoogleCredentials;
pub use error::{TranslationError, TranslationResult};
pub use gateway::{ClientFactory, FallbackMessages, GoogleClientFactory, TextInput, TranslationGateway};
pub use token::TokenProvider;
