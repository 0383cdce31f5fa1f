//! Error types for the translation domain.

use thiserror::Error;

/// Result type for translation operations.
pub type TranslationResult<T> = Result<T, TranslationError>;

/// Errors that can occur while building a client or translating text.
///
/// The gateway turns every one of these into a fallback string; they only
/// ever reach logs.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// No usable credential, or the credential could not be loaded.
    #[error("Translation client unavailable: {0}")]
    ClientConstruction(String),

    /// Network failure talking to the provider or the token endpoint.
    #[error("Translation transport error: {0}")]
    Transport(String),

    /// Provider or token endpoint answered with a non-success status.
    #[error("Translation provider rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Input bytes were not valid UTF-8.
    #[error("Text is not valid UTF-8: {0}")]
    Decoding(String),

    /// Provider response did not have the expected shape.
    #[error("Malformed translation response: {0}")]
    MalformedResponse(String),
}

impl TranslationError {
    /// Whether the error means translation is not set up at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ClientConstruction(_))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
