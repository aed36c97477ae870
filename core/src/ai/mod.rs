pub mod gemini;
pub mod hints;
pub mod prompt;
pub mod retry;

use thiserror::Error;

pub use gemini::GeminiTranslator;
pub use prompt::TranslationPrompt;

/// Error text the Gemini API uses when the project quota is used up.
pub const QUOTA_EXHAUST_SIGNATURE: &str = "429 Resource has been exhausted";

#[derive(Debug, Error)]
pub enum RemoteError {
    /// Non-success HTTP status. Displayed as `"{status} {message}"` so quota
    /// replies carry [`QUOTA_EXHAUST_SIGNATURE`].
    #[error("{status} {message}")]
    Http {
        status: u16,
        message: String,
        quota_failure: bool,
    },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response payload: {0}")]
    MalformedResponse(String),
    #[error("API key is not configured")]
    MissingApiKey,
    #[error("translator reported an error: {0}")]
    Failure(String),
}

impl RemoteError {
    pub fn is_quota_exhausted(&self) -> bool {
        if let RemoteError::Http {
            quota_failure: true,
            ..
        } = self
        {
            return true;
        }
        self.to_string().contains(QUOTA_EXHAUST_SIGNATURE)
    }

    /// Errors that cannot improve by retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RemoteError::MissingApiKey)
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        // request URLs carry the API key as a query parameter
        RemoteError::Network(error.without_url().to_string())
    }
}

/// One remote call: the texts of a (sub-)batch and the rendered prompt that
/// carries them.
#[derive(Debug, Clone)]
pub struct TranslationRequest<'a> {
    pub texts: &'a [String],
    pub target_lang: &'a str,
    pub prompt: String,
}

/// A remote text-array translation service.
///
/// Implementations return the raw reply text; the caller checks that it is a
/// JSON array with one entry per input text.
pub trait RemoteTranslator: Send {
    fn name(&self) -> &'static str;

    fn translate(&mut self, request: &TranslationRequest<'_>) -> Result<String, RemoteError>;
}

pub(crate) fn normalize_api_key(key: Option<String>) -> Option<String> {
    key.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
