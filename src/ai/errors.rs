//! AI text-transform error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI text service is not configured")]
    NotConfigured,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API access denied")]
    PermissionDenied,

    #[error("API quota exceeded")]
    QuotaExceeded,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Empty response from AI service")]
    EmptyResponse,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI service error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl AiError {
    /// Whether a retry policy may try the call again
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidApiKey | Self::NotConfigured)
    }

    /// Text safe to show to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::NotConfigured => {
                "AI features are not configured. Set an API key to enable them.".to_string()
            }
            Self::InvalidApiKey => "Invalid API key. Please check your configuration.".to_string(),
            Self::PermissionDenied => {
                "API access denied. Please verify your API key has proper permissions.".to_string()
            }
            Self::QuotaExceeded => "API quota exceeded. Please check your API usage limits.".to_string(),
            Self::RateLimited => "Rate limit exceeded. Please wait a moment and try again.".to_string(),
            Self::EmptyResponse | Self::Http(_) | Self::Api { .. } => {
                "The AI service is unavailable at this time. Please try again later.".to_string()
            }
        }
    }
}

pub type AiResult<T> = Result<T, AiError>;
