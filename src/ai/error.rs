//! Completion backend errors.

use thiserror::Error;

/// Errors raised by completion clients.
#[derive(Error, Debug)]
pub enum AiError {
    /// API key not found in the environment or settings file.
    #[error("OpenAI API key not found. Set the OPENAI_API_KEY environment variable")]
    ApiKeyNotFound,

    /// The backend refused the request because of rate limiting or quota.
    #[error("Rate limit exceeded. Please try again later")]
    RateLimitExceeded,

    /// The backend answered with a non-success status.
    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    /// The request never got an HTTP response.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The response body did not have the expected shape.
    #[error("Invalid response format from API: {0}")]
    InvalidResponseFormat(String),

    /// The client could not be constructed.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Returns true when `err` (or anything in its cause chain) is a rate-limit refusal.
pub fn is_rate_limited(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| matches!(cause.downcast_ref::<AiError>(), Some(AiError::RateLimitExceeded)))
}
