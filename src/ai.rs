//! Completion client trait and shared request types.

pub mod error;
pub mod openai;

#[cfg(test)]
pub(crate) mod test_utils;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;

pub use error::{is_rate_limited, AiError};
pub use openai::OpenAiClient;

/// HTTP request timeout for completion calls.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// One chat-style completion call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletionRequest<'a> {
    /// Persona the model is asked to adopt (e.g. "a project manager"), if any.
    pub system_role: Option<&'a str>,
    /// User message.
    pub user_prompt: &'a str,
    /// Sampling temperature.
    pub temperature: f32,
    /// Model identifier.
    pub model: &'a str,
    /// Output token cap, when the caller wants one.
    pub max_tokens: Option<u32>,
    /// Stop sequence, when the caller wants one.
    pub stop: Option<&'a str>,
}

impl CompletionRequest<'_> {
    /// Returns the system message for this request's role.
    pub fn system_message(&self) -> Option<String> {
        self.system_role.map(|role| format!("You are {role}."))
    }
}

/// Metadata about a completion client implementation.
#[derive(Clone, Debug)]
pub struct ClientMetadata {
    /// Service provider name.
    pub provider: String,
    /// Endpoint the client talks to.
    pub endpoint: String,
}

/// Trait for completion backends.
///
/// Implementations must report throttling as [`AiError::RateLimitExceeded`]
/// so callers can tell it apart from other failures.
pub trait CompletionClient: Send + Sync {
    /// Executes a completion request and returns the generated text.
    fn complete<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Returns metadata about the client implementation.
    fn get_metadata(&self) -> ClientMetadata;
}

/// Builds an HTTP client with the standard request timeout.
pub(crate) fn build_http_client() -> std::result::Result<Client, AiError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AiError::Configuration(format!("failed to build HTTP client: {e}")))
}
