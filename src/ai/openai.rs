//! OpenAI-compatible chat completions client (works with OpenAI, Ollama, etc.).

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::{build_http_client, ClientMetadata, CompletionClient, CompletionRequest};
use crate::ai::error::AiError;
use crate::config::CompletionConfig;

/// Chat message in a request body.
#[derive(Serialize, Debug)]
struct Message {
    role: &'static str,
    content: String,
}

/// Chat completions request body.
#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a str>,
    stream: bool,
}

/// Response choice.
#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

/// Response message.
#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat completions response body.
#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<Usage>,
}

/// Token usage statistics.
#[derive(Deserialize, Debug)]
#[allow(dead_code)] // only read through Debug in logs
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

/// OpenAI-compatible completion client.
pub struct OpenAiClient {
    /// HTTP client for API requests.
    client: Client,
    /// API key for authentication (optional for local servers).
    api_key: Option<String>,
    /// Base URL for the API (e.g., "https://api.openai.com" or "http://localhost:11434").
    base_url: String,
}

impl OpenAiClient {
    /// Creates a client for `base_url`, authenticating with `api_key` when given.
    ///
    /// Fails with [`AiError::Configuration`] when `base_url` is not an
    /// absolute http(s) URL or the HTTP client cannot be built.
    pub fn new(base_url: String, api_key: Option<String>) -> Result<Self> {
        // Catch typos here rather than as a network error on the first request.
        let parsed = Url::parse(&base_url)
            .map_err(|e| AiError::Configuration(format!("invalid base URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AiError::Configuration(format!(
                "unsupported base URL scheme '{}'",
                parsed.scheme()
            ))
            .into());
        }

        Ok(Self {
            client: build_http_client()?,
            api_key,
            base_url,
        })
    }

    /// Creates a client from loaded configuration; an API key is required.
    pub fn from_config(config: &CompletionConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Self::new(config.base_url.clone(), Some(api_key))
    }

    /// Returns the full chat completions URL.
    fn get_api_url(&self) -> String {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        debug!(base_url = %self.base_url, full_url = %url, "Constructed chat completions URL");
        url
    }

    /// Returns true for a likely local server (e.g. Ollama).
    fn is_local(&self) -> bool {
        self.base_url.contains("localhost")
            || self.base_url.contains("127.0.0.1")
            || self.api_key.is_none()
    }
}

/// Returns true for models that take `max_completion_tokens` and reject `temperature`.
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5") || model.starts_with("o1") || model.starts_with("o3")
}

fn build_body<'a>(request: &CompletionRequest<'a>) -> ChatRequest<'a> {
    let mut messages = Vec::new();
    if let Some(system) = request.system_message() {
        messages.push(Message {
            role: "system",
            content: system,
        });
    }
    messages.push(Message {
        role: "user",
        content: request.user_prompt.to_string(),
    });

    // Reasoning models reject `temperature` and renamed the token cap
    if is_reasoning_model(request.model) {
        ChatRequest {
            model: request.model,
            messages,
            temperature: None,
            max_tokens: None,
            max_completion_tokens: request.max_tokens,
            stop: request.stop,
            stream: false,
        }
    } else {
        ChatRequest {
            model: request.model,
            messages,
            temperature: Some(request.temperature),
            max_tokens: request.max_tokens,
            max_completion_tokens: None,
            stop: request.stop,
            stream: false,
        }
    }
}

impl CompletionClient for OpenAiClient {
    fn complete<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let body = build_body(&request);
            debug!(
                model = %request.model,
                system_role = ?request.system_role,
                user_prompt_len = request.user_prompt.len(),
                temperature = ?body.temperature,
                max_tokens = ?request.max_tokens,
                "Built chat completions payload"
            );

            let api_url = self.get_api_url();
            info!(url = %api_url, model = %request.model, "Sending completion request");

            let mut builder = self
                .client
                .post(&api_url)
                .header("Content-Type", "application/json")
                .json(&body);
            // Local servers (e.g. Ollama) run without a key
            if let Some(ref api_key) = self.api_key {
                builder = builder.header("Authorization", format!("Bearer {api_key}"));
            }

            let response = builder
                .send()
                .await
                .map_err(|e| AiError::NetworkError(e.to_string()))?;

            // 429 gets its own error so the pipeline can halt gracefully
            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let error_text = response.text().await.unwrap_or_default();
                debug!(body = %error_text, "Completion request was rate limited");
                return Err(AiError::RateLimitExceeded.into());
            }
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_else(|e| {
                    debug!("Failed to read error response body: {e}");
                    String::new()
                });
                return Err(AiError::ApiRequestFailed(format!("HTTP {status}: {error_text}")).into());
            }

            let chat_response: ChatResponse = response
                .json()
                .await
                .map_err(|e| AiError::InvalidResponseFormat(e.to_string()))?;

            debug!(
                choice_count = chat_response.choices.len(),
                model = ?chat_response.model,
                usage = ?chat_response.usage,
                finish_reason = ?chat_response.choices.first().and_then(|c| c.finish_reason.as_deref()),
                "Received chat completions response"
            );

            // Only the first choice is used; `n` is never set above 1
            let text = chat_response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .map(|content| content.trim().to_string())
                .ok_or_else(|| {
                    AiError::InvalidResponseFormat("No message content in response".to_string())
                })?;

            debug!(response_len = text.len(), "Extracted completion text");
            Ok(text)
        })
    }

    fn get_metadata(&self) -> ClientMetadata {
        let provider = if self.is_local() {
            "OpenAI-compatible (local)"
        } else {
            "OpenAI"
        };
        ClientMetadata {
            provider: provider.to_string(),
            endpoint: self.get_api_url(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ai::error::is_rate_limited;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request<'a>(system_role: Option<&'a str>, prompt: &'a str) -> CompletionRequest<'a> {
        CompletionRequest {
            system_role,
            user_prompt: prompt,
            temperature: 0.7,
            model: "gpt-3.5-turbo",
            max_tokens: None,
            stop: None,
        }
    }

    fn chat_body(content: &str) -> serde_json::Value {
        json!({
            "model": "gpt-3.5-turbo",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        })
    }

    #[test]
    fn api_url_strips_trailing_slash() {
        let client = OpenAiClient::new("http://localhost:11434/".to_string(), None).unwrap();
        assert_eq!(
            client.get_api_url(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn local_detection() {
        let local = OpenAiClient::new("http://127.0.0.1:8080".to_string(), Some("k".to_string()))
            .unwrap();
        assert!(local.is_local());
        let remote = OpenAiClient::new(
            "https://api.openai.com".to_string(),
            Some("sk-real".to_string()),
        )
        .unwrap();
        assert!(!remote.is_local());
        assert_eq!(remote.get_metadata().provider, "OpenAI");
    }

    #[test]
    fn rejects_unusable_base_url() {
        for base_url in ["api.openai.com", "ftp://example.com", ""] {
            let err = OpenAiClient::new(base_url.to_string(), None).err().unwrap();
            assert!(
                matches!(err.downcast_ref::<AiError>(), Some(AiError::Configuration(_))),
                "{base_url}: {err}"
            );
        }
    }

    #[test]
    fn from_config_requires_api_key() {
        let err = OpenAiClient::from_config(&CompletionConfig::default())
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<AiError>(),
            Some(AiError::ApiKeyNotFound)
        ));
    }

    #[test]
    fn body_for_chat_model() {
        let req = CompletionRequest {
            max_tokens: Some(60),
            stop: Some("END"),
            ..request(Some("a project manager"), "why?")
        };
        let body = serde_json::to_value(build_body(&req)).unwrap();
        assert_eq!(
            body["messages"],
            json!([
                { "role": "system", "content": "You are a project manager." },
                { "role": "user", "content": "why?" }
            ])
        );
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(body["max_tokens"], 60);
        assert_eq!(body["stop"], "END");
        assert_eq!(body["stream"], false);
        assert!(body.get("max_completion_tokens").is_none());
    }

    #[test]
    fn body_for_reasoning_model_drops_temperature() {
        let req = CompletionRequest {
            model: "gpt-5",
            max_tokens: Some(100),
            ..request(None, "why?")
        };
        let body = serde_json::to_value(build_body(&req)).unwrap();
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
        assert_eq!(body["max_completion_tokens"], 100);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn returns_trimmed_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    { "role": "system", "content": "You are a project manager." },
                    { "role": "user", "content": "compare" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("  - reason one\n")))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(server.uri(), Some("sk-test".to_string())).unwrap();
        let text = client
            .complete(request(Some("a project manager"), "compare"))
            .await
            .unwrap();
        assert_eq!(text, "- reason one");
    }

    #[tokio::test]
    async fn maps_429_to_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(server.uri(), Some("sk-test".to_string())).unwrap();
        let err = client.complete(request(None, "x")).await.unwrap_err();
        assert!(is_rate_limited(&err));
    }

    #[tokio::test]
    async fn maps_server_error_to_request_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(server.uri(), None).unwrap();
        let err = client.complete(request(None, "x")).await.unwrap_err();
        assert!(!is_rate_limited(&err));
        match err.downcast_ref::<AiError>() {
            Some(AiError::ApiRequestFailed(msg)) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("internal"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(server.uri(), None).unwrap();
        let err = client.complete(request(None, "x")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AiError>(),
            Some(AiError::InvalidResponseFormat(_))
        ));
    }
}
