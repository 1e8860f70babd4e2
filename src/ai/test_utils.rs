//! Shared test utilities for the `ai` module.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::ai::{ClientMetadata, CompletionClient, CompletionRequest};

/// Owned copy of a [`CompletionRequest`] captured by the mock.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RecordedRequest {
    pub system_role: Option<String>,
    pub user_prompt: String,
    pub temperature: f32,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub stop: Option<String>,
}

/// Mock completion client with a pre-programmed queue of responses.
///
/// Responses are returned in FIFO order. When the queue is exhausted,
/// subsequent calls return `Err("no more mock responses")`. Every call is
/// recorded; use [`request_handle`](Self::request_handle) to read them
/// after the client has been borrowed by the pipeline.
pub(crate) struct ConfigurableMockAiClient {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ConfigurableMockAiClient {
    /// Creates a new mock client that will return the given responses in order.
    pub(crate) fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            recorded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a handle for inspecting which requests were sent.
    pub(crate) fn request_handle(&self) -> RequestRecordHandle {
        RequestRecordHandle {
            recorded: self.recorded.clone(),
        }
    }
}

/// Shared handle to a mock client's recorded requests.
pub(crate) struct RequestRecordHandle {
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl RequestRecordHandle {
    /// Returns all recorded requests.
    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded.lock().unwrap().clone()
    }

    /// Returns the number of completion requests that were made.
    pub(crate) fn request_count(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }
}

impl CompletionClient for ConfigurableMockAiClient {
    fn complete<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        let recorded = RecordedRequest {
            system_role: request.system_role.map(str::to_string),
            user_prompt: request.user_prompt.to_string(),
            temperature: request.temperature,
            model: request.model.to_string(),
            max_tokens: request.max_tokens,
            stop: request.stop.map(str::to_string),
        };
        Box::pin(async move {
            self.recorded.lock().unwrap().push(recorded);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no more mock responses")))
        })
    }

    fn get_metadata(&self) -> ClientMetadata {
        ClientMetadata {
            provider: "Mock".to_string(),
            endpoint: "mock://completions".to_string(),
        }
    }
}
