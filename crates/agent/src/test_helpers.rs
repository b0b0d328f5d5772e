//! Shared test helpers: a scripted provider and canned failures.

use pagewise_core::error::ProviderError;
use pagewise_core::message::Message;
use pagewise_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A mock provider that replays a queue of scripted results.
///
/// Once the queue is empty it keeps returning `fallback`, or panics when no
/// fallback was set. Every request is recorded for inspection.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    fallback: Option<ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that fails every call with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            fallback: Some(error),
            ..Self::new()
        }
    }

    pub fn then_text(self, text: &str) -> Self {
        self.push(Ok(make_text_response(text)))
    }

    pub fn then_err(self, error: ProviderError) -> Self {
        self.push(Err(error))
    }

    fn push(self, result: Result<ProviderResponse, ProviderError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        match self.script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => match &self.fallback {
                Some(error) => Err(error.clone()),
                None => panic!("ScriptedProvider: no scripted result for call #{call}"),
            },
        }
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// The error a completion service returns for an oversized prompt.
pub fn size_limit_error() -> ProviderError {
    ProviderError::ApiError {
        status_code: 400,
        message: "Prompt contains 52000 tokens, too large for model with 32768 maximum context length"
            .into(),
    }
}
