//! Shrinking retry around the completion call.
//!
//! Each attempt is a fresh [`Attempt`] record with its own prompt and
//! response cap. Attempt 1 sends the full content. After a size-limit or
//! transport failure the controller waits a fixed backoff and retries with a
//! shorter prefix of the *original* content (never of the previous prompt)
//! and a smaller response cap. Once the shrink attempts are spent, a single
//! minimal-context attempt sends a short excerpt with a preamble; if that
//! also fails the caller gets [`APOLOGY`].
//!
//! Failures the classifier cannot place are returned as
//! [`AskError::Unclassified`] instead of being hidden behind the apology.

use crate::context::token::char_prefix;
use crate::prompt;
use pagewise_config::RetryConfig;
use pagewise_core::classify::{FailureClassifier, KeywordClassifier};
use pagewise_core::error::{AskError, ProviderError};
use pagewise_core::provider::{Provider, ProviderRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const F32_TOLERANCE: f64 = 1e-6;

/// Returned when every attempt has failed.
pub const APOLOGY: &str =
    "I'm sorry, I encountered an error processing your question. Please try again.";

/// Returned when the service answers with empty text.
pub const EMPTY_RESPONSE: &str = "I couldn't generate a response.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptKind {
    /// The fully assembled content.
    Full,
    /// A prefix of the original content.
    Shrunk,
    /// A short excerpt with an explanatory preamble.
    Minimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Pending,
    Sent,
    Succeeded,
    RetryableFailed,
    FatalFailed,
}

/// One call to the completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based.
    pub number: u32,
    pub kind: AttemptKind,
    pub system_prompt: String,
    /// Characters of document content in `system_prompt`.
    pub content_chars: usize,
    pub response_token_cap: u32,
    pub state: AttemptState,
    pub failure: Option<String>,
}

impl Attempt {
    fn new(number: u32, kind: AttemptKind, system_prompt: String, content_chars: usize, cap: u32) -> Self {
        Self {
            number,
            kind,
            system_prompt,
            content_chars,
            response_token_cap: cap,
            state: AttemptState::Pending,
            failure: None,
        }
    }
}

/// The answer plus the attempts that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskOutcome {
    pub answer: String,
    pub attempts: Vec<Attempt>,
    /// True when every attempt failed and `answer` is [`APOLOGY`].
    pub exhausted: bool,
}

/// Drives the attempt chain for one question. Holds no per-question state.
pub struct RetryController {
    provider: Arc<dyn Provider>,
    classifier: Arc<dyn FailureClassifier>,
    config: RetryConfig,
    model: String,
    temperature: f32,
    max_response_tokens: u32,
}

impl RetryController {
    pub fn new(
        provider: Arc<dyn Provider>,
        config: RetryConfig,
        model: impl Into<String>,
        temperature: f32,
        max_response_tokens: u32,
    ) -> Self {
        Self {
            provider,
            classifier: Arc::new(KeywordClassifier::new()),
            config,
            model: model.into(),
            temperature,
            max_response_tokens,
        }
    }

    /// Replace the default keyword classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn FailureClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Shrink attempts plus the minimal-context attempt.
    pub fn max_attempts(&self) -> u32 {
        self.config.shrink_attempts.max(1) + 1
    }

    /// Content length for shrink attempt `number` (1-based).
    pub fn content_chars_for(&self, original: usize, number: u32) -> usize {
        let factor = f64::from(self.config.content_shrink).powi(number.saturating_sub(1) as i32);
        // absorb the f32 rounding of the configured factor (0.7 is stored as 0.69999998)
        (original as f64 * factor * (1.0 + F32_TOLERANCE)).floor() as usize
    }

    fn shrink_cap(&self, cap: u32) -> u32 {
        let shrunk = f64::from(cap) * f64::from(self.config.response_shrink) * (1.0 + F32_TOLERANCE);
        (shrunk.floor() as u32).max(1)
    }

    /// Ask `query` against `content`.
    pub async fn run(
        &self,
        content: &str,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<AskOutcome, AskError> {
        let original_chars = content.chars().count();
        let shrink_attempts = self.config.shrink_attempts.max(1);
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut cap = self.max_response_tokens;
        let mut content_chars = original_chars;

        for number in 1..=shrink_attempts {
            if number > 1 {
                self.backoff(cancel).await?;
                content_chars = self.content_chars_for(original_chars, number);
                cap = self.shrink_cap(cap);
            }
            if cancel.is_cancelled() {
                return Err(AskError::Cancelled);
            }

            let kind = if number == 1 {
                AttemptKind::Full
            } else {
                AttemptKind::Shrunk
            };
            let system_prompt = prompt::document_prompt(char_prefix(content, content_chars));
            let mut attempt = Attempt::new(number, kind, system_prompt, content_chars, cap);

            let result = self.send(&mut attempt, query).await;
            attempts.push(attempt);
            if let Some(answer) = result? {
                return Ok(AskOutcome {
                    answer,
                    attempts,
                    exhausted: false,
                });
            }
        }

        self.backoff(cancel).await?;
        if cancel.is_cancelled() {
            return Err(AskError::Cancelled);
        }

        let excerpt_chars = self.config.minimal_context_chars.min(content_chars);
        let system_prompt = prompt::excerpt_prompt(char_prefix(content, excerpt_chars));
        let mut attempt = Attempt::new(
            shrink_attempts + 1,
            AttemptKind::Minimal,
            system_prompt,
            excerpt_chars,
            self.shrink_cap(cap),
        );

        let result = self.send(&mut attempt, query).await;
        attempts.push(attempt);
        if let Some(answer) = result? {
            return Ok(AskOutcome {
                answer,
                attempts,
                exhausted: false,
            });
        }

        error!(attempts = attempts.len(), "All attempts failed, returning apology");
        Ok(AskOutcome {
            answer: APOLOGY.to_string(),
            attempts,
            exhausted: true,
        })
    }

    /// Send one attempt. `Ok(None)` means a retryable failure.
    async fn send(&self, attempt: &mut Attempt, query: &str) -> Result<Option<String>, AskError> {
        info!(
            attempt = attempt.number,
            kind = ?attempt.kind,
            content_chars = attempt.content_chars,
            response_cap = attempt.response_token_cap,
            "Sending completion attempt"
        );

        let request = ProviderRequest::chat(
            &self.model,
            attempt.system_prompt.clone(),
            query,
            attempt.response_token_cap,
            self.temperature,
        );
        attempt.state = AttemptState::Sent;

        match self.provider.complete(request).await {
            Ok(response) => {
                attempt.state = AttemptState::Succeeded;
                let text = response.message.content;
                if text.trim().is_empty() {
                    warn!(attempt = attempt.number, "Empty completion");
                    Ok(Some(EMPTY_RESPONSE.to_string()))
                } else {
                    Ok(Some(text))
                }
            }
            Err(e) => self.handle_failure(attempt, e),
        }
    }

    fn handle_failure(&self, attempt: &mut Attempt, e: ProviderError) -> Result<Option<String>, AskError> {
        let class = self.classifier.classify(&e);
        attempt.failure = Some(e.to_string());
        warn!(attempt = attempt.number, ?class, error = %e, "Completion attempt failed");

        if class.is_retryable() {
            attempt.state = AttemptState::RetryableFailed;
            Ok(None)
        } else {
            attempt.state = AttemptState::FatalFailed;
            Err(AskError::Unclassified(e))
        }
    }

    async fn backoff(&self, cancel: &CancellationToken) -> Result<(), AskError> {
        let delay = Duration::from_millis(self.config.backoff_ms);
        tokio::select! {
            _ = cancel.cancelled() => Err(AskError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}
