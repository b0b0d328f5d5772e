//! Failure classification for completion errors.
//!
//! The retry controller never inspects a [`ProviderError`] directly; it asks
//! a [`FailureClassifier`] whether the failure is worth a smaller retry.
//! [`KeywordClassifier`] is the message-keyword heuristic; a provider with a
//! structured error channel can supply its own classifier instead.

use crate::error::ProviderError;

/// How a failed completion should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The service rejected the request because the input was too large.
    SizeLimit,
    /// Network, timeout, rate limiting, or server-side failure.
    Transport,
    /// Anything else. Not retried.
    Unknown,
}

impl FailureClass {
    /// Whether a shrunk retry may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::SizeLimit | Self::Transport)
    }
}

/// Strategy mapping a failure payload to a [`FailureClass`].
pub trait FailureClassifier: Send + Sync {
    fn classify(&self, error: &ProviderError) -> FailureClass;
}

impl<F> FailureClassifier for F
where
    F: Fn(&ProviderError) -> FailureClass + Send + Sync,
{
    fn classify(&self, error: &ProviderError) -> FailureClass {
        self(error)
    }
}

/// Wording that completion services use when the input is too large.
const SIZE_KEYWORDS: &[&str] = &[
    "size",
    "token",
    "exceed",
    "too long",
    "too large",
    "context length",
    "maximum",
];

/// Substring-based classifier.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    extra_keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lowercase keyword that also marks a size-limit failure.
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.extra_keywords.push(keyword.into().to_lowercase());
        self
    }

    fn mentions_size(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        SIZE_KEYWORDS.iter().any(|k| lower.contains(k))
            || self.extra_keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

impl FailureClassifier for KeywordClassifier {
    fn classify(&self, error: &ProviderError) -> FailureClass {
        // "invalid token" is a credential problem, not a size problem
        if matches!(
            error,
            ProviderError::AuthenticationFailed(_)
                | ProviderError::NotConfigured(_)
                | ProviderError::ModelNotFound(_)
        ) {
            return FailureClass::Unknown;
        }

        if self.mentions_size(&error.message()) {
            return FailureClass::SizeLimit;
        }

        match error {
            ProviderError::Network(_)
            | ProviderError::Timeout(_)
            | ProviderError::RateLimited { .. } => FailureClass::Transport,
            ProviderError::ApiError { status_code, .. } if *status_code >= 500 => {
                FailureClass::Transport
            }
            ProviderError::ApiError { status_code: 413, .. } => FailureClass::SizeLimit,
            _ => FailureClass::Unknown,
        }
    }
}
