//! Error types for the Pagewise domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Pagewise operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Extraction errors ---
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    // --- Question answering errors ---
    #[error("Ask error: {0}")]
    Ask(#[from] AskError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// The structured failure payload of the completion service boundary.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// The human-readable message carried by this failure.
    ///
    /// This is what failure classifiers inspect.
    pub fn message(&self) -> String {
        match self {
            Self::ApiError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Faults raised while turning a source into page text.
///
/// `Page` and `SourceUnreadable` are absorbed by the page extractor into
/// placeholder text; only `Cancelled` reaches callers of the cancellable
/// entry points.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("Source unreadable: {0}")]
    SourceUnreadable(String),

    #[error("Page {page} unreadable: {reason}")]
    Page { page: usize, reason: String },

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ExtractionError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Faults the question-answering surface returns instead of an answer.
///
/// Size-limit and transport failures are never reported here: they are
/// retried and, once exhausted, answered with a fixed apology.
#[derive(Debug, Clone, Error)]
pub enum AskError {
    #[error("Request cancelled")]
    Cancelled,

    #[error("Unclassified provider failure: {0}")]
    Unclassified(ProviderError),
}
