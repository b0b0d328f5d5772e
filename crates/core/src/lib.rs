//! # Pagewise Core
//!
//! Domain types, traits, and error definitions for the Pagewise document
//! assistant. Nothing here performs I/O; this crate defines the domain model
//! that the ingestion, provider, and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here:
//! - [`Provider`]: the completion service boundary
//! - [`PaginatedSource`]: the paginated document boundary
//! - [`FailureClassifier`]: how a completion failure maps to a retry decision
//!
//! Implementations live in their respective crates, and tests substitute
//! scripted mocks.

pub mod classify;
pub mod document;
pub mod error;
pub mod message;
pub mod provider;
pub mod source;

// Re-export key types at crate root for ergonomics
pub use classify::{FailureClass, FailureClassifier, KeywordClassifier};
pub use document::{Document, DocumentStats, FileType};
pub use error::{AskError, Error, ExtractionError, ProviderError, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use source::{PaginatedSource, TextFragment};
