//! Paginated source trait: the boundary to page-oriented formats.
//!
//! The page extractor only needs a page count and, per page, the positioned
//! text fragments in content-stream order. PDF is the production
//! implementation; tests use in-memory sources.

use crate::error::ExtractionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A run of text placed at a position on the page.
///
/// Coordinates follow PDF user space: `y` grows upwards, so successive lines
/// on a page have decreasing `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    /// Horizontal position of the fragment's start.
    pub x: f32,
    /// Vertical position of the fragment's baseline.
    pub y: f32,
    /// Horizontal extent of the fragment.
    pub width: f32,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
        }
    }

    /// Horizontal position where the fragment ends.
    pub fn end_x(&self) -> f32 {
        self.x + self.width
    }
}

#[async_trait]
pub trait PaginatedSource: Send + Sync {
    /// Number of pages. Pages are numbered `1..=page_count()`.
    fn page_count(&self) -> usize;

    /// Positioned text fragments of a single page.
    async fn page_fragments(&self, page: usize) -> Result<Vec<TextFragment>, ExtractionError>;
}
