//! Batched page extraction.
//!
//! Pages are extracted in fixed-size batches to bound peak memory. Pages
//! within a batch run concurrently, but a batch only starts once the previous
//! one has finished, and results are appended in page order, so the output
//! never depends on which page finished first. A short pause between batches
//! keeps the runtime responsive on very large documents.

use futures::future::join_all;
use pagewise_config::ExtractionConfig;
use pagewise_core::{ExtractionError, PaginatedSource};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::layout;

/// Text of a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number.
    pub number: usize,
    pub text: String,
    /// False when `text` is a placeholder for a page that failed.
    pub extracted: bool,
}

/// Ordered page texts of a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub pages: Vec<PageText>,
}

impl ExtractionResult {
    /// A result standing in for a source that could not be read at all.
    pub fn unreadable(reason: &str) -> Self {
        Self {
            pages: vec![PageText {
                number: 1,
                text: unreadable_placeholder(reason),
                extracted: false,
            }],
        }
    }

    /// All page texts joined by blank lines, in page order.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Numbers of pages replaced by placeholders.
    pub fn failed_pages(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|p| !p.extracted)
            .map(|p| p.number)
            .collect()
    }
}

/// Placeholder for a single page that could not be extracted.
pub fn page_placeholder(page: usize) -> String {
    format!("[Page {page}: text could not be extracted]")
}

/// Placeholder for a source that could not be read at all.
pub fn unreadable_placeholder(reason: &str) -> String {
    format!("[Unable to extract text from this document: {reason}]")
}

/// Extracts ordered page text from a [`PaginatedSource`].
#[derive(Debug, Clone, Default)]
pub struct PageExtractor {
    config: ExtractionConfig,
}

impl PageExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Pages per batch for a document of `page_count` pages.
    pub fn batch_size_for(&self, page_count: usize) -> usize {
        let base = self.config.batch_size.max(1);
        if page_count > self.config.large_document_pages {
            (base / 2).max(1)
        } else {
            base
        }
    }

    /// Extract every page. Never fails; faults become placeholders.
    pub async fn extract(&self, source: &dyn PaginatedSource) -> ExtractionResult {
        match self.extract_cancellable(source, &CancellationToken::new()).await {
            Ok(result) => result,
            Err(e) => ExtractionResult::unreadable(&e.to_string()),
        }
    }

    /// Extract every page, stopping between batches once `cancel` fires.
    pub async fn extract_cancellable(
        &self,
        source: &dyn PaginatedSource,
        cancel: &CancellationToken,
    ) -> Result<ExtractionResult, ExtractionError> {
        let page_count = source.page_count();
        if page_count == 0 {
            warn!("Source has no pages");
            return Ok(ExtractionResult::unreadable("the document has no pages"));
        }

        let batch_size = self.batch_size_for(page_count);
        let pause = Duration::from_millis(self.config.batch_pause_ms);
        let mut pages = Vec::with_capacity(page_count);

        info!(page_count, batch_size, "Extracting pages");

        let mut start = 1;
        while start <= page_count {
            if cancel.is_cancelled() {
                info!(completed = pages.len(), page_count, "Extraction cancelled");
                return Err(ExtractionError::Cancelled);
            }

            let end = (start + batch_size - 1).min(page_count);
            debug!(first = start, last = end, "Extracting batch");

            let batch = join_all((start..=end).map(|page| self.extract_page(source, page))).await;
            pages.extend(batch);

            start = end + 1;
            if start <= page_count && !pause.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!(completed = pages.len(), page_count, "Extraction cancelled");
                        return Err(ExtractionError::Cancelled);
                    }
                    _ = tokio::time::sleep(pause) => {}
                }
            }
        }

        let result = ExtractionResult { pages };
        let failed = result.failed_pages();
        if !failed.is_empty() {
            warn!(failed = failed.len(), page_count, "Some pages could not be extracted");
        }
        Ok(result)
    }

    /// Extract pages one at a time, in order, with no batching or pauses.
    pub async fn extract_sequential(&self, source: &dyn PaginatedSource) -> ExtractionResult {
        let page_count = source.page_count();
        if page_count == 0 {
            return ExtractionResult::unreadable("the document has no pages");
        }

        let mut pages = Vec::with_capacity(page_count);
        for page in 1..=page_count {
            pages.push(self.extract_page(source, page).await);
        }
        ExtractionResult { pages }
    }

    async fn extract_page(&self, source: &dyn PaginatedSource, page: usize) -> PageText {
        match source.page_fragments(page).await {
            Ok(fragments) => PageText {
                number: page,
                text: layout::reconstruct_lines(
                    &fragments,
                    self.config.line_epsilon,
                    self.config.word_gap,
                ),
                extracted: true,
            },
            Err(e) => {
                warn!(page, error = %e, "Page extraction failed");
                PageText {
                    number: page,
                    text: page_placeholder(page),
                    extracted: false,
                }
            }
        }
    }
}
