//! Document ingestion for Pagewise.
//!
//! Turns raw source files into a single [`Document`](pagewise_core::Document):
//!
//! 1. **Detect** the file type from its name
//! 2. **Extract** page text in bounded concurrent batches (paginated formats)
//! 3. **Reconstruct** line breaks and word spacing from fragment positions
//! 4. **Join** pages in order, separated by blank lines
//!
//! Extraction faults never reach the caller as errors: an unreadable page
//! becomes a placeholder line and an unreadable source becomes a single
//! descriptive placeholder. Only cancellation is reported as `Err`.

pub mod extractor;
pub mod layout;
pub mod loader;
pub mod pdf;

pub use extractor::{ExtractionResult, PageExtractor, PageText};
pub use loader::{load_document, load_document_cancellable};
pub use pdf::PdfSource;
