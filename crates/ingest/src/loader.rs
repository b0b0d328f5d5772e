//! File loading, dispatched on [`FileType`].

use pagewise_config::ExtractionConfig;
use pagewise_core::{Document, ExtractionError, FileType};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::extractor::{PageExtractor, unreadable_placeholder};
use crate::pdf::PdfSource;

/// Load a file into a [`Document`].
///
/// Never fails: an unreadable file yields a document holding a placeholder
/// that describes the fault.
pub async fn load_document(path: &Path, config: &ExtractionConfig) -> Document {
    match load_document_cancellable(path, config, &CancellationToken::new()).await {
        Ok(doc) => doc,
        Err(e) => Document::new(unreadable_placeholder(&e.to_string())),
    }
}

/// Like [`load_document`], but stops between extraction batches once
/// `cancel` fires. Cancellation is the only error returned.
pub async fn load_document_cancellable(
    path: &Path,
    config: &ExtractionConfig,
    cancel: &CancellationToken,
) -> Result<Document, ExtractionError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file_type = FileType::from_file_name(&name);

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(file = %name, error = %e, "Failed to read document");
            return Ok(Document::new(unreadable_placeholder(&e.to_string())));
        }
    };

    info!(file = %name, %file_type, bytes = bytes.len(), "Loading document");

    let text = match file_type {
        FileType::Txt => String::from_utf8_lossy(&bytes).into_owned(),
        FileType::Pdf => match PdfSource::from_bytes(&bytes) {
            Ok(source) => PageExtractor::new(config.clone())
                .extract_cancellable(&source, cancel)
                .await?
                .full_text(),
            Err(e) => {
                error!(file = %name, error = %e, "PDF could not be parsed");
                unreadable_placeholder(&e.to_string())
            }
        },
        FileType::Docx | FileType::Unknown => printable_text(&bytes)
            .unwrap_or_else(|| special_processing_notice(&name, file_type)),
    };

    debug!(file = %name, chars = text.chars().count(), "Document loaded");
    Ok(Document::new(text))
}

/// Keep printable ASCII and line breaks. `None` when nothing survives.
fn printable_text(bytes: &[u8]) -> Option<String> {
    let text: String = bytes
        .iter()
        .filter(|&&b| (0x20..=0x7E).contains(&b) || b == b'\r' || b == b'\n')
        .map(|&b| b as char)
        .collect();

    if text.trim().is_empty() {
        warn!("No printable text found");
        None
    } else {
        Some(text)
    }
}

fn special_processing_notice(name: &str, file_type: FileType) -> String {
    format!(
        "Document content from {name}. This file type ({file_type}) requires special processing. \
         Please make sure you're uploading a text-based document for best results."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::tests::build_pdf;

    fn write(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn text_file_is_loaded_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "notes.txt", b"Chapter 1\n\nPlants need light.");

        let doc = load_document(&path, &ExtractionConfig::default()).await;
        assert_eq!(doc.text(), "Chapter 1\n\nPlants need light.");
        assert_eq!(doc.char_len(), 28);
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_not_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "latin.TXT", b"caf\xe9 menu");

        let doc = load_document(&path, &ExtractionConfig::default()).await;
        assert!(doc.text().starts_with("caf"));
        assert!(doc.text().ends_with(" menu"));
    }

    #[tokio::test]
    async fn pdf_pages_are_joined_with_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = build_pdf(&[vec!["Cell Biology", "Cells divide."], vec!["Genetics"]]);
        let path = write(&dir, "biology.pdf", &bytes);

        let doc = load_document(&path, &ExtractionConfig::default()).await;
        assert_eq!(doc.text(), "Cell Biology\nCells divide.\n\nGenetics");
    }

    #[tokio::test]
    async fn corrupt_pdf_becomes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "broken.pdf", b"%PDF-1.4 not really");

        let doc = load_document(&path, &ExtractionConfig::default()).await;
        assert!(doc.text().starts_with("[Unable to extract text from this document"));
    }

    #[tokio::test]
    async fn missing_file_becomes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");

        let doc = load_document(&path, &ExtractionConfig::default()).await;
        assert!(doc.text().starts_with("[Unable to extract text from this document"));
    }

    #[tokio::test]
    async fn binary_docx_keeps_printable_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "essay.docx", b"PK\x03\x04\x00Essay text\x01\n");

        let doc = load_document(&path, &ExtractionConfig::default()).await;
        assert_eq!(doc.text(), "PKEssay text\n");
    }

    #[tokio::test]
    async fn unprintable_file_gets_notice() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "image.bin", &[0x00, 0x01, 0xFF, 0x90]);

        let doc = load_document(&path, &ExtractionConfig::default()).await;
        assert_eq!(
            doc.text(),
            "Document content from image.bin. This file type (Unknown) requires special \
             processing. Please make sure you're uploading a text-based document for best results."
        );
    }

    #[tokio::test]
    async fn cancelled_pdf_load_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = build_pdf(&[vec!["One"], vec!["Two"]]);
        let path = write(&dir, "cancel.pdf", &bytes);
        let token = CancellationToken::new();
        token.cancel();

        let result = load_document_cancellable(&path, &ExtractionConfig::default(), &token).await;
        assert!(matches!(result, Err(ExtractionError::Cancelled)));
    }
}
