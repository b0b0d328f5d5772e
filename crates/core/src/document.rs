//! Document value types.
//!
//! A [`Document`] is produced once by extraction and read thereafter; no
//! component mutates its text.

use serde::{Deserialize, Serialize};

/// Kind of source file, detected from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Pdf,
    Docx,
    Txt,
    Unknown,
}

impl FileType {
    /// Detect the file type from a file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Self {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Self::Pdf,
            "docx" | "doc" => Self::Docx,
            "txt" => Self::Txt,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Txt => "TXT",
            Self::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Immutable document text plus its length in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    char_len: usize,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        Self { text, char_len }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Words assumed per printed page when estimating page count.
const WORDS_PER_PAGE: usize = 500;

/// Rough size statistics for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub word_count: usize,
    pub page_count: usize,
}

impl DocumentStats {
    pub fn estimate(text: &str) -> Self {
        let word_count = text.split_whitespace().count();
        let page_count = word_count.div_ceil(WORDS_PER_PAGE).max(1);
        Self {
            word_count,
            page_count,
        }
    }
}

/// Human-readable file size, base 1024, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".into();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
