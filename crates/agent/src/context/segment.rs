//! Paragraph segmentation.

use serde::{Deserialize, Serialize};

/// A paragraph-bounded span of document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Position in the original document, stable for the section's lifetime.
    pub index: usize,
    pub text: String,
    pub score: u32,
}

impl Section {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split text into sections on blank lines. Empty sections are dropped.
pub fn segment(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut current, &mut sections);
        } else {
            current.push(line);
        }
    }
    flush(&mut current, &mut sections);

    sections
}

fn flush(lines: &mut Vec<&str>, sections: &mut Vec<Section>) {
    if lines.is_empty() {
        return;
    }
    let text = lines.join("\n").trim().to_string();
    lines.clear();
    if !text.is_empty() {
        sections.push(Section {
            index: sections.len(),
            text,
            score: 0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_blank_lines() {
        let sections = segment("Intro line\nstill intro\n\nSecond\n\n\n\nThird");
        let texts: Vec<&str> = sections.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Intro line\nstill intro", "Second", "Third"]);
        let indices: Vec<usize> = sections.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn whitespace_only_lines_count_as_blank() {
        let sections = segment("One\n   \t\nTwo\r\n\r\nThree");
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[2].text, "Three");
    }

    #[test]
    fn empty_and_blank_text_has_no_sections() {
        assert!(segment("").is_empty());
        assert!(segment("\n\n   \n").is_empty());
    }

    #[test]
    fn text_without_blank_lines_is_one_section() {
        let sections = segment("a\nb\nc");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].char_len(), 5);
    }

    #[test]
    fn deterministic() {
        let text = "A\n\nB\n\nC";
        assert_eq!(segment(text), segment(text));
    }
}
