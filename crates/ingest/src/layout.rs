//! Line reconstruction from positioned text fragments.
//!
//! Fragments arrive in content-stream order. A vertical move beyond
//! `line_epsilon` starts a new line; a vertical move much larger than the
//! previous line advance starts a new paragraph (blank line), which is what
//! lets the segmenter find paragraphs in PDF text. On the same line, a
//! horizontal gap wider than `word_gap` becomes a single space.

use pagewise_core::TextFragment;

/// A vertical advance this many times the last line advance is a paragraph break.
const PARAGRAPH_GAP_RATIO: f32 = 1.8;

/// Rebuild page text from fragments.
pub fn reconstruct_lines(fragments: &[TextFragment], line_epsilon: f32, word_gap: f32) -> String {
    let mut out = String::new();
    let mut prev: Option<&TextFragment> = None;
    let mut line_advance: Option<f32> = None;

    for fragment in fragments {
        if fragment.text.is_empty() {
            continue;
        }

        if let Some(p) = prev {
            let dy = (fragment.y - p.y).abs();
            if dy > line_epsilon {
                let paragraph = line_advance.is_some_and(|adv| dy > adv * PARAGRAPH_GAP_RATIO);
                trim_trailing_spaces(&mut out);
                out.push_str(if paragraph { "\n\n" } else { "\n" });
                line_advance = Some(dy);
            } else if fragment.x - p.end_x() > word_gap
                && !out.ends_with(char::is_whitespace)
                && !fragment.text.starts_with(char::is_whitespace)
            {
                out.push(' ');
            }
        }

        out.push_str(&fragment.text);
        prev = Some(fragment);
    }

    trim_trailing_spaces(&mut out);
    out
}

fn trim_trailing_spaces(s: &mut String) {
    let len = s.trim_end_matches([' ', '\t']).len();
    s.truncate(len);
}
