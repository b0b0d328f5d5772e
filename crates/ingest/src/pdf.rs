//! PDF as a [`PaginatedSource`], backed by `lopdf`.
//!
//! Each page's content stream is decoded and walked with a minimal text
//! state machine (`BT`, `Tf`, `Td`/`TD`/`Tm`/`T*`/`TL`, `Tj`/`TJ`/`'`/`"`)
//! to produce positioned fragments. Glyph widths are estimated from the font
//! size rather than read from font metrics, which is enough for line and
//! word-gap reconstruction.

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use pagewise_core::{ExtractionError, PaginatedSource, TextFragment};
use std::sync::Arc;

/// Average glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// A `TJ` adjustment below this (thousandths of an em) reads as a word space.
const TJ_SPACE_THRESHOLD: f32 = -200.0;

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

pub struct PdfSource {
    doc: Arc<Document>,
    pages: Vec<ObjectId>,
}

impl PdfSource {
    /// Parse a PDF held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractionError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| ExtractionError::SourceUnreadable(format!("invalid PDF: {e}")))?;
        // get_pages is keyed by page number, so values come out in page order
        let pages = doc.get_pages().into_values().collect();
        Ok(Self {
            doc: Arc::new(doc),
            pages,
        })
    }
}

#[async_trait]
impl PaginatedSource for PdfSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    async fn page_fragments(&self, page: usize) -> Result<Vec<TextFragment>, ExtractionError> {
        let page_id = page
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .copied()
            .ok_or_else(|| ExtractionError::Page {
                page,
                reason: "page out of range".into(),
            })?;

        let doc = Arc::clone(&self.doc);
        tokio::task::spawn_blocking(move || {
            page_text_fragments(&doc, page_id)
                .map_err(|reason| ExtractionError::Page { page, reason })
        })
        .await
        .map_err(|e| ExtractionError::Page {
            page,
            reason: e.to_string(),
        })?
    }
}

fn page_text_fragments(doc: &Document, page_id: ObjectId) -> Result<Vec<TextFragment>, String> {
    let data = doc.get_page_content(page_id).map_err(|e| e.to_string())?;
    let content = Content::decode(&data).map_err(|e| e.to_string())?;
    Ok(TextState::default().run(&content.operations))
}

/// Text-positioning state while walking a content stream.
struct TextState {
    font_size: f32,
    leading: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    fragments: Vec<TextFragment>,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            leading: 0.0,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            fragments: Vec::new(),
        }
    }
}

impl TextState {
    fn run(mut self, operations: &[Operation]) -> Vec<TextFragment> {
        for op in operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "BT" => {
                    self.text_matrix = IDENTITY;
                    self.line_matrix = IDENTITY;
                }
                "Tf" => {
                    if let Some(size) = operands.get(1).and_then(number) {
                        self.font_size = size;
                    }
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(number) {
                        self.leading = leading;
                    }
                }
                "Td" => {
                    if let Some([tx, ty]) = numbers::<2>(operands) {
                        self.move_line(tx, ty);
                    }
                }
                "TD" => {
                    if let Some([tx, ty]) = numbers::<2>(operands) {
                        self.leading = -ty;
                        self.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = numbers::<6>(operands) {
                        self.text_matrix = m;
                        self.line_matrix = m;
                    }
                }
                "T*" => self.next_line(),
                "Tj" => {
                    if let Some(text) = operands.first().and_then(decode_string) {
                        self.show(text);
                    }
                }
                "'" => {
                    self.next_line();
                    if let Some(text) = operands.first().and_then(decode_string) {
                        self.show(text);
                    }
                }
                "\"" => {
                    self.next_line();
                    if let Some(text) = operands.get(2).and_then(decode_string) {
                        self.show(text);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.show(decode_tj_array(items));
                    }
                }
                _ => {}
            }
        }
        self.fragments
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        let m = &mut self.line_matrix;
        m[4] += tx * m[0] + ty * m[2];
        m[5] += tx * m[1] + ty * m[3];
        self.text_matrix = *m;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, text: String) {
        if text.is_empty() {
            return;
        }

        let scale = match self.text_matrix[3].abs() {
            s if s > f32::EPSILON => s,
            _ => 1.0,
        };
        let width = text.chars().count() as f32 * self.font_size * scale * AVG_GLYPH_WIDTH;
        let x = self.text_matrix[4];
        let y = self.text_matrix[5];

        self.fragments.push(TextFragment::new(text, x, y, width));
        self.text_matrix[4] += width;
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(out)
}

fn decode_string(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_bytes(bytes)),
        _ => None,
    }
}

fn decode_tj_array(items: &[Object]) -> String {
    let mut text = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => text.push_str(&decode_bytes(bytes)),
            other => {
                if number(other).is_some_and(|n| n < TJ_SPACE_THRESHOLD) && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
        }
    }
    text
}

/// Decode a PDF string: UTF-16BE when it carries a BOM, Latin-1 otherwise.
fn decode_bytes(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    bytes
        .iter()
        .map(|&b| b as char)
        .filter(|c| !c.is_control())
        .collect()
}
