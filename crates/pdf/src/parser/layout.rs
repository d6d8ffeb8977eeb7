//! Text span extraction from page content streams.
//!
//! Walks the text-showing operators of a page and records every run of text
//! with its position and an estimated width. Table detection works on these
//! spans directly, so runs are never merged here.
//!
//! ```text
//! content ops  ->  TextSpan[]
//!   (per page)      extract_page_spans
//! ```

use super::backend::{ContentOp, PageId, PdfBackend, PdfValue, TextDecoder};
use crate::PdfError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A single run of text at a specific position on the page.
///
/// `x`/`y` are the baseline origin in PDF user space (Y grows upwards).
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
}

impl TextSpan {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Approximate width of a Latin glyph as a fraction of font size when no
/// glyph metrics are available.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Ideographs and kana are set on a full em.
const WIDE_CHAR_WIDTH_RATIO: f32 = 1.0;

/// A `TJ` kerning step wider than this fraction of a glyph is a word gap.
const TJ_GAP_RATIO: f32 = 0.3;

/// The identity 2x3 text matrix: [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// CJK / spaceless-script helper
// ---------------------------------------------------------------------------

/// Returns `true` if `c` belongs to a script that does not use inter-word
/// spaces (CJK ideographs, kana, Hangul, full-width forms).
pub fn is_spaceless_script_char(c: char) -> bool {
    matches!(
        c as u32,
        // CJK Unified Ideographs and Extension A
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        // CJK Compatibility Ideographs
        | 0xF900..=0xFAFF
        // Hiragana, Katakana, Katakana Phonetic Extensions
        | 0x3040..=0x30FF
        | 0x31F0..=0x31FF
        // Hangul
        | 0xAC00..=0xD7AF
        | 0x1100..=0x11FF
        // CJK Symbols and Punctuation
        | 0x3000..=0x303F
        // Fullwidth Forms
        | 0xFF00..=0xFFEF
    )
}

fn char_width_ratio(c: char) -> f32 {
    if is_spaceless_script_char(c) {
        WIDE_CHAR_WIDTH_RATIO
    } else {
        APPROX_CHAR_WIDTH_RATIO
    }
}

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

/// Text state tracked while walking a page's content stream.
#[derive(Debug, Clone)]
struct TextState {
    /// Current font resource name (the `/F1`-style key).
    font_key: Vec<u8>,
    font_size: f32,
    /// Elements [a, b, c, d, tx, ty] of the current text matrix.
    text_matrix: [f32; 6],
    /// Text line matrix; set by BT and updated by Td/TD/T*/Tm.
    line_matrix: [f32; 6],
    /// Horizontal scaling factor (percent / 100).
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    fn y(&self) -> f32 {
        self.text_matrix[5] + self.text_rise
    }

    /// Rendered size: `font_size * sqrt(b^2 + d^2)` of the text matrix.
    fn effective_font_size(&self) -> f32 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    /// Horizontal scale of the text matrix, used to map text-space widths
    /// into user space.
    fn matrix_scale(&self) -> f32 {
        (self.text_matrix[0].powi(2) + self.text_matrix[1].powi(2)).sqrt()
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Multiply the text line matrix by a translation (Td / TD / T*).
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    /// Text-space advance of `text`, glyph widths estimated per script.
    fn text_advance(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| {
                let glyph = self.font_size * char_width_ratio(c) * self.horiz_scale;
                let word = if c == ' ' { self.word_spacing } else { 0.0 };
                glyph + self.char_spacing + word
            })
            .sum()
    }
}

/// Collects the spans of one page.
struct SpanCollector<'a> {
    decoder: Box<dyn TextDecoder + 'a>,
    state: TextState,
    spans: Vec<TextSpan>,
}

impl<'a> SpanCollector<'a> {
    fn new(decoder: Box<dyn TextDecoder + 'a>) -> Self {
        Self {
            decoder,
            state: TextState::default(),
            spans: Vec::new(),
        }
    }

    fn apply(&mut self, op: &ContentOp) {
        match op.operator.as_str() {
            "BT" => {
                self.state.text_matrix = IDENTITY_MATRIX;
                self.state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => self.set_font(&op.operands),
            "Tm" => {
                let vals: Vec<f32> = (0..6).filter_map(|i| op.number(i)).collect();
                if let [a, b, c, d, e, f] = vals[..] {
                    self.state.text_matrix = [a, b, c, d, e, f];
                    self.state.line_matrix = self.state.text_matrix;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    self.state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    self.state.leading = -ty;
                    self.state.translate_line(tx, ty);
                }
            }
            "T*" => self.next_line(),
            "TL" => set_if_some(&mut self.state.leading, op.number(0)),
            "Tc" => set_if_some(&mut self.state.char_spacing, op.number(0)),
            "Tw" => set_if_some(&mut self.state.word_spacing, op.number(0)),
            "Tz" => set_if_some(&mut self.state.horiz_scale, op.number(0).map(|v| v / 100.0)),
            "Ts" => set_if_some(&mut self.state.text_rise, op.number(0)),
            "Tj" => {
                if let Some(operand) = op.operands.first() {
                    self.show(operand);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    self.show_array(items);
                }
            }
            "'" => {
                self.next_line();
                if let Some(operand) = op.operands.first() {
                    self.show(operand);
                }
            }
            "\"" => {
                if op.operands.len() >= 3 {
                    set_if_some(&mut self.state.word_spacing, op.number(0));
                    set_if_some(&mut self.state.char_spacing, op.number(1));
                    self.next_line();
                    self.show(&op.operands[2]);
                }
            }
            _ => {}
        }
    }

    fn next_line(&mut self) {
        let leading = self.state.leading;
        self.state.translate_line(0.0, -leading);
    }

    fn set_font(&mut self, operands: &[PdfValue]) {
        let key = match operands.first() {
            Some(PdfValue::Name(n)) | Some(PdfValue::Str(n)) => n.clone(),
            _ => return,
        };
        self.state.font_key = key;
        self.state.font_size = operands.get(1).and_then(PdfValue::as_number).unwrap_or(0.0);
    }

    fn decode(&self, operand: &PdfValue) -> String {
        match operand {
            PdfValue::Str(bytes) => self.decoder.decode(&self.state.font_key, bytes),
            _ => String::new(),
        }
    }

    /// Record a span for `text` at the current position and advance past it.
    fn push_span(&mut self, text: String, x: f32, y: f32, advance: f32) {
        let text = text.trim_end().to_string();
        if text.trim().is_empty() {
            return;
        }
        self.spans.push(TextSpan {
            text,
            x,
            y,
            width: advance * self.state.matrix_scale(),
            font_size: self.state.effective_font_size(),
        });
    }

    fn show(&mut self, operand: &PdfValue) {
        let text = self.decode(operand);
        if text.is_empty() {
            return;
        }
        let (x, y) = (self.state.x(), self.state.y());
        let advance = self.state.text_advance(&text);
        self.push_span(text, x, y, advance);
        self.state.advance_x(advance);
    }

    /// `TJ`: strings interleaved with kerning adjustments in thousandths of
    /// a text-space unit. Large negative adjustments read as word gaps and
    /// split the run into separate spans.
    fn show_array(&mut self, items: &[PdfValue]) {
        let mut buf = String::new();
        let mut start = (self.state.x(), self.state.y());
        let mut advance = 0.0;

        for item in items {
            if let PdfValue::Str(_) = item {
                let fragment = self.decode(item);
                if buf.is_empty() {
                    start = (self.state.x(), self.state.y());
                    advance = 0.0;
                }
                let dx = self.state.text_advance(&fragment);
                buf.push_str(&fragment);
                advance += dx;
                self.state.advance_x(dx);
                continue;
            }

            let Some(adj) = item.as_number() else {
                continue;
            };
            let dx = -adj / 1000.0 * self.state.font_size * self.state.horiz_scale;
            let gap = self.state.font_size * APPROX_CHAR_WIDTH_RATIO * self.state.horiz_scale;

            if dx > gap * 2.0 && !buf.is_empty() {
                // A cell-sized gap: close the run.
                self.push_span(std::mem::take(&mut buf), start.0, start.1, advance);
            } else if dx > gap * TJ_GAP_RATIO && !buf.is_empty() {
                buf.push(' ');
            }
            if !buf.is_empty() {
                advance += dx;
            }
            self.state.advance_x(dx);
        }

        if !buf.is_empty() {
            self.push_span(buf, start.0, start.1, advance);
        }
    }
}

fn set_if_some(slot: &mut f32, value: Option<f32>) {
    if let Some(v) = value {
        *slot = v;
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Walk a single page's content stream and produce a flat list of
/// [`TextSpan`]s.
///
/// Implements a simplified text-rendering state machine over `BT`, `Tf`,
/// `Tm`, `Td`, `TD`, `T*`, `TL`, `Tc`, `Tw`, `Tz`, `Ts`, `Tj`, `TJ`, `'` and
/// `"`. Everything else is ignored.
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<TextSpan>, PdfError> {
    let ops = backend.page_ops(page_id)?;
    let mut collector = SpanCollector::new(backend.page_decoder(page_id));
    for op in &ops {
        collector.apply(op);
    }

    Ok(collector.spans)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeMap;

    use super::super::backend::SimpleDecoder;
    use super::*;

    /// Backend replaying a fixed operator list for page 1.
    #[derive(Default)]
    struct ScriptedBackend {
        ops: Vec<ContentOp>,
        decoders_built: Cell<usize>,
    }

    impl PdfBackend for ScriptedBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            BTreeMap::from([(1, (1, 0))])
        }

        fn page_ops(&self, _page: PageId) -> Result<Vec<ContentOp>, PdfError> {
            Ok(self.ops.clone())
        }

        fn page_decoder(&self, _page: PageId) -> Box<dyn TextDecoder + '_> {
            self.decoders_built.set(self.decoders_built.get() + 1);
            Box::new(SimpleDecoder)
        }
    }

    fn op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }

    fn s(text: &str) -> PdfValue {
        PdfValue::Str(text.as_bytes().to_vec())
    }

    fn n(v: f32) -> PdfValue {
        PdfValue::Real(v)
    }

    fn spans(ops: Vec<ContentOp>) -> Vec<TextSpan> {
        let backend = ScriptedBackend {
            ops,
            ..Default::default()
        };
        extract_page_spans(&backend, (1, 0)).unwrap()
    }

    fn font(size: f32) -> ContentOp {
        op("Tf", vec![PdfValue::Name(b"F1".to_vec()), n(size)])
    }

    #[test]
    fn tj_records_position_and_width() {
        let result = spans(vec![
            op("BT", vec![]),
            font(10.0),
            op("Td", vec![n(50.0), n(700.0)]),
            op("Tj", vec![s("Sales")]),
            op("ET", vec![]),
        ]);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "Sales");
        assert_eq!(result[0].x, 50.0);
        assert_eq!(result[0].y, 700.0);
        assert_eq!(result[0].width, 25.0);
        assert_eq!(result[0].font_size, 10.0);
    }

    #[test]
    fn fonts_resolved_once_per_page() {
        let backend = ScriptedBackend {
            ops: vec![
                op("BT", vec![]),
                font(10.0),
                op("Tj", vec![s("Sales")]),
                op("Td", vec![n(100.0), n(0.0)]),
                op("Tj", vec![s("100")]),
                op(
                    "TJ",
                    vec![PdfValue::Array(vec![s("Cost"), PdfValue::Integer(-5000), s("40")])],
                ),
            ],
            ..Default::default()
        };

        let result = extract_page_spans(&backend, (1, 0)).unwrap();

        assert_eq!(result.len(), 4);
        assert_eq!(backend.decoders_built.get(), 1);
    }

    #[test]
    fn wide_chars_use_full_em() {
        let result = spans(vec![
            op("BT", vec![]),
            font(10.0),
            op("Tj", vec![s("売上高")]),
        ]);
        assert_eq!(result[0].width, 30.0);
    }

    #[test]
    fn tm_sets_absolute_position() {
        let result = spans(vec![
            op("BT", vec![]),
            font(1.0),
            op(
                "Tm",
                vec![n(12.0), n(0.0), n(0.0), n(12.0), n(100.0), n(500.0)],
            ),
            op("Tj", vec![s("A")]),
        ]);
        assert_eq!(result[0].x, 100.0);
        assert_eq!(result[0].y, 500.0);
        assert_eq!(result[0].font_size, 12.0);
        assert_eq!(result[0].width, 6.0);
    }

    #[test]
    fn t_star_moves_down_by_leading() {
        let result = spans(vec![
            op("BT", vec![]),
            font(10.0),
            op("TL", vec![n(14.0)]),
            op("Td", vec![n(0.0), n(700.0)]),
            op("Tj", vec![s("one")]),
            op("T*", vec![]),
            op("Tj", vec![s("two")]),
        ]);
        assert_eq!(result[1].y, 686.0);
        assert_eq!(result[1].x, 0.0);
    }

    #[test]
    fn tj_array_splits_on_cell_sized_gaps() {
        let result = spans(vec![
            op("BT", vec![]),
            font(10.0),
            op(
                "TJ",
                vec![PdfValue::Array(vec![
                    s("Net"),
                    PdfValue::Integer(-300),
                    s("sales"),
                    PdfValue::Integer(-5000),
                    s("100"),
                ])],
            ),
        ]);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "Net sales");
        assert_eq!(result[1].text, "100");
        assert!(result[1].x > result[0].right());
    }

    #[test]
    fn blank_strings_produce_no_span() {
        let result = spans(vec![op("BT", vec![]), font(10.0), op("Tj", vec![s("   ")])]);
        assert!(result.is_empty());
    }

    #[test]
    fn spaceless_script_chars() {
        assert!(is_spaceless_script_char('売'));
        assert!(is_spaceless_script_char('カ'));
        assert!(is_spaceless_script_char('１'));
        assert!(!is_spaceless_script_char('A'));
        assert!(!is_spaceless_script_char('1'));
    }
}
