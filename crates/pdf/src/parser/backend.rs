use std::collections::BTreeMap;

use lopdf::{self, content::Content};

use crate::PdfError;

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// A simplified, lopdf-independent representation of the content-stream
/// operands the span extractor cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    /// Numeric value of `Integer` and `Real` operands.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            PdfValue::Integer(i) => Some(*i as f32),
            PdfValue::Real(f) => Some(*f),
            _ => None,
        }
    }
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    pub fn number(&self, idx: usize) -> Option<f32> {
        self.operands.get(idx).and_then(PdfValue::as_number)
    }
}

/// Convert a `lopdf::Object` operand into a [`PdfValue`].
pub fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Null => PdfValue::Null,
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Best-effort decoding of raw PDF string bytes into a Rust `String`.
///
/// Handles three cases in order:
/// 1. UTF-16BE with BOM (`\xFE\xFF` prefix) -- strips BOM and decodes.
/// 2. Valid UTF-8 -- returned as-is.
/// 3. Fallback to Latin-1 (ISO 8859-1) -- each byte mapped to its Unicode
///    code point.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let code_units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&code_units);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// PdfBackend trait
// ---------------------------------------------------------------------------

/// Abstraction over a PDF parsing backend (currently backed by `lopdf`).
///
/// The span extractor only talks to this trait, so it can be driven by a
/// scripted backend in tests.
pub trait PdfBackend {
    /// Return a mapping from 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Decode the page's content stream into a sequence of [`ContentOp`]s.
    fn page_ops(&self, page: PageId) -> Result<Vec<ContentOp>, PdfError>;

    /// Text decoder for the fonts of one page. Font encodings are resolved
    /// once here and reused for every text-showing operator on the page.
    fn page_decoder(&self, page: PageId) -> Box<dyn TextDecoder + '_>;
}

/// Decodes the string operands of text-showing operators.
pub trait TextDecoder {
    /// Decode raw string bytes shown with the named font resource, falling
    /// back to [`decode_text_simple`] when the font cannot decode them.
    fn decode(&self, font_name: &[u8], bytes: &[u8]) -> String;
}

/// Decoder for fonts without a resolvable encoding.
pub struct SimpleDecoder;

impl TextDecoder for SimpleDecoder {
    fn decode(&self, _font_name: &[u8], bytes: &[u8]) -> String {
        decode_text_simple(bytes)
    }
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] implementation backed by [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    /// Total number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Plain text of a 1-based page, decoded through the page fonts'
    /// `ToUnicode` maps where present.
    pub fn page_text(&self, page_num: u32) -> Result<String, PdfError> {
        self.doc
            .extract_text(&[page_num])
            .map_err(|e| PdfError::Parse(format!("cannot extract text of page {page_num}: {e}")))
    }
}

// ---------------------------------------------------------------------------
// PdfBackend implementation for LopdfBackend
// ---------------------------------------------------------------------------

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_ops(&self, page: PageId) -> Result<Vec<ContentOp>, PdfError> {
        let data = self
            .doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))?;
        let content = Content::decode(&data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn page_decoder(&self, page: PageId) -> Box<dyn TextDecoder + '_> {
        let fonts = match self.doc.get_page_fonts(page) {
            Ok(fonts) => fonts,
            Err(e) => {
                log::debug!("page {page:?}: cannot get fonts: {e}");
                return Box::new(SimpleDecoder);
            }
        };

        let mut encodings = BTreeMap::new();
        for (name, font) in fonts {
            match font.get_font_encoding(&self.doc) {
                Ok(encoding) => {
                    encodings.insert(name, encoding);
                }
                Err(e) => log::debug!(
                    "font {}: no usable encoding: {e}",
                    String::from_utf8_lossy(&name)
                ),
            }
        }

        Box::new(LopdfDecoder { encodings })
    }
}

/// Encodings of one page's fonts, keyed by resource name.
struct LopdfDecoder<'a> {
    encodings: BTreeMap<Vec<u8>, lopdf::Encoding<'a>>,
}

impl TextDecoder for LopdfDecoder<'_> {
    fn decode(&self, font_name: &[u8], bytes: &[u8]) -> String {
        let decoded = self
            .encodings
            .get(font_name)
            .and_then(|encoding| lopdf::Document::decode_text(encoding, bytes).ok());

        match decoded {
            Some(text) if !text.is_empty() && !text.chars().all(|c| c == '\u{FFFD}') => text,
            _ => decode_text_simple(bytes),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- decode_text_simple -------------------------------------------------

    #[test]
    fn decode_text_simple_utf8() {
        assert_eq!(decode_text_simple("売上高".as_bytes()), "売上高");
    }

    #[test]
    fn decode_text_simple_latin1() {
        // 0xE9 is U+00E9 in Latin-1 but not valid standalone UTF-8.
        let input: &[u8] = &[0x63, 0x61, 0x66, 0xE9];
        assert_eq!(decode_text_simple(input), "caf\u{00E9}");
    }

    #[test]
    fn decode_text_simple_utf16be() {
        // BOM followed by U+58F2 U+4E0A ("売上").
        let input: &[u8] = &[0xFE, 0xFF, 0x58, 0xF2, 0x4E, 0x0A];
        assert_eq!(decode_text_simple(input), "売上");
    }

    #[test]
    fn decode_text_simple_utf16be_odd_trailing_byte() {
        let input: &[u8] = &[0xFE, 0xFF, 0x00, 0x41, 0x00];
        assert_eq!(decode_text_simple(input), "A");
    }

    #[test]
    fn decode_text_simple_empty() {
        assert_eq!(decode_text_simple(&[]), "");
    }

    // -- convert_object -----------------------------------------------------

    #[test]
    fn convert_numbers() {
        assert_eq!(
            convert_object(&lopdf::Object::Integer(99)).as_number(),
            Some(99.0)
        );
        assert_eq!(convert_object(&lopdf::Object::Real(1.5)).as_number(), Some(1.5));
        assert_eq!(convert_object(&lopdf::Object::Null).as_number(), None);
    }

    #[test]
    fn convert_tj_array() {
        let arr = lopdf::Object::Array(vec![
            lopdf::Object::string_literal("A"),
            lopdf::Object::Integer(-250),
        ]);
        assert_eq!(
            convert_object(&arr),
            PdfValue::Array(vec![PdfValue::Str(b"A".to_vec()), PdfValue::Integer(-250)]),
        );
    }

    #[test]
    fn convert_unhandled_objects() {
        assert_eq!(
            convert_object(&lopdf::Object::Boolean(true)),
            PdfValue::Other
        );
        assert_eq!(
            convert_object(&lopdf::Object::Reference((7, 0))),
            PdfValue::Other
        );
    }

    // -- LopdfBackend ---------------------------------------------------------

    /// One page whose resources name a single Type1 font `F1`.
    fn one_page_pdf() -> Vec<u8> {
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1i64,
                "MediaBox" => vec![0i64.into(), 0i64.into(), 595i64.into(), 842i64.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn page_decoder_resolves_page_fonts() {
        let backend = LopdfBackend::load_bytes(&one_page_pdf()).unwrap();
        let page = backend.pages()[&1];

        let decoder = backend.page_decoder(page);

        assert_eq!(decoder.decode(b"F1", b"Sales"), "Sales");
        assert_eq!(decoder.decode(b"F1", b"2024Q1"), "2024Q1");
    }

    #[test]
    fn page_decoder_falls_back_for_unknown_font() {
        let backend = LopdfBackend::load_bytes(&one_page_pdf()).unwrap();
        let page = backend.pages()[&1];

        let decoder = backend.page_decoder(page);

        assert_eq!(decoder.decode(b"F9", "売上".as_bytes()), "売上");
    }

    #[test]
    fn load_bytes_rejects_garbage() {
        assert!(matches!(
            LopdfBackend::load_bytes(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }
}
