use std::collections::BTreeMap;

use log::debug;
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

/// Font information extracted from a page's resource dictionary.
#[derive(Debug, Clone, Default)]
pub struct BackendFontInfo {
    /// The font name key as it appears in the resource dictionary (e.g. `b"F1"`).
    pub name: Vec<u8>,
    /// Base font name from the font dictionary, if present.
    pub base_font: Option<String>,
    /// Font subtype (e.g. `Type1`, `TrueType`, `Type0`).
    pub subtype: Option<String>,
    /// Encoding entry from the font dictionary, if present.
    pub encoding: Option<String>,
    /// First character code covered by `widths`.
    pub first_char: u32,
    /// Glyph advance widths in thousandths of text space, indexed from
    /// `first_char`.  Empty when the font does not declare `Widths`.
    pub widths: Vec<f32>,
    /// Inclusive CID ranges and their widths, from the descendant font's `W`
    /// array.  Only filled for `Type0` fonts.
    pub cid_widths: Vec<(u32, u32, f32)>,
    /// Width for codes not covered above: `MissingWidth` for simple fonts,
    /// the descendant's `DW` for composite ones.
    pub missing_width: Option<f32>,
}

impl BackendFontInfo {
    /// Simple (single-byte) fonts map one byte to one glyph.  Composite
    /// `Type0` fonts use multi-byte codes.
    pub fn is_simple(&self) -> bool {
        self.subtype.as_deref() != Some("Type0")
    }

    /// Advance width for a character code, in thousandths of text space.
    pub fn glyph_width(&self, code: u32) -> Option<f32> {
        let declared = if self.is_simple() {
            code.checked_sub(self.first_char)
                .and_then(|idx| self.widths.get(idx as usize).copied())
        } else {
            self.cid_widths
                .iter()
                .find(|(lo, hi, _)| (*lo..=*hi).contains(&code))
                .map(|(_, _, w)| *w)
        };
        declared
            .filter(|w| *w > 0.0)
            .or(self.missing_width.filter(|w| *w > 0.0))
    }
}

/// A simplified, lopdf-independent representation of a PDF value.
///
/// This enum decouples the content-stream interpreter from the concrete
/// `lopdf::Object` type so it can be tested against hand-built operations.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Dict(Vec<(Vec<u8>, PdfValue)>),
    Reference(PageId),
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    pub fn new(operator: &str, operands: Vec<PdfValue>) -> Self {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Extract an `f32` from a [`PdfValue`], accepting both `Integer` and `Real`.
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(f) => Some(*f),
        _ => None,
    }
}

/// Convert a `lopdf::Object` into a [`PdfValue`].
///
/// Stream dictionaries are converted but the raw stream bytes are discarded.
pub fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Null => PdfValue::Null,
        lopdf::Object::Boolean(b) => PdfValue::Bool(*b),
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        lopdf::Object::Dictionary(dict) => PdfValue::Dict(
            dict.iter()
                .map(|(k, v)| (k.clone(), convert_object(v)))
                .collect(),
        ),
        lopdf::Object::Stream(stream) => PdfValue::Dict(
            stream
                .dict
                .iter()
                .map(|(k, v)| (k.clone(), convert_object(v)))
                .collect(),
        ),
        lopdf::Object::Reference(id) => PdfValue::Reference(*id),
    }
}

/// Best-effort decoding of raw PDF string bytes into a Rust `String`.
///
/// Handles three cases in order:
/// 1. UTF-16BE with BOM (`\xFE\xFF` prefix) -- strips BOM and decodes.
/// 2. Valid UTF-8 -- returned as-is.
/// 3. Fallback to Latin-1 (ISO 8859-1).
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        return decode_utf16be(&bytes[2..]);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

/// Decode big-endian UTF-16 code units, ignoring a trailing odd byte.
fn decode_utf16be(payload: &[u8]) -> String {
    let code_units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&code_units)
}

// ---------------------------------------------------------------------------
// PdfBackend trait
// ---------------------------------------------------------------------------

/// Abstraction over a PDF parsing backend (currently backed by `lopdf`).
///
/// The content-stream interpreter only talks to this trait so it can be
/// exercised with a mock backend that serves hand-written operations.
pub trait PdfBackend {
    /// Return a mapping from 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return the page's MediaBox as `[llx, lly, urx, ury]`.
    fn page_box(&self, page: PageId) -> Result<[f32; 4], PdfError>;

    /// Return font information for every font referenced by the given page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError>;

    /// Return the decompressed content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    /// Decode raw content-stream bytes into a sequence of [`ContentOp`]s.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// Decode raw string bytes found in a text-showing operator, using any
    /// font-specific encoding information the backend can find.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// Default CID width when a descendant font omits `DW`.
const DEFAULT_CID_WIDTH: f32 = 1000.0;

/// Concrete [`PdfBackend`] implementation backed by [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse an unencrypted PDF held in memory.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    fn deref<'a>(&'a self, obj: &'a lopdf::Object) -> Option<&'a lopdf::Object> {
        match obj {
            lopdf::Object::Reference(id) => self.doc.get_object(*id).ok(),
            direct => Some(direct),
        }
    }

    fn entry<'a>(&'a self, dict: &'a lopdf::Dictionary, key: &[u8]) -> Option<&'a lopdf::Object> {
        dict.get(key).ok().and_then(|obj| self.deref(obj))
    }

    fn number(&self, obj: &lopdf::Object) -> Option<f32> {
        match self.deref(obj)? {
            lopdf::Object::Integer(i) => Some(*i as f32),
            lopdf::Object::Real(f) => Some(*f),
            _ => None,
        }
    }

    /// MediaBox of a page, inherited from the nearest ancestor that sets it.
    fn inherited_media_box<'a>(&'a self, dict: &'a lopdf::Dictionary) -> Option<Vec<lopdf::Object>> {
        let mut current = dict;
        loop {
            if let Some(arr) = self.entry(current, b"MediaBox").and_then(|o| o.as_array().ok()) {
                return Some(arr.clone());
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.doc.get_object(parent).ok()?.as_dict().ok()?;
        }
    }

    /// `FirstChar`, `Widths` and the descriptor's `MissingWidth` of a simple font.
    fn simple_metrics(&self, dict: &lopdf::Dictionary) -> (u32, Vec<f32>, Option<f32>) {
        let first_char = self
            .entry(dict, b"FirstChar")
            .and_then(|o| self.number(o))
            .map_or(0, |n| n.max(0.0) as u32);

        let widths = self
            .entry(dict, b"Widths")
            .and_then(|o| o.as_array().ok())
            .map(|arr| arr.iter().map(|w| self.number(w).unwrap_or(0.0)).collect())
            .unwrap_or_default();

        let missing_width = self
            .entry(dict, b"FontDescriptor")
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| self.entry(d, b"MissingWidth"))
            .and_then(|o| self.number(o));

        (first_char, widths, missing_width)
    }

    /// CID width ranges and `DW` of a composite font's first descendant.
    ///
    /// `W` mixes two forms: `c [w1 w2 ...]` and `c_first c_last w`.
    fn cid_metrics(&self, dict: &lopdf::Dictionary) -> (Vec<(u32, u32, f32)>, f32) {
        let Some(descendant) = self
            .entry(dict, b"DescendantFonts")
            .and_then(|o| o.as_array().ok())
            .and_then(|arr| arr.first())
            .and_then(|o| self.deref(o))
            .and_then(|o| o.as_dict().ok())
        else {
            return (Vec::new(), DEFAULT_CID_WIDTH);
        };

        let default_width = self
            .entry(descendant, b"DW")
            .and_then(|o| self.number(o))
            .unwrap_or(DEFAULT_CID_WIDTH);

        let mut ranges = Vec::new();
        let Some(w) = self.entry(descendant, b"W").and_then(|o| o.as_array().ok()) else {
            return (ranges, default_width);
        };

        let mut i = 0;
        while let Some(first) = w.get(i).and_then(|o| self.number(o)) {
            let first = first.max(0.0) as u32;
            match w.get(i + 1).and_then(|o| self.deref(o)) {
                Some(lopdf::Object::Array(list)) => {
                    for (offset, width) in list.iter().enumerate() {
                        if let Some(width) = self.number(width) {
                            let cid = first + offset as u32;
                            ranges.push((cid, cid, width));
                        }
                    }
                    i += 2;
                }
                Some(last) => {
                    let (Some(last), Some(width)) =
                        (self.number(last), w.get(i + 2).and_then(|o| self.number(o)))
                    else {
                        break;
                    };
                    ranges.push((first, last.max(0.0) as u32, width));
                    i += 3;
                }
                None => break,
            }
        }
        (ranges, default_width)
    }
}

/// Decode a composite-font string one 2-byte code at a time so each glyph
/// keeps its own code.  Unmapped codes are dropped.
fn decode_cid_codes(encoding: &lopdf::Encoding, bytes: &[u8]) -> Option<String> {
    let mut out = String::new();
    for code in bytes.chunks_exact(2) {
        let text = lopdf::Document::decode_text(encoding, code).ok()?;
        out.extend(text.chars().filter(|c| *c != '\u{FFFD}'));
    }
    Some(out)
}

// ---------------------------------------------------------------------------
// PdfBackend implementation for LopdfBackend
// ---------------------------------------------------------------------------

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_box(&self, page: PageId) -> Result<[f32; 4], PdfError> {
        let page_dict = self
            .doc
            .get_object(page)
            .and_then(lopdf::Object::as_dict)
            .map_err(|e| PdfError::Parse(format!("page {page:?}: {e}")))?;

        let corners: Vec<f32> = self
            .inherited_media_box(page_dict)
            .ok_or_else(|| PdfError::Parse(format!("page {page:?} has no MediaBox")))?
            .iter()
            .filter_map(|o| self.number(o))
            .collect();

        let [x0, y0, x1, y1] = corners[..] else {
            return Err(PdfError::Parse(format!(
                "page {page:?}: MediaBox needs 4 numbers, found {}",
                corners.len()
            )));
        };
        Ok([x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)])
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("fonts of page {page:?}: {e}")))?;

        let name_of = |dict: &lopdf::Dictionary, key: &[u8]| {
            dict.get(key)
                .and_then(lopdf::Object::as_name)
                .ok()
                .map(|n| String::from_utf8_lossy(n).into_owned())
        };

        Ok(fonts
            .into_iter()
            .map(|(name, dict)| {
                let mut info = BackendFontInfo {
                    name,
                    base_font: name_of(dict, b"BaseFont"),
                    subtype: name_of(dict, b"Subtype"),
                    encoding: name_of(dict, b"Encoding"),
                    ..Default::default()
                };
                if info.is_simple() {
                    (info.first_char, info.widths, info.missing_width) = self.simple_metrics(dict);
                } else {
                    let (ranges, default_width) = self.cid_metrics(dict);
                    info.cid_widths = ranges;
                    info.missing_width = Some(default_width);
                }
                info
            })
            .collect())
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("content of page {page:?}: {e}")))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content =
            Content::decode(data).map_err(|e| PdfError::Parse(format!("content stream: {e}")))?;

        Ok(content
            .operations
            .iter()
            .map(|op| ContentOp {
                operator: op.operator.clone(),
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    /// Decode through the font's own encoding when it names one: the
    /// standard single-byte tables, or the `ToUnicode` map behind
    /// `Identity-H`/`Identity-V`.  Anything else falls back to
    /// [`decode_text_simple`].
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        let Ok(fonts) = self.doc.get_page_fonts(page) else {
            return decode_text_simple(bytes);
        };
        let Some(font) = fonts.get(font_name) else {
            return decode_text_simple(bytes);
        };

        let composite = font
            .get(b"Subtype")
            .and_then(lopdf::Object::as_name)
            .is_ok_and(|subtype| subtype == b"Type0");
        let named_encoding = font.get(b"Encoding").and_then(lopdf::Object::as_name).is_ok();

        if named_encoding {
            match font.get_font_encoding(&self.doc) {
                Ok(encoding) => {
                    let decoded = if composite {
                        decode_cid_codes(&encoding, bytes)
                    } else {
                        lopdf::Document::decode_text(&encoding, bytes).ok()
                    };
                    if let Some(text) = decoded {
                        return text;
                    }
                }
                Err(e) => debug!(
                    "font {}: encoding unavailable ({e})",
                    String::from_utf8_lossy(font_name)
                ),
            }
        }

        if composite && bytes.len() % 2 == 0 {
            return decode_utf16be(bytes);
        }
        decode_text_simple(bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
