//! PDF text-state machine producing glyph-level positions.
//!
//! Every visible character shown by `Tj`, `TJ`, `'` and `"` becomes one
//! [`RawGlyph`] in device space.  Glyph advances come from the font's
//! `Widths` array (the descendant's `W` for composite fonts) when the font
//! declares one, otherwise from a fixed ratio of the font size.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::backend::{get_number_from_value, BackendFontInfo, PdfValue};
use super::graphics::Matrix;

/// Approximate character width as a fraction of font size when the font
/// carries no usable metrics.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// A glyph positioned in device space (PDF coordinates, y up).
#[derive(Debug, Clone, PartialEq)]
pub struct RawGlyph {
    pub text: String,
    /// Left and right edge along the baseline.
    pub x0: f32,
    pub x1: f32,
    pub baseline: f32,
    /// Rendered font size.
    pub size: f32,
}

/// Text-state parameters (`Tf`, `Tc`, `Tw`, `Tz`, `TL`, `Ts`).  They belong
/// to the graphics state, so `q` saves them and `Q` restores them.
#[derive(Debug, Clone)]
pub struct TextParams {
    font_key: Vec<u8>,
    font: Option<BackendFontInfo>,
    font_size: f32,
    /// Horizontal scaling factor (percent / 100).
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font: None,
            font_size: 0.0,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

/// Mutable state tracked while walking a page's content stream.
#[derive(Debug, Clone)]
pub struct TextState {
    params: TextParams,
    text_matrix: Matrix,
    line_matrix: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            params: TextParams::default(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
        }
    }
}

impl TextState {
    /// Current font resource name (the `/F1`-style key).
    pub fn font_key(&self) -> &[u8] {
        &self.params.font_key
    }

    /// Copy of the parameters, for `q`.
    pub fn save(&self) -> TextParams {
        self.params.clone()
    }

    /// `Q`: put saved parameters back.  The text matrices are untouched.
    pub fn restore(&mut self, params: TextParams) {
        self.params = params;
    }

    /// `BT`: reset both text matrices.  Font state survives across text
    /// objects because some producers set it once per page.
    pub fn begin_text(&mut self) {
        self.text_matrix = Matrix::IDENTITY;
        self.line_matrix = Matrix::IDENTITY;
    }

    /// `Tf`: select a font resource and size.
    pub fn set_font(&mut self, operands: &[PdfValue], fonts: &[BackendFontInfo]) {
        let [key, size, ..] = operands else {
            return;
        };
        let key = match key {
            PdfValue::Name(n) | PdfValue::Str(n) => n.clone(),
            _ => return,
        };
        self.params.font = fonts.iter().find(|f| f.name == key).cloned();
        self.params.font_key = key;
        self.params.font_size = get_number_from_value(size).unwrap_or(0.0);
    }

    /// `Tm`: set the text and line matrices directly.
    pub fn set_matrix(&mut self, operands: &[PdfValue]) {
        if let Some(m) = Matrix::from_operands(operands) {
            self.text_matrix = m;
            self.line_matrix = m;
        }
    }

    /// `Td`: move to the start of the next line, offset from the current one.
    pub fn translate_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// `TD`: like `Td`, also setting the leading.
    pub fn translate_line_set_leading(&mut self, tx: f32, ty: f32) {
        self.params.leading = -ty;
        self.translate_line(tx, ty);
    }

    /// `T*`
    pub fn next_line(&mut self) {
        self.translate_line(0.0, -self.params.leading);
    }

    pub fn set_leading(&mut self, v: f32) {
        self.params.leading = v;
    }

    pub fn set_char_spacing(&mut self, v: f32) {
        self.params.char_spacing = v;
    }

    pub fn set_word_spacing(&mut self, v: f32) {
        self.params.word_spacing = v;
    }

    pub fn set_horiz_scale(&mut self, percent: f32) {
        self.params.horiz_scale = percent / 100.0;
    }

    pub fn set_rise(&mut self, v: f32) {
        self.params.text_rise = v;
    }

    /// Advance the text matrix horizontally by `dx` text-space units.
    fn advance(&mut self, dx: f32) {
        self.text_matrix = Matrix::translate(dx, 0.0).then(&self.text_matrix);
    }

    /// Apply a `TJ` kerning adjustment (thousandths of text space; positive
    /// values move left).
    pub fn kern(&mut self, adjustment: f32) {
        self.advance(-adjustment / 1000.0 * self.params.font_size * self.params.horiz_scale);
    }

    /// Glyph width in thousandths of text space.
    fn glyph_width(&self, code: Option<u32>) -> f32 {
        code.and_then(|c| self.params.font.as_ref().and_then(|f| f.glyph_width(c)))
            .unwrap_or(APPROX_CHAR_WIDTH_RATIO * 1000.0)
    }

    /// Render a decoded string, pushing one glyph per visible character.
    ///
    /// `bytes` are the raw string bytes.  They double as the width-lookup
    /// codes when they line up with the decoded characters: one byte per
    /// character for simple fonts, two for composite ones.
    pub fn show(&mut self, bytes: &[u8], decoded: &str, ctm: &Matrix, out: &mut Vec<RawGlyph>) {
        let simple = self.params.font.as_ref().map_or(true, |f| f.is_simple());
        let count = decoded.chars().count();
        let codes: Vec<Option<u32>> = if simple && count == bytes.len() {
            bytes.iter().map(|&b| Some(u32::from(b))).collect()
        } else if !simple && count * 2 == bytes.len() {
            bytes
                .chunks_exact(2)
                .map(|c| Some(u32::from(u16::from_be_bytes([c[0], c[1]]))))
                .collect()
        } else {
            vec![None; count]
        };

        let TextParams {
            font_size,
            horiz_scale,
            char_spacing,
            word_spacing,
            text_rise,
            ..
        } = self.params;

        for (ch, code) in decoded.chars().zip(codes) {
            let w0 = self.glyph_width(code) / 1000.0;

            if is_combining_mark(ch) {
                if let Some(prev) = out.last_mut() {
                    prev.text.push(ch);
                    prev.text = prev.text.nfc().collect();
                }
                continue;
            }

            if !ch.is_whitespace() && !ch.is_control() {
                let trm = self.text_matrix.then(ctm);
                let (sx, sy) = trm.apply(0.0, text_rise);
                let (ex, _) = trm.apply(w0 * font_size * horiz_scale, text_rise);
                out.push(RawGlyph {
                    text: expand_ligature(ch),
                    x0: sx.min(ex),
                    x1: sx.max(ex),
                    baseline: sy,
                    size: (font_size * trm.vertical_scale()).abs(),
                });
            }

            let mut tx = w0 * font_size + char_spacing;
            if ch == ' ' {
                tx += word_spacing;
            }
            self.advance(tx * horiz_scale);
        }
    }
}

/// Replace typographic ligature code points with their letters.
fn expand_ligature(ch: char) -> String {
    match ch {
        '\u{FB00}' => "ff".to_string(),
        '\u{FB01}' => "fi".to_string(),
        '\u{FB02}' => "fl".to_string(),
        '\u{FB03}' => "ffi".to_string(),
        '\u{FB04}' => "ffl".to_string(),
        other => other.to_string(),
    }
}
