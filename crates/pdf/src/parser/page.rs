//! Content-stream interpretation for one page.
//!
//! ```text
//! content ops  ->  RawGlyph[] + DeviceLine[]  ->  PageLayout
//!                  (text state + graphics state)   (top-left origin)
//! ```

use log::{debug, warn};

use super::backend::{get_number_from_value, PageId, PdfBackend, PdfValue};
use super::graphics::{is_paint_operator, DeviceLine, Matrix, PathBuilder};
use super::text::{RawGlyph, TextParams, TextState};
use crate::types::{LineSegment, PageLayout, TextAtom};
use crate::PdfError;

/// Fraction of the font size below the baseline covered by a glyph box.
const DESCENT_RATIO: f32 = 0.2;

/// A device line whose endpoints differ by no more than this along one axis
/// is treated as axis-aligned.
const AXIS_TOLERANCE: f32 = 0.5;

/// Interpret a page's content stream and return its glyph atoms and rule
/// segments in top-left page coordinates.
pub fn extract_page(
    backend: &dyn PdfBackend,
    number: usize,
    page_id: PageId,
) -> Result<PageLayout, PdfError> {
    let media_box = backend.page_box(page_id)?;
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_default();

    let mut ctm = Matrix::IDENTITY;
    let mut saved: Vec<(Matrix, TextParams)> = Vec::new();
    let mut text = TextState::default();
    let mut path = PathBuilder::default();
    let mut glyphs: Vec<RawGlyph> = Vec::new();
    let mut lines: Vec<DeviceLine> = Vec::new();

    let number_at = |operands: &[PdfValue], i: usize| -> f32 {
        operands
            .get(i)
            .and_then(get_number_from_value)
            .unwrap_or(0.0)
    };

    for op in &ops {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            // -- Graphics state -----------------------------------------
            "q" => saved.push((ctm, text.save())),
            "Q" => match saved.pop() {
                Some((m, params)) => {
                    ctm = m;
                    text.restore(params);
                }
                None => debug!("page {number}: unbalanced Q ignored"),
            },
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    ctm = m.then(&ctm);
                }
            }

            // -- Path construction --------------------------------------
            "m" => path.move_to(&ctm, number_at(operands, 0), number_at(operands, 1)),
            "l" => path.line_to(&ctm, number_at(operands, 0), number_at(operands, 1)),
            "re" => path.rect(
                &ctm,
                number_at(operands, 0),
                number_at(operands, 1),
                number_at(operands, 2),
                number_at(operands, 3),
            ),
            "h" => path.close(),
            "n" => path.discard(),
            op_name if is_paint_operator(op_name) => {
                if matches!(op_name, "s" | "b" | "b*") {
                    path.close();
                }
                lines.extend(path.take());
            }

            // -- Text objects -------------------------------------------
            "BT" => text.begin_text(),
            "Tf" => text.set_font(operands, &fonts),
            "Tm" => text.set_matrix(operands),
            "Td" => text.translate_line(number_at(operands, 0), number_at(operands, 1)),
            "TD" => {
                text.translate_line_set_leading(number_at(operands, 0), number_at(operands, 1))
            }
            "T*" => text.next_line(),
            "TL" => text.set_leading(number_at(operands, 0)),
            "Tc" => text.set_char_spacing(number_at(operands, 0)),
            "Tw" => text.set_word_spacing(number_at(operands, 0)),
            "Tz" => text.set_horiz_scale(number_at(operands, 0)),
            "Ts" => text.set_rise(number_at(operands, 0)),
            "Tj" => {
                if let Some(PdfValue::Str(bytes)) = operands.first() {
                    show(backend, page_id, &mut text, bytes, &ctm, &mut glyphs);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            PdfValue::Str(bytes) => {
                                show(backend, page_id, &mut text, bytes, &ctm, &mut glyphs)
                            }
                            other => {
                                if let Some(adj) = get_number_from_value(other) {
                                    text.kern(adj);
                                }
                            }
                        }
                    }
                }
            }
            "'" => {
                text.next_line();
                if let Some(PdfValue::Str(bytes)) = operands.first() {
                    show(backend, page_id, &mut text, bytes, &ctm, &mut glyphs);
                }
            }
            "\"" => {
                if let [aw, ac, PdfValue::Str(bytes), ..] = operands {
                    text.set_word_spacing(get_number_from_value(aw).unwrap_or(0.0));
                    text.set_char_spacing(get_number_from_value(ac).unwrap_or(0.0));
                    text.next_line();
                    show(backend, page_id, &mut text, bytes, &ctm, &mut glyphs);
                }
            }

            _ => { /* Operators irrelevant to layout */ }
        }
    }

    let [llx, lly, urx, ury] = media_box;
    debug!(
        "page {number}: {} glyphs, {} path lines",
        glyphs.len(),
        lines.len()
    );

    Ok(PageLayout {
        number,
        width: f64::from(urx - llx),
        height: f64::from(ury - lly),
        atoms: glyphs
            .into_iter()
            .map(|g| glyph_to_atom(g, llx, ury))
            .collect(),
        segments: lines
            .into_iter()
            .filter_map(|l| line_to_segment(&l, llx, ury))
            .collect(),
    })
}

/// Extract every page, skipping pages whose content cannot be interpreted.
///
/// Fails only when the document has pages and none of them could be read.
pub fn extract_all_pages(backend: &dyn PdfBackend) -> Result<Vec<PageLayout>, PdfError> {
    let page_map = backend.pages();
    let mut result = Vec::with_capacity(page_map.len());
    let mut first_error = None;

    for (&page_num, &page_id) in &page_map {
        match extract_page(backend, page_num as usize, page_id) {
            Ok(page) => result.push(page),
            Err(e) => {
                warn!("skipping page {page_num}: {e}");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if result.is_empty() => Err(e),
        _ => Ok(result),
    }
}

fn show(
    backend: &dyn PdfBackend,
    page_id: PageId,
    text: &mut TextState,
    bytes: &[u8],
    ctm: &Matrix,
    glyphs: &mut Vec<RawGlyph>,
) {
    let decoded = backend.decode_text(page_id, text.font_key(), bytes);
    text.show(bytes, &decoded, ctm, glyphs);
}

/// Convert a device-space glyph into a top-left-origin atom.
fn glyph_to_atom(glyph: RawGlyph, llx: f32, ury: f32) -> TextAtom {
    let box_bottom = glyph.baseline - DESCENT_RATIO * glyph.size;
    let box_top = box_bottom + glyph.size;
    TextAtom {
        text: glyph.text,
        x0: f64::from(glyph.x0 - llx),
        x1: f64::from(glyph.x1 - llx),
        top: f64::from(ury - box_top),
        bottom: f64::from(ury - box_bottom),
    }
}

/// Keep axis-aligned lines; diagonals and degenerate points carry no grid
/// information.
fn line_to_segment(line: &DeviceLine, llx: f32, ury: f32) -> Option<LineSegment> {
    let (x0, y0) = line.from;
    let (x1, y1) = line.to;
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();

    if dx <= AXIS_TOLERANCE && dy <= AXIS_TOLERANCE {
        return None;
    }
    if dy <= AXIS_TOLERANCE {
        let y = ury - (y0 + y1) / 2.0;
        return Some(LineSegment::horizontal(
            f64::from(y),
            f64::from(x0 - llx),
            f64::from(x1 - llx),
        ));
    }
    if dx <= AXIS_TOLERANCE {
        let x = (x0 + x1) / 2.0 - llx;
        return Some(LineSegment::vertical(
            f64::from(x),
            f64::from(ury - y0),
            f64::from(ury - y1),
        ));
    }
    None
}
