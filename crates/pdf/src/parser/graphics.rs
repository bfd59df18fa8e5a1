//! Graphics state and path construction.
//!
//! Only what rule-line recovery needs is modelled: the current
//! transformation matrix (`cm`, `q`, `Q`) and straight path segments (`m`,
//! `l`, `re`, `h`).  Curves are ignored because table grids never use them.

use super::backend::{get_number_from_value, PdfValue};

/// A PDF affine matrix `[a, b, c, d, e, f]` applied to row vectors:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix(pub [f32; 6]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn translate(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// Read six numeric operands (as used by `cm` and `Tm`).
    pub fn from_operands(operands: &[PdfValue]) -> Option<Self> {
        let vals: Vec<f32> = operands
            .iter()
            .take(6)
            .filter_map(get_number_from_value)
            .collect();
        match vals.as_slice() {
            [a, b, c, d, e, f] => Some(Matrix([*a, *b, *c, *d, *e, *f])),
            _ => None,
        }
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// Length of the transformed unit vertical vector.
    pub fn vertical_scale(&self) -> f32 {
        (self.0[2].powi(2) + self.0[3].powi(2)).sqrt()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

/// A straight line between two points in device space (PDF coordinates,
/// y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceLine {
    pub from: (f32, f32),
    pub to: (f32, f32),
}

/// Accumulates the current path until a painting operator consumes it.
#[derive(Debug, Default)]
pub struct PathBuilder {
    lines: Vec<DeviceLine>,
    current: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
}

impl PathBuilder {
    pub fn move_to(&mut self, ctm: &Matrix, x: f32, y: f32) {
        let p = ctm.apply(x, y);
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    pub fn line_to(&mut self, ctm: &Matrix, x: f32, y: f32) {
        let p = ctm.apply(x, y);
        if let Some(from) = self.current {
            self.lines.push(DeviceLine { from, to: p });
        }
        self.current = Some(p);
    }

    pub fn close(&mut self) {
        if let (Some(from), Some(to)) = (self.current, self.subpath_start) {
            if from != to {
                self.lines.push(DeviceLine { from, to });
            }
            self.current = Some(to);
        }
    }

    /// `re`: a closed rectangle contributing its four edges.
    pub fn rect(&mut self, ctm: &Matrix, x: f32, y: f32, w: f32, h: f32) {
        self.move_to(ctm, x, y);
        self.line_to(ctm, x + w, y);
        self.line_to(ctm, x + w, y + h);
        self.line_to(ctm, x, y + h);
        self.close();
    }

    /// Hand over the accumulated lines and start a fresh path.
    pub fn take(&mut self) -> Vec<DeviceLine> {
        self.current = None;
        self.subpath_start = None;
        std::mem::take(&mut self.lines)
    }

    /// Drop the current path without painting it (`n`, clipping paths).
    pub fn discard(&mut self) {
        self.take();
    }
}

/// Returns `true` for operators that paint (and therefore end) the path.
pub fn is_paint_operator(op: &str) -> bool {
    matches!(
        op,
        "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_then_translates_after_scaling() {
        let scale = Matrix([2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        let shift = Matrix::translate(10.0, 5.0);
        let combined = scale.then(&shift);
        assert_eq!(combined.apply(1.0, 1.0), (12.0, 7.0));
    }

    #[test]
    fn test_matrix_from_operands_requires_six_numbers() {
        let ops = vec![PdfValue::Integer(1); 5];
        assert!(Matrix::from_operands(&ops).is_none());

        let ops = vec![
            PdfValue::Integer(1),
            PdfValue::Integer(0),
            PdfValue::Integer(0),
            PdfValue::Integer(1),
            PdfValue::Real(3.0),
            PdfValue::Real(4.0),
        ];
        assert_eq!(Matrix::from_operands(&ops), Some(Matrix::translate(3.0, 4.0)));
    }

    #[test]
    fn test_rect_yields_four_edges() {
        let mut path = PathBuilder::default();
        path.rect(&Matrix::IDENTITY, 0.0, 0.0, 10.0, 5.0);
        let lines = path.take();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].from, (0.0, 0.0));
        assert_eq!(lines[0].to, (10.0, 0.0));
        assert_eq!(lines[3].to, (0.0, 0.0));
    }

    #[test]
    fn test_line_to_without_move_is_ignored() {
        let mut path = PathBuilder::default();
        path.line_to(&Matrix::IDENTITY, 5.0, 5.0);
        path.line_to(&Matrix::IDENTITY, 10.0, 5.0);
        assert_eq!(path.take().len(), 1);
    }

    #[test]
    fn test_discard_clears_path() {
        let mut path = PathBuilder::default();
        path.rect(&Matrix::IDENTITY, 0.0, 0.0, 1.0, 1.0);
        path.discard();
        assert!(path.take().is_empty());
    }

    #[test]
    fn test_paint_operators() {
        assert!(is_paint_operator("S"));
        assert!(is_paint_operator("f*"));
        assert!(!is_paint_operator("n"));
        assert!(!is_paint_operator("W"));
    }
}
