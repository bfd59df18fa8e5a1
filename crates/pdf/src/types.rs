use std::fmt;

use serde::{Deserialize, Serialize};

/// A positioned fragment of text (a glyph or a word).
///
/// Coordinates are page coordinates with the origin at the top-left corner of
/// the MediaBox and `y` growing downward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAtom {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub bottom: f64,
}

impl TextAtom {
    pub fn new(text: impl Into<String>, x0: f64, x1: f64, top: f64, bottom: f64) -> Self {
        TextAtom {
            text: text.into(),
            x0,
            x1,
            top,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Vertical midpoint, used to decide which band an atom belongs to.
    pub fn mid_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "h"),
            Orientation::Vertical => write!(f, "v"),
        }
    }
}

/// A straight rule line on the page.
///
/// `position` is the shared coordinate (x for vertical segments, y for
/// horizontal ones). `start..end` is the perpendicular extent, always
/// `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub orientation: Orientation,
    pub position: f64,
    pub start: f64,
    pub end: f64,
}

impl LineSegment {
    pub fn new(orientation: Orientation, position: f64, a: f64, b: f64) -> Self {
        LineSegment {
            orientation,
            position,
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn horizontal(y: f64, x0: f64, x1: f64) -> Self {
        Self::new(Orientation::Horizontal, y, x0, x1)
    }

    pub fn vertical(x: f64, top: f64, bottom: f64) -> Self {
        Self::new(Orientation::Vertical, x, top, bottom)
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// Everything the reconstruction pipeline needs from one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLayout {
    /// 1-based page number.
    pub number: usize,
    pub width: f64,
    pub height: f64,
    pub atoms: Vec<TextAtom>,
    pub segments: Vec<LineSegment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_extent_is_ordered() {
        let seg = LineSegment::vertical(10.0, 50.0, 20.0);
        assert_eq!(seg.start, 20.0);
        assert_eq!(seg.end, 50.0);
        assert_eq!(seg.length(), 30.0);
    }

    #[test]
    fn test_atom_dimensions() {
        let atom = TextAtom::new("9B", 10.0, 22.0, 100.0, 108.0);
        assert_eq!(atom.width(), 12.0);
        assert_eq!(atom.height(), 8.0);
        assert_eq!(atom.mid_y(), 104.0);
    }

    #[test]
    fn test_orientation_display() {
        assert_eq!(format!("{}", Orientation::Horizontal), "h");
        assert_eq!(format!("{}", Orientation::Vertical), "v");
    }
}
