use pdf::{LineSegment, Orientation, PageLayout, TextAtom};

/// Whether `atom` sits on the same visual line as `anchor`: their bottoms
/// agree within `tolerance`, or they share at least half of the shorter
/// one's height.  Glyphs of different sizes on one baseline stay together.
pub fn same_line(anchor: &TextAtom, atom: &TextAtom, tolerance: f64) -> bool {
    if (atom.bottom - anchor.bottom).abs() <= tolerance {
        return true;
    }
    let shared = atom.bottom.min(anchor.bottom) - atom.top.max(anchor.top);
    let shorter = (atom.bottom - atom.top).min(anchor.bottom - anchor.top);
    shared >= 0.5 * shorter.max(1e-6)
}

/// Groups atoms into visual lines, top to bottom, each sorted left to right.
pub fn group_lines<'a>(mut atoms: Vec<&'a TextAtom>, tolerance: f64) -> Vec<Vec<&'a TextAtom>> {
    atoms.sort_by(|a, b| a.bottom.total_cmp(&b.bottom).then(a.x0.total_cmp(&b.x0)));

    let mut lines: Vec<Vec<&TextAtom>> = Vec::new();
    for atom in atoms {
        match lines.last_mut() {
            Some(line) if same_line(line[0], atom, tolerance) => line.push(atom),
            _ => lines.push(vec![atom]),
        }
    }
    for line in &mut lines {
        line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    }
    lines
}

/// Read-only spatial queries over one page.
#[derive(Debug, Clone, Copy)]
pub struct PositionIndex<'a> {
    page: &'a PageLayout,
}

impl<'a> PositionIndex<'a> {
    pub fn new(page: &'a PageLayout) -> Self {
        PositionIndex { page }
    }

    pub fn width(&self) -> f64 {
        self.page.width
    }

    pub fn height(&self) -> f64 {
        self.page.height
    }

    pub fn atoms(&self) -> &'a [TextAtom] {
        &self.page.atoms
    }

    /// Atoms whose vertical midpoint lies in `[top, bottom)`.
    pub fn atoms_in_band(&self, top: f64, bottom: f64) -> Vec<&'a TextAtom> {
        self.page
            .atoms
            .iter()
            .filter(|atom| {
                let mid = atom.mid_y();
                mid >= top && mid < bottom
            })
            .collect()
    }

    pub fn segments(
        &self,
        orientation: Orientation,
        min_len: f64,
    ) -> impl Iterator<Item = &'a LineSegment> + 'a {
        self.page
            .segments
            .iter()
            .filter(move |s| s.orientation == orientation && s.length() > min_len)
    }

    /// Segments of the given orientation whose position lies in `[top, bottom]`.
    pub fn segments_in_band(
        &self,
        orientation: Orientation,
        min_len: f64,
        top: f64,
        bottom: f64,
    ) -> Vec<&'a LineSegment> {
        self.segments(orientation, min_len)
            .filter(|s| s.position >= top && s.position <= bottom)
            .collect()
    }

    /// Regroups atoms into words: atoms on the same line (see [`same_line`])
    /// separated by at most `gap` are joined.
    pub fn words(&self, gap: f64, line_tolerance: f64) -> Vec<TextAtom> {
        let lines = group_lines(self.page.atoms.iter().collect(), line_tolerance);

        let mut words = Vec::new();
        for line in lines {
            let mut current: Option<TextAtom> = None;
            for atom in line {
                current = match current.take() {
                    Some(mut word) if atom.x0 - word.x1 <= gap => {
                        word.text.push_str(&atom.text);
                        word.x1 = word.x1.max(atom.x1);
                        word.top = word.top.min(atom.top);
                        word.bottom = word.bottom.max(atom.bottom);
                        Some(word)
                    }
                    Some(word) => {
                        words.push(word);
                        Some(atom.clone())
                    }
                    None => Some(atom.clone()),
                };
            }
            words.extend(current);
        }
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_atom(text: &str, x0: f64, x1: f64, top: f64) -> TextAtom {
        TextAtom::new(text, x0, x1, top, top + 8.0)
    }

    fn make_page(atoms: Vec<TextAtom>, segments: Vec<LineSegment>) -> PageLayout {
        PageLayout {
            number: 1,
            width: 600.0,
            height: 800.0,
            atoms,
            segments,
        }
    }

    #[test]
    fn test_atoms_in_band_uses_midpoint() {
        let page = make_page(
            vec![
                make_atom("a", 0.0, 5.0, 96.0),  // mid 100
                make_atom("b", 0.0, 5.0, 100.0), // mid 104
                make_atom("c", 0.0, 5.0, 196.0), // mid 200
            ],
            vec![],
        );
        let index = PositionIndex::new(&page);
        let texts: Vec<_> = index
            .atoms_in_band(100.0, 200.0)
            .iter()
            .map(|a| a.text.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_segments_filters_orientation_and_length() {
        let page = make_page(
            vec![],
            vec![
                LineSegment::vertical(10.0, 0.0, 500.0),
                LineSegment::vertical(20.0, 0.0, 2.0),
                LineSegment::horizontal(30.0, 0.0, 500.0),
            ],
        );
        let index = PositionIndex::new(&page);
        let xs: Vec<_> = index
            .segments(Orientation::Vertical, 4.0)
            .map(|s| s.position)
            .collect();
        assert_eq!(xs, vec![10.0]);
        assert_eq!(
            index
                .segments_in_band(Orientation::Horizontal, 4.0, 0.0, 29.0)
                .len(),
            0
        );
    }

    #[test]
    fn test_words_joins_glyphs() {
        let page = make_page(
            vec![
                make_atom("T", 15.0, 20.0, 50.2),
                make_atom("M", 0.0, 5.0, 50.0),
                make_atom("O", 5.0, 10.0, 50.0),
                make_atom("N", 10.0, 15.0, 50.0),
                make_atom("X", 40.0, 45.0, 50.0),
                make_atom("Y", 0.0, 5.0, 80.0),
            ],
            vec![],
        );
        let words = PositionIndex::new(&page).words(1.0, 1.0);
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["MONT", "X", "Y"]);
        assert_eq!(words[0].x1, 20.0);
    }

    #[test]
    fn test_group_lines_keeps_baseline_together() {
        // A 12pt capital followed by 8pt glyphs on the same baseline.
        let big = TextAtom::new("M", 0.0, 8.0, 40.0, 52.0);
        let small = TextAtom::new("ontag", 8.0, 24.0, 43.2, 51.2);
        let below = TextAtom::new("x", 0.0, 4.0, 54.0, 62.0);

        let lines = group_lines(vec![&below, &big, &small], 1.0);
        let texts: Vec<Vec<&str>> = lines
            .iter()
            .map(|line| line.iter().map(|a| a.text.as_str()).collect())
            .collect();
        assert_eq!(texts, vec![vec!["M", "ontag"], vec!["x"]]);
    }
}
