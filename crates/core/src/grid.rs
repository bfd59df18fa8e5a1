use pdf::TextAtom;

use crate::config::PipelineConfig;
use crate::index::group_lines;

/// Fixed-size text grid of one day zone.  Column 0 is the time column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<String>,
}

impl Grid {
    /// A grid with no rows, used for zones without enough row rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a grid from row-major cell text.  Missing trailing cells are
    /// empty; surplus cells are dropped.
    pub fn from_rows(rows: Vec<Vec<String>>, cols: usize) -> Self {
        let row_count = rows.len();
        let mut cells = Vec::with_capacity(row_count * cols);
        for mut row in rows {
            row.resize(cols, String::new());
            cells.extend(row);
        }
        Grid {
            rows: row_count,
            cols,
            cells,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        if row >= self.rows || col >= self.cols {
            return "";
        }
        &self.cells[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[String] {
        if row >= self.rows {
            return &[];
        }
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[String]> {
        (0..self.rows).map(move |r| self.row(r))
    }
}

/// Length of the intersection of `[a0, a1]` and `[b0, b1]`.
pub fn overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    (a1.min(b1) - a0.max(b0)).max(0.0)
}

/// Share of `[a0, a1]` covered by `[b0, b1]`.
pub fn overlap_ratio(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    overlap(a0, a1, b0, b1) / (a1 - a0).max(1e-6)
}

/// Indices of the intervals `boundaries[i]..boundaries[i + 1]` that cover
/// at least `threshold` of `[a0, a1]`.
fn covering_intervals(a0: f64, a1: f64, boundaries: &[f64], threshold: f64) -> Vec<usize> {
    boundaries
        .windows(2)
        .enumerate()
        .filter(|(_, w)| overlap_ratio(a0, a1, w[0], w[1]) >= threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Places each atom in every cell it overlaps enough and renders cell text.
///
/// An atom wider than one column (a merged header) lands in each column it
/// covers.  Returns [`Grid::empty`] when there are fewer than
/// `min_row_boundaries` row boundaries.
pub fn assemble_grid(
    atoms: &[&TextAtom],
    columns: &[f64],
    rows: &[f64],
    config: &PipelineConfig,
) -> Grid {
    if rows.len() < config.min_row_boundaries.max(2) || columns.len() < 2 {
        return Grid::empty();
    }
    let row_count = rows.len() - 1;
    let col_count = columns.len() - 1;
    let mut buckets: Vec<Vec<&TextAtom>> = vec![Vec::new(); row_count * col_count];

    for &atom in atoms {
        let hit_rows = covering_intervals(atom.top, atom.bottom, rows, config.row_overlap);
        if hit_rows.is_empty() {
            continue;
        }
        let hit_cols = covering_intervals(atom.x0, atom.x1, columns, config.col_overlap);
        for &r in &hit_rows {
            for &c in &hit_cols {
                buckets[r * col_count + c].push(atom);
            }
        }
    }

    Grid {
        rows: row_count,
        cols: col_count,
        cells: buckets
            .into_iter()
            .map(|bucket| cell_text(bucket, config))
            .collect(),
    }
}

/// Joins the atoms of one cell into text.
///
/// Atoms are grouped into visual lines and ordered left to right; a gap
/// wider than `word_gap` becomes a space.  Whitespace runs collapse.
pub fn cell_text(atoms: Vec<&TextAtom>, config: &PipelineConfig) -> String {
    let mut text = String::new();
    for line in group_lines(atoms, config.line_tolerance) {
        if !text.is_empty() {
            text.push(' ');
        }
        let mut prev: Option<&TextAtom> = None;
        for atom in line {
            if let Some(p) = prev {
                if atom.x0 - p.x1 > config.word_gap {
                    text.push(' ');
                }
            }
            text.push_str(&atom.text);
            prev = Some(atom);
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
