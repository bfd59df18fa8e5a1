//! Header row detection and column → class mapping.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::PipelineConfig;
use crate::error::ZoneError;
use crate::grid::Grid;
use crate::schedule::ClassId;

fn class_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b([1-9]\d?)\s?([A-Z])\b").expect("valid regex"))
}

fn full_class_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^([1-9]\d?)\s?([A-Z])$").expect("valid regex"))
}

/// `"10C, D"`, `"10C/D"`, `"10C & 10D"` style continuations.
fn merged_tail_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*[,/&+]\s*(?:\d{1,2}\s?)?[A-Za-z]\b").expect("valid regex")
    })
}

fn class_id(grade: &str, section: &str) -> ClassId {
    ClassId::new(format!("{grade}{}", section.to_uppercase()))
}

/// True when the whole (trimmed) text is a class code like `9B`.
pub fn is_class_token(text: &str) -> bool {
    full_class_token_regex().is_match(text.trim())
}

/// How the column mapping of a zone was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStrategy {
    /// A header row was found at `row`.
    Detected { row: usize },
    /// No header row; columns follow the configured class order.
    Positional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderCell {
    Class { id: ClassId, note: Option<String> },
    /// Several classes share the cell; the owner is ambiguous.
    Merged,
    Empty,
}

/// Immutable column → class mapping of one zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMapping {
    strategy: HeaderStrategy,
    columns: Vec<(usize, ClassId)>,
    notes: Vec<(usize, String)>,
}

impl HeaderMapping {
    pub fn new(
        strategy: HeaderStrategy,
        columns: Vec<(usize, ClassId)>,
        notes: Vec<(usize, String)>,
    ) -> Self {
        HeaderMapping {
            strategy,
            columns,
            notes,
        }
    }

    pub fn strategy(&self) -> HeaderStrategy {
        self.strategy
    }

    /// First row that may hold data.
    pub fn first_data_row(&self) -> usize {
        match self.strategy {
            HeaderStrategy::Detected { row } => row + 1,
            HeaderStrategy::Positional => 0,
        }
    }

    pub fn columns(&self) -> &[(usize, ClassId)] {
        &self.columns
    }

    pub fn class_for(&self, col: usize) -> Option<&ClassId> {
        self.columns.iter().find(|(c, _)| *c == col).map(|(_, id)| id)
    }

    pub fn note_for(&self, col: usize) -> Option<&str> {
        self.notes
            .iter()
            .find(|(c, _)| *c == col)
            .map(|(_, n)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Strips surrounding whitespace, separators and one pair of wrapping
/// parentheses.
fn trim_note(raw: &str) -> String {
    const EDGE: &[char] = &[',', ';', ':', '-', '–', '—', '/', '|'];
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut note = collapsed.trim_matches(|c: char| c.is_whitespace() || EDGE.contains(&c));
    if let Some(inner) = note.strip_prefix('(').and_then(|n| n.strip_suffix(')')) {
        note = inner.trim_matches(|c: char| c.is_whitespace() || EDGE.contains(&c));
    }
    note.to_string()
}

/// Splits a header cell into its class token and trailing note.
pub fn parse_header_cell(text: &str) -> HeaderCell {
    let re = class_token_regex();
    let mut matches = re.captures_iter(text);
    let Some(caps) = matches.next() else {
        return HeaderCell::Empty;
    };
    if matches.next().is_some() {
        return HeaderCell::Merged;
    }
    let (Some(whole), Some(grade), Some(section)) = (caps.get(0), caps.get(1), caps.get(2))
    else {
        return HeaderCell::Empty;
    };
    if merged_tail_regex().is_match(&text[whole.end()..]) {
        return HeaderCell::Merged;
    }

    let remainder = format!("{} {}", &text[..whole.start()], &text[whole.end()..]);
    let note = trim_note(&remainder);
    HeaderCell::Class {
        id: class_id(grade.as_str(), section.as_str()),
        note: (!note.is_empty()).then_some(note),
    }
}

/// Number of columns (time column excluded) holding a class token.
pub fn score_row(row: &[String]) -> usize {
    row.iter()
        .skip(1)
        .filter(|cell| class_token_regex().is_match(cell))
        .count()
}

/// Finds the header row of a zone and builds its column mapping.
///
/// The best-scoring row among the first `header_scan_rows` is accepted only
/// if it reaches [`PipelineConfig::header_threshold`].  Otherwise the
/// configured `class_order` is used positionally, if there is one.
pub fn resolve_header(grid: &Grid, config: &PipelineConfig) -> Result<HeaderMapping, ZoneError> {
    let required = config.header_threshold();
    let mut best: Option<(usize, usize)> = None;
    for row in 0..grid.rows().min(config.header_scan_rows) {
        let score = score_row(grid.row(row));
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((row, score));
        }
    }
    let best_score = best.map_or(0, |(_, s)| s);

    match best {
        Some((row, score)) if score >= required => Ok(detected_mapping(grid, row)),
        _ if !config.class_order.is_empty() => {
            log::warn!(
                "no header row (best score {best_score} < {required}), using positional class order"
            );
            Ok(positional_mapping(grid, &config.class_order))
        }
        _ => Err(ZoneError::HeaderNotFound {
            best_score,
            required,
        }),
    }
}

fn detected_mapping(grid: &Grid, row: usize) -> HeaderMapping {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    let mut notes = Vec::new();

    for (col, text) in grid.row(row).iter().enumerate().skip(1) {
        match parse_header_cell(text) {
            HeaderCell::Class { id, note } => {
                if !seen.insert(id.clone()) {
                    log::debug!("duplicate header {id} in column {col}, keeping first");
                    continue;
                }
                if let Some(note) = note {
                    notes.push((col, note));
                }
                columns.push((col, id));
            }
            HeaderCell::Merged => log::debug!("merged header {text:?} in column {col} skipped"),
            HeaderCell::Empty => {}
        }
    }

    HeaderMapping::new(HeaderStrategy::Detected { row }, columns, notes)
}

fn positional_mapping(grid: &Grid, class_order: &[String]) -> HeaderMapping {
    let mut seen = HashSet::new();
    let columns = class_order
        .iter()
        .enumerate()
        .take(grid.cols().saturating_sub(1))
        .filter(|(_, class)| seen.insert(class.as_str()))
        .map(|(i, class)| (i + 1, ClassId::new(class.clone())))
        .collect();
    HeaderMapping::new(HeaderStrategy::Positional, columns, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn header_grid(header: &[&str], filler_rows: usize) -> Grid {
        let cols = header.len();
        let mut rows = vec![row(&["Stundenplan"])];
        rows.push(row(header));
        for _ in 0..filler_rows {
            rows.push(row(&["08:00-08:50", "Math"]));
        }
        Grid::from_rows(rows, cols)
    }

    fn config(classes: usize) -> PipelineConfig {
        PipelineConfig {
            classes_per_page: classes,
            ..Default::default()
        }
    }

    #[test]
    fn test_is_class_token() {
        assert!(is_class_token("9B"));
        assert!(is_class_token(" 12d "));
        assert!(!is_class_token("9B lab"));
        assert!(!is_class_token("0A"));
        assert!(!is_class_token("Math"));
    }

    #[test]
    fn test_parse_cell_with_note() {
        assert_eq!(
            parse_header_cell("8D lab. bio"),
            HeaderCell::Class {
                id: "8D".into(),
                note: Some("lab. bio".into())
            }
        );
    }

    #[test]
    fn test_parse_cell_note_punctuation_trimmed() {
        assert_eq!(
            parse_header_cell("9 b - (sala 12)"),
            HeaderCell::Class {
                id: "9B".into(),
                note: Some("sala 12".into())
            }
        );
    }

    #[test]
    fn test_parse_merged_cells() {
        assert_eq!(parse_header_cell("10C, D"), HeaderCell::Merged);
        assert_eq!(parse_header_cell("10C/10D"), HeaderCell::Merged);
        assert_eq!(parse_header_cell("10C & 10 D"), HeaderCell::Merged);
    }

    #[test]
    fn test_parse_empty_cell() {
        assert_eq!(parse_header_cell("Zeit"), HeaderCell::Empty);
        assert_eq!(parse_header_cell(""), HeaderCell::Empty);
    }

    #[test]
    fn test_resolve_detected_header() {
        let grid = header_grid(&["Zeit", "9A", "9B", "8D lab. bio", "10C, D"], 3);
        let mapping = resolve_header(&grid, &config(6)).unwrap();
        assert_eq!(mapping.strategy(), HeaderStrategy::Detected { row: 1 });
        assert_eq!(mapping.first_data_row(), 2);
        assert_eq!(mapping.class_for(1).map(ClassId::as_str), Some("9A"));
        assert_eq!(mapping.class_for(3).map(ClassId::as_str), Some("8D"));
        assert_eq!(mapping.note_for(3), Some("lab. bio"));
        assert_eq!(mapping.class_for(4), None);
        assert_eq!(mapping.columns().len(), 3);
    }

    #[test]
    fn test_duplicate_header_keeps_first() {
        let grid = header_grid(&["", "9A", "9A", "9B"], 1);
        let mapping = resolve_header(&grid, &config(4)).unwrap();
        let cols: Vec<_> = mapping.columns().iter().map(|(c, _)| *c).collect();
        assert_eq!(cols, vec![1, 3]);
    }

    #[test]
    fn test_header_below_threshold_rejected() {
        let grid = header_grid(&["", "9A", "9B", "Math", "Bio"], 1);
        let err = resolve_header(&grid, &config(16)).unwrap_err();
        assert_eq!(
            err,
            ZoneError::HeaderNotFound {
                best_score: 2,
                required: 6
            }
        );
    }

    #[test]
    fn test_positional_fallback() {
        let grid = header_grid(&["", "Math", "Bio", "Chem"], 1);
        let config = PipelineConfig {
            class_order: vec!["5A".into(), "5B".into(), "6A".into(), "6B".into()],
            ..config(4)
        };
        let mapping = resolve_header(&grid, &config).unwrap();
        assert_eq!(mapping.strategy(), HeaderStrategy::Positional);
        assert_eq!(mapping.first_data_row(), 0);
        let classes: Vec<_> = mapping
            .columns()
            .iter()
            .map(|(c, id)| (*c, id.as_str()))
            .collect();
        assert_eq!(classes, vec![(1, "5A"), (2, "5B"), (3, "6A")]);
    }

    #[test]
    fn test_scan_limited_to_first_rows() {
        let mut rows: Vec<Vec<String>> = (0..12).map(|_| row(&["x"])).collect();
        rows.push(row(&["", "9A", "9B"]));
        let grid = Grid::from_rows(rows, 3);
        assert!(resolve_header(&grid, &config(2)).is_err());
    }
}
