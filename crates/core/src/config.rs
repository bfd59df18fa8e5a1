//! Tunables for the reconstruction pipeline.
//!
//! Every field has a default; a TOML `[pipeline]` table only needs the keys
//! it wants to change.

use serde::{Deserialize, Serialize};

/// What to do when fewer column rule lines survive clustering than a full
/// grid needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnPolicy {
    /// Spread the expected number of boundaries evenly over the observed range.
    #[default]
    Interpolate,
    /// Give up on the page with `AmbiguousColumnBoundaries`.
    Strict,
}

/// A day label as printed in the document and the name it is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLabel {
    pub token: String,
    pub name: String,
}

impl DayLabel {
    pub fn new(token: impl Into<String>, name: impl Into<String>) -> Self {
        DayLabel {
            token: token.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRewrite {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Drop a single leading lowercase glyph glued to an uppercase letter,
    /// digit or diacritic (`"aMatematica"` → `"Matematica"`).
    pub strip_stray_prefix: bool,
    /// Drop a time range leaked in front of the subject.
    pub strip_leaked_time: bool,
    pub reject_single_letter: bool,
    pub min_subject_len: usize,
    /// Whole-word prefix substitutions applied before the other steps.
    pub prefix_rewrites: Vec<PrefixRewrite>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig {
            strip_stray_prefix: true,
            strip_leaked_time: true,
            reject_single_letter: true,
            min_subject_len: 2,
            prefix_rewrites: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Clustering tolerance τ in page units.
    pub cluster_tolerance: f64,
    /// Minimum rule length as a fraction of the page dimension it spans.
    pub min_segment_ratio: f64,
    pub classes_per_page: usize,
    pub column_policy: ColumnPolicy,
    /// Distance a zone starts above its day label.
    pub zone_margin: f64,
    pub days: Vec<DayLabel>,
    pub row_overlap: f64,
    pub col_overlap: f64,
    /// Horizontal gap between atoms that becomes a space.
    pub word_gap: f64,
    /// Distance between atom bottoms that still counts as one line.
    pub line_tolerance: f64,
    pub min_row_boundaries: usize,
    pub header_scan_rows: usize,
    pub min_header_score: usize,
    /// Column order used when no header row can be detected.  Empty disables
    /// the positional fallback.
    pub class_order: Vec<String>,
    pub normalizer: NormalizerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            cluster_tolerance: 1.5,
            min_segment_ratio: 0.005,
            classes_per_page: 16,
            column_policy: ColumnPolicy::default(),
            zone_margin: 8.0,
            days: vec![
                DayLabel::new("MONTAG", "Luni"),
                DayLabel::new("DIENSTAG", "Marti"),
                DayLabel::new("MITTWOCH", "Miercuri"),
                DayLabel::new("DONNERSTAG", "Joi"),
                DayLabel::new("FREITAG", "Vineri"),
            ],
            row_overlap: 0.40,
            col_overlap: 0.30,
            word_gap: 1.0,
            line_tolerance: 1.0,
            min_row_boundaries: 5,
            header_scan_rows: 12,
            min_header_score: 6,
            class_order: Vec::new(),
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Time column + one column per class + the closing rule.
    pub fn expected_column_boundaries(&self) -> usize {
        self.classes_per_page + 2
    }

    /// Minimum class-token count for a row to be accepted as header.
    pub fn header_threshold(&self) -> usize {
        self.min_header_score
            .min(self.classes_per_page.div_ceil(2))
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.expected_column_boundaries(), 18);
        assert_eq!(config.header_threshold(), 6);
        assert_eq!(config.days.len(), 5);
        assert_eq!(config.column_policy, ColumnPolicy::Interpolate);
    }

    #[test]
    fn test_header_threshold_small_pages() {
        let config = PipelineConfig {
            classes_per_page: 5,
            ..Default::default()
        };
        assert_eq!(config.header_threshold(), 3);

        let config = PipelineConfig {
            classes_per_page: 0,
            ..Default::default()
        };
        assert_eq!(config.header_threshold(), 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"classes_per_page": 4, "column_policy": "strict"}"#).unwrap();
        assert_eq!(config.classes_per_page, 4);
        assert_eq!(config.column_policy, ColumnPolicy::Strict);
        assert_eq!(config.cluster_tolerance, 1.5);
        assert!(config.normalizer.strip_stray_prefix);
    }
}
