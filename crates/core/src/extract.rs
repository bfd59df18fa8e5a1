use std::sync::OnceLock;

use regex::Regex;

use crate::grid::Grid;
use crate::header::HeaderMapping;
use crate::normalize::SubjectNormalizer;
use crate::schedule::{DayNotes, Schedule, ScheduleEntry, Timetable};

fn time_slot_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}:\d{2}\s*[-–—]\s*\d{1,2}:\d{2}$").expect("valid regex"))
}

/// `HH:MM-HH:MM` with `-`, `–` or `—` and optional spaces around it.
pub fn is_time_slot(text: &str) -> bool {
    time_slot_regex().is_match(text.trim())
}

/// Whether `subject` names a class of this zone or of the configured order.
fn is_known_class(subject: &str, mapping: &HeaderMapping, class_order: &[String]) -> bool {
    mapping.columns().iter().any(|(_, id)| id.as_str() == subject)
        || class_order.iter().any(|id| id == subject)
}

/// Reads the entries of one day zone.
///
/// Only rows below the header whose first cell is a time slot are read.
/// Subjects that repeat the row's time or name a known class are
/// cross-column bleed and are dropped.
pub fn extract_zone(
    grid: &Grid,
    mapping: &HeaderMapping,
    day: &str,
    normalizer: &SubjectNormalizer,
    class_order: &[String],
) -> Timetable {
    let mut schedule = Schedule::new();

    for row in mapping.first_data_row()..grid.rows() {
        let time = grid.cell(row, 0).trim();
        if !is_time_slot(time) {
            continue;
        }
        for (col, class) in mapping.columns() {
            let Some(subject) = normalizer.normalize(grid.cell(row, *col)) else {
                continue;
            };
            if subject == time
                || is_time_slot(&subject)
                || is_known_class(&subject, mapping, class_order)
            {
                log::debug!("discarding {subject:?} in {class}/{day} as bleed");
                continue;
            }
            schedule.insert(class.clone(), day, ScheduleEntry::new(time, subject));
        }
    }

    let mut day_notes = DayNotes::new();
    for (col, class) in mapping.columns() {
        if let Some(note) = mapping.note_for(*col) {
            day_notes.insert(class.clone(), day, note);
        }
    }

    Timetable {
        schedule,
        day_notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderStrategy;
    use crate::schedule::ClassId;

    fn grid(rows: &[&[&str]], cols: usize) -> Grid {
        Grid::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            cols,
        )
    }

    fn mapping(header_row: usize, columns: &[(usize, &str)]) -> HeaderMapping {
        HeaderMapping::new(
            HeaderStrategy::Detected { row: header_row },
            columns
                .iter()
                .map(|&(c, id)| (c, ClassId::new(id)))
                .collect(),
            vec![],
        )
    }

    #[test]
    fn test_is_time_slot() {
        assert!(is_time_slot("09:00-09:45"));
        assert!(is_time_slot("9:00 – 9:45"));
        assert!(is_time_slot("12:00—12:50"));
        assert!(!is_time_slot("19.01"));
        assert!(!is_time_slot("09:00"));
        assert!(!is_time_slot("09:00-09:45 Math"));
    }

    #[test]
    fn test_extract_single_entry() {
        let g = grid(
            &[
                &["", "", "", "9B"],
                &["09:00-09:45", "", "", "Math"],
            ],
            4,
        );
        let out = extract_zone(&g, &mapping(0, &[(3, "9B")]), "Monday", &SubjectNormalizer::default(), &[]);
        let entries: Vec<String> = out
            .schedule
            .get("9B", "Monday")
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(entries, vec!["09:00-09:45 | Math"]);
    }

    #[test]
    fn test_skips_rows_without_time_slot() {
        let g = grid(
            &[
                &["", "9A"],
                &["19.01", "Ausflug"],
                &["Pause", "Hof"],
                &["08:00-08:50", "Bio"],
            ],
            2,
        );
        let out = extract_zone(&g, &mapping(0, &[(1, "9A")]), "Luni", &SubjectNormalizer::default(), &[]);
        assert_eq!(out.schedule.entry_count(), 1);
        assert_eq!(out.schedule.get("9A", "Luni").unwrap()[0].subject, "Bio");
    }

    #[test]
    fn test_rows_above_header_ignored() {
        let g = grid(
            &[
                &["08:00-08:50", "Stray"],
                &["", "9A"],
                &["08:00-08:50", "Bio"],
            ],
            2,
        );
        let out = extract_zone(&g, &mapping(1, &[(1, "9A")]), "Luni", &SubjectNormalizer::default(), &[]);
        let subjects: Vec<_> = out
            .schedule
            .get("9A", "Luni")
            .unwrap()
            .iter()
            .map(|e| e.subject.clone())
            .collect();
        assert_eq!(subjects, vec!["Bio"]);
    }

    #[test]
    fn test_bleed_discarded() {
        let g = grid(
            &[
                &["", "9A", "9B", "9C"],
                &["08:00-08:50", "08:00-08:50", "9B", "x"],
            ],
            4,
        );
        let out = extract_zone(
            &g,
            &mapping(0, &[(1, "9A"), (2, "9B"), (3, "9C")]),
            "Luni",
            &SubjectNormalizer::default(),
            &[],
        );
        assert!(out.schedule.is_empty());
    }

    #[test]
    fn test_duplicate_rows_deduplicated() {
        let g = grid(
            &[
                &["", "9A"],
                &["08:00-08:50", "Bio"],
                &["08:00-08:50", "Bio"],
            ],
            2,
        );
        let out = extract_zone(&g, &mapping(0, &[(1, "9A")]), "Luni", &SubjectNormalizer::default(), &[]);
        assert_eq!(out.schedule.entry_count(), 1);
    }

    #[test]
    fn test_notes_recorded_per_day() {
        let g = grid(&[&["", "8D lab. bio"], &["08:00-08:50", "Bio"]], 2);
        let mapping = HeaderMapping::new(
            HeaderStrategy::Detected { row: 0 },
            vec![(1, ClassId::new("8D"))],
            vec![(1, "lab. bio".to_string())],
        );
        let out = extract_zone(&g, &mapping, "Joi", &SubjectNormalizer::default(), &[]);
        assert_eq!(out.day_notes.get("8D", "Joi"), Some("lab. bio"));
    }

    #[test]
    fn test_unknown_class_code_kept_as_subject() {
        let g = grid(&[&["", "9A", "9B"], &["08:00-08:50", "5A", "12C"]], 3);
        let out = extract_zone(
            &g,
            &mapping(0, &[(1, "9A"), (2, "9B")]),
            "Luni",
            &SubjectNormalizer::default(),
            &["9A".to_string(), "9B".to_string(), "12C".to_string()],
        );
        let entries: Vec<String> = out
            .schedule
            .get("9A", "Luni")
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(entries, vec!["08:00-08:50 | 5A"]);
        // 12C is in the configured order, so it is bleed under 9B.
        assert!(out.schedule.get("9B", "Luni").is_none());
    }
}
