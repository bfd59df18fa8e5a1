use std::borrow::Borrow;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Short class code such as `9B` or `12D`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(String);

impl ClassId {
    pub fn new(id: impl Into<String>) -> Self {
        ClassId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ClassId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClassId {
    fn from(value: &str) -> Self {
        ClassId::new(value)
    }
}

pub type DayName = String;

/// One period of one class: `"<time_range> | <subject>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ScheduleEntry {
    pub time_range: String,
    pub subject: String,
}

impl ScheduleEntry {
    pub fn new(time_range: impl Into<String>, subject: impl Into<String>) -> Self {
        ScheduleEntry {
            time_range: time_range.into(),
            subject: subject.into(),
        }
    }
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.time_range, self.subject)
    }
}

impl From<ScheduleEntry> for String {
    fn from(entry: ScheduleEntry) -> Self {
        entry.to_string()
    }
}

impl TryFrom<String> for ScheduleEntry {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.split_once(" | ") {
            Some((time, subject)) if !time.is_empty() && !subject.is_empty() => {
                Ok(ScheduleEntry::new(time, subject))
            }
            _ => Err(format!("malformed schedule entry: {value:?}")),
        }
    }
}

/// Class → day → ordered, duplicate-free entries.
///
/// Both maps keep insertion order so the serialized JSON follows the order
/// in which classes and days were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule(IndexMap<ClassId, IndexMap<DayName, Vec<ScheduleEntry>>>);

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` unless the exact same entry is already listed for
    /// that class and day.  Returns whether the schedule changed.
    pub fn insert(&mut self, class: ClassId, day: &str, entry: ScheduleEntry) -> bool {
        let entries = self
            .0
            .entry(class)
            .or_default()
            .entry(day.to_string())
            .or_default();
        if entries.contains(&entry) {
            return false;
        }
        entries.push(entry);
        true
    }

    pub fn get(&self, class: &str, day: &str) -> Option<&[ScheduleEntry]> {
        self.0
            .get(class)
            .and_then(|days| days.get(day))
            .map(Vec::as_slice)
    }

    pub fn days(&self, class: &str) -> Option<&IndexMap<DayName, Vec<ScheduleEntry>>> {
        self.0.get(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassId> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of entries over all classes and days.
    pub fn entry_count(&self) -> usize {
        self.0
            .values()
            .flat_map(|days| days.values())
            .map(Vec::len)
            .sum()
    }

    /// Set-union with `other`, keeping first-seen order.
    pub fn merge(&mut self, other: Schedule) {
        for (class, days) in other.0 {
            for (day, entries) in days {
                for entry in entries {
                    self.insert(class.clone(), &day, entry);
                }
            }
        }
    }

    /// Replaces every class present in `other` wholesale and keeps the rest.
    pub fn replace_classes(&mut self, other: Schedule) {
        for (class, days) in other.0 {
            self.0.insert(class, days);
        }
    }
}

/// Class → day → room or lab note taken from the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayNotes(IndexMap<ClassId, IndexMap<DayName, String>>);

impl DayNotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a note; an existing note for the same class and day wins.
    pub fn insert(&mut self, class: ClassId, day: &str, note: impl Into<String>) {
        self.0
            .entry(class)
            .or_default()
            .entry(day.to_string())
            .or_insert_with(|| note.into());
    }

    pub fn get(&self, class: &str, day: &str) -> Option<&str> {
        self.0
            .get(class)
            .and_then(|days| days.get(day))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn merge(&mut self, other: DayNotes) {
        for (class, days) in other.0 {
            for (day, note) in days {
                self.insert(class.clone(), &day, note);
            }
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.0.shift_remove(class);
    }
}

/// Output of the reconstruction pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timetable {
    pub schedule: Schedule,
    pub day_notes: DayNotes,
}

impl Timetable {
    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }

    pub fn merge(&mut self, other: Timetable) {
        self.schedule.merge(other.schedule);
        self.day_notes.merge(other.day_notes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(time: &str, subject: &str) -> ScheduleEntry {
        ScheduleEntry::new(time, subject)
    }

    #[test]
    fn test_entry_canonical_form() {
        assert_eq!(entry("08:00-08:50", "Math").to_string(), "08:00-08:50 | Math");
    }

    #[test]
    fn test_entry_serializes_as_string() {
        let json = serde_json::to_string(&entry("08:00-08:50", "Bio | lab")).unwrap();
        assert_eq!(json, "\"08:00-08:50 | Bio | lab\"");

        let back: ScheduleEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.time_range, "08:00-08:50");
        assert_eq!(back.subject, "Bio | lab");
    }

    #[test]
    fn test_entry_rejects_malformed_string() {
        assert!(serde_json::from_str::<ScheduleEntry>("\"Math\"").is_err());
    }

    #[test]
    fn test_insert_deduplicates_and_keeps_order() {
        let mut schedule = Schedule::new();
        assert!(schedule.insert("9B".into(), "Luni", entry("08:00-08:50", "Math")));
        assert!(schedule.insert("9B".into(), "Luni", entry("09:00-09:50", "Bio")));
        assert!(!schedule.insert("9B".into(), "Luni", entry("08:00-08:50", "Math")));

        let subjects: Vec<_> = schedule
            .get("9B", "Luni")
            .unwrap()
            .iter()
            .map(|e| e.subject.as_str())
            .collect();
        assert_eq!(subjects, vec!["Math", "Bio"]);
        assert_eq!(schedule.entry_count(), 2);
    }

    #[test]
    fn test_merge_is_union() {
        let mut a = Schedule::new();
        a.insert("9B".into(), "Luni", entry("08:00-08:50", "Math"));
        let mut b = Schedule::new();
        b.insert("9B".into(), "Luni", entry("08:00-08:50", "Math"));
        b.insert("10A".into(), "Marti", entry("08:00-08:50", "Chem"));

        a.merge(b);
        assert_eq!(a.entry_count(), 2);
        let classes: Vec<_> = a.classes().map(ClassId::as_str).collect();
        assert_eq!(classes, vec!["9B", "10A"]);
    }

    #[test]
    fn test_replace_classes_keeps_untouched_classes() {
        let mut prior = Schedule::new();
        prior.insert("9B".into(), "Luni", entry("08:00-08:50", "Old"));
        prior.insert("10A".into(), "Luni", entry("08:00-08:50", "Kept"));

        let mut fresh = Schedule::new();
        fresh.insert("9B".into(), "Marti", entry("08:00-08:50", "New"));
        prior.replace_classes(fresh);

        assert!(prior.get("9B", "Luni").is_none());
        assert_eq!(prior.get("9B", "Marti").unwrap()[0].subject, "New");
        assert_eq!(prior.get("10A", "Luni").unwrap()[0].subject, "Kept");
    }

    #[test]
    fn test_day_notes_first_wins() {
        let mut notes = DayNotes::new();
        notes.insert("8D".into(), "Luni", "lab. bio");
        notes.insert("8D".into(), "Luni", "sala 4");
        assert_eq!(notes.get("8D", "Luni"), Some("lab. bio"));
    }

    #[test]
    fn test_schedule_json_shape() {
        let mut schedule = Schedule::new();
        schedule.insert("9B".into(), "Luni", entry("08:00-08:50", "Math"));
        let json = serde_json::to_string(&schedule).unwrap();
        assert_eq!(json, r#"{"9B":{"Luni":["08:00-08:50 | Math"]}}"#);
    }
}
