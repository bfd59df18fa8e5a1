//! The persisted timetable state and the pure rules for updating it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::schedule::{ClassId, DayNotes, Schedule, Timetable};

/// SHA-256 of the document bytes as lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub source_pdf: String,
    pub pdf_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableState {
    pub updated_at: String,
    pub sources: IndexMap<String, SourceInfo>,
    pub schedule: Schedule,
    pub day_notes: DayNotes,
}

impl TimetableState {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn source_hash(&self, kind: &str) -> Option<&str> {
        self.sources.get(kind).map(|s| s.pdf_hash.as_str())
    }

    /// True when `hash` matches what was recorded for `kind` last time.
    pub fn is_unchanged(&self, kind: &str, hash: &str) -> bool {
        self.source_hash(kind) == Some(hash)
    }

    /// Folds a freshly parsed source into the state.
    ///
    /// Every class present in `timetable` replaces its previous schedule and
    /// notes; other classes stay as they were.  An empty timetable leaves the
    /// state untouched and returns `false`.
    pub fn apply_update(
        &mut self,
        kind: &str,
        info: SourceInfo,
        timetable: Timetable,
        updated_at: impl Into<String>,
    ) -> bool {
        if timetable.is_empty() {
            log::warn!("{kind}: parsed timetable is empty, keeping previous state");
            return false;
        }

        let classes: Vec<ClassId> = timetable.schedule.classes().cloned().collect();
        for class in &classes {
            self.day_notes.remove_class(class.as_str());
        }
        self.day_notes.merge(timetable.day_notes);
        self.schedule.replace_classes(timetable.schedule);
        self.sources.insert(kind.to_string(), info);
        self.updated_at = updated_at.into();
        true
    }
}
