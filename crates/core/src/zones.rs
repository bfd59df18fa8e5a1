use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::TimetableError;
use crate::index::PositionIndex;

/// The vertical band of a page belonging to one weekday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayZone {
    pub name: String,
    pub top: f64,
    pub bottom: f64,
}

/// Uppercases and drops everything that is not alphanumeric.
pub fn normalize_label(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Splits the page into day zones, top to bottom.
///
/// A zone starts `zone_margin` above its label and ends where the next zone
/// starts; the last zone runs to the bottom of the page.  A label that
/// repeats an already accepted day within `zone_margin` (the same label
/// printed again on one line) is dropped.  Different days are always kept.
pub fn find_day_zones(
    index: &PositionIndex<'_>,
    config: &PipelineConfig,
) -> Result<Vec<DayZone>, TimetableError> {
    let mut hits: Vec<(f64, &str)> = index
        .words(config.word_gap, config.line_tolerance)
        .iter()
        .filter_map(|word| {
            let label = normalize_label(&word.text);
            config
                .days
                .iter()
                .find(|day| normalize_label(&day.token) == label)
                .map(|day| (word.top, day.name.as_str()))
        })
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut anchors: Vec<(f64, &str)> = Vec::with_capacity(hits.len());
    for hit in hits {
        let repeated = anchors
            .iter()
            .any(|(top, name)| *name == hit.1 && hit.0 - top <= config.zone_margin);
        if repeated {
            log::debug!("dropping repeated day label {} at {:.1}", hit.1, hit.0);
        } else {
            anchors.push(hit);
        }
    }

    if anchors.is_empty() {
        return Err(TimetableError::MissingDayAnchors);
    }

    let tops: Vec<f64> = anchors
        .iter()
        .map(|(top, _)| (top - config.zone_margin).max(0.0))
        .collect();

    Ok(anchors
        .iter()
        .enumerate()
        .map(|(i, (_, name))| DayZone {
            name: name.to_string(),
            top: tops[i],
            bottom: tops.get(i + 1).copied().unwrap_or(index.height()),
        })
        .collect())
}
