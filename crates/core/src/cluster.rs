//! Rule-line clustering into column and row boundaries.

use pdf::Orientation;

use crate::config::{ColumnPolicy, PipelineConfig};
use crate::error::TimetableError;
use crate::index::PositionIndex;
use crate::zones::DayZone;

/// Greedy single-pass clustering of coordinates.
///
/// Values are sorted; a value within `tolerance` of the previous cluster's
/// last member joins that cluster.  Each cluster is replaced by the mean of
/// its members.  Non-finite values are ignored.
///
/// The result is strictly increasing and adjacent values are more than
/// `tolerance` apart.
pub fn cluster_positions(values: impl IntoIterator<Item = f64>, tolerance: f64) -> Vec<f64> {
    let mut values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    values.sort_by(f64::total_cmp);

    let mut clusters: Vec<Vec<f64>> = Vec::new();
    for value in values {
        match clusters.last_mut() {
            Some(cluster) if value - cluster[cluster.len() - 1] <= tolerance => cluster.push(value),
            _ => clusters.push(vec![value]),
        }
    }

    clusters
        .iter()
        .map(|c| c.iter().sum::<f64>() / c.len() as f64)
        .collect()
}

/// Page-global column boundaries from the long vertical rules.
///
/// Surplus boundaries are reduced to the widest contiguous window of the
/// expected size; a shortfall is handled according to
/// [`PipelineConfig::column_policy`].
pub fn column_boundaries(
    index: &PositionIndex<'_>,
    config: &PipelineConfig,
) -> Result<Vec<f64>, TimetableError> {
    let min_len = config.min_segment_ratio * index.height();
    let positions = cluster_positions(
        index
            .segments(Orientation::Vertical, min_len)
            .map(|s| s.position),
        config.cluster_tolerance,
    );
    let expected = config.expected_column_boundaries();
    let found = positions.len();

    if found < 2 {
        return Err(TimetableError::AmbiguousColumnBoundaries { found, expected });
    }
    if found == expected {
        return Ok(positions);
    }
    if found > expected {
        return Ok(widest_window(&positions, expected).to_vec());
    }

    match config.column_policy {
        ColumnPolicy::Strict => Err(TimetableError::AmbiguousColumnBoundaries { found, expected }),
        ColumnPolicy::Interpolate => {
            let first = positions[0];
            let last = positions[found - 1];
            let step = (last - first) / (expected - 1) as f64;
            if step <= config.cluster_tolerance {
                return Err(TimetableError::AmbiguousColumnBoundaries { found, expected });
            }
            log::warn!(
                "only {found} of {expected} column rules found, interpolating over {first:.1}..{last:.1}"
            );
            Ok((0..expected).map(|i| first + step * i as f64).collect())
        }
    }
}

/// The contiguous run of `size` values with the largest span (first wins).
fn widest_window(positions: &[f64], size: usize) -> &[f64] {
    let mut best = 0;
    let mut best_span = f64::NEG_INFINITY;
    for start in 0..=positions.len() - size {
        let span = positions[start + size - 1] - positions[start];
        if span > best_span {
            best_span = span;
            best = start;
        }
    }
    &positions[best..best + size]
}

/// Zone-local row boundaries from the horizontal rules inside the zone.
pub fn row_boundaries(
    index: &PositionIndex<'_>,
    zone: &DayZone,
    config: &PipelineConfig,
) -> Vec<f64> {
    let min_len = config.min_segment_ratio * index.width();
    cluster_positions(
        index
            .segments_in_band(Orientation::Horizontal, min_len, zone.top, zone.bottom)
            .into_iter()
            .map(|s| s.position),
        config.cluster_tolerance,
    )
}
