use thiserror::Error;

/// Failures that invalidate a whole page (or, for
/// [`TimetableError::MissingDayAnchors`], a whole document).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimetableError {
    #[error("no day labels found; entries cannot be attributed to a day")]
    MissingDayAnchors,

    #[error("column boundaries did not converge: found {found}, expected {expected}")]
    AmbiguousColumnBoundaries { found: usize, expected: usize },
}

/// Failures contained to a single day zone.  The zone contributes no
/// entries; other zones are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    #[error("only {found} row boundaries, need at least {required}")]
    InsufficientRowBoundaries { found: usize, required: usize },

    #[error("no header row: best row had {best_score} class tokens, need {required}")]
    HeaderNotFound { best_score: usize, required: usize },
}
