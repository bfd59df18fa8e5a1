//! Core library for orar
//!
//! This crate implements the **Functional Core** of the orar application:
//! it turns the positioned text and rule lines of a weekly timetable page
//! into a normalized schedule (class → day → ordered entries).
//!
//! # Architecture Overview
//!
//! - **`pdf`**: loads a document into [`pdf::PageLayout`]s (atoms + segments)
//! - **`orar_core`** (this crate): pure layout reconstruction, no I/O
//! - **`orar`**: fetching, hashing, persistence, notification and the CLI
//!
//! # Pipeline
//!
//! ```text
//! PageLayout -> PositionIndex -> column boundaries (page-global)
//!                             -> day zones -> row boundaries (zone-local)
//!                                          -> Grid -> HeaderMapping
//!                                          -> entries (SubjectNormalizer per cell)
//!                                          -> Timetable (merged)
//! ```
//!
//! Zone failures stay inside the zone, page failures stay inside the page;
//! only a document where no page yields a day zone is an error.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use orar_core::{Pipeline, PipelineConfig};
//!
//! let pages = pdf::load_pages(&bytes)?;
//! let parsed = Pipeline::new(PipelineConfig::default()).parse_document(&pages)?;
//! for entry in parsed.timetable.schedule.get("9B", "Luni").unwrap_or_default() {
//!     println!("{entry}");
//! }
//! ```

pub mod cluster;
pub mod config;
pub mod error;
pub mod extract;
pub mod grid;
pub mod header;
pub mod index;
pub mod normalize;
pub mod pipeline;
pub mod schedule;
pub mod source;
pub mod state;
pub mod zones;

pub use config::{ColumnPolicy, DayLabel, NormalizerConfig, PipelineConfig, PrefixRewrite};
pub use error::{TimetableError, ZoneError};
pub use pipeline::{PageReport, ParsedDocument, Pipeline, ZoneGrid, ZoneReport};
pub use schedule::{ClassId, DayNotes, Schedule, ScheduleEntry, Timetable};
