//! Page and document level orchestration of the reconstruction steps.

use pdf::PageLayout;

use crate::cluster::{column_boundaries, row_boundaries};
use crate::config::PipelineConfig;
use crate::error::{TimetableError, ZoneError};
use crate::extract::extract_zone;
use crate::grid::{assemble_grid, Grid};
use crate::header::{resolve_header, HeaderStrategy};
use crate::index::PositionIndex;
use crate::normalize::SubjectNormalizer;
use crate::schedule::Timetable;
use crate::zones::{find_day_zones, DayZone};

/// One day zone with its row boundaries and assembled grid.
#[derive(Debug, Clone)]
pub struct ZoneGrid {
    pub zone: DayZone,
    pub rows: Vec<f64>,
    pub grid: Grid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneReport {
    pub day: String,
    pub rows: usize,
    pub header: Option<HeaderStrategy>,
    pub entries: usize,
    pub error: Option<ZoneError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    pub page: usize,
    pub zones: Vec<ZoneReport>,
    pub error: Option<TimetableError>,
}

#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub timetable: Timetable,
    pub report: PageReport,
}

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub timetable: Timetable,
    pub reports: Vec<PageReport>,
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    normalizer: SubjectNormalizer,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let normalizer = SubjectNormalizer::new(config.normalizer.clone());
        Pipeline { config, normalizer }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Column boundaries of the page and one grid per day zone.
    pub fn zone_grids(
        &self,
        page: &PageLayout,
    ) -> Result<(Vec<f64>, Vec<ZoneGrid>), TimetableError> {
        let index = PositionIndex::new(page);
        let zones = find_day_zones(&index, &self.config)?;
        let columns = column_boundaries(&index, &self.config)?;
        log::debug!(
            "page {}: {} day zones, {} column boundaries",
            page.number,
            zones.len(),
            columns.len()
        );

        let grids = zones
            .into_iter()
            .map(|zone| {
                let rows = row_boundaries(&index, &zone, &self.config);
                let atoms = index.atoms_in_band(zone.top, zone.bottom);
                let grid = assemble_grid(&atoms, &columns, &rows, &self.config);
                ZoneGrid { zone, rows, grid }
            })
            .collect();
        Ok((columns, grids))
    }

    fn parse_zone(&self, zone: &ZoneGrid) -> (Timetable, ZoneReport) {
        let mut report = ZoneReport {
            day: zone.zone.name.clone(),
            rows: zone.rows.len(),
            header: None,
            entries: 0,
            error: None,
        };

        if zone.grid.is_empty() {
            report.error = Some(ZoneError::InsufficientRowBoundaries {
                found: zone.rows.len(),
                required: self.config.min_row_boundaries,
            });
            return (Timetable::default(), report);
        }

        match resolve_header(&zone.grid, &self.config) {
            Ok(mapping) => {
                let timetable = extract_zone(
                    &zone.grid,
                    &mapping,
                    &zone.zone.name,
                    &self.normalizer,
                    &self.config.class_order,
                );
                report.header = Some(mapping.strategy());
                report.entries = timetable.schedule.entry_count();
                (timetable, report)
            }
            Err(err) => {
                report.error = Some(err);
                (Timetable::default(), report)
            }
        }
    }

    /// Parses one page.  Zone failures are recorded in the report and do not
    /// affect the other zones.
    pub fn parse_page(&self, page: &PageLayout) -> PageOutcome {
        let mut timetable = Timetable::default();
        let mut report = PageReport {
            page: page.number,
            zones: Vec::new(),
            error: None,
        };

        match self.zone_grids(page) {
            Ok((_, zones)) => {
                for zone in &zones {
                    let (partial, zone_report) = self.parse_zone(zone);
                    if let Some(err) = &zone_report.error {
                        log::warn!("page {} {}: {err}", page.number, zone_report.day);
                    }
                    timetable.merge(partial);
                    report.zones.push(zone_report);
                }
            }
            Err(err) => {
                log::warn!("page {}: {err}", page.number);
                report.error = Some(err);
            }
        }

        PageOutcome { timetable, report }
    }

    /// Parses every page and merges the results in page order.
    ///
    /// Fails only when no page could be parsed; the first page error is
    /// returned then.
    pub fn parse_document(&self, pages: &[PageLayout]) -> Result<ParsedDocument, TimetableError> {
        let mut timetable = Timetable::default();
        let mut reports = Vec::with_capacity(pages.len());
        let mut first_error = None;
        let mut parsed_pages = 0;

        for page in pages {
            let outcome = self.parse_page(page);
            match &outcome.report.error {
                Some(err) => {
                    first_error.get_or_insert_with(|| err.clone());
                }
                None => parsed_pages += 1,
            }
            timetable.merge(outcome.timetable);
            reports.push(outcome.report);
        }

        if parsed_pages == 0 {
            return Err(first_error.unwrap_or(TimetableError::MissingDayAnchors));
        }
        log::info!(
            "parsed {parsed_pages}/{} pages, {} classes, {} entries",
            pages.len(),
            timetable.schedule.classes().count(),
            timetable.schedule.entry_count()
        );
        Ok(ParsedDocument { timetable, reports })
    }
}
