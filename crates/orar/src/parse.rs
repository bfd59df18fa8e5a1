use std::path::PathBuf;

use orar_core::{ParsedDocument, Pipeline, PipelineConfig};

use crate::config::AppConfig;
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args)]
pub struct ParseOptions {
    /// Path to the timetable PDF
    pub path: PathBuf,

    /// Print per-page and per-zone diagnostics to stderr
    #[arg(long, env = "ORAR_REPORT")]
    pub report: bool,
}

/// Loads the PDF bytes and runs the reconstruction pipeline.  CPU bound;
/// call from `spawn_blocking` inside async code.
pub fn parse_bytes(bytes: &[u8], config: &PipelineConfig) -> Result<ParsedDocument> {
    let pages = pdf::load_pages(bytes).map_err(|e| eyre!(e))?;
    Pipeline::new(config.clone())
        .parse_document(&pages)
        .map_err(|e| eyre!(e))
}

pub fn print_report(parsed: &ParsedDocument) {
    for page in &parsed.reports {
        if let Some(err) = &page.error {
            eprintln!("page {}: {err}", page.page);
            continue;
        }
        for zone in &page.zones {
            match &zone.error {
                Some(err) => eprintln!("page {} {}: {err}", page.page, zone.day),
                None => eprintln!(
                    "page {} {}: {} rows, {} entries ({:?})",
                    page.page, zone.day, zone.rows, zone.entries, zone.header
                ),
            }
        }
    }
}

pub async fn run(options: ParseOptions, global: crate::Global) -> Result<()> {
    let config = AppConfig::load(global.config.as_deref())?;
    let bytes = std::fs::read(&options.path)
        .with_context(|| f!("Failed to read {}", options.path.display()))?;

    let parsed =
        tokio::task::spawn_blocking(move || parse_bytes(&bytes, &config.pipeline)).await??;

    if options.report || global.verbose {
        print_report(&parsed);
    }
    println!("{}", serde_json::to_string_pretty(&parsed.timetable)?);
    Ok(())
}
