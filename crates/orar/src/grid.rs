use std::path::PathBuf;

use colored::Colorize;
use orar_core::{Pipeline, ZoneGrid};
use prettytable::{Cell, Row};

use crate::config::AppConfig;
use crate::prelude::{println, *};

#[derive(Debug, clap::Args)]
pub struct GridOptions {
    /// Path to the timetable PDF
    pub path: PathBuf,

    /// Only show this page (1-based)
    #[arg(long)]
    pub page: Option<usize>,

    /// Truncate cell text to this many characters
    #[arg(long, default_value = "14")]
    pub width: usize,
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        f!("{cut}…")
    }
}

fn zone_table(zone: &ZoneGrid, width: usize) -> prettytable::Table {
    let mut table = new_table();
    let mut header = vec![Cell::new("#")];
    header.extend((0..zone.grid.cols()).map(|c| Cell::new(&c.to_string())));
    table.set_titles(Row::new(header));

    for (r, row) in zone.grid.iter_rows().enumerate() {
        let mut cells = vec![Cell::new(&r.to_string())];
        cells.extend(row.iter().map(|text| Cell::new(&truncate(text, width))));
        table.add_row(Row::new(cells));
    }
    table
}

/// Prints the grid of every day zone, for checking how a layout is read.
pub async fn run(options: GridOptions, global: crate::Global) -> Result<()> {
    let config = AppConfig::load(global.config.as_deref())?;
    let pages = pdf::load_file(&options.path)
        .with_context(|| f!("Failed to load {}", options.path.display()))?;
    let pipeline = Pipeline::new(config.pipeline);

    for page in pages
        .iter()
        .filter(|p| options.page.map_or(true, |n| n == p.number))
    {
        println!("{}", f!("Page {}", page.number).bold());
        let (columns, zones) = match pipeline.zone_grids(page) {
            Ok(grids) => grids,
            Err(err) => {
                println!("  {}", err.to_string().red());
                continue;
            }
        };
        let columns: Vec<String> = columns.iter().map(|x| f!("{x:.1}")).collect();
        println!("  columns: {}", columns.join(" "));

        for zone in &zones {
            println!(
                "\n  {} [{:.1}..{:.1}] {} row boundaries",
                zone.zone.name.green(),
                zone.zone.top,
                zone.zone.bottom,
                zone.rows.len()
            );
            if zone.grid.is_empty() {
                println!("  {}", "no grid".yellow());
                continue;
            }
            zone_table(zone, options.width).printstd();
        }
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Math", 14), "Math");
        assert_eq!(truncate("Matematica aplicata", 6), "Matem…");
    }
}
