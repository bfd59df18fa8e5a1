use std::path::{Path, PathBuf};

use colored::Colorize;
use orar_core::state::{content_hash, SourceInfo, TimetableState};

use crate::config::AppConfig;
use crate::fetch::{build_client, fetch_source, FetchedSource};
use crate::notify::{change_message, notify};
use crate::parse::parse_bytes;
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args)]
pub struct SyncOptions {
    /// Re-parse sources even when the PDF hash did not change
    #[arg(long, env = "ORAR_FORCE")]
    pub force: bool,

    /// Override the output path from the config file
    #[arg(short, long, env = "ORAR_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Skip the webhook notification
    #[arg(long, env = "ORAR_NO_NOTIFY")]
    pub no_notify: bool,
}

pub fn load_state(path: &Path) -> Result<TimetableState> {
    if !path.exists() {
        return Ok(TimetableState::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| f!("Failed to read state {}", path.display()))?;
    TimetableState::from_json(&raw).with_context(|| f!("Invalid state file {}", path.display()))
}

pub fn write_state(path: &Path, state: &TimetableState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| f!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, state.to_json_pretty()?)
        .with_context(|| f!("Failed to write state {}", path.display()))
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M").to_string()
}

/// Parses one downloaded source and folds it into `state`.  Returns whether
/// the state changed.
async fn apply_source(
    state: &mut TimetableState,
    fetched: FetchedSource,
    config: &AppConfig,
    force: bool,
) -> Result<bool> {
    let hash = content_hash(&fetched.bytes);
    if !force && state.is_unchanged(&fetched.kind, &hash) {
        log::info!("{}: unchanged ({})", fetched.kind, &hash[..12]);
        return Ok(false);
    }

    let pipeline = config.pipeline.clone();
    let bytes = fetched.bytes;
    let parsed = tokio::task::spawn_blocking(move || parse_bytes(&bytes, &pipeline)).await??;

    let info = SourceInfo {
        source_pdf: fetched.url,
        pdf_hash: hash,
    };
    Ok(state.apply_update(&fetched.kind, info, parsed.timetable, timestamp()))
}

/// Fetch every source, parse what changed, persist and notify.
pub async fn run(options: SyncOptions, global: crate::Global) -> Result<()> {
    let config = AppConfig::load(global.config.as_deref())?;
    if config.sources.is_empty() {
        return Err(Error::Config("no sources configured".into()).into());
    }
    let output = options.output.unwrap_or_else(|| config.output.clone());
    let mut state = load_state(&output)?;
    let client = build_client(&config)?;

    let results = futures::future::join_all(
        config
            .sources
            .iter()
            .map(|source| fetch_source(&client, &config, source)),
    )
    .await;

    let mut changed = Vec::new();
    for (source, result) in config.sources.iter().zip(results) {
        let fetched = match result {
            Ok(fetched) => fetched,
            Err(err) => {
                eprintln!("{} {}: {err:#}", "✗".red(), source.kind);
                continue;
            }
        };
        match apply_source(&mut state, fetched, &config, options.force).await {
            Ok(true) => {
                println!("{} {} updated", "✓".green(), source.kind);
                changed.push(source.kind.clone());
            }
            Ok(false) => println!("{} {} unchanged", "•".dimmed(), source.kind),
            Err(err) => eprintln!("{} {}: {err:#}, keeping previous data", "✗".red(), source.kind),
        }
    }

    if changed.is_empty() {
        return Ok(());
    }

    write_state(&output, &state)?;
    println!("Wrote {}", output.display());

    if let (Some(webhook), false) = (&config.webhook, options.no_notify) {
        let text = change_message(&changed, &state.updated_at);
        if let Err(err) = notify(&client, webhook, &text).await {
            log::warn!("notification failed: {err:#}");
        }
    }
    Ok(())
}
