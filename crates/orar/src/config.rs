use std::path::{Path, PathBuf};

use orar_core::PipelineConfig;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// One timetable document to track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Key under which the source is stored, e.g. `liceu`.
    pub kind: String,
    /// Page that links to the current PDF.
    pub listing_url: String,
    /// Case-insensitive fragment the PDF link must contain.
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the timetable state JSON is written.
    pub output: PathBuf,
    pub user_agent: String,
    pub listing_timeout_secs: u64,
    pub download_timeout_secs: u64,
    /// Webhook that receives `{"text": ...}` when a timetable changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    pub sources: Vec<SourceConfig>,
    pub pipeline: PipelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            output: PathBuf::from("orar.json"),
            user_agent: f!("orar/{}", env!("CARGO_PKG_VERSION")),
            listing_timeout_secs: 30,
            download_timeout_secs: 60,
            webhook: None,
            sources: Vec::new(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// `<config dir>/orar/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs_next::config_dir()
            .ok_or_eyre("Unable to determine config directory")?
            .join("orar")
            .join("config.toml"))
    }

    /// Loads the config from `path`, or from [`AppConfig::default_path`].
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| f!("Failed to read config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| f!("Invalid config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()).into())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orar_core::ColumnPolicy;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            output = "/srv/orar/orar.json"
            webhook = "https://hooks.example/abc"

            [[sources]]
            kind = "liceu"
            listing_url = "https://school.example/orar"
            pattern = "orar_liceu"

            [pipeline]
            classes_per_page = 12
            column_policy = "strict"
            "#,
        )
        .unwrap();

        assert_eq!(config.output, PathBuf::from("/srv/orar/orar.json"));
        assert_eq!(config.webhook.as_deref(), Some("https://hooks.example/abc"));
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].kind, "liceu");
        assert_eq!(config.pipeline.classes_per_page, 12);
        assert_eq!(config.pipeline.column_policy, ColumnPolicy::Strict);
        assert_eq!(config.pipeline.cluster_tolerance, 1.5);
        assert_eq!(config.download_timeout_secs, 60);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let raw = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&raw).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AppConfig::from_toml("sources = 3").unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Config(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "listing_timeout_secs = 5\n").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.listing_timeout_secs, 5);
    }
}
