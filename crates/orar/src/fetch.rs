use std::time::Duration;

use orar_core::source::discover_pdf_url;

use crate::config::{AppConfig, SourceConfig};
use crate::prelude::*;

/// A downloaded timetable document.
#[derive(Debug, Clone)]
pub struct FetchedSource {
    pub kind: String,
    pub url: String,
    pub bytes: Vec<u8>,
}

pub fn build_client(config: &AppConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}

async fn get(client: &reqwest::Client, url: &str, timeout: u64) -> Result<reqwest::Response> {
    let response = client
        .get(url)
        .timeout(Duration::from_secs(timeout))
        .send()
        .await
        .map_err(|e| Error::Network(f!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::Network(f!("GET {url}: HTTP {}", response.status())).into());
    }
    Ok(response)
}

/// Resolves the current PDF link of `source` and downloads it.
pub async fn fetch_source(
    client: &reqwest::Client,
    config: &AppConfig,
    source: &SourceConfig,
) -> Result<FetchedSource> {
    let html = get(client, &source.listing_url, config.listing_timeout_secs)
        .await?
        .text()
        .await
        .map_err(|e| Error::Network(f!("reading {}: {e}", source.listing_url)))?;

    let url = discover_pdf_url(&html, &source.listing_url, &source.pattern).ok_or_else(|| {
        Error::LinkNotFound {
            url: source.listing_url.clone(),
            pattern: source.pattern.clone(),
        }
    })?;
    log::info!("{}: downloading {url}", source.kind);

    let bytes = get(client, &url, config.download_timeout_secs)
        .await?
        .bytes()
        .await
        .map_err(|e| Error::Network(f!("reading {url}: {e}")))?;

    Ok(FetchedSource {
        kind: source.kind.clone(),
        url,
        bytes: bytes.to_vec(),
    })
}
