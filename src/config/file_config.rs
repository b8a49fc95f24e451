use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub content_db: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,

    pub store: Option<StoreConfig>,
    pub scheduler: Option<SchedulerConfig>,
    pub scraper: Option<ScraperConfig>,
    pub static_source: Option<StaticSourceConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub albums_root: Option<String>,
    pub artists_root: Option<String>,
    pub service_identity: Option<String>,
    /// Create missing root collections at startup.
    pub bootstrap_roots: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: Option<bool>,
    /// Seconds-first cron expression, e.g. `0 15 5 * * Mon *`.
    pub cron_expression: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ScraperConfig {
    pub enabled: Option<bool>,
    pub listing_url: Option<String>,
    pub album_link_pattern: Option<String>,
    pub track_link_pattern: Option<String>,
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct StaticSourceConfig {
    pub enabled: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
