mod file_config;

pub use file_config::{
    FileConfig, SchedulerConfig, ScraperConfig, StaticSourceConfig, StoreConfig,
};

use crate::background_jobs::parse_cron;
use crate::content_store::normalize_path;
use crate::providers::HtmlScraperConfig;
use crate::server::RequestsLoggingLevel;
use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ALBUMS_ROOT: &str = "/content/catalog/albums";
pub const DEFAULT_ARTISTS_ROOT: &str = "/content/catalog/artists";
pub const DEFAULT_SERVICE_IDENTITY: &str = "album-ingest";
/// Mondays at 05:15:00.
pub const DEFAULT_CRON_EXPRESSION: &str = "0 15 5 * * Mon *";
pub const DEFAULT_LISTING_URL: &str = "https://trendybeatz.com/artist-albums";
pub const DEFAULT_ALBUM_LINK_PATTERN: &str = r"trendybeatz\.com/artist-albums/\d+/[\w-]+$";
pub const DEFAULT_TRACK_LINK_PATTERN: &str = r"trendybeatz\.com/download-mp3/\d+/[\w-]+$";
pub const DEFAULT_SCRAPER_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_USER_AGENT: &str = concat!("album-ingest/", env!("CARGO_PKG_VERSION"));

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub content_db: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub content_db: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,

    pub store: StoreSettings,
    pub scheduler: SchedulerSettings,
    pub scraper: ScraperSettings,
    pub static_source_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub albums_root: String,
    pub artists_root: String,
    pub service_identity: String,
    pub bootstrap_roots: bool,
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub cron_expression: String,
}

#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub enabled: bool,
    pub source: HtmlScraperConfig,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let content_db = file
            .content_db
            .map(PathBuf::from)
            .or_else(|| cli.content_db.clone())
            .ok_or_else(|| {
                anyhow!("content_db must be specified via --content-db or in config file")
            })?;
        if let Some(parent) = content_db.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                bail!("Content database directory does not exist: {:?}", parent);
            }
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let store = resolve_store(file.store.unwrap_or_default())?;
        let scheduler = resolve_scheduler(file.scheduler.unwrap_or_default())?;
        let scraper = resolve_scraper(file.scraper.unwrap_or_default())?;
        let static_source_enabled = file
            .static_source
            .and_then(|s| s.enabled)
            .unwrap_or(false);

        Ok(Self {
            content_db,
            port,
            metrics_port,
            logging_level,
            store,
            scheduler,
            scraper,
            static_source_enabled,
        })
    }
}

fn resolve_store(file: StoreConfig) -> Result<StoreSettings> {
    let albums_root = normalize_path(file.albums_root.as_deref().unwrap_or(DEFAULT_ALBUMS_ROOT))
        .context("albums_root must be an absolute path")?;
    let artists_root = normalize_path(file.artists_root.as_deref().unwrap_or(DEFAULT_ARTISTS_ROOT))
        .context("artists_root must be an absolute path")?;
    if albums_root == artists_root {
        bail!("albums_root and artists_root must differ (both are {})", albums_root);
    }

    let service_identity = file
        .service_identity
        .unwrap_or_else(|| DEFAULT_SERVICE_IDENTITY.to_string());
    if service_identity.trim().is_empty() {
        bail!("service_identity must not be blank");
    }

    Ok(StoreSettings {
        albums_root,
        artists_root,
        service_identity,
        bootstrap_roots: file.bootstrap_roots.unwrap_or(true),
    })
}

fn resolve_scheduler(file: SchedulerConfig) -> Result<SchedulerSettings> {
    let cron_expression = file
        .cron_expression
        .unwrap_or_else(|| DEFAULT_CRON_EXPRESSION.to_string());
    parse_cron(&cron_expression).map_err(|e| anyhow!(e))?;

    Ok(SchedulerSettings {
        enabled: file.enabled.unwrap_or(false),
        cron_expression,
    })
}

fn resolve_scraper(file: ScraperConfig) -> Result<ScraperSettings> {
    let compile = |name: &str, pattern: Option<String>, default: &str| -> Result<Regex> {
        let pattern = pattern.unwrap_or_else(|| default.to_string());
        Regex::new(&pattern).with_context(|| format!("Invalid {} '{}'", name, pattern))
    };

    let timeout_ms = file.timeout_ms.unwrap_or(DEFAULT_SCRAPER_TIMEOUT_MS);
    if timeout_ms == 0 {
        bail!("scraper timeout_ms must be greater than 0");
    }

    Ok(ScraperSettings {
        enabled: file.enabled.unwrap_or(true),
        source: HtmlScraperConfig {
            listing_url: file
                .listing_url
                .unwrap_or_else(|| DEFAULT_LISTING_URL.to_string()),
            album_link_pattern: compile(
                "album_link_pattern",
                file.album_link_pattern,
                DEFAULT_ALBUM_LINK_PATTERN,
            )?,
            track_link_pattern: compile(
                "track_link_pattern",
                file.track_link_pattern,
                DEFAULT_TRACK_LINK_PATTERN,
            )?,
            timeout: Duration::from_millis(timeout_ms),
            user_agent: file
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        },
    })
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_with_db(dir: &TempDir) -> CliConfig {
        CliConfig {
            content_db: Some(dir.path().join("content.db")),
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
        }
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("BODY"),
            Some(RequestsLoggingLevel::Body)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::resolve(&cli_with_db(&temp_dir), None).unwrap();

        assert_eq!(config.content_db, temp_dir.path().join("content.db"));
        assert_eq!(config.port, 3001);
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Path);

        assert_eq!(config.store.albums_root, DEFAULT_ALBUMS_ROOT);
        assert_eq!(config.store.artists_root, DEFAULT_ARTISTS_ROOT);
        assert_eq!(config.store.service_identity, "album-ingest");
        assert!(config.store.bootstrap_roots);

        assert!(!config.scheduler.enabled);
        assert_eq!(config.scheduler.cron_expression, DEFAULT_CRON_EXPRESSION);

        assert!(config.scraper.enabled);
        assert_eq!(config.scraper.source.listing_url, DEFAULT_LISTING_URL);
        assert_eq!(config.scraper.source.timeout, Duration::from_millis(10_000));
        assert!(config
            .scraper
            .source
            .album_link_pattern
            .is_match("https://trendybeatz.com/artist-albums/123/some-album"));
        assert!(!config.static_source_enabled);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            port: Some(4000),
            logging_level: Some("body".to_string()),
            store: Some(StoreConfig {
                albums_root: Some("/music/albums/".to_string()),
                ..Default::default()
            }),
            scheduler: Some(SchedulerConfig {
                enabled: Some(true),
                cron_expression: Some("0 */5 * * * * *".to_string()),
            }),
            static_source: Some(StaticSourceConfig { enabled: Some(true) }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli_with_db(&temp_dir), Some(file_config)).unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.metrics_port, 9091);
        // Normalized
        assert_eq!(config.store.albums_root, "/music/albums");
        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler.cron_expression, "0 */5 * * * * *");
        assert!(config.static_source_enabled);
    }

    #[test]
    fn test_resolve_missing_content_db_error() {
        let result = AppConfig::resolve(&CliConfig::default(), None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("content_db must be specified"));
    }

    #[test]
    fn test_resolve_missing_db_directory_error() {
        let cli = CliConfig {
            content_db: Some(PathBuf::from("/nonexistent/dir/content.db")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_relative_root_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            store: Some(StoreConfig {
                artists_root: Some("content/artists".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_with_db(&temp_dir), Some(file_config)).is_err());
    }

    #[test]
    fn test_identical_roots_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            store: Some(StoreConfig {
                albums_root: Some("/content/x".to_string()),
                artists_root: Some("/content/x/".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli_with_db(&temp_dir), Some(file_config)).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_invalid_cron_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            scheduler: Some(SchedulerConfig {
                enabled: Some(true),
                cron_expression: Some("0 15 5 ? * MON *".to_string() + " extra"),
            }),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli_with_db(&temp_dir), Some(file_config)).unwrap_err();
        assert!(err.to_string().contains("Invalid cron expression"));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            scraper: Some(ScraperConfig {
                track_link_pattern: Some("download-mp3/(".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli_with_db(&temp_dir), Some(file_config)).unwrap_err();
        assert!(err.to_string().contains("Invalid track_link_pattern"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            scraper: Some(ScraperConfig {
                timeout_ms: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_with_db(&temp_dir), Some(file_config)).is_err());
    }
}
