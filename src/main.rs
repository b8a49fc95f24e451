use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use album_ingest_server::background_jobs::{create_scheduler, jobs::AlbumRetrievalJob};
use album_ingest_server::catalog_view::CatalogReader;
use album_ingest_server::config::{AppConfig, CliConfig, FileConfig};
use album_ingest_server::content_store::{bootstrap_collection, ContentStore, SqliteContentStore};
use album_ingest_server::ingestion::{AlbumReconciler, IngestionPipeline, RunTrigger};
use album_ingest_server::providers::{Aggregator, AlbumSource, HtmlScraperSource, StaticAlbumSource};
use album_ingest_server::server::{self, state::ServerState, ServerConfig};
use album_ingest_server::{run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite content store database file.
    #[clap(long, value_parser = parse_path)]
    pub content_db: Option<PathBuf>,

    /// Path to a TOML configuration file. Its values override the CLI ones.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Run the ingestion pipeline once and exit instead of serving.
    #[clap(long)]
    pub run_once: bool,
}

fn build_sources(config: &AppConfig) -> Vec<Arc<dyn AlbumSource>> {
    let mut sources: Vec<Arc<dyn AlbumSource>> = Vec::new();
    if config.scraper.enabled {
        info!(
            "Scraper source enabled for {}",
            config.scraper.source.listing_url
        );
        sources.push(Arc::new(HtmlScraperSource::new(
            config.scraper.source.clone(),
        )));
    }
    if config.static_source_enabled {
        info!("Static placeholder source enabled");
        sources.push(Arc::new(StaticAlbumSource::placeholder()));
    }
    if sources.is_empty() {
        warn!("No album sources enabled, runs will not ingest anything");
    }
    sources
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        content_db: cli_args.content_db.clone(),
        port: cli_args.port,
        metrics_port: cli_args.metrics_port,
        logging_level: cli_args.logging_level.clone(),
    };
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Initializing metrics...");
    server::metrics::init_metrics();

    info!(
        "Opening SQLite content store at {:?}...",
        app_config.content_db
    );
    let store: Arc<dyn ContentStore> = Arc::new(SqliteContentStore::new(&app_config.content_db)?);

    let store_settings = &app_config.store;
    if store_settings.bootstrap_roots {
        for root in [&store_settings.albums_root, &store_settings.artists_root] {
            bootstrap_collection(store.as_ref(), &store_settings.service_identity, root)
                .with_context(|| format!("Failed to bootstrap content root {}", root))?;
        }
    }

    let pipeline = Arc::new(IngestionPipeline::new(
        store.clone(),
        Aggregator::new(build_sources(&app_config)),
        AlbumReconciler::new(&store_settings.albums_root, &store_settings.artists_root),
        store_settings.service_identity.clone(),
    ));

    if cli_args.run_once {
        let run_pipeline = pipeline.clone();
        let report = tokio::task::spawn_blocking(move || run_pipeline.run(RunTrigger::Cli)).await??;
        info!(
            "Done: {} created, {} updated, {} skipped, {} artists created",
            report.created, report.updated, report.skipped, report.artists_created
        );
        return Ok(());
    }

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
        signal_token.cancel();
    });

    let mut scheduler_task = None;
    let scheduler_handle = if app_config.scheduler.enabled {
        let (mut scheduler, handle) = create_scheduler(shutdown_token.clone());
        scheduler
            .register_job(Arc::new(AlbumRetrievalJob::new(
                pipeline.clone(),
                app_config.scheduler.cron_expression.clone(),
            )))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to register album retrieval job: {}", e))?;
        scheduler_task = Some(tokio::spawn(async move { scheduler.run().await }));
        Some(handle)
    } else {
        info!("Scheduler disabled, albums are retrieved on demand only");
        None
    };

    let catalog = CatalogReader::new(
        store,
        &store_settings.albums_root,
        &store_settings.artists_root,
        &store_settings.service_identity,
    );
    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
    };
    let state = ServerState::new(server_config, pipeline, catalog, scheduler_handle);

    let result = run_server(state, shutdown_token.clone()).await;
    shutdown_token.cancel();
    if let Some(task) = scheduler_task {
        if let Err(e) = task.await {
            error!("Scheduler task failed: {}", e);
        }
    }
    result
}
