//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own content store and its own
//! fixture site to scrape.

use super::constants::*;
use super::fixtures::{FixtureSite, ALBUM_LINK_PATTERN, TRACK_LINK_PATTERN};
use album_ingest_server::background_jobs::{create_scheduler, jobs::AlbumRetrievalJob};
use album_ingest_server::catalog_view::CatalogReader;
use album_ingest_server::content_store::{bootstrap_collection, ContentStore, SqliteContentStore};
use album_ingest_server::ingestion::{AlbumReconciler, IngestionPipeline};
use album_ingest_server::providers::{Aggregator, HtmlScraperConfig, HtmlScraperSource};
use album_ingest_server::server::{make_app, state::ServerState, RequestsLoggingLevel, ServerConfig};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Test server instance with an isolated content store
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Content store for direct inspection in tests
    pub store: Arc<dyn ContentStore>,

    // Private fields - keep resources alive until drop
    _site: FixtureSite,
    _temp_db_dir: TempDir,
    _shutdown_token: CancellationToken,
}

impl TestServer {
    /// Spawns a new test server on a random port, with both content roots
    /// in place
    pub async fn spawn() -> Self {
        Self::spawn_with_roots(true).await
    }

    /// Spawns a new test server, optionally without the content roots
    ///
    /// This function:
    /// 1. Starts a fixture site for the scraper source
    /// 2. Creates a temporary SQLite content store
    /// 3. Registers the album retrieval job (the scheduler loop is not started)
    /// 4. Binds to a random port (127.0.0.1:0)
    /// 5. Spawns the server in a background task
    /// 6. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if any of the steps above fails.
    pub async fn spawn_with_roots(bootstrap_roots: bool) -> Self {
        let site = FixtureSite::spawn().await;

        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let store: Arc<dyn ContentStore> = Arc::new(
            SqliteContentStore::new(temp_db_dir.path().join("content.db"))
                .expect("Failed to open content store"),
        );
        if bootstrap_roots {
            for root in [ALBUMS_ROOT, ARTISTS_ROOT] {
                bootstrap_collection(store.as_ref(), SERVICE_IDENTITY, root)
                    .expect("Failed to bootstrap content root");
            }
        }

        let scraper = HtmlScraperSource::new(HtmlScraperConfig {
            listing_url: site.listing_url(),
            album_link_pattern: Regex::new(ALBUM_LINK_PATTERN).unwrap(),
            track_link_pattern: Regex::new(TRACK_LINK_PATTERN).unwrap(),
            timeout: Duration::from_millis(SCRAPER_TIMEOUT_MS),
            user_agent: "album-ingest-tests".to_string(),
        });
        let pipeline = Arc::new(IngestionPipeline::new(
            store.clone(),
            Aggregator::new(vec![Arc::new(scraper)]),
            AlbumReconciler::new(ALBUMS_ROOT, ARTISTS_ROOT),
            SERVICE_IDENTITY,
        ));

        let shutdown_token = CancellationToken::new();
        let (mut scheduler, scheduler_handle) = create_scheduler(shutdown_token.clone());
        scheduler
            .register_job(Arc::new(AlbumRetrievalJob::new(
                pipeline.clone(),
                "0 15 5 * * Mon *",
            )))
            .await
            .expect("Failed to register job");

        let catalog = CatalogReader::new(store.clone(), ALBUMS_ROOT, ARTISTS_ROOT, "reader");

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            metrics_port: 0,
        };
        let app = make_app(ServerState::new(
            config,
            pipeline,
            catalog,
            Some(scheduler_handle),
        ));

        // Spawn server in background task with graceful shutdown
        let server_token = shutdown_token.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { server_token.cancelled().await })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            store,
            _site: site,
            _temp_db_dir: temp_db_dir,
            _shutdown_token: shutdown_token,
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }

    /// Number of children under a content root, read straight from the store
    pub fn count_children(&self, root: &str) -> usize {
        let session = self
            .store
            .open_session("inspector")
            .expect("Failed to open session");
        match session.resolve(root).expect("Failed to resolve root") {
            Some(entry) => session
                .list_children(&entry)
                .expect("Failed to list children")
                .len(),
            None => 0,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self._shutdown_token.cancel();
    }
}
