use anyhow::Result;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, metrics::metrics_handler, state::*};
use crate::background_jobs::SchedulerHandle;
use crate::catalog_view::CatalogReader;
use crate::ingestion::{IngestError, RunTrigger};

const DEFAULT_JOB_HISTORY_LIMIT: usize = 20;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug, Default)]
struct AlbumQuery {
    #[serde(default)]
    pub brief: bool,
}

#[derive(Deserialize, Debug, Default)]
struct HistoryQuery {
    pub limit: Option<usize>,
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

// =============================================================================
// Ingestion trigger
// =============================================================================

async fn retrieve_albums(State(pipeline): State<GuardedPipeline>) -> Response {
    let result = tokio::task::spawn_blocking(move || pipeline.run(RunTrigger::Http)).await;

    match result {
        Ok(Ok(_)) => (StatusCode::OK, "Completed.").into_response(),
        Ok(Err(err @ IngestError::RunInProgress)) => {
            (StatusCode::CONFLICT, err.to_string()).into_response()
        }
        Ok(Err(err)) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
        Err(join_err) => {
            error!("Ingestion task did not complete: {}", join_err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Ingestion run aborted unexpectedly",
            )
                .into_response()
        }
    }
}

async fn retrieve_albums_wrong_method() -> Response {
    (StatusCode::BAD_REQUEST, "Please use a POST request.").into_response()
}

// =============================================================================
// Catalog views
// =============================================================================

async fn list_albums(State(catalog): State<CatalogReader>) -> Response {
    match catalog.list_albums() {
        Ok(slugs) => Json(slugs).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err)).into_response(),
    }
}

async fn get_album(
    State(catalog): State<CatalogReader>,
    Path(slug): Path<String>,
    Query(query): Query<AlbumQuery>,
) -> Response {
    match catalog.get_album(&slug, query.brief) {
        Ok(Some(album)) => Json(album).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err)).into_response(),
    }
}

async fn get_artist(
    State(catalog): State<CatalogReader>,
    Path(slug): Path<String>,
) -> Response {
    match catalog.get_artist(&slug) {
        Ok(Some(artist)) => Json(artist).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err)).into_response(),
    }
}

// =============================================================================
// Background jobs
// =============================================================================

fn get_scheduler(
    handle: &OptionalSchedulerHandle,
) -> Result<&SchedulerHandle, (StatusCode, &'static str)> {
    handle
        .as_ref()
        .ok_or((StatusCode::SERVICE_UNAVAILABLE, "Scheduler not enabled"))
}

async fn list_jobs(State(handle): State<OptionalSchedulerHandle>) -> Response {
    match get_scheduler(&handle) {
        Ok(scheduler) => Json(scheduler.list_jobs().await).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn get_job(
    State(handle): State<OptionalSchedulerHandle>,
    Path(job_id): Path<String>,
) -> Response {
    let scheduler = match get_scheduler(&handle) {
        Ok(s) => s,
        Err(e) => return e.into_response(),
    };
    match scheduler.get_job(&job_id).await {
        Some(job) => Json(job).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_job_history(
    State(handle): State<OptionalSchedulerHandle>,
    Path(job_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let scheduler = match get_scheduler(&handle) {
        Ok(s) => s,
        Err(e) => return e.into_response(),
    };
    if scheduler.get_job(&job_id).await.is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    let limit = query.limit.unwrap_or(DEFAULT_JOB_HISTORY_LIMIT);
    Json(scheduler.get_job_history(&job_id, limit).await).into_response()
}

pub fn make_app(state: ServerState) -> Router {
    let ingestion_routes: Router = Router::new()
        .route(
            "/albums/retrieve",
            get(retrieve_albums_wrong_method).post(retrieve_albums),
        )
        .with_state(state.clone());

    let content_routes: Router = Router::new()
        .route("/albums", get(list_albums))
        .route("/album/{slug}", get(get_album))
        .route("/artist/{slug}", get(get_artist))
        .with_state(state.clone());

    let job_routes: Router = Router::new()
        .route("/", get(list_jobs))
        .route("/{id}", get(get_job))
        .route("/{id}/history", get(get_job_history))
        .with_state(state.clone());

    Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/services", ingestion_routes)
        .nest("/v1/content", content_routes)
        .nest("/v1/jobs", job_routes)
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            log_requests,
        ))
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Serves the API and the metrics endpoint until `shutdown` is cancelled.
pub async fn run_server(state: ServerState, shutdown: CancellationToken) -> Result<()> {
    let port = state.config.port;
    let metrics_port = state.config.metrics_port;

    let app = make_app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    let metrics_listener =
        tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port)).await?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    let app_shutdown = shutdown.clone();
    let metrics_shutdown = shutdown.clone();
    tokio::try_join!(
        async {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { app_shutdown.cancelled().await })
                .await
        },
        async {
            axum::serve(metrics_listener, make_metrics_app())
                .with_graceful_shutdown(async move { metrics_shutdown.cancelled().await })
                .await
        },
    )?;

    info!("Server stopped");
    Ok(())
}
