use axum::extract::FromRef;

use crate::background_jobs::SchedulerHandle;
use crate::catalog_view::CatalogReader;
use crate::ingestion::IngestionPipeline;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedPipeline = Arc<IngestionPipeline>;
pub type OptionalSchedulerHandle = Option<SchedulerHandle>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub pipeline: GuardedPipeline,
    pub catalog: CatalogReader,
    pub scheduler_handle: OptionalSchedulerHandle,
    pub hash: String,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        pipeline: GuardedPipeline,
        catalog: CatalogReader,
        scheduler_handle: OptionalSchedulerHandle,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            pipeline,
            catalog,
            scheduler_handle,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

impl FromRef<ServerState> for GuardedPipeline {
    fn from_ref(input: &ServerState) -> Self {
        input.pipeline.clone()
    }
}

impl FromRef<ServerState> for CatalogReader {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for OptionalSchedulerHandle {
    fn from_ref(input: &ServerState) -> Self {
        input.scheduler_handle.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
