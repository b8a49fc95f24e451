//! Periodic album retrieval.
//!
//! Runs the ingestion pipeline on the configured cron schedule. Failures are
//! only logged and kept in the job history; the next occurrence runs as usual.

use crate::background_jobs::{BackgroundJob, JobContext, JobError, JobSchedule};
use crate::ingestion::{IngestError, IngestionPipeline, RunTrigger};
use std::sync::Arc;
use tracing::info;

pub struct AlbumRetrievalJob {
    pipeline: Arc<IngestionPipeline>,
    cron_expression: String,
}

impl AlbumRetrievalJob {
    pub fn new(pipeline: Arc<IngestionPipeline>, cron_expression: impl Into<String>) -> Self {
        Self {
            pipeline,
            cron_expression: cron_expression.into(),
        }
    }
}

impl BackgroundJob for AlbumRetrievalJob {
    fn id(&self) -> &'static str {
        "album_retrieval"
    }

    fn name(&self) -> &'static str {
        "Album Retrieval"
    }

    fn description(&self) -> &'static str {
        "Fetch albums from all configured sources into the catalog"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::Cron(self.cron_expression.clone())
    }

    fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        if ctx.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        match self.pipeline.run(RunTrigger::Scheduler) {
            Ok(report) => {
                info!(
                    "Scheduled album retrieval done: {} created, {} updated",
                    report.created, report.updated
                );
                Ok(())
            }
            Err(IngestError::RunInProgress) => Err(JobError::AlreadyRunning),
            Err(e) => Err(JobError::ExecutionFailed(e.to_string())),
        }
    }
}
