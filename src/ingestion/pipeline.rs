use super::{AlbumReconciler, IngestError, ReconcileReport};
use crate::content_store::ContentStore;
use crate::providers::Aggregator;
use crate::server::metrics;
use std::fmt;
use std::sync::{Arc, Mutex, TryLockError};
use std::time::Instant;
use tracing::{error, info, warn};

/// What started a run. Only used for logs and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunTrigger {
    Http,
    Scheduler,
    Cli,
}

impl RunTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunTrigger::Http => "http",
            RunTrigger::Scheduler => "scheduler",
            RunTrigger::Cli => "cli",
        }
    }
}

impl fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ingestion run: aggregate every source, then reconcile the result in a
/// single store session.
///
/// Runs block and must be called off the async executor. At most one run is
/// in flight per pipeline.
pub struct IngestionPipeline {
    store: Arc<dyn ContentStore>,
    aggregator: Aggregator,
    reconciler: AlbumReconciler,
    service_identity: String,
    run_lock: Mutex<()>,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn ContentStore>,
        aggregator: Aggregator,
        reconciler: AlbumReconciler,
        service_identity: impl Into<String>,
    ) -> Self {
        Self {
            store,
            aggregator,
            reconciler,
            service_identity: service_identity.into(),
            run_lock: Mutex::new(()),
        }
    }

    pub fn run(&self, trigger: RunTrigger) -> Result<ReconcileReport, IngestError> {
        let _guard = match self.run_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                warn!("Ingestion run requested by {} while another is running", trigger);
                return Err(IngestError::RunInProgress);
            }
            // A previous run panicked; the lock guards no data.
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        info!("Starting ingestion run (trigger: {})", trigger);
        let start = Instant::now();
        let result = self.run_locked();
        let elapsed = start.elapsed();

        match &result {
            Ok(report) => {
                info!(
                    "Ingestion run finished in {:?}: {} created, {} updated, {} skipped, {} artists created",
                    elapsed, report.created, report.updated, report.skipped, report.artists_created
                );
                metrics::record_ingestion_run(trigger.as_str(), "success", elapsed);
            }
            Err(err) => {
                error!("Ingestion run failed after {:?}: {}", elapsed, err);
                metrics::record_ingestion_run(trigger.as_str(), "failed", elapsed);
            }
        }
        result
    }

    fn run_locked(&self) -> Result<ReconcileReport, IngestError> {
        let mut session = self.store.open_session(&self.service_identity)?;
        let albums = self.aggregator.collect();
        info!("Collected {} candidate albums", albums.len());
        self.reconciler.reconcile(session.as_mut(), &albums)
    }
}
