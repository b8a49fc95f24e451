use super::context::JobContext;
use super::handle::{JobRunStatus, SchedulerHandle, SharedJobState};
use super::job::{BackgroundJob, JobError};
use crate::server::metrics;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Longest the loop sleeps before re-evaluating schedules.
const MAX_SLEEP: Duration = Duration::from_secs(60);

/// Time granted to running jobs on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Manages background job scheduling and execution.
pub struct JobScheduler {
    /// Shared state accessible by SchedulerHandle
    shared_state: Arc<RwLock<SharedJobState>>,

    /// Currently running jobs with their task handles
    running_handles: HashMap<String, JoinHandle<()>>,

    shutdown_token: CancellationToken,

    job_context: JobContext,
}

impl JobScheduler {
    pub fn new(
        shutdown_token: CancellationToken,
        job_context: JobContext,
        shared_state: Arc<RwLock<SharedJobState>>,
    ) -> Self {
        Self {
            shared_state,
            running_handles: HashMap::new(),
            shutdown_token,
            job_context,
        }
    }

    /// Register a job with the scheduler. Jobs whose schedule never fires
    /// are rejected.
    pub async fn register_job(&mut self, job: Arc<dyn BackgroundJob>) -> Result<(), JobError> {
        let job_id = job.id().to_string();
        let Some(next_run) = job.schedule().next_after(chrono::Utc::now()) else {
            return Err(JobError::ExecutionFailed(format!(
                "Job {} has no upcoming run for schedule {:?}",
                job_id,
                job.schedule()
            )));
        };

        info!(
            "Registering job: {} - {} (next run at {})",
            job_id,
            job.description(),
            next_run
        );
        let mut state = self.shared_state.write().await;
        state.next_runs.insert(job_id.clone(), next_run);
        state.jobs.insert(job_id, job);
        Ok(())
    }

    pub async fn job_count(&self) -> usize {
        self.shared_state.read().await.jobs.len()
    }

    /// Main scheduler loop. Returns once the shutdown token is cancelled and
    /// running jobs had their chance to finish.
    pub async fn run(&mut self) {
        let job_count = self.job_count().await;
        info!("Starting job scheduler with {} registered jobs", job_count);

        loop {
            self.cleanup_completed_jobs().await;

            let sleep_duration = self.time_until_next_scheduled_job().await;
            debug!(
                "Scheduler sleeping for {:?} until next scheduled job",
                sleep_duration
            );

            tokio::select! {
                _ = tokio::time::sleep(sleep_duration) => {
                    self.run_due_jobs().await;
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Scheduler received shutdown signal");
                    self.shutdown().await;
                    break;
                }
            }
        }

        info!("Job scheduler stopped");
    }

    async fn time_until_next_scheduled_job(&self) -> Duration {
        let now = chrono::Utc::now();
        let state = self.shared_state.read().await;
        state
            .next_runs
            .values()
            .map(|next_run| (*next_run - now).to_std().unwrap_or(Duration::ZERO))
            .min()
            .unwrap_or(MAX_SLEEP)
            .min(MAX_SLEEP)
    }

    /// Start every due job and move its next run forward. A job still
    /// running from its previous occurrence skips this one.
    async fn run_due_jobs(&mut self) {
        let now = chrono::Utc::now();
        let mut jobs_to_run = Vec::new();

        {
            let mut state = self.shared_state.write().await;
            let due: Vec<(String, Arc<dyn BackgroundJob>)> = state
                .jobs
                .iter()
                .filter(|(job_id, _)| state.next_runs.get(*job_id).is_some_and(|next| *next <= now))
                .map(|(job_id, job)| (job_id.clone(), Arc::clone(job)))
                .collect();

            for (job_id, job) in due {
                match job.schedule().next_after(now) {
                    Some(next) => {
                        state.next_runs.insert(job_id.clone(), next);
                    }
                    None => {
                        warn!("Job {} has no further runs scheduled", job_id);
                        state.next_runs.remove(&job_id);
                    }
                }

                if state.running_jobs.contains(&job_id) {
                    warn!("Skipping scheduled run of {}: still running", job_id);
                    continue;
                }
                jobs_to_run.push(job_id);
            }
        }

        for job_id in jobs_to_run {
            self.spawn_job(&job_id, "schedule").await;
        }
    }

    /// Spawn a job execution task.
    async fn spawn_job(&mut self, job_id: &str, triggered_by: &str) {
        let job = {
            let mut state = self.shared_state.write().await;
            let job = match state.jobs.get(job_id) {
                Some(job) => Arc::clone(job),
                None => {
                    error!("Attempted to spawn unknown job: {}", job_id);
                    return;
                }
            };
            state.record_start(job_id, triggered_by);
            job
        };

        info!("Starting job: {} (triggered_by: {})", job_id, triggered_by);
        metrics::set_background_job_running(job_id, true);

        let ctx = JobContext::new(self.job_context.cancellation_token.child_token());
        let job_id_owned = job_id.to_string();
        let shared_state = Arc::clone(&self.shared_state);

        // Jobs are synchronous, run them on the blocking pool
        let handle = tokio::spawn(async move {
            let start_time = Instant::now();
            let result = tokio::task::spawn_blocking(move || job.execute(&ctx)).await;
            let elapsed = start_time.elapsed();

            let (status, error_msg, status_label) = match result {
                Ok(Ok(())) => {
                    info!(
                        "Job {} completed successfully in {:?}",
                        job_id_owned, elapsed
                    );
                    (JobRunStatus::Completed, None, "success")
                }
                Ok(Err(JobError::Cancelled)) => {
                    info!("Job {} was cancelled after {:?}", job_id_owned, elapsed);
                    (
                        JobRunStatus::Failed,
                        Some("Cancelled".to_string()),
                        "cancelled",
                    )
                }
                Ok(Err(e)) => {
                    error!("Job {} failed after {:?}: {}", job_id_owned, elapsed, e);
                    (JobRunStatus::Failed, Some(e.to_string()), "failed")
                }
                Err(e) => {
                    error!("Job {} panicked after {:?}: {}", job_id_owned, elapsed, e);
                    (
                        JobRunStatus::Failed,
                        Some(format!("Task panic: {}", e)),
                        "panic",
                    )
                }
            };

            metrics::record_background_job_execution(&job_id_owned, status_label, elapsed);
            metrics::set_background_job_running(&job_id_owned, false);

            shared_state
                .write()
                .await
                .record_finish(&job_id_owned, status, error_msg);
        });

        self.running_handles.insert(job_id.to_string(), handle);
    }

    async fn cleanup_completed_jobs(&mut self) {
        let completed: Vec<String> = self
            .running_handles
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(job_id, _)| job_id.clone())
            .collect();

        for job_id in completed {
            if let Some(handle) = self.running_handles.remove(&job_id) {
                let _ = handle.await;
            }
        }
    }

    async fn shutdown(&mut self) {
        info!("Shutting down scheduler...");
        self.job_context.cancellation_token.cancel();

        for (job_id, handle) in self.running_handles.drain() {
            info!("Waiting for job {} to complete...", job_id);
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                warn!("Job {} did not finish within {:?}", job_id, SHUTDOWN_GRACE);
            }
        }

        info!("Scheduler shutdown complete");
    }
}

/// Create a scheduler and its handle.
pub fn create_scheduler(shutdown_token: CancellationToken) -> (JobScheduler, SchedulerHandle) {
    let shared_state = Arc::new(RwLock::new(SharedJobState::default()));
    let job_context = JobContext::new(shutdown_token.child_token());

    let scheduler = JobScheduler::new(shutdown_token, job_context, Arc::clone(&shared_state));
    let handle = SchedulerHandle::new(shared_state);

    (scheduler, handle)
}
