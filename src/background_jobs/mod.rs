//! Background job scheduling and execution.
//!
//! Jobs run on a cron schedule, on the blocking thread pool,
//! and never overlap with themselves. Run history is kept in memory.

mod context;
mod handle;
mod job;
pub mod jobs;
mod scheduler;

pub use context::JobContext;
pub use handle::{JobInfo, JobRunInfo, JobRunStatus, SchedulerHandle};
pub use job::{parse_cron, BackgroundJob, JobError, JobSchedule};
pub use scheduler::{create_scheduler, JobScheduler};
