use std::time::Duration;

use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

use crate::error::AppError;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job '{job_name}' failed after {attempts} attempt(s): {source}")]
    ExecutionFailed {
        job_name: String,
        attempts: u32,
        #[source]
        source: AppError,
    },

    #[error("Job '{job_name}' timed out after {}s", timeout.as_secs())]
    Timeout { job_name: String, timeout: Duration },

    #[error("Job '{0}' was cancelled")]
    Cancelled(String),

    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("Job already exists: {0}")]
    AlreadyExists(String),

    #[error("Concurrency limit reached for job: {0}")]
    ConcurrencyLimitReached(String),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

pub type JobResult<T> = Result<T, JobError>;
