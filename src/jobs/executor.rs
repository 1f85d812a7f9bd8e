use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::jobs::error::{JobError, JobResult};
use crate::jobs::models::JobDefinition;
use crate::jobs::types::{JobContext, JobTask};

/// Tracks concurrent job executions in memory
#[derive(Clone, Default)]
pub struct ConcurrencyTracker {
    running: Arc<RwLock<HashMap<String, usize>>>,
}

impl ConcurrencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot for `job`, or return false if it is already running
    /// and does not allow overlap.
    pub async fn try_acquire(&self, job: &JobDefinition) -> bool {
        let mut running = self.running.write().await;
        let count = running.entry(job.job_name.clone()).or_insert(0);
        if *count > 0 && !job.allow_concurrent {
            return false;
        }
        *count += 1;
        true
    }

    pub async fn release(&self, job_name: &str) {
        let mut running = self.running.write().await;
        if let Some(count) = running.get_mut(job_name) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                running.remove(job_name);
            }
        }
    }

    pub async fn running(&self, job_name: &str) -> usize {
        self.running.read().await.get(job_name).copied().unwrap_or(0)
    }
}

/// Executes jobs with retry, timeout, and concurrency control
#[derive(Clone)]
pub struct JobExecutor {
    concurrency: ConcurrencyTracker,
    shutdown_token: CancellationToken,
}

impl JobExecutor {
    pub fn new(shutdown_token: CancellationToken) -> Self {
        Self {
            concurrency: ConcurrencyTracker::new(),
            shutdown_token,
        }
    }

    pub async fn execute_job(&self, job: &JobDefinition, task: Arc<dyn JobTask>) -> JobResult<()> {
        if !self.concurrency.try_acquire(job).await {
            return Err(JobError::ConcurrencyLimitReached(job.job_name.clone()));
        }

        let result = self.execute_with_retry(job, task).await;
        self.concurrency.release(&job.job_name).await;

        result
    }

    async fn execute_with_retry(&self, job: &JobDefinition, task: Arc<dyn JobTask>) -> JobResult<()> {
        let mut attempt = 0;

        loop {
            let execution_id = Uuid::new_v4();
            let start_time = Instant::now();

            let cancellation = self.shutdown_token.child_token();
            let ctx = JobContext {
                execution_id,
                job_name: job.job_name.clone(),
                retry_attempt: attempt,
                cancellation_token: cancellation.clone(),
            };

            let result = tokio::time::timeout(job.timeout, task.execute(ctx)).await;
            let duration_ms = start_time.elapsed().as_millis() as u64;

            match result {
                Ok(Ok(())) => {
                    info!(
                        job_name = %job.job_name,
                        %execution_id,
                        attempt,
                        duration_ms,
                        "Job completed"
                    );
                    return Ok(());
                }
                Ok(Err(_)) if cancellation.is_cancelled() => {
                    info!(
                        job_name = %job.job_name,
                        %execution_id,
                        attempt,
                        duration_ms,
                        "Job interrupted by shutdown"
                    );
                    return Err(JobError::Cancelled(job.job_name.clone()));
                }
                Ok(Err(e)) if e.is_retryable() && attempt < job.max_retries => {
                    let delay = job.retry_delay_for(attempt);
                    warn!(
                        job_name = %job.job_name,
                        %execution_id,
                        attempt,
                        duration_ms,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "Job failed, retrying"
                    );

                    tokio::select! {
                        _ = self.shutdown_token.cancelled() => {
                            return Err(JobError::Cancelled(job.job_name.clone()));
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Ok(Err(e)) => {
                    return Err(JobError::ExecutionFailed {
                        job_name: job.job_name.clone(),
                        attempts: attempt + 1,
                        source: e,
                    });
                }
                Err(_) => {
                    return Err(JobError::Timeout {
                        job_name: job.job_name.clone(),
                        timeout: job.timeout,
                    });
                }
            }
        }
    }
}
