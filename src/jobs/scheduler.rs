use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler as TokioCronScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::jobs::error::{JobError, JobResult};
use crate::jobs::executor::JobExecutor;
use crate::jobs::models::JobDefinition;
use crate::jobs::registry::JobRegistry;
use crate::jobs::types::JobTask;

/// Wrapper around tokio-cron-scheduler running the registered jobs
pub struct JobScheduler {
    scheduler: Arc<Mutex<TokioCronScheduler>>,
    executor: Arc<JobExecutor>,
    registry: Arc<JobRegistry>,
    shutdown_token: CancellationToken,
}

impl JobScheduler {
    pub async fn new(registry: JobRegistry) -> JobResult<Self> {
        let scheduler = TokioCronScheduler::new().await?;
        let shutdown_token = CancellationToken::new();

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            executor: Arc::new(JobExecutor::new(shutdown_token.clone())),
            registry: Arc::new(registry),
            shutdown_token,
        })
    }

    /// Schedule every registered job and start ticking
    pub async fn start(&self) -> JobResult<()> {
        for (definition, task) in self.registry.jobs() {
            self.schedule_job(definition.clone(), Arc::clone(task)).await?;
        }

        self.scheduler.lock().await.start().await?;
        info!(jobs = self.registry.len(), "Job scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully; pending retries are abandoned
    pub async fn stop(&self) -> JobResult<()> {
        self.shutdown_token.cancel();
        self.scheduler.lock().await.shutdown().await?;
        info!("Job scheduler stopped");
        Ok(())
    }

    async fn schedule_job(&self, job: JobDefinition, task: Arc<dyn JobTask>) -> JobResult<()> {
        let cron_job = build_cron_job(job, task, Arc::clone(&self.executor))?;
        self.scheduler.lock().await.add(cron_job).await?;
        Ok(())
    }
}

fn build_cron_job(
    job: JobDefinition,
    task: Arc<dyn JobTask>,
    executor: Arc<JobExecutor>,
) -> JobResult<Job> {
    let expression = job.cron_expression.clone();

    Job::new_async(expression.as_str(), move |_uuid, _lock| {
        let executor = Arc::clone(&executor);
        let task = Arc::clone(&task);
        let job = job.clone();

        Box::pin(async move {
            if let Err(e) = executor.execute_job(&job, task).await {
                error!(job_name = %job.job_name, error = %e, "Job execution failed");
            }
        })
    })
    .map_err(|e| JobError::InvalidCronExpression {
        expression,
        reason: e.to_string(),
    })
}
