use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppResult;

/// Job execution context passed to tasks
#[derive(Debug, Clone)]
pub struct JobContext {
    pub execution_id: Uuid,
    pub job_name: String,
    pub retry_attempt: u32,
    pub cancellation_token: CancellationToken,
}

/// Trait that all job tasks must implement
#[async_trait]
pub trait JobTask: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this task type
    fn task_type() -> &'static str
    where
        Self: Sized;

    /// Execute the task. Errors for which [`crate::error::AppError::is_retryable`]
    /// holds are retried by the executor.
    async fn execute(&self, ctx: JobContext) -> AppResult<()>;

    /// Optional description
    fn description(&self) -> Option<String> {
        None
    }
}
