use std::fmt;

use async_trait::async_trait;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::jobs::types::{JobContext, JobTask};
use crate::services::ProximityMatcher;

/// Runs one proximity matching pass per scheduled tick.
pub struct ProximityAlertTask {
    matcher: ProximityMatcher,
}

impl ProximityAlertTask {
    pub const JOB_NAME: &'static str = "proximity_alerts";

    pub fn new(matcher: ProximityMatcher) -> Self {
        Self { matcher }
    }
}

impl fmt::Debug for ProximityAlertTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProximityAlertTask")
            .field("lookback", &self.matcher.lookback())
            .finish()
    }
}

#[async_trait]
impl JobTask for ProximityAlertTask {
    fn task_type() -> &'static str {
        Self::JOB_NAME
    }

    async fn execute(&self, ctx: JobContext) -> AppResult<()> {
        // fetch failures are transient, so they surface as retryable
        let report = tokio::select! {
            _ = ctx.cancellation_token.cancelled() => {
                info!(execution_id = %ctx.execution_id, "Proximity alert job interrupted");
                return Err(anyhow::anyhow!("proximity pass interrupted by shutdown").into());
            }
            outcome = self.matcher.run() => {
                outcome.map_err(|e| AppError::from(anyhow::Error::new(e)))?
            }
        };

        info!(
            execution_id = %ctx.execution_id,
            retry_attempt = ctx.retry_attempt,
            jobs_checked = report.jobs_checked,
            alerts_checked = report.alerts_checked,
            notifications_sent = report.notifications_sent,
            notifications_failed = report.notifications_failed,
            distance_unavailable = report.distance_unavailable,
            "Proximity alert job finished"
        );

        Ok(())
    }

    fn description(&self) -> Option<String> {
        Some(format!(
            "Notify alert owners about postings created in the last {} minutes",
            self.matcher.lookback().as_secs() / 60
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use jiff::Timestamp;
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    use super::*;
    use crate::models::{AlertSubscription, JobPosting, NewNotification};
    use crate::services::proximity::{HaversineDistance, MatchingStore};

    struct EmptyStore {
        healthy: bool,
        stalled: bool,
    }

    #[async_trait]
    impl MatchingStore for EmptyStore {
        async fn recent_active_postings(&self, _since: Timestamp) -> AppResult<Vec<JobPosting>> {
            if self.stalled {
                std::future::pending::<()>().await;
            }
            if self.healthy {
                Ok(Vec::new())
            } else {
                Err(AppError::ConnectionPool {
                    source: anyhow::anyhow!("pool exhausted"),
                })
            }
        }

        async fn active_alerts(&self) -> AppResult<Vec<AlertSubscription>> {
            Ok(Vec::new())
        }

        async fn insert_notification(&self, _notification: NewNotification) -> AppResult<()> {
            Ok(())
        }
    }

    fn task(healthy: bool) -> ProximityAlertTask {
        task_with(EmptyStore {
            healthy,
            stalled: false,
        })
    }

    fn task_with(store: EmptyStore) -> ProximityAlertTask {
        ProximityAlertTask::new(ProximityMatcher::new(
            Arc::new(store),
            Arc::new(HaversineDistance),
            Duration::from_secs(600),
        ))
    }

    fn ctx() -> JobContext {
        JobContext {
            execution_id: Uuid::new_v4(),
            job_name: ProximityAlertTask::JOB_NAME.to_string(),
            retry_attempt: 0,
            cancellation_token: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn test_empty_pass_succeeds() {
        assert!(task(true).execute(ctx()).await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_retryable() {
        let err = task(false).execute(ctx()).await.unwrap_err();

        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_stalled_pass() {
        let task = task_with(EmptyStore {
            healthy: true,
            stalled: true,
        });
        let ctx = ctx();
        let token = ctx.cancellation_token.clone();

        let handle = tokio::spawn(async move { task.execute(ctx).await });
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!handle.is_finished());

        token.cancel();
        let err = handle.await.unwrap().unwrap_err();
        assert!(
            matches!(err, AppError::Internal { ref source } if source.to_string().contains("interrupted"))
        );
    }

    #[test]
    fn test_description_mentions_lookback() {
        let description = task(true).description().unwrap();

        assert!(description.contains("10 minutes"));
    }
}
