use std::time::Duration;

use serde::Serialize;

use crate::config::JobsConfig;

/// A recurring job: what to run, when, and how failures are handled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDefinition {
    pub job_name: String,
    pub cron_expression: String,
    /// Overlapping runs of the same job are rejected when false
    pub allow_concurrent: bool,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub retry_backoff_multiplier: f64,
    pub timeout: Duration,
}

impl JobDefinition {
    /// Build a non-concurrent definition using the retry policy from `jobs`.
    pub fn new(
        job_name: impl Into<String>,
        cron_expression: impl Into<String>,
        jobs: &JobsConfig,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            cron_expression: cron_expression.into(),
            allow_concurrent: false,
            max_retries: jobs.max_retries,
            retry_delay: Duration::from_secs(jobs.retry_delay),
            retry_backoff_multiplier: jobs.retry_backoff_multiplier,
            timeout: Duration::from_secs(jobs.job_timeout),
        }
    }

    /// Delay before retry number `attempt + 1`
    pub fn retry_delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let seconds =
            self.retry_delay.as_secs_f64() * self.retry_backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }
}
