//! Scheduled-trigger response bodies.

use serde::Serialize;

use crate::services::MatchReport;
use crate::services::proximity::MatchError;

/// Body of `/api/cron/proximity-alerts`.
///
/// Success flattens the report next to `success`; failure carries the
/// error and whether the caller should try again.
#[derive(Debug, Clone, Serialize)]
pub struct CronRunResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: Option<MatchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<usize>,
}

impl CronRunResponse {
    pub fn success(report: MatchReport) -> Self {
        Self {
            success: true,
            report: Some(report),
            error: None,
            retryable: None,
            processed: None,
        }
    }

    pub fn failure(error: &MatchError) -> Self {
        Self {
            success: false,
            report: None,
            error: Some(error.to_string()),
            retryable: Some(error.is_retryable()),
            processed: Some(0),
        }
    }
}
