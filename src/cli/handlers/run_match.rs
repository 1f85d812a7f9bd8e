//! Match command handler
//!
//! One proximity matching pass, outside the scheduler, with the same JSON
//! body the cron endpoint returns.

use jiff::Timestamp;
use tracing::Instrument;

use crate::api::dto::CronRunResponse;
use crate::config::Settings;
use crate::db::establish_async_connection_pool;
use crate::error::{AppError, AppResult};
use crate::services::proximity::MatchError;
use crate::services::{MatchReport, ProximityMatcher};
use crate::state::AppState;

/// Handler for the match command
pub struct MatchCommandHandler {
    config: Settings,
}

impl MatchCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Run one pass at `at` (default: now) and print the report.
    ///
    /// A failed pass still prints its failure body before returning the error.
    pub async fn execute(&self, at: Option<Timestamp>) -> AppResult<MatchReport> {
        self.config.database.validate()?;

        let pool = establish_async_connection_pool(&self.config.database).await?;
        let state = AppState::new(pool, &self.config);

        let outcome = run_pass(&state.services.matcher, at.unwrap_or_else(Timestamp::now)).await;
        println!("{}", render(&outcome)?);

        outcome.map_err(|e| AppError::from(anyhow::Error::new(e)))
    }
}

async fn run_pass(matcher: &ProximityMatcher, now: Timestamp) -> Result<MatchReport, MatchError> {
    let span = tracing::info_span!("match_command", %now);
    matcher.run_at(now).instrument(span).await
}

fn render(outcome: &Result<MatchReport, MatchError>) -> AppResult<String> {
    let body = match outcome {
        Ok(report) => CronRunResponse::success(*report),
        Err(e) => CronRunResponse::failure(e),
    };

    serde_json::to_string_pretty(&body).map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })
}
