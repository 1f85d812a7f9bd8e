//! Read access to job postings.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;

use crate::db::{AsyncDbPool, get_connection};
use crate::error::AppError;
use crate::models::{JobPosting, JobPostingRow, PostingStatus};
use crate::schema::{jobs, users};

#[derive(Clone)]
pub struct JobPostingRepository {
    pool: AsyncDbPool,
}

impl JobPostingRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Active postings created strictly after `since`, newest first, each
    /// joined to its employer's display name.
    pub async fn recent_active(&self, since: Timestamp) -> Result<Vec<JobPosting>, AppError> {
        let mut conn = get_connection(&self.pool).await?;

        let rows: Vec<(JobPostingRow, Option<String>)> = jobs::table
            .inner_join(users::table)
            .filter(jobs::status.eq(PostingStatus::Active))
            .filter(jobs::created_at.gt(jiff_diesel::Timestamp::from(since)))
            .order(jobs::created_at.desc())
            .select((JobPostingRow::as_select(), users::display_name))
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .map(|(row, employer_name)| JobPosting::from_row(row, employer_name))
            .collect())
    }
}
