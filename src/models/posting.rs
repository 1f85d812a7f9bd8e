use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::GeoPoint;

/// Shown in place of a missing employer display name.
pub const UNKNOWN_EMPLOYER: &str = "An employer";

/// Lifecycle of a job posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum)]
#[db_enum(existing_type_path = "crate::schema::sql_types::JobStatus")]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
    Active,
    Filled,
    Closed,
    Draft,
}

/// Row of the `jobs` table
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobPostingRow {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub trades: Vec<String>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: PostingStatus,
    pub created_at: jiff_diesel::Timestamp,
}

/// A job posting together with its employer's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPosting {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub employer_name: Option<String>,
    pub title: String,
    pub trades: Vec<String>,
    pub location: String,
    pub point: Option<GeoPoint>,
    pub status: PostingStatus,
    pub created_at: Timestamp,
}

impl JobPosting {
    pub fn from_row(row: JobPostingRow, employer_name: Option<String>) -> Self {
        Self {
            id: row.id,
            employer_id: row.employer_id,
            employer_name,
            title: row.title,
            trades: row.trades,
            location: row.location,
            point: GeoPoint::from_columns(row.latitude, row.longitude),
            status: row.status,
            created_at: row.created_at.to_jiff(),
        }
    }

    pub fn employer_display_name(&self) -> &str {
        self.employer_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_EMPLOYER)
    }
}
