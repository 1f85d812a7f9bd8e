use diesel::prelude::*;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::schema::notifications;

/// `type` column value for proximity matches
pub const NEW_JOB_NEARBY: &str = "new_job_nearby";

/// Row of the `notifications` table
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: JsonValue,
    pub is_read: bool,
    pub created_at: jiff_diesel::Timestamp,
}

/// An in-app notification as exposed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: JsonValue,
    pub is_read: bool,
    pub created_at: Timestamp,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            notification_type: row.notification_type,
            title: row.title,
            message: row.message,
            data: row.data,
            is_read: row.is_read,
            created_at: row.created_at.to_jiff(),
        }
    }
}

/// Insert model; id, read flag and timestamp come from column defaults.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: JsonValue,
}

/// Structured `data` payload of a new-job-nearby notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJobNearbyPayload {
    pub job_id: Uuid,
    pub job_title: String,
    pub trades: Vec<String>,
    pub location: String,
    pub distance_km: f64,
}
