//! Data access the matcher depends on.

use async_trait::async_trait;
use jiff::Timestamp;

use crate::error::AppResult;
use crate::models::{AlertSubscription, JobPosting, NewNotification};
use crate::repositories::{AlertRepository, JobPostingRepository, NotificationRepository};

#[async_trait]
pub trait MatchingStore: Send + Sync {
    /// Active postings created strictly after `since`.
    async fn recent_active_postings(&self, since: Timestamp) -> AppResult<Vec<JobPosting>>;

    /// Every alert with `is_active = true`, owner location resolved.
    async fn active_alerts(&self) -> AppResult<Vec<AlertSubscription>>;

    async fn insert_notification(&self, notification: NewNotification) -> AppResult<()>;
}

/// PostgreSQL-backed store built from the repositories.
#[derive(Clone)]
pub struct PgMatchingStore {
    postings: JobPostingRepository,
    alerts: AlertRepository,
    notifications: NotificationRepository,
}

impl PgMatchingStore {
    pub fn new(
        postings: JobPostingRepository,
        alerts: AlertRepository,
        notifications: NotificationRepository,
    ) -> Self {
        Self {
            postings,
            alerts,
            notifications,
        }
    }
}

#[async_trait]
impl MatchingStore for PgMatchingStore {
    async fn recent_active_postings(&self, since: Timestamp) -> AppResult<Vec<JobPosting>> {
        self.postings.recent_active(since).await
    }

    async fn active_alerts(&self) -> AppResult<Vec<AlertSubscription>> {
        self.alerts.list_active().await
    }

    async fn insert_notification(&self, notification: NewNotification) -> AppResult<()> {
        self.notifications.create(notification).await.map(|_| ())
    }
}
