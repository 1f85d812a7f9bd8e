//! Notification reads and state changes for the HTTP surface.

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Notification;
use crate::repositories::{NotificationPage, NotificationRepository};

#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository) -> Self {
        Self { repo }
    }

    /// A page of `user_id`'s notifications, newest first.
    ///
    /// `page` is 1-based; callers validate the bounds.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: u32,
        page_size: u32,
    ) -> AppResult<NotificationPage> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        self.repo
            .list_for_user(user_id, unread_only, offset, i64::from(page_size))
            .await
    }

    /// Marks a notification read; `NotFound` when the id is unknown.
    pub async fn mark_read(&self, id: Uuid) -> AppResult<Notification> {
        self.repo.mark_read(id).await?.ok_or(AppError::NotFound {
            entity: "notification".to_string(),
            field: "id".to_string(),
            value: id.to_string(),
        })
    }
}
