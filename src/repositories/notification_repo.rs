//! Notification persistence.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::{AsyncDbPool, get_connection};
use crate::error::AppError;
use crate::models::{NewNotification, Notification, NotificationRow};
use crate::schema::notifications;

/// One page of a user's notifications plus the counters the API reports
#[derive(Debug, Clone)]
pub struct NotificationPage {
    pub items: Vec<Notification>,
    pub total: i64,
    pub unread_count: i64,
}

#[derive(Clone)]
pub struct NotificationRepository {
    pool: AsyncDbPool,
}

impl NotificationRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_notification: NewNotification) -> Result<Notification, AppError> {
        let mut conn = get_connection(&self.pool).await?;

        diesel::insert_into(notifications::table)
            .values(&new_notification)
            .returning(NotificationRow::as_returning())
            .get_result(&mut conn)
            .await
            .map(Notification::from)
            .map_err(AppError::from)
    }

    /// Newest first. `total` counts the filtered set, `unread_count` always
    /// counts every unread notification of the user.
    pub async fn list_for_user(
        &self,
        owner: Uuid,
        unread_only: bool,
        offset: i64,
        limit: i64,
    ) -> Result<NotificationPage, AppError> {
        let mut conn = get_connection(&self.pool).await?;

        let mut query = notifications::table
            .filter(notifications::user_id.eq(owner))
            .select(NotificationRow::as_select())
            .into_boxed();
        let mut count_query = notifications::table
            .filter(notifications::user_id.eq(owner))
            .select(diesel::dsl::count_star())
            .into_boxed();
        if unread_only {
            query = query.filter(notifications::is_read.eq(false));
            count_query = count_query.filter(notifications::is_read.eq(false));
        }

        let rows: Vec<NotificationRow> = query
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        let total: i64 = count_query
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)?;

        let unread_count: i64 = notifications::table
            .filter(notifications::user_id.eq(owner))
            .filter(notifications::is_read.eq(false))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(NotificationPage {
            items: rows.into_iter().map(Notification::from).collect(),
            total,
            unread_count,
        })
    }

    /// Returns `None` when no notification has this id.
    pub async fn mark_read(&self, notification_id: Uuid) -> Result<Option<Notification>, AppError> {
        let mut conn = get_connection(&self.pool).await?;

        diesel::update(notifications::table.find(notification_id))
            .set(notifications::is_read.eq(true))
            .returning(NotificationRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map(|row| row.map(Notification::from))
            .map_err(AppError::from)
    }
}
