//! Repository layer for data access operations.

mod alert_repo;
mod notification_repo;
mod posting_repo;

pub use alert_repo::AlertRepository;
pub use notification_repo::{NotificationPage, NotificationRepository};
pub use posting_repo::JobPostingRepository;

use crate::db::AsyncDbPool;

/// Aggregates all repositories for convenient access.
///
/// `AsyncDbPool` is reference counted, so cloning this is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub postings: JobPostingRepository,
    pub alerts: AlertRepository,
    pub notifications: NotificationRepository,
}

impl Repositories {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            postings: JobPostingRepository::new(pool.clone()),
            alerts: AlertRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool),
        }
    }
}
