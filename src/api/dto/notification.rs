//! Notification listing DTOs.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::dto::PaginationParams;
use crate::models::Notification;
use crate::repositories::NotificationPage;

/// `?unread_only&page&page_size` of the listing endpoint.
///
/// Pagination fields are spelled out rather than flattened; serde cannot
/// parse numbers out of a flattened query string.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread_only: bool,

    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: u32,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    pub page_size: u32,
}

impl NotificationListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

fn default_page() -> u32 {
    PaginationParams::default().page
}

fn default_page_size() -> u32 {
    PaginationParams::default().page_size
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationListResponse {
    pub items: Vec<Notification>,
    pub unread_count: i64,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl NotificationListResponse {
    pub fn new(page: NotificationPage, pagination: PaginationParams) -> Self {
        Self {
            items: page.items,
            unread_count: page.unread_count,
            total: page.total,
            page: pagination.page,
            page_size: pagination.page_size,
        }
    }
}
