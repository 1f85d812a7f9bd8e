//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `cron` - Responses of the scheduled-trigger endpoints
//! - `notification` - Notification listing query and response
//! - `error` - Common error response DTOs
//! - `pagination` - Pagination-related DTOs

mod cron;
mod error;
mod notification;
mod pagination;

pub use cron::CronRunResponse;
pub use error::ErrorResponse;
pub use notification::{NotificationListQuery, NotificationListResponse};
pub use pagination::PaginationParams;
