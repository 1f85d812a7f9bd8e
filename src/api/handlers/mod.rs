//! HTTP request handlers grouped by resource.

pub mod cron;
pub mod health;
pub mod notifications;
