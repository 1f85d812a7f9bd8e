//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use crate::config::Settings;
use crate::db::AsyncDbPool;
use crate::repositories::Repositories;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// Cloning is cheap since services, the pool and the secrets are all
/// reference counted.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Direct access to the database connection pool
    pub db_pool: AsyncDbPool,
    /// Bearer secret guarding the cron trigger
    pub cron_secret: Arc<str>,
    /// Bearer token guarding the notification routes
    pub service_token: Arc<str>,
}

impl AppState {
    /// Wires repositories and services on top of `pool`.
    pub fn new(pool: AsyncDbPool, settings: &Settings) -> Self {
        let repos = Repositories::new(pool.clone());
        let services = Services::new(repos, pool.clone(), &settings.matching);

        Self {
            services,
            db_pool: pool,
            cron_secret: Arc::from(settings.matching.cron_secret.as_str()),
            service_token: Arc::from(settings.api.service_token.as_str()),
        }
    }
}
