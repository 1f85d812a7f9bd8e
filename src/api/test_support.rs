//! In-memory state for router tests: a pool that never connects and a
//! matching store whose behaviour is chosen per test.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;
use jiff::Timestamp;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{AlertSubscription, JobPosting, NewNotification};
use crate::repositories::NotificationRepository;
use crate::services::proximity::{HaversineDistance, MatchingStore};
use crate::services::{NotificationService, ProximityMatcher, Services};
use crate::state::AppState;

pub const CRON_SECRET: &str = "cron-secret";
pub const SERVICE_TOKEN: &str = "service-token";

/// Pool pointed at a closed port; checkouts fail after a short timeout.
pub fn unreachable_pool() -> AsyncDbPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(
        "postgres://crewmatch@127.0.0.1:1/crewmatch",
    );
    Pool::builder()
        .max_size(1)
        .connection_timeout(Duration::from_millis(200))
        .build_unchecked(manager)
}

pub struct StubStore {
    pub healthy: bool,
}

#[async_trait]
impl MatchingStore for StubStore {
    async fn recent_active_postings(&self, _since: Timestamp) -> AppResult<Vec<JobPosting>> {
        if self.healthy {
            Ok(Vec::new())
        } else {
            Err(AppError::ConnectionPool {
                source: anyhow::anyhow!("pool exhausted"),
            })
        }
    }

    async fn active_alerts(&self) -> AppResult<Vec<AlertSubscription>> {
        Ok(Vec::new())
    }

    async fn insert_notification(&self, _notification: NewNotification) -> AppResult<()> {
        Ok(())
    }
}

pub fn state_with(healthy_store: bool, cron_secret: &str, service_token: &str) -> AppState {
    let pool = unreachable_pool();
    let matcher = ProximityMatcher::new(
        Arc::new(StubStore {
            healthy: healthy_store,
        }),
        Arc::new(HaversineDistance),
        Duration::from_secs(600),
    );

    AppState {
        services: Services {
            notifications: NotificationService::new(NotificationRepository::new(pool.clone())),
            matcher,
        },
        db_pool: pool,
        cron_secret: Arc::from(cron_secret),
        service_token: Arc::from(service_token),
    }
}

pub fn state() -> AppState {
    state_with(true, CRON_SECRET, SERVICE_TOKEN)
}
