//! Service layer for business logic operations.
//!
//! Services encapsulate business logic and coordinate between
//! repositories and handlers.

mod notification_service;
pub mod proximity;

pub use notification_service::NotificationService;
pub use proximity::{MatchReport, ProximityMatcher};

use std::sync::Arc;

use crate::config::{DistanceBackend, MatchingConfig};
use crate::db::AsyncDbPool;
use crate::repositories::Repositories;
use proximity::{DistanceOracle, HaversineDistance, PgMatchingStore, PostgisDistance};

/// Aggregates all services for convenient access.
///
/// Cloning is cheap since underlying pools use `Arc` internally.
#[derive(Clone)]
pub struct Services {
    pub notifications: NotificationService,
    pub matcher: ProximityMatcher,
}

impl Services {
    pub fn new(repos: Repositories, pool: AsyncDbPool, matching: &MatchingConfig) -> Self {
        let store = PgMatchingStore::new(
            repos.postings,
            repos.alerts,
            repos.notifications.clone(),
        );
        let distance: Arc<dyn DistanceOracle> = match matching.distance_backend {
            DistanceBackend::Postgis => Arc::new(PostgisDistance::new(pool)),
            DistanceBackend::Haversine => Arc::new(HaversineDistance),
        };

        Self {
            notifications: NotificationService::new(repos.notifications),
            matcher: ProximityMatcher::new(Arc::new(store), distance, matching.lookback()),
        }
    }
}
