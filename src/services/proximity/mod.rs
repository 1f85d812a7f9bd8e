//! Proximity matching: pairs freshly posted jobs with nearby workers'
//! alerts and records an in-app notification for each match.

mod distance;
mod matcher;
mod store;

pub use distance::{
    DistanceOracle, EARTH_RADIUS_METERS, HaversineDistance, PostgisDistance, haversine_meters,
};
pub use matcher::{MatchError, MatchReport, ProximityMatcher};
pub use store::{MatchingStore, PgMatchingStore};
