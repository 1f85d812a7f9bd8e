//! Distance between two geographic points.

use async_trait::async_trait;
use diesel::sql_types::{Float8, Nullable};
use diesel::{QueryableByName, sql_query};
use diesel_async::RunQueryDsl;

use crate::db::{AsyncDbPool, get_connection};
use crate::error::{AppError, AppResult};
use crate::models::GeoPoint;

/// Mean Earth radius (IUGG) in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Answers "how far apart are these two points, in meters".
///
/// `Ok(None)`, an error, or a non-finite value all mean the distance is
/// unknown; the matcher treats that as infinitely far.
#[async_trait]
pub trait DistanceOracle: Send + Sync {
    async fn distance_meters(&self, a: GeoPoint, b: GeoPoint) -> AppResult<Option<f64>>;

    fn name(&self) -> &'static str;
}

/// Great-circle distance on a spherical Earth.
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    EARTH_RADIUS_METERS * c
}

/// In-process haversine oracle, for deployments without PostGIS.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineDistance;

#[async_trait]
impl DistanceOracle for HaversineDistance {
    async fn distance_meters(&self, a: GeoPoint, b: GeoPoint) -> AppResult<Option<f64>> {
        Ok(Some(haversine_meters(a, b)))
    }

    fn name(&self) -> &'static str {
        "haversine"
    }
}

#[derive(QueryableByName)]
struct DistanceRow {
    #[diesel(sql_type = Nullable<Float8>)]
    meters: Option<f64>,
}

/// Geodesic distance computed by PostGIS (`ST_Distance` on geography).
#[derive(Clone)]
pub struct PostgisDistance {
    pool: AsyncDbPool,
}

impl PostgisDistance {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DistanceOracle for PostgisDistance {
    async fn distance_meters(&self, a: GeoPoint, b: GeoPoint) -> AppResult<Option<f64>> {
        let mut conn = get_connection(&self.pool).await?;

        // ST_MakePoint takes (x, y) = (longitude, latitude)
        let row: DistanceRow = sql_query(
            "SELECT ST_Distance(\
                ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, \
                ST_SetSRID(ST_MakePoint($3, $4), 4326)::geography\
             ) AS meters",
        )
        .bind::<Float8, _>(a.longitude)
        .bind::<Float8, _>(a.latitude)
        .bind::<Float8, _>(b.longitude)
        .bind::<Float8, _>(b.latitude)
        .get_result(&mut conn)
        .await
        .map_err(|e| AppError::Database {
            operation: "ST_Distance".to_string(),
            source: anyhow::Error::from(e),
        })?;

        Ok(row.meters)
    }

    fn name(&self) -> &'static str {
        "postgis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_point() -> impl Strategy<Value = GeoPoint> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lng)| GeoPoint::new(lat, lng))
    }

    proptest! {
        #[test]
        fn prop_haversine_is_a_bounded_symmetric_distance(a in arb_point(), b in arb_point()) {
            let ab = haversine_meters(a, b);
            let ba = haversine_meters(b, a);

            prop_assert!(ab.is_finite());
            prop_assert!(ab >= 0.0);
            prop_assert!((ab - ba).abs() < 1e-6);
            prop_assert!(ab <= std::f64::consts::PI * EARTH_RADIUS_METERS + 1e-6);
        }

        #[test]
        fn prop_haversine_zero_for_same_point(a in arb_point()) {
            prop_assert!(haversine_meters(a, a) < 1e-6);
        }
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let meters = haversine_meters(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((meters - 111_195.08).abs() < 1.0, "got {meters}");
    }

    #[test]
    fn test_minneapolis_to_st_paul() {
        let minneapolis = GeoPoint::new(44.98, -93.27);
        let st_paul = GeoPoint::new(44.95, -93.09);
        let km = haversine_meters(minneapolis, st_paul) / 1000.0;
        assert!(km > 14.0 && km < 16.0, "got {km}");
    }

    #[tokio::test]
    async fn test_haversine_oracle_always_answers() {
        let oracle = HaversineDistance;
        let result = oracle
            .distance_meters(GeoPoint::new(10.0, 10.0), GeoPoint::new(10.0, 10.0))
            .await
            .unwrap();
        assert_eq!(result, Some(0.0));
        assert_eq!(oracle.name(), "haversine");
    }
}
