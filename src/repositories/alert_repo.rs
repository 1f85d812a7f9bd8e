//! Read access to proximity alerts.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::{AsyncDbPool, get_connection};
use crate::error::AppError;
use crate::models::{AlertRow, AlertSubscription, GeoPoint};
use crate::schema::{proximity_alerts, users};

#[derive(Clone)]
pub struct AlertRepository {
    pool: AsyncDbPool,
}

impl AlertRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// All alerts with `is_active = true`. The owner's coordinates come from
    /// the single `users` row the alert belongs to.
    pub async fn list_active(&self) -> Result<Vec<AlertSubscription>, AppError> {
        let mut conn = get_connection(&self.pool).await?;

        let rows: Vec<(AlertRow, Option<f64>, Option<f64>)> = proximity_alerts::table
            .inner_join(users::table)
            .filter(proximity_alerts::is_active.eq(true))
            .select((AlertRow::as_select(), users::latitude, users::longitude))
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .map(|(row, lat, lng)| AlertSubscription::from_row(row, GeoPoint::from_columns(lat, lng)))
            .collect())
    }
}
