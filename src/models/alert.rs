use diesel::prelude::*;
use jiff::Timestamp;
use uuid::Uuid;

use crate::models::GeoPoint;

/// Row of the `proximity_alerts` table
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::proximity_alerts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AlertRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub radius_km: f64,
    pub trades: Vec<String>,
    pub is_active: bool,
    pub created_at: jiff_diesel::Timestamp,
}

/// A worker's saved alert, with the owner's location resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub radius_km: f64,
    pub trades: Vec<String>,
    pub is_active: bool,
    pub owner_point: Option<GeoPoint>,
    pub created_at: Timestamp,
}

impl AlertSubscription {
    pub fn from_row(row: AlertRow, owner_point: Option<GeoPoint>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            radius_km: row.radius_km,
            trades: row.trades,
            is_active: row.is_active,
            owner_point,
            created_at: row.created_at.to_jiff(),
        }
    }

    /// True when at least one trade appears in both lists. Exact,
    /// case-sensitive comparison; an alert without trades matches nothing.
    pub fn shares_trade_with(&self, trades: &[String]) -> bool {
        self.trades.iter().any(|wanted| trades.contains(wanted))
    }
}
