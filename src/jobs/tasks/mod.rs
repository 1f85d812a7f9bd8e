mod proximity_alerts;

pub use proximity_alerts::ProximityAlertTask;
