use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside the latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Build a point from two nullable columns. Missing or out-of-range
    /// coordinates mean the row has no point.
    pub fn from_columns(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Some(Self::new(lat, lng)).filter(GeoPoint::is_valid),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns_requires_both() {
        assert!(GeoPoint::from_columns(Some(45.0), None).is_none());
        assert!(GeoPoint::from_columns(None, Some(-93.0)).is_none());
        assert_eq!(
            GeoPoint::from_columns(Some(45.0), Some(-93.0)),
            Some(GeoPoint::new(45.0, -93.0))
        );
    }

    #[test]
    fn test_validity_bounds() {
        assert!(GeoPoint::new(90.0, 180.0).is_valid());
        assert!(GeoPoint::new(-90.0, -180.0).is_valid());
        assert!(!GeoPoint::new(90.1, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(GeoPoint::from_columns(Some(f64::INFINITY), Some(0.0)).is_none());
    }
}
