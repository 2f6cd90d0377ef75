use serde::{Deserialize, Serialize};

/// Raw location reading as delivered by the platform provider.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in meters
    pub accuracy: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            timestamp,
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A plotted route vertex / map marker position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
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

    /// geo uses x = longitude, y = latitude
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(point: geo::Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Validated (> 40 kg) by the caller, not by the core
    pub weight_kg: f64,
}

impl UserProfile {
    pub fn new(weight_kg: f64) -> Self {
        Self { weight_kg }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_position() {
        let fix = Fix::new(37.7749, -122.4194, 5.0, 1_000);
        assert_eq!(fix.position(), GeoPoint::new(37.7749, -122.4194));
    }

    #[test]
    fn test_geo_point_axis_order() {
        let point = GeoPoint::new(10.0, 20.0).to_point();
        assert_eq!(point.x(), 20.0);
        assert_eq!(point.y(), 10.0);
        assert_eq!(GeoPoint::from(point), GeoPoint::new(10.0, 20.0));
    }

    #[test]
    fn test_fix_json_shape() {
        let fix: Fix = serde_json::from_str(
            r#"{"latitude":1.5,"longitude":2.5,"accuracy":4.0,"timestamp":42}"#,
        )
        .unwrap();
        assert_eq!(fix, Fix::new(1.5, 2.5, 4.0, 42));
    }
}
