//! Great-circle helpers over the spherical Earth model used by `geo`.

use geo::HaversineDistance;

use crate::types::GeoPoint;

/// Mean Earth radius used by `geo`'s haversine implementation (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance in meters.
pub fn great_circle_distance_m(from: GeoPoint, to: GeoPoint) -> f64 {
    from.to_point().haversine_distance(&to.to_point())
}

/// Great-circle distance in kilometers.
pub fn great_circle_distance_km(from: GeoPoint, to: GeoPoint) -> f64 {
    great_circle_distance_m(from, to) / 1000.0
}

/// Move a point by local north/east offsets in meters (equirectangular approximation).
pub fn offset_m(origin: GeoPoint, north_m: f64, east_m: f64) -> GeoPoint {
    let d_lat = north_m / EARTH_RADIUS_M;
    let d_lon = east_m / (EARTH_RADIUS_M * origin.latitude.to_radians().cos());
    GeoPoint::new(
        origin.latitude + d_lat.to_degrees(),
        origin.longitude + d_lon.to_degrees(),
    )
}
