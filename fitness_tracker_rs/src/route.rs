//! Plotted route with an incrementally accumulated total distance.

use serde::Serialize;

use crate::geodesy::great_circle_distance_km;
use crate::types::GeoPoint;

/// Result of offering a point to the route.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AppendOutcome {
    /// First vertex; no distance added
    First,
    /// Appended; `segment_km` was added to the total
    Extended { segment_km: f64 },
    /// Too close to the last plotted vertex
    Discarded { segment_km: f64 },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Route {
    points: Vec<GeoPoint>,
    total_distance_km: f64,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `point` if it is more than `min_segment_km` from the last plotted
    /// vertex. The total is only ever incremented, never recomputed.
    pub fn try_append(&mut self, point: GeoPoint, min_segment_km: f64) -> AppendOutcome {
        let Some(last) = self.points.last().copied() else {
            self.points.push(point);
            return AppendOutcome::First;
        };

        let segment_km = great_circle_distance_km(last, point);
        if segment_km > min_segment_km {
            self.points.push(point);
            self.total_distance_km += segment_km;
            AppendOutcome::Extended { segment_km }
        } else {
            AppendOutcome::Discarded { segment_km }
        }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn last(&self) -> Option<GeoPoint> {
        self.points.last().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.total_distance_km = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::offset_m;
    use approx::assert_abs_diff_eq;

    const MIN_SEGMENT_KM: f64 = 0.003;

    fn origin() -> GeoPoint {
        GeoPoint::new(48.8566, 2.3522)
    }

    #[test]
    fn test_first_point_adds_no_distance() {
        let mut route = Route::new();
        assert_eq!(route.try_append(origin(), MIN_SEGMENT_KM), AppendOutcome::First);
        assert_eq!(route.len(), 1);
        assert_eq!(route.total_distance_km(), 0.0);
    }

    #[test]
    fn test_each_segment_adds_its_own_distance() {
        let mut route = Route::new();
        route.try_append(origin(), MIN_SEGMENT_KM);

        let a = offset_m(origin(), 10.0, 0.0);
        let b = offset_m(a, 0.0, 20.0);
        let expected_a = great_circle_distance_km(origin(), a);
        let expected_b = great_circle_distance_km(a, b);

        assert_eq!(
            route.try_append(a, MIN_SEGMENT_KM),
            AppendOutcome::Extended {
                segment_km: expected_a
            }
        );
        assert_eq!(route.total_distance_km(), expected_a);

        route.try_append(b, MIN_SEGMENT_KM);
        assert_eq!(route.total_distance_km(), expected_a + expected_b);
        assert_abs_diff_eq!(route.total_distance_km(), 0.030, epsilon = 1e-6);
        assert_eq!(route.points(), &[origin(), a, b]);
    }

    #[test]
    fn test_sub_threshold_point_is_discarded() {
        let mut route = Route::new();
        route.try_append(origin(), MIN_SEGMENT_KM);

        let close = offset_m(origin(), 2.0, 0.0);
        assert!(matches!(
            route.try_append(close, MIN_SEGMENT_KM),
            AppendOutcome::Discarded { .. }
        ));
        assert_eq!(route.len(), 1);
        assert_eq!(route.total_distance_km(), 0.0);
        assert_eq!(route.last(), Some(origin()));
    }

    #[test]
    fn test_threshold_is_against_last_plotted_vertex() {
        let mut route = Route::new();
        route.try_append(origin(), MIN_SEGMENT_KM);

        // Two 2 m steps: neither is 3 m from the plotted origin on its own,
        // the second one is 4 m away and lands.
        let step1 = offset_m(origin(), 2.0, 0.0);
        let step2 = offset_m(origin(), 4.0, 0.0);
        route.try_append(step1, MIN_SEGMENT_KM);
        assert_eq!(route.len(), 1);
        route.try_append(step2, MIN_SEGMENT_KM);
        assert_eq!(route.len(), 2);
        assert_abs_diff_eq!(route.total_distance_km(), 0.004, epsilon = 1e-9);
    }

    #[test]
    fn test_clear() {
        let mut route = Route::new();
        route.try_append(origin(), MIN_SEGMENT_KM);
        route.try_append(offset_m(origin(), 50.0, 0.0), MIN_SEGMENT_KM);
        route.clear();
        assert!(route.is_empty());
        assert_eq!(route.total_distance_km(), 0.0);
        assert_eq!(route, Route::new());
    }
}
