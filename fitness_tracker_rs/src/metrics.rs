//! Calorie and pace derivation.
//!
//! Calories use a speed-bucketed MET model: `MET * weight_kg * hours`.
//! The value is recomputed from total distance and duration on every call
//! and only committed while the filter reports movement, so it stays frozen
//! through GPS gaps even though duration keeps advancing.

use serde::{Deserialize, Serialize};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Upper speed bound (km/h, inclusive) → MET value; anything faster uses `MET_FASTEST`.
const MET_BUCKETS: [(f64, f64); 3] = [(4.0, 2.0), (8.0, 7.0), (11.0, 8.5)];
const MET_FASTEST: f64 = 10.0;

/// Derived display metrics. Never mutated independently of the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub distance_km: f64,
    pub duration_ms: i64,
    pub calories_kcal: f64,
    pub pace_kmh: f64,
}

pub fn met_for_speed(speed_kmh: f64) -> f64 {
    MET_BUCKETS
        .iter()
        .find(|(upper, _)| speed_kmh <= *upper)
        .map_or(MET_FASTEST, |(_, met)| *met)
}

fn hours(duration_ms: i64) -> f64 {
    duration_ms as f64 / MILLIS_PER_HOUR
}

/// Average speed in km/h; zero below 1 m of distance or without elapsed time.
pub fn calculate_pace(distance_km: f64, duration_ms: i64) -> f64 {
    if distance_km < 0.001 || duration_ms <= 0 {
        return 0.0;
    }
    distance_km / hours(duration_ms)
}

/// Holds the cumulative calorie value between recomputations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricsCalculator {
    cumulative_calories: f64,
    min_duration_ms: i64,
}

impl MetricsCalculator {
    pub fn new(min_duration_ms: i64) -> Self {
        Self {
            cumulative_calories: 0.0,
            min_duration_ms,
        }
    }

    /// Recompute calories; returns the (possibly unchanged) cumulative value.
    pub fn calculate_calories(
        &mut self,
        weight_kg: f64,
        distance_km: f64,
        duration_ms: i64,
        is_moving: bool,
    ) -> f64 {
        if duration_ms < self.min_duration_ms {
            return self.cumulative_calories;
        }
        let hours = hours(duration_ms);
        if hours <= 0.0 {
            return self.cumulative_calories;
        }

        let speed_kmh = distance_km / hours;
        let met = met_for_speed(speed_kmh);
        if is_moving {
            self.cumulative_calories = met * weight_kg * hours;
        }
        self.cumulative_calories
    }

    pub fn cumulative_calories(&self) -> f64 {
        self.cumulative_calories
    }

    pub fn reset(&mut self) {
        self.cumulative_calories = 0.0;
    }
}
