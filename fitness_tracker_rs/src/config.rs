use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};

/// Tunable thresholds for filtering, plotting and metrics.
///
/// Defaults are the values the tracker ships with; every field can be
/// overridden from JSON (missing fields keep their default).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Fixes with an accuracy radius above this are never trusted (meters)
    pub max_accuracy_m: f64,
    /// Minimum displacement from the reference fix to count as movement (meters)
    pub min_movement_m: f64,
    /// Implied speed must be strictly above this (m/s)
    pub min_speed_mps: f64,
    /// Implied speed must be strictly below this (m/s)
    pub max_speed_mps: f64,
    /// Minimum distance from the last plotted vertex (km)
    pub route_min_segment_km: f64,
    /// Periodic duration/calorie refresh cadence
    pub tick_interval_ms: u64,
    /// Below this active duration calories are not recomputed
    pub min_calorie_duration_ms: i64,
    pub default_weight_kg: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: 20.0,
            min_movement_m: 3.0,
            min_speed_mps: 0.5,
            max_speed_mps: 8.0,
            route_min_segment_km: 0.003,
            tick_interval_ms: 1000,
            min_calorie_duration_ms: 1000,
            default_weight_kg: 70.0,
        }
    }
}

impl TrackerConfig {
    pub fn from_json(json: &str) -> TrackerResult<Self> {
        let config: TrackerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TrackerResult<()> {
        let non_negative = [
            ("max_accuracy_m", self.max_accuracy_m),
            ("min_movement_m", self.min_movement_m),
            ("min_speed_mps", self.min_speed_mps),
            ("max_speed_mps", self.max_speed_mps),
            ("route_min_segment_km", self.route_min_segment_km),
            ("default_weight_kg", self.default_weight_kg),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(TrackerError::InvalidParameters(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        if self.min_speed_mps >= self.max_speed_mps {
            return Err(TrackerError::InvalidParameters(format!(
                "min_speed_mps ({}) must be below max_speed_mps ({})",
                self.min_speed_mps, self.max_speed_mps
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(TrackerError::InvalidParameters(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.min_calorie_duration_ms < 0 {
            return Err(TrackerError::InvalidParameters(
                "min_calorie_duration_ms must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
