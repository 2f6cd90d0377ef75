use serde::{Deserialize, Serialize};

use crate::error::TrackerResult;
use crate::types::GeoPoint;

/// Summary of a finished workout, produced when tracking stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub id: String,
    pub distance_km: f64,
    pub duration_ms: i64,
    pub calories_kcal: f64,
    pub route: Vec<GeoPoint>,
    pub average_pace_kmh: f64,
    /// Session start, milliseconds since the epoch
    pub timestamp_ms: i64,
}

impl WorkoutSummary {
    pub fn id_for(started_at_ms: i64) -> String {
        format!("workout_{started_at_ms}")
    }

    pub fn to_json(&self) -> TrackerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
