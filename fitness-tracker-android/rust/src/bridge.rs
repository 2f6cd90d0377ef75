//! Process-wide tracking session shared by all JNI calls.
//!
//! Location callbacks, the UI tick and user commands all arrive on different
//! Java threads; every one of them goes through the same mutex so the session
//! only ever has one writer at a time.

use std::sync::{Arc, Mutex, MutexGuard};

use fitness_tracker_rs::{
    Clock, Fix, LocationPermission, SystemClock, TrackerConfig, TrackerError, TrackingSession,
};
use log::info;

use crate::error::{JResult, JniBridgeError};

/// Lightest body weight the app accepts (kg, exclusive)
pub const MIN_WEIGHT_KG: f64 = 40.0;

pub struct TrackerBridge {
    clock: Arc<dyn Clock>,
    session: Mutex<Option<TrackingSession>>,
}

impl Default for TrackerBridge {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl TrackerBridge {
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            session: Mutex::new(None),
        }
    }

    fn lock(&self) -> JResult<MutexGuard<'_, Option<TrackingSession>>> {
        self.session.lock().map_err(|_| {
            JniBridgeError::Internal("Failed to acquire global session lock".to_string())
        })
    }

    /// Run `f` against the session, creating one with default config if
    /// `init` was never called.
    fn with_session<T>(&self, f: impl FnOnce(&mut TrackingSession) -> JResult<T>) -> JResult<T> {
        let mut guard = self.lock()?;
        let session = guard.get_or_insert_with(|| {
            TrackingSession::new(TrackerConfig::default(), self.clock.clone())
        });
        f(session)
    }

    /// Replace the session with a fresh one built from `config_json`.
    /// An empty string selects the defaults.
    pub fn init(&self, config_json: &str) -> JResult<()> {
        let config = if config_json.trim().is_empty() {
            TrackerConfig::default()
        } else {
            TrackerConfig::from_json(config_json)?
        };
        *self.lock()? = Some(TrackingSession::new(config, self.clock.clone()));
        info!("Tracker initialised");
        Ok(())
    }

    pub fn start(&self, permission_granted: bool) -> JResult<()> {
        self.with_session(|s| Ok(s.start(LocationPermission::from(permission_granted))?))
    }

    pub fn pause(&self) -> JResult<()> {
        self.with_session(|s| Ok(s.pause()?))
    }

    pub fn resume(&self, permission_granted: bool) -> JResult<()> {
        self.with_session(|s| Ok(s.resume(LocationPermission::from(permission_granted))?))
    }

    /// Stop the workout and return its summary as JSON.
    pub fn stop(&self) -> JResult<String> {
        self.with_session(|s| Ok(s.stop()?.to_json()?))
    }

    pub fn clear(&self) -> JResult<()> {
        self.with_session(|s| {
            s.clear();
            Ok(())
        })
    }

    pub fn push_fix(
        &self,
        latitude: f64,
        longitude: f64,
        accuracy: f64,
        timestamp_ms: i64,
    ) -> JResult<()> {
        if !(latitude.is_finite() && (-90.0..=90.0).contains(&latitude))
            || !(longitude.is_finite() && (-180.0..=180.0).contains(&longitude))
        {
            return Err(TrackerError::InvalidParameters(format!(
                "coordinates out of range: {latitude}, {longitude}"
            ))
            .into());
        }
        if !accuracy.is_finite() || accuracy < 0.0 {
            return Err(TrackerError::InvalidParameters(format!(
                "accuracy must be a non-negative radius, got {accuracy}"
            ))
            .into());
        }
        let fix = Fix::new(latitude, longitude, accuracy, timestamp_ms);
        self.with_session(|s| {
            s.push_fix(fix);
            Ok(())
        })
    }

    pub fn tick(&self) -> JResult<()> {
        self.with_session(|s| {
            s.tick();
            Ok(())
        })
    }

    pub fn update_weight(&self, weight_kg: f64) -> JResult<()> {
        if !weight_kg.is_finite() || weight_kg <= MIN_WEIGHT_KG {
            return Err(TrackerError::InvalidParameters(format!(
                "weight must be above {MIN_WEIGHT_KG} kg, got {weight_kg}"
            ))
            .into());
        }
        self.with_session(|s| {
            s.update_weight(weight_kg);
            Ok(())
        })
    }

    /// `[duration, distance, calories, pace]`
    pub fn display_metrics(&self) -> JResult<[String; 4]> {
        self.with_session(|s| {
            let d = s.display();
            Ok([d.duration, d.distance, d.calories, d.pace])
        })
    }

    /// Route vertices flattened as `[lat0, lon0, lat1, lon1, ...]`.
    pub fn route_coordinates(&self) -> JResult<Vec<f64>> {
        self.with_session(|s| {
            Ok(s.route()
                .points()
                .iter()
                .flat_map(|p| [p.latitude, p.longitude])
                .collect())
        })
    }

    pub fn is_tracking(&self) -> JResult<bool> {
        self.with_session(|s| Ok(s.is_tracking()))
    }

    pub fn is_moving(&self) -> JResult<bool> {
        self.with_session(|s| Ok(s.is_moving()))
    }

    pub fn snapshot_json(&self) -> JResult<String> {
        self.with_session(|s| Ok(s.snapshot().to_json()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitness_tracker_rs::ManualClock;

    const T0: i64 = 1_700_000_000_000;
    // ~5 m of latitude
    const STEP_DEG: f64 = 0.000045;

    fn bridge() -> (TrackerBridge, ManualClock) {
        let clock = ManualClock::new(T0);
        (TrackerBridge::with_clock(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_uninitialised_bridge_uses_defaults() {
        let (bridge, _clock) = bridge();
        assert!(!bridge.is_tracking().unwrap());
        assert_eq!(
            bridge.display_metrics().unwrap(),
            ["00:00:00", "0.00 km", "0 kcal", "0.00 km/h"].map(String::from)
        );
    }

    #[test]
    fn test_permission_denied_surfaces() {
        let (bridge, _clock) = bridge();
        assert_eq!(
            bridge.start(false),
            Err(JniBridgeError::Tracker(TrackerError::PermissionDenied))
        );
        assert!(!bridge.is_tracking().unwrap());
    }

    #[test]
    fn test_workout_through_bridge() {
        let (bridge, clock) = bridge();
        bridge.init(r#"{"default_weight_kg": 80.0}"#).unwrap();
        bridge.start(true).unwrap();

        for i in 0..4 {
            clock.advance(1_000);
            bridge
                .push_fix(45.0 + STEP_DEG * i as f64, 7.0, 4.0, clock.now_millis())
                .unwrap();
        }
        assert!(bridge.is_moving().unwrap());

        let route = bridge.route_coordinates().unwrap();
        assert_eq!(route.len(), 6);
        assert_eq!(route[0], 45.0 + STEP_DEG);
        assert_eq!(route[1], 7.0);

        let summary: serde_json::Value = serde_json::from_str(&bridge.stop().unwrap()).unwrap();
        assert_eq!(summary["duration_ms"], 4_000);
        assert_eq!(summary["id"], format!("workout_{T0}"));

        let snapshot: serde_json::Value =
            serde_json::from_str(&bridge.snapshot_json().unwrap()).unwrap();
        assert_eq!(snapshot["weight_kg"], 80.0);

        bridge.clear().unwrap();
        assert!(bridge.route_coordinates().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_bad_input() {
        let (bridge, _clock) = bridge();
        assert!(bridge.push_fix(f64::NAN, 7.0, 4.0, T0).is_err());
        assert!(bridge.push_fix(45.0, 200.0, 4.0, T0).is_err());
        assert!(bridge.update_weight(0.0).is_err());
        assert!(bridge.init("{not json").is_err());
    }

    #[test]
    fn test_unusable_accuracy_is_rejected() {
        let (bridge, clock) = bridge();
        bridge.start(true).unwrap();
        for accuracy in [f64::NAN, f64::INFINITY, -1.0] {
            let result = bridge.push_fix(45.0, 7.0, accuracy, clock.now_millis());
            assert!(
                matches!(
                    result,
                    Err(JniBridgeError::Tracker(TrackerError::InvalidParameters(_)))
                ),
                "accuracy {accuracy}"
            );
        }
        // Nothing reached the session
        let snapshot: serde_json::Value =
            serde_json::from_str(&bridge.snapshot_json().unwrap()).unwrap();
        assert!(snapshot["current_location"].is_null());
        assert!(bridge.push_fix(45.0, 7.0, 0.0, clock.now_millis()).is_ok());
    }

    #[test]
    fn test_weight_must_exceed_minimum() {
        let (bridge, _clock) = bridge();
        assert!(bridge.update_weight(MIN_WEIGHT_KG).is_err());
        assert!(bridge.update_weight(f64::NAN).is_err());
        bridge.update_weight(40.5).unwrap();

        let snapshot: serde_json::Value =
            serde_json::from_str(&bridge.snapshot_json().unwrap()).unwrap();
        assert_eq!(snapshot["weight_kg"], 40.5);
    }

    #[test]
    fn test_tick_advances_duration() {
        let (bridge, clock) = bridge();
        bridge.start(true).unwrap();
        clock.advance(65_000);
        bridge.tick().unwrap();
        assert_eq!(bridge.display_metrics().unwrap()[0], "00:01:05");
    }
}
