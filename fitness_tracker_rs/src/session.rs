//! Single-owner tracking session.
//!
//! Owns every piece of per-workout state (filter reference, route, active
//! time, cumulative calories) behind `&mut self`, so callers must serialise
//! fixes, ticks and commands through one owner: the async service in
//! [`crate::tracker`], or a mutex in the Android bridge.

use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::active_time::ActiveTimeTracker;
use crate::clock::Clock;
use crate::config::TrackerConfig;
use crate::display::DisplayMetrics;
use crate::error::{TrackerError, TrackerResult};
use crate::filters::location::{LocationFilter, Verdict};
use crate::live_status::{RoutePoints, SessionSnapshot};
use crate::metrics::{calculate_pace, Metrics, MetricsCalculator};
use crate::route::{AppendOutcome, Route};
use crate::types::{Fix, GeoPoint, UserProfile};
use crate::workout::WorkoutSummary;

/// Session state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Nothing recording; last workout (if any) still visible until cleared
    Idle,
    /// Accepting fixes, active time running
    Tracking,
    /// Fixes ignored, active time frozen
    Paused,
}

/// Whether the platform granted location access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationPermission {
    Granted,
    Denied,
}

impl From<bool> for LocationPermission {
    fn from(granted: bool) -> Self {
        if granted {
            LocationPermission::Granted
        } else {
            LocationPermission::Denied
        }
    }
}

pub struct TrackingSession {
    config: TrackerConfig,
    clock: Arc<dyn Clock>,
    state: SessionState,
    profile: UserProfile,
    filter: LocationFilter,
    route: Route,
    plotted: RoutePoints,
    active_time: ActiveTimeTracker,
    calculator: MetricsCalculator,
    current_location: Option<GeoPoint>,
    metrics: Metrics,
    started_at: Option<i64>,
}

impl TrackingSession {
    pub fn new(config: TrackerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: SessionState::Idle,
            profile: UserProfile::new(config.default_weight_kg),
            filter: LocationFilter::new(config),
            route: Route::new(),
            plotted: RoutePoints::default(),
            active_time: ActiveTimeTracker::new(),
            calculator: MetricsCalculator::new(config.min_calorie_duration_ms),
            current_location: None,
            metrics: Metrics::default(),
            started_at: None,
        }
    }

    /// Begin a new workout. Any previous workout is discarded.
    pub fn start(&mut self, permission: LocationPermission) -> TrackerResult<()> {
        if permission == LocationPermission::Denied {
            return Err(TrackerError::PermissionDenied);
        }
        if self.state == SessionState::Tracking {
            return Err(TrackerError::AlreadyTracking);
        }

        let now = self.clock.now_millis();
        self.reset_workout();
        self.active_time.start(now);
        self.started_at = Some(now);
        self.state = SessionState::Tracking;
        info!("Tracking started");
        Ok(())
    }

    pub fn pause(&mut self) -> TrackerResult<()> {
        if self.state != SessionState::Tracking {
            return Err(TrackerError::NotTracking);
        }

        self.active_time.pause(self.clock.now_millis());
        self.filter.halt();
        self.state = SessionState::Paused;
        self.recompute();
        info!("Tracking paused at {} ms active", self.metrics.duration_ms);
        Ok(())
    }

    /// Continue a paused workout, carrying distance, time and calories forward.
    pub fn resume(&mut self, permission: LocationPermission) -> TrackerResult<()> {
        if permission == LocationPermission::Denied {
            return Err(TrackerError::PermissionDenied);
        }
        match self.state {
            SessionState::Paused => {
                self.active_time.resume(self.clock.now_millis());
                self.state = SessionState::Tracking;
                info!("Tracking resumed");
                Ok(())
            }
            SessionState::Tracking => Err(TrackerError::AlreadyTracking),
            SessionState::Idle => Err(TrackerError::InvalidState(
                "cannot resume a stopped workout".to_string(),
            )),
        }
    }

    /// End the workout. Route and metrics stay visible until `clear` or the
    /// next `start`.
    pub fn stop(&mut self) -> TrackerResult<WorkoutSummary> {
        if self.state == SessionState::Idle {
            return Err(TrackerError::NotTracking);
        }

        self.active_time.pause(self.clock.now_millis());
        self.filter.reset();
        self.state = SessionState::Idle;
        self.recompute();

        let started_at = self.started_at.unwrap_or_default();
        let summary = WorkoutSummary {
            id: WorkoutSummary::id_for(started_at),
            distance_km: self.metrics.distance_km,
            duration_ms: self.metrics.duration_ms,
            calories_kcal: self.metrics.calories_kcal,
            route: self.route.points().to_vec(),
            average_pace_kmh: calculate_pace(self.metrics.distance_km, self.metrics.duration_ms),
            timestamp_ms: started_at,
        };
        info!(
            "Tracking stopped: {:.3} km in {} ms",
            summary.distance_km, summary.duration_ms
        );
        Ok(summary)
    }

    /// Drop all workout state and return to `Idle`. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.reset_workout();
        self.state = SessionState::Idle;
        debug!("Session cleared");
    }

    /// Feed one raw fix. Returns `None` when the session is not tracking.
    pub fn push_fix(&mut self, fix: Fix) -> Option<Verdict> {
        if self.state != SessionState::Tracking {
            return None;
        }

        self.current_location = Some(fix.position());
        let verdict = self.filter.process(&fix);
        if verdict.is_movement() {
            match self
                .route
                .try_append(fix.position(), self.config.route_min_segment_km)
            {
                AppendOutcome::First => {
                    debug!("First route point added");
                    self.plotted = RoutePoints::new(self.route.points());
                }
                AppendOutcome::Extended { segment_km } => {
                    debug!("Route extended by {:.1} m", segment_km * 1000.0);
                    self.plotted = RoutePoints::new(self.route.points());
                }
                AppendOutcome::Discarded { .. } => {}
            }
        }
        self.recompute();
        Some(verdict)
    }

    /// Periodic refresh of duration and calories; no-op unless tracking.
    pub fn tick(&mut self) {
        if self.state == SessionState::Tracking {
            self.recompute();
        }
    }

    pub fn update_weight(&mut self, weight_kg: f64) {
        self.profile = UserProfile::new(weight_kg);
        self.recompute();
    }

    fn recompute(&mut self) {
        let duration_ms = self.active_time.current(self.clock.now_millis());
        let distance_km = self.route.total_distance_km();
        let calories_kcal = self.calculator.calculate_calories(
            self.profile.weight_kg,
            distance_km,
            duration_ms,
            self.filter.is_moving(),
        );
        self.metrics = Metrics {
            distance_km,
            duration_ms,
            calories_kcal,
            pace_kmh: calculate_pace(distance_km, duration_ms),
        };
    }

    fn reset_workout(&mut self) {
        self.filter.reset();
        self.route.clear();
        self.plotted = RoutePoints::default();
        self.active_time.reset();
        self.calculator.reset();
        self.current_location = None;
        self.metrics = Metrics::default();
        self.started_at = None;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state == SessionState::Tracking
    }

    pub fn is_moving(&self) -> bool {
        self.filter.is_moving()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn current_location(&self) -> Option<GeoPoint> {
        self.current_location
    }

    pub fn profile(&self) -> UserProfile {
        self.profile
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Metrics as of the last fix, tick or command.
    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn display(&self) -> DisplayMetrics {
        DisplayMetrics::from_metrics(&self.metrics)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            is_tracking: self.is_tracking(),
            is_moving: self.is_moving(),
            current_location: self.current_location,
            route: self.plotted.clone(),
            total_distance_km: self.metrics.distance_km,
            duration_ms: self.metrics.duration_ms,
            calories_kcal: self.metrics.calories_kcal,
            pace_kmh: self.metrics.pace_kmh,
            weight_kg: self.profile.weight_kg,
            display: self.display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::geodesy::offset_m;
    use approx::assert_abs_diff_eq;

    const T0: i64 = 1_700_000_000_000;

    fn origin() -> GeoPoint {
        GeoPoint::new(52.52, 13.405)
    }

    fn session() -> (TrackingSession, ManualClock) {
        let clock = ManualClock::new(T0);
        let session = TrackingSession::new(TrackerConfig::default(), Arc::new(clock.clone()));
        (session, clock)
    }

    /// Advance the clock by `gap_ms` and push a fix `north_m` north of the origin.
    fn walk(session: &mut TrackingSession, clock: &ManualClock, north_m: f64, gap_ms: i64) -> Verdict {
        clock.advance(gap_ms);
        let p = offset_m(origin(), north_m, 0.0);
        let fix = Fix::new(p.latitude, p.longitude, 5.0, clock.now_millis());
        session.push_fix(fix).unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let (mut session, _clock) = session();
        assert_eq!(session.state(), SessionState::Idle);

        session.start(LocationPermission::Granted).unwrap();
        assert_eq!(session.state(), SessionState::Tracking);
        assert_eq!(
            session.start(LocationPermission::Granted),
            Err(TrackerError::AlreadyTracking)
        );

        session.pause().unwrap();
        assert_eq!(session.state(), SessionState::Paused);
        assert_eq!(session.pause(), Err(TrackerError::NotTracking));

        session.resume(LocationPermission::Granted).unwrap();
        assert_eq!(
            session.resume(LocationPermission::Granted),
            Err(TrackerError::AlreadyTracking)
        );

        session.stop().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.stop(), Err(TrackerError::NotTracking));
        assert!(matches!(
            session.resume(LocationPermission::Granted),
            Err(TrackerError::InvalidState(_))
        ));
    }

    #[test]
    fn test_permission_denied_leaves_state_untouched() {
        let (mut session, _clock) = session();
        assert_eq!(
            session.start(LocationPermission::Denied),
            Err(TrackerError::PermissionDenied)
        );
        assert_eq!(session.state(), SessionState::Idle);

        session.start(LocationPermission::Granted).unwrap();
        session.pause().unwrap();
        assert_eq!(
            session.resume(false.into()),
            Err(TrackerError::PermissionDenied)
        );
        assert_eq!(session.state(), SessionState::Paused);
    }

    #[test]
    fn test_fixes_ignored_unless_tracking() {
        let (mut session, clock) = session();
        let fix = Fix::new(52.52, 13.405, 5.0, clock.now_millis());
        assert!(session.push_fix(fix).is_none());
        assert_eq!(session.current_location(), None);

        session.start(LocationPermission::Granted).unwrap();
        session.pause().unwrap();
        assert!(session.push_fix(fix).is_none());
        assert_eq!(session.current_location(), None);
    }

    #[test]
    fn test_walk_builds_route_and_distance() {
        let (mut session, clock) = session();
        session.start(LocationPermission::Granted).unwrap();

        assert_eq!(walk(&mut session, &clock, 0.0, 1_000), Verdict::Reference);
        assert!(session.route().is_empty());

        // 5 m/s steps north
        for step in 1..=4 {
            assert!(walk(&mut session, &clock, 5.0 * step as f64, 1_000).is_movement());
        }
        // First accepted point is plotted without distance, three 5 m segments follow
        assert_eq!(session.route().len(), 4);
        assert_abs_diff_eq!(session.metrics().distance_km, 0.015, epsilon = 1e-9);
        assert_eq!(session.metrics().duration_ms, 5_000);
        assert!(session.is_moving());
        assert!(session.metrics().calories_kcal > 0.0);
    }

    #[test]
    fn test_poor_accuracy_fix_updates_marker_only() {
        let (mut session, clock) = session();
        session.start(LocationPermission::Granted).unwrap();
        walk(&mut session, &clock, 0.0, 1_000);
        walk(&mut session, &clock, 5.0, 1_000);

        clock.advance(1_000);
        let far = offset_m(origin(), 100.0, 0.0);
        let verdict = session
            .push_fix(Fix::new(far.latitude, far.longitude, 35.0, clock.now_millis()))
            .unwrap();
        assert_eq!(verdict, Verdict::PoorAccuracy);
        assert_eq!(session.current_location(), Some(far));
        assert!(!session.is_moving());
        assert_eq!(session.route().len(), 1);
    }

    #[test]
    fn test_pause_freezes_duration_and_calories() {
        let (mut session, clock) = session();
        session.start(LocationPermission::Granted).unwrap();
        walk(&mut session, &clock, 0.0, 1_000);
        for step in 1..=10 {
            walk(&mut session, &clock, 3.5 * step as f64, 1_000);
        }
        let before = session.metrics();
        assert_eq!(before.duration_ms, 11_000);

        session.pause().unwrap();
        assert!(!session.is_moving());
        clock.advance(30_000);
        session.tick();
        assert_eq!(session.metrics(), before);

        session.resume(LocationPermission::Granted).unwrap();
        clock.advance(2_000);
        session.tick();
        assert_eq!(session.metrics().duration_ms, 13_000);
        // Not moving since the pause, so calories hold their value
        assert_eq!(session.metrics().calories_kcal, before.calories_kcal);
        assert_eq!(session.metrics().distance_km, before.distance_km);
    }

    #[test]
    fn test_tick_advances_duration_without_fixes() {
        let (mut session, clock) = session();
        session.start(LocationPermission::Granted).unwrap();
        clock.advance(5_000);
        session.tick();
        assert_eq!(session.metrics().duration_ms, 5_000);
        assert_eq!(session.display().duration, "00:00:05");
    }

    #[test]
    fn test_weight_update_recomputes_calories() {
        let (mut session, clock) = session();
        session.start(LocationPermission::Granted).unwrap();
        walk(&mut session, &clock, 0.0, 1_000);
        for step in 1..=5 {
            walk(&mut session, &clock, 5.0 * step as f64, 1_000);
        }
        let at_70 = session.metrics().calories_kcal;
        session.update_weight(140.0);
        assert_abs_diff_eq!(session.metrics().calories_kcal, at_70 * 2.0, epsilon = 1e-9);
        assert_eq!(session.profile().weight_kg, 140.0);
    }

    #[test]
    fn test_stop_keeps_results_and_returns_summary() {
        let (mut session, clock) = session();
        session.start(LocationPermission::Granted).unwrap();
        walk(&mut session, &clock, 0.0, 1_000);
        for step in 1..=3 {
            walk(&mut session, &clock, 10.0 * step as f64, 2_000);
        }
        let summary = session.stop().unwrap();

        assert_eq!(summary.id, format!("workout_{T0}"));
        assert_eq!(summary.timestamp_ms, T0);
        assert_eq!(summary.duration_ms, 7_000);
        assert_eq!(summary.route.len(), 3);
        assert_abs_diff_eq!(summary.distance_km, 0.020, epsilon = 1e-9);
        assert_eq!(summary.route, session.route().points());

        // Still visible after stop, frozen
        clock.advance(10_000);
        session.tick();
        assert_eq!(session.metrics().duration_ms, 7_000);
        assert!(!session.is_tracking());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (mut session, clock) = session();
        session.start(LocationPermission::Granted).unwrap();
        walk(&mut session, &clock, 0.0, 1_000);
        walk(&mut session, &clock, 5.0, 1_000);
        walk(&mut session, &clock, 10.0, 1_000);

        session.clear();
        let first = session.snapshot();
        session.clear();
        let second = session.snapshot();

        assert_eq!(first, second);
        assert_eq!(first, SessionSnapshot::empty(70.0));
    }

    #[test]
    fn test_snapshot_route_only_rebuilt_when_plotted() {
        let (mut session, clock) = session();
        session.start(LocationPermission::Granted).unwrap();
        walk(&mut session, &clock, 0.0, 1_000);
        walk(&mut session, &clock, 5.0, 1_000);
        let before = session.snapshot().route;

        // Stationary fix and a tick leave the plotted route alone
        walk(&mut session, &clock, 5.0, 1_000);
        clock.advance(1_000);
        session.tick();
        let after = session.snapshot().route;
        assert!(std::ptr::eq(before.as_ptr(), after.as_ptr()));

        walk(&mut session, &clock, 10.0, 1_000);
        let extended = session.snapshot().route;
        assert_eq!(extended.len(), 2);
        assert_eq!(&*extended, session.route().points());
    }

    #[test]
    fn test_start_discards_previous_workout() {
        let (mut session, clock) = session();
        session.start(LocationPermission::Granted).unwrap();
        walk(&mut session, &clock, 0.0, 1_000);
        walk(&mut session, &clock, 5.0, 1_000);
        walk(&mut session, &clock, 10.0, 1_000);
        session.stop().unwrap();

        session.start(LocationPermission::Granted).unwrap();
        assert!(session.route().is_empty());
        assert_eq!(session.metrics(), Metrics::default());
        assert_eq!(session.current_location(), None);
        // Fresh reference: first fix only sets the reference point
        assert_eq!(walk(&mut session, &clock, 50.0, 1_000), Verdict::Reference);
    }
}
