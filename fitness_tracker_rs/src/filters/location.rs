//! Fix-by-fix movement classification.
//!
//! Every fix with usable accuracy becomes the reference for the next one,
//! whether or not it was itself classified as movement. Poor-accuracy fixes
//! never touch the reference.

use log::debug;

use crate::config::TrackerConfig;
use crate::geodesy::great_circle_distance_m;
use crate::types::Fix;

/// Filter state carried between fixes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackState {
    pub last_valid_fix: Option<Fix>,
    pub is_moving: bool,
    pub last_fix_time: i64,
}

/// Outcome of classifying a single fix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verdict {
    /// Accuracy radius too large; state reference untouched
    PoorAccuracy,
    /// First usable fix, stored as the reference point
    Reference,
    /// Genuine movement relative to the reference fix
    Movement { distance_m: f64, speed_mps: f64 },
    /// Usable fix that did not move far or fast enough (or moved implausibly fast)
    Stationary { distance_m: f64, speed_mps: f64 },
}

impl Verdict {
    pub fn is_movement(&self) -> bool {
        matches!(self, Verdict::Movement { .. })
    }
}

/// Movement test with strict bounds on both distance and implied speed.
pub fn is_movement(config: &TrackerConfig, distance_m: f64, speed_mps: f64) -> bool {
    distance_m > config.min_movement_m
        && speed_mps > config.min_speed_mps
        && speed_mps < config.max_speed_mps
}

/// Implied speed in m/s from a distance in meters and a gap in milliseconds.
/// Non-positive gaps yield zero.
pub fn implied_speed_mps(distance_m: f64, gap_ms: i64) -> f64 {
    if gap_ms > 0 {
        distance_m * 1000.0 / gap_ms as f64
    } else {
        0.0
    }
}

/// Classify `fix` against `state`, returning the verdict and the updated state.
pub fn classify(config: &TrackerConfig, fix: &Fix, state: &TrackState) -> (Verdict, TrackState) {
    if fix.accuracy > config.max_accuracy_m {
        let next = TrackState {
            is_moving: false,
            ..*state
        };
        return (Verdict::PoorAccuracy, next);
    }

    let Some(reference) = state.last_valid_fix else {
        let next = TrackState {
            last_valid_fix: Some(*fix),
            is_moving: false,
            last_fix_time: fix.timestamp,
        };
        return (Verdict::Reference, next);
    };

    let distance_m = great_circle_distance_m(reference.position(), fix.position());
    let speed_mps = implied_speed_mps(distance_m, fix.timestamp - state.last_fix_time);
    let moving = is_movement(config, distance_m, speed_mps);

    let next = TrackState {
        last_valid_fix: Some(*fix),
        is_moving: moving,
        last_fix_time: fix.timestamp,
    };
    let verdict = if moving {
        Verdict::Movement {
            distance_m,
            speed_mps,
        }
    } else {
        Verdict::Stationary {
            distance_m,
            speed_mps,
        }
    };
    (verdict, next)
}

/// Owns the [`TrackState`] for a tracking session.
#[derive(Clone, Debug)]
pub struct LocationFilter {
    config: TrackerConfig,
    state: TrackState,
}

impl LocationFilter {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            state: TrackState::default(),
        }
    }

    pub fn process(&mut self, fix: &Fix) -> Verdict {
        let (verdict, next) = classify(&self.config, fix, &self.state);
        self.state = next;

        match verdict {
            Verdict::PoorAccuracy => debug!("Fix rejected: accuracy {:.1} m too poor", fix.accuracy),
            Verdict::Reference => debug!("Reference fix stored"),
            Verdict::Movement {
                distance_m,
                speed_mps,
            } => debug!("Valid movement: {distance_m:.2} m at {speed_mps:.2} m/s"),
            Verdict::Stationary {
                distance_m,
                speed_mps,
            } => debug!("No movement: {distance_m:.2} m at {speed_mps:.2} m/s"),
        }
        verdict
    }

    pub fn state(&self) -> &TrackState {
        &self.state
    }

    pub fn is_moving(&self) -> bool {
        self.state.is_moving
    }

    /// Clear the movement flag but keep the reference point (pause).
    pub fn halt(&mut self) {
        self.state.is_moving = false;
    }

    pub fn reset(&mut self) {
        self.state = TrackState::default();
    }
}
