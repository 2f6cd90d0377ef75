//! Synthetic location provider for the simulator binary and tests.

use std::f64::consts::PI;
use std::sync::Arc;

use log::{debug, info};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::clock::Clock;
use crate::geodesy::offset_m;
use crate::tracker::TrackerHandle;
use crate::types::{Fix, GeoPoint};

/// Every Nth fix is reported with a degraded accuracy radius.
const POOR_FIX_EVERY: u64 = 15;
/// Walk/stand cycle, in fixes: walk for two thirds, stand for the rest.
const CYCLE_FIXES: u64 = 30;
const STAND_FROM: u64 = 20;
/// Amplitude of the position jitter (meters)
const JITTER_M: f64 = 0.8;

/// Deterministic walker that wanders around `origin` at a steady pace,
/// with stationary stretches, position jitter and the occasional bad fix.
#[derive(Debug, Clone)]
pub struct SyntheticWalk {
    origin: GeoPoint,
    speed_mps: f64,
    accuracy_m: f64,
    north_m: f64,
    east_m: f64,
    last_timestamp: Option<i64>,
    seq: u64,
}

impl SyntheticWalk {
    pub fn new(origin: GeoPoint, speed_mps: f64, accuracy_m: f64) -> Self {
        Self {
            origin,
            speed_mps,
            accuracy_m,
            north_m: 0.0,
            east_m: 0.0,
            last_timestamp: None,
            seq: 0,
        }
    }

    pub fn is_standing(&self) -> bool {
        self.seq % CYCLE_FIXES >= STAND_FROM
    }

    /// Produce the fix observed at `timestamp_ms`.
    pub fn fix_at(&mut self, timestamp_ms: i64) -> Fix {
        let dt_s = self
            .last_timestamp
            .map(|last| (timestamp_ms - last).max(0) as f64 / 1000.0)
            .unwrap_or(0.0);
        self.last_timestamp = Some(timestamp_ms);

        if !self.is_standing() {
            let heading = (self.seq as f64 * 0.05).sin() * PI / 4.0;
            let step = self.speed_mps * dt_s;
            self.north_m += step * heading.cos();
            self.east_m += step * heading.sin();
        }

        let t = self.seq as f64;
        let position = offset_m(
            self.origin,
            self.north_m + (t * 1.3).sin() * JITTER_M,
            self.east_m + (t * 0.7).cos() * JITTER_M,
        );
        let accuracy = if self.seq > 0 && self.seq % POOR_FIX_EVERY == 0 {
            self.accuracy_m * 4.0 + 30.0
        } else {
            self.accuracy_m + (t * 0.1).sin().abs()
        };
        self.seq += 1;

        Fix::new(position.latitude, position.longitude, accuracy, timestamp_ms)
    }
}

/// Feed fixes from `walk` into the tracker every `period` until the service
/// goes away.
pub async fn fix_feed_loop(
    handle: TrackerHandle,
    mut walk: SyntheticWalk,
    clock: Arc<dyn Clock>,
    period: Duration,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut fix_count = 0u64;

    loop {
        ticker.tick().await;
        let fix = walk.fix_at(clock.now_millis());
        if handle.push_fix(fix).await.is_err() {
            info!("[gps] Feed closed after {fix_count} fixes");
            break;
        }
        fix_count += 1;
        if fix_count % 10 == 0 {
            debug!("[gps] {fix_count} fixes");
        }
    }
}
