//! Published session state.
//!
//! Every mutation of a session ends with one [`SessionSnapshot`] being
//! committed to a `tokio::sync::watch` channel. Per-field subscriptions are
//! projections of that single stream, so a subscriber can never see one field
//! from before a reset and another from after it.

use std::ops::Deref;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tokio::sync::watch;

use crate::display::DisplayMetrics;
use crate::error::{TrackerError, TrackerResult};
use crate::metrics::Metrics;
use crate::session::SessionState;
use crate::types::GeoPoint;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub is_tracking: bool,
    pub is_moving: bool,
    pub current_location: Option<GeoPoint>,
    pub route: RoutePoints,
    pub total_distance_km: f64,
    pub duration_ms: i64,
    pub calories_kcal: f64,
    pub pace_kmh: f64,
    pub weight_kg: f64,
    pub display: DisplayMetrics,
}

impl SessionSnapshot {
    /// Snapshot of a session with nothing recorded.
    pub fn empty(weight_kg: f64) -> Self {
        Self {
            state: SessionState::Idle,
            is_tracking: false,
            is_moving: false,
            current_location: None,
            route: RoutePoints::default(),
            total_distance_km: 0.0,
            duration_ms: 0,
            calories_kcal: 0.0,
            pace_kmh: 0.0,
            weight_kg,
            display: DisplayMetrics::from_metrics(&Metrics::default()),
        }
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            distance_km: self.total_distance_km,
            duration_ms: self.duration_ms,
            calories_kcal: self.calories_kcal,
            pace_kmh: self.pace_kmh,
        }
    }

    pub fn to_json(&self) -> TrackerResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Shared, immutable copy of the plotted route.
///
/// Rebuilt only when a vertex is plotted or the route is cleared; snapshots
/// taken in between share one allocation and compare by pointer.
#[derive(Clone, Debug)]
pub struct RoutePoints(Arc<[GeoPoint]>);

impl RoutePoints {
    pub fn new(points: &[GeoPoint]) -> Self {
        Self(Arc::from(points))
    }

    pub fn to_vec(&self) -> Vec<GeoPoint> {
        self.0.to_vec()
    }
}

impl Default for RoutePoints {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl Deref for RoutePoints {
    type Target = [GeoPoint];

    fn deref(&self) -> &[GeoPoint] {
        &self.0
    }
}

impl PartialEq for RoutePoints {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Serialize for RoutePoints {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

/// Single writer side of the snapshot stream.
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<SessionSnapshot>,
}

impl SnapshotPublisher {
    pub fn new(initial: SessionSnapshot) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Commit `snapshot`; subscribers are only woken if something changed.
    pub fn publish(&self, snapshot: SessionSnapshot) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        })
    }

    pub fn latest(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }
}

/// One field of the snapshot stream.
#[derive(Debug, Clone)]
pub struct Subscription<T> {
    rx: watch::Receiver<SessionSnapshot>,
    project: fn(&SessionSnapshot) -> T,
}

impl<T> Subscription<T> {
    pub fn new(rx: watch::Receiver<SessionSnapshot>, project: fn(&SessionSnapshot) -> T) -> Self {
        Self { rx, project }
    }

    /// Value from the most recently committed snapshot.
    pub fn latest(&self) -> T {
        (self.project)(&self.rx.borrow())
    }

    /// Wait for the next commit and return this field's value from it.
    pub async fn changed(&mut self) -> TrackerResult<T> {
        self.rx
            .changed()
            .await
            .map_err(|_| TrackerError::Internal("tracker stopped publishing".to_string()))?;
        Ok((self.project)(&self.rx.borrow_and_update()))
    }
}
