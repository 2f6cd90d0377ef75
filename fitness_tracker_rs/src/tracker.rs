//! Async single-writer service around a [`TrackingSession`].
//!
//! One task owns the session. Fixes and commands arrive over an mpsc channel,
//! the periodic tick comes from a `tokio::time::interval`, and both are
//! handled sequentially by the same `select!` loop. The tick branch is only
//! polled while tracking, so once a pause or stop has been processed no tick
//! can touch the session until tracking resumes.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::clock::Clock;
use crate::config::TrackerConfig;
use crate::display::DisplayMetrics;
use crate::error::{TrackerError, TrackerResult};
use crate::live_status::{RoutePoints, SessionSnapshot, SnapshotPublisher, Subscription};
use crate::session::{LocationPermission, TrackingSession};
use crate::types::{Fix, GeoPoint};
use crate::workout::WorkoutSummary;

const COMMAND_QUEUE: usize = 100;

type Reply<T> = oneshot::Sender<TrackerResult<T>>;

enum Command {
    Start {
        permission: LocationPermission,
        reply: Reply<()>,
    },
    Pause {
        reply: Reply<()>,
    },
    Resume {
        permission: LocationPermission,
        reply: Reply<()>,
    },
    Stop {
        reply: Reply<WorkoutSummary>,
    },
    Clear {
        reply: Reply<()>,
    },
    PushFix(Fix),
    UpdateWeight(f64),
    Shutdown,
}

pub struct TrackerService;

impl TrackerService {
    /// Spawn the session task on the current tokio runtime.
    pub fn spawn(
        config: TrackerConfig,
        clock: Arc<dyn Clock>,
    ) -> TrackerResult<(TrackerHandle, JoinHandle<()>)> {
        config.validate()?;

        let session = TrackingSession::new(config, clock);
        let publisher = SnapshotPublisher::new(session.snapshot());
        let snapshots = publisher.subscribe();
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);

        let task = tokio::spawn(run(session, rx, publisher, config.tick_interval()));
        Ok((
            TrackerHandle {
                commands: tx,
                snapshots,
            },
            task,
        ))
    }
}

async fn run(
    mut session: TrackingSession,
    mut commands: mpsc::Receiver<Command>,
    publisher: SnapshotPublisher,
    tick_every: Duration,
) {
    let mut ticker = interval(tick_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                let Some(command) = command else { break };
                if matches!(command, Command::Shutdown) {
                    break;
                }
                let was_tracking = session.is_tracking();
                apply(&mut session, &publisher, command);
                if !was_tracking && session.is_tracking() {
                    // First tick one full period after start/resume
                    ticker.reset();
                }
            }
            _ = ticker.tick(), if session.is_tracking() => {
                session.tick();
            }
        }
        publisher.publish(session.snapshot());
    }
    info!("Tracker service stopped");
}

fn apply(session: &mut TrackingSession, publisher: &SnapshotPublisher, command: Command) {
    match command {
        Command::Start { permission, reply } => {
            let result = session.start(permission);
            commit(session, publisher, reply, result);
        }
        Command::Pause { reply } => {
            let result = session.pause();
            commit(session, publisher, reply, result);
        }
        Command::Resume { permission, reply } => {
            let result = session.resume(permission);
            commit(session, publisher, reply, result);
        }
        Command::Stop { reply } => {
            let result = session.stop();
            commit(session, publisher, reply, result);
        }
        Command::Clear { reply } => {
            session.clear();
            commit(session, publisher, reply, Ok(()));
        }
        Command::PushFix(fix) => {
            session.push_fix(fix);
        }
        Command::UpdateWeight(weight_kg) => session.update_weight(weight_kg),
        Command::Shutdown => {}
    }
}

/// The snapshot is committed before the caller is answered.
fn commit<T>(
    session: &TrackingSession,
    publisher: &SnapshotPublisher,
    reply: Reply<T>,
    result: TrackerResult<T>,
) {
    publisher.publish(session.snapshot());
    if let Err(err) = &result {
        warn!("Command refused: {err}");
    }
    // Caller may have given up waiting
    let _ = reply.send(result);
}

fn service_gone<E>(_: E) -> TrackerError {
    TrackerError::Internal("tracker service is not running".to_string())
}

/// Cloneable handle to a running [`TrackerService`].
#[derive(Clone, Debug)]
pub struct TrackerHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Start { .. } => "Start",
            Command::Pause { .. } => "Pause",
            Command::Resume { .. } => "Resume",
            Command::Stop { .. } => "Stop",
            Command::Clear { .. } => "Clear",
            Command::PushFix(_) => "PushFix",
            Command::UpdateWeight(_) => "UpdateWeight",
            Command::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

impl TrackerHandle {
    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> TrackerResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(service_gone)?;
        response.await.map_err(service_gone)?
    }

    pub async fn start(&self, permission: LocationPermission) -> TrackerResult<()> {
        self.request(|reply| Command::Start { permission, reply })
            .await
    }

    pub async fn pause(&self) -> TrackerResult<()> {
        self.request(|reply| Command::Pause { reply }).await
    }

    pub async fn resume(&self, permission: LocationPermission) -> TrackerResult<()> {
        self.request(|reply| Command::Resume { permission, reply })
            .await
    }

    pub async fn stop(&self) -> TrackerResult<WorkoutSummary> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn clear(&self) -> TrackerResult<()> {
        self.request(|reply| Command::Clear { reply }).await
    }

    /// Queue a raw fix from the location provider.
    pub async fn push_fix(&self, fix: Fix) -> TrackerResult<()> {
        self.commands
            .send(Command::PushFix(fix))
            .await
            .map_err(service_gone)
    }

    pub async fn update_weight(&self, weight_kg: f64) -> TrackerResult<()> {
        self.commands
            .send(Command::UpdateWeight(weight_kg))
            .await
            .map_err(service_gone)
    }

    pub async fn shutdown(&self) -> TrackerResult<()> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(service_gone)
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Latest committed snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that has already seen the current commit; `changed()` waits
    /// for the next one.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        let mut rx = self.snapshots.clone();
        rx.mark_unchanged();
        rx
    }

    fn field<T>(&self, project: fn(&SessionSnapshot) -> T) -> Subscription<T> {
        Subscription::new(self.subscribe(), project)
    }

    pub fn route(&self) -> Subscription<RoutePoints> {
        self.field(|s| s.route.clone())
    }

    pub fn current_location(&self) -> Subscription<Option<GeoPoint>> {
        self.field(|s| s.current_location)
    }

    pub fn distance_km(&self) -> Subscription<f64> {
        self.field(|s| s.total_distance_km)
    }

    pub fn duration_ms(&self) -> Subscription<i64> {
        self.field(|s| s.duration_ms)
    }

    pub fn calories_kcal(&self) -> Subscription<f64> {
        self.field(|s| s.calories_kcal)
    }

    pub fn pace_kmh(&self) -> Subscription<f64> {
        self.field(|s| s.pace_kmh)
    }

    pub fn is_tracking(&self) -> Subscription<bool> {
        self.field(|s| s.is_tracking)
    }

    pub fn is_moving(&self) -> Subscription<bool> {
        self.field(|s| s.is_moving)
    }

    pub fn display(&self) -> Subscription<DisplayMetrics> {
        self.field(|s| s.display.clone())
    }
}
