//! Wall-clock "tracking enabled" time across start/pause/resume cycles.
//!
//! Independent of the location filter: duration keeps accruing through
//! movement gaps as long as tracking is running.

/// Accumulated active time. All methods take the current time explicitly
/// (milliseconds since the epoch) so the owner decides which clock to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActiveTimeTracker {
    active_millis: i64,
    last_resume: Option<i64>,
}

impl ActiveTimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: i64) {
        self.active_millis = 0;
        self.last_resume = Some(now);
    }

    /// Fold the running interval into the total. No-op when already paused.
    pub fn pause(&mut self, now: i64) {
        if let Some(resumed_at) = self.last_resume.take() {
            self.active_millis += (now - resumed_at).max(0);
        }
    }

    /// Open a new running interval. No-op when already running, so a stray
    /// resume never drops the interval in progress.
    pub fn resume(&mut self, now: i64) {
        if self.last_resume.is_none() {
            self.last_resume = Some(now);
        }
    }

    pub fn current(&self, now: i64) -> i64 {
        match self.last_resume {
            Some(resumed_at) => self.active_millis + (now - resumed_at).max(0),
            None => self.active_millis,
        }
    }

    pub fn is_running(&self) -> bool {
        self.last_resume.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
