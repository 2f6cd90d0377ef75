use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::json;

use fitness_tracker_rs::{
    Clock, Fix, LocationPermission, ManualClock, SessionState, TrackerConfig, TrackingSession,
    WorkoutSummary,
};

const TICK_MS: i64 = 1000;

#[derive(Parser, Debug)]
#[command(about = "Replay a recorded fix log through a tracking session", long_about = None)]
struct Args {
    /// JSON-lines file with one fix per line
    #[arg(long)]
    fixes: PathBuf,

    /// Body weight used for calorie estimates (kg)
    #[arg(long, default_value = "70")]
    weight: f64,

    /// Pause this many ms after the first fix
    #[arg(long)]
    pause_at: Option<i64>,

    /// Resume this many ms after the first fix
    #[arg(long, requires = "pause_at")]
    resume_at: Option<i64>,

    /// Tracker config JSON file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_fixes(path: &Path) -> anyhow::Result<Vec<Fix>> {
    let reader = BufReader::new(File::open(path)?);
    let mut fixes = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fix: Fix = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;
        fixes.push(fix);
    }
    Ok(fixes)
}

/// Pause/resume offsets relative to the first fix.
#[derive(Debug, Clone, Copy, Default)]
struct Schedule {
    pause_at: Option<i64>,
    resume_at: Option<i64>,
}

struct Replay {
    session: TrackingSession,
    clock: ManualClock,
    origin: i64,
    schedule: Schedule,
    stats: ReplayStats,
}

#[derive(Debug, Default)]
struct ReplayStats {
    fixes: usize,
    movements: usize,
    ticks: usize,
}

impl Replay {
    fn new(
        config: TrackerConfig,
        weight_kg: f64,
        origin: i64,
        schedule: Schedule,
    ) -> anyhow::Result<Self> {
        let clock = ManualClock::new(origin);
        let mut session = TrackingSession::new(config, Arc::new(clock.clone()));
        session.update_weight(weight_kg);
        session.start(LocationPermission::Granted)?;
        Ok(Self {
            session,
            clock,
            origin,
            schedule,
            stats: ReplayStats::default(),
        })
    }

    fn apply_schedule(&mut self) -> anyhow::Result<()> {
        let offset = self.clock.now_millis() - self.origin;
        let state = self.session.state();
        if state == SessionState::Tracking
            && self.schedule.pause_at.is_some_and(|at| offset >= at)
            && !self.schedule.resume_at.is_some_and(|at| offset >= at)
        {
            self.session.pause()?;
            println!("[replay] paused at +{offset} ms");
        } else if state == SessionState::Paused
            && self.schedule.resume_at.is_some_and(|at| offset >= at)
        {
            self.session.resume(LocationPermission::Granted)?;
            println!("[replay] resumed at +{offset} ms");
        }
        Ok(())
    }

    /// Tick once per whole second until `timestamp`, then deliver the fix.
    fn feed(&mut self, fix: Fix) -> anyhow::Result<()> {
        while self.clock.now_millis() + TICK_MS <= fix.timestamp {
            self.clock.advance(TICK_MS);
            self.apply_schedule()?;
            self.session.tick();
            self.stats.ticks += 1;
        }
        if fix.timestamp > self.clock.now_millis() {
            self.clock.set(fix.timestamp);
        }
        self.apply_schedule()?;

        self.stats.fixes += 1;
        if self.session.push_fix(fix).is_some_and(|v| v.is_movement()) {
            self.stats.movements += 1;
        }
        Ok(())
    }

    fn finish(mut self) -> anyhow::Result<(WorkoutSummary, ReplayStats)> {
        let display = self.session.display();
        println!("Duration: {}", display.duration);
        println!("Distance: {}", display.distance);
        println!("Calories: {}", display.calories);
        println!("Pace:     {}", display.pace);
        Ok((self.session.stop()?, self.stats))
    }
}

fn run(
    fixes: Vec<Fix>,
    config: TrackerConfig,
    weight_kg: f64,
    schedule: Schedule,
) -> anyhow::Result<(WorkoutSummary, ReplayStats)> {
    let Some(first) = fixes.first() else {
        bail!("fix log is empty");
    };
    let mut replay = Replay::new(config, weight_kg, first.timestamp, schedule)?;
    for fix in fixes {
        replay.feed(fix)?;
    }
    replay.finish()
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = match args.config.as_ref() {
        Some(path) => TrackerConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => TrackerConfig::default(),
    };
    let fixes = load_fixes(&args.fixes)?;
    let schedule = Schedule {
        pause_at: args.pause_at,
        resume_at: args.resume_at,
    };

    let (summary, stats) = run(fixes, config, args.weight, schedule)?;
    let report = json!({
        "fixes": stats.fixes,
        "movement_fixes": stats.movements,
        "ticks": stats.ticks,
        "summary": summary,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ~5 m of latitude
    const STEP_DEG: f64 = 0.000045;

    fn straight_walk(n: usize, every_ms: i64) -> Vec<Fix> {
        (0..n)
            .map(|i| {
                let timestamp = 1_000_000 + every_ms * i as i64;
                Fix::new(45.0 + STEP_DEG * i as f64, 7.0, 4.0, timestamp)
            })
            .collect()
    }

    #[test]
    fn test_replay_counts_movements_and_ticks() {
        let (summary, stats) = run(
            straight_walk(6, 2000),
            TrackerConfig::default(),
            70.0,
            Schedule::default(),
        )
        .unwrap();
        assert_eq!(stats.fixes, 6);
        assert_eq!(stats.movements, 5);
        assert_eq!(stats.ticks, 10);
        assert_eq!(summary.duration_ms, 10_000);
        assert_eq!(summary.route.len(), 5);
    }

    #[test]
    fn test_pause_window_excluded_from_duration() {
        let schedule = Schedule {
            pause_at: Some(4000),
            resume_at: Some(7000),
        };
        let (summary, _) =
            run(straight_walk(6, 2000), TrackerConfig::default(), 70.0, schedule).unwrap();
        assert_eq!(summary.duration_ms, 7_000);
    }

    #[test]
    fn test_empty_log_is_an_error() {
        let result = run(Vec::new(), TrackerConfig::default(), 70.0, Schedule::default());
        assert!(result.is_err());
    }
}
