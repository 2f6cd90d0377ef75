use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::info;
use tokio::time::{sleep, Duration, Instant};

use fitness_tracker_rs::sensors::{fix_feed_loop, SyntheticWalk};
use fitness_tracker_rs::{
    Clock, GeoPoint, LocationPermission, SystemClock, TrackerConfig, TrackerService,
};

#[derive(Parser, Debug)]
#[command(name = "fitness_tracker")]
#[command(about = "Live workout session driven by a simulated location provider", long_about = None)]
struct Args {
    /// Duration in seconds
    #[arg(value_name = "SECONDS", default_value = "60")]
    duration: u64,

    /// Body weight used for calorie estimates (kg)
    #[arg(long, default_value = "70")]
    weight: f64,

    /// Simulated walking speed (m/s)
    #[arg(long, default_value = "1.4")]
    speed: f64,

    /// Interval between location fixes (ms)
    #[arg(long, default_value = "1000")]
    interval: u64,

    /// Reported accuracy radius of good fixes (m)
    #[arg(long, default_value = "5")]
    accuracy: f64,

    /// Pause the workout after this many seconds
    #[arg(long)]
    pause_after: Option<u64>,

    /// Length of the pause (seconds)
    #[arg(long, default_value = "10")]
    pause_for: u64,

    /// Tracker config JSON file; missing fields keep their defaults
    #[arg(long)]
    config: Option<String>,

    /// Output directory for the workout summary
    #[arg(long, default_value = "fitness_tracker_sessions")]
    output_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {path}"))?;
            TrackerConfig::from_json(&json)?
        }
        None => TrackerConfig::default(),
    };

    println!("[{}] Fitness Tracker RS Starting", ts_now());
    println!("  Duration: {} seconds", args.duration);
    println!("  Weight: {} kg", args.weight);
    println!("  Speed: {} m/s, fix every {} ms", args.speed, args.interval);
    println!("  Output Dir: {}", args.output_dir);

    std::fs::create_dir_all(&args.output_dir)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (handle, service) = TrackerService::spawn(config, clock.clone())?;
    handle.update_weight(args.weight).await?;
    handle.start(LocationPermission::Granted).await?;

    let walk = SyntheticWalk::new(GeoPoint::new(37.7749, -122.4194), args.speed, args.accuracy);
    let feed = tokio::spawn(fix_feed_loop(
        handle.clone(),
        walk,
        clock.clone(),
        Duration::from_millis(args.interval),
    ));

    let started = Instant::now();
    let deadline = started + Duration::from_secs(args.duration);
    let mut paused_until: Option<Instant> = None;
    let mut pause_taken = false;
    let display = handle.display();

    while Instant::now() < deadline {
        tokio::select! {
            _ = sleep(Duration::from_secs(2)) => {}
            _ = tokio::time::sleep_until(deadline) => break,
        }

        let elapsed = started.elapsed().as_secs();
        match paused_until {
            None if !pause_taken && args.pause_after.is_some_and(|after| elapsed >= after) => {
                handle.pause().await?;
                pause_taken = true;
                paused_until = Some(Instant::now() + Duration::from_secs(args.pause_for));
                println!("[{}] Paused", ts_now());
            }
            Some(until) if Instant::now() >= until => {
                handle.resume(LocationPermission::Granted).await?;
                paused_until = None;
                println!("[{}] Resumed", ts_now());
            }
            _ => {}
        }

        let metrics = display.latest();
        let snapshot = handle.snapshot();
        println!(
            "[{}] {} | {} | {} | {} | {} pts{}",
            ts_now(),
            metrics.duration,
            metrics.distance,
            metrics.calories,
            metrics.pace,
            snapshot.route.len(),
            if snapshot.is_moving { " | moving" } else { "" }
        );
    }

    println!("[{}] Duration reached, stopping...", ts_now());
    let summary = handle.stop().await?;
    handle.shutdown().await?;
    feed.await?;
    service.await?;

    let filename = format!("{}/{}.json", args.output_dir, summary.id);
    std::fs::write(&filename, summary.to_json()?)?;
    info!("Saved workout summary to {filename}");

    println!("\n=== Workout Summary ===");
    println!("Distance: {:.3} km", summary.distance_km);
    println!("Duration: {} s", summary.duration_ms / 1000);
    println!("Calories: {:.1} kcal", summary.calories_kcal);
    println!("Average pace: {:.2} km/h", summary.average_pace_kmh);
    println!("Route points: {}", summary.route.len());

    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
