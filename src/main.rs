//! Capacity Tracker - simulated gym capacity display
//!
//! This binary arms a timer that fabricates a capacity history every tick and
//! renders the resulting count, recent changes and chart to stdout.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `CAPACITY_TRACKER_TICK_INTERVAL_SECS`: Seconds between ticks (default: 5)
//! - `CAPACITY_TRACKER_HISTORY_LEN`: Retained samples/events (default: 10)
//! - `CAPACITY_TRACKER_HISTORY_STEP_MINS`: Minutes between history points (default: 30)
//! - `CAPACITY_TRACKER_BASE` / `_SPREAD` / `_OFFSET`: Count constants (default: 30/5/2)
//! - `CAPACITY_TRACKER_FACILITY`: Facility name (default: Fitstar Schwabing)
//! - `CAPACITY_TRACKER_TICK_MODE`: `synthetic` or `live` (default: synthetic)
//! - `CAPACITY_TRACKER_OUTPUT`: `text` or `json` (default: text)
//! - `RUST_LOG`: Logging level filter (default: info)

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use capacity_tracker::config::{Config, OutputFormat};
use capacity_tracker::presentation::{render_json, Dashboard};
use capacity_tracker::sample_generator::SystemClock;
use capacity_tracker::ticker::Ticker;
use capacity_tracker::tracker::{CapacityTracker, TrackerSnapshot};

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with environment filter
    init_tracing();

    info!("Starting Capacity Tracker...");

    let config = match Config::from_env() {
        Ok(config) => {
            info!(
                facility = %config.facility,
                tick_interval_secs = config.tick_interval.as_secs(),
                history_len = config.history_len,
                tick_mode = ?config.tick_mode,
                output = ?config.output,
                "Configuration loaded"
            );
            config
        }
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let ticker = Ticker::arm(
        CapacityTracker::from_config(&config),
        config.tick_interval,
        StdRng::from_entropy(),
        SystemClock,
    );

    // Spawn render task - redraws on every published snapshot
    let updates = ticker.subscribe();
    let render_config = config.clone();
    let render_handle = tokio::spawn(async move {
        run_renderer(updates, &render_config).await;
    });

    info!("Capacity Tracker running. Press Ctrl+C to stop.");
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping...");
        }
        Err(e) => {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
    }

    match ticker.disarm().await {
        Ok(tracker) => {
            info!(ticks = tracker.ticks(), count = tracker.count(), "Ticker stopped");
        }
        Err(e) => {
            warn!(error = %e, "Ticker did not stop cleanly");
        }
    }

    // The renderer exits once the snapshot sender is gone
    let shutdown_timeout = Duration::from_secs(2);
    if tokio::time::timeout(shutdown_timeout, render_handle).await.is_err() {
        warn!("Render task shutdown timed out after {:?}", shutdown_timeout);
    }

    info!("Capacity Tracker stopped");
}

/// Initialize the tracing subscriber with environment-based filtering.
///
/// Logs go to stderr so stdout only carries rendered output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Render every snapshot change until the ticker goes away.
async fn run_renderer(mut updates: watch::Receiver<TrackerSnapshot>, config: &Config) {
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        render(&snapshot, config);
    }
    info!("Snapshot channel closed, renderer stopping");
}

fn render(snapshot: &TrackerSnapshot, config: &Config) {
    match config.output {
        OutputFormat::Text => {
            let dashboard = Dashboard::from_snapshot(&config.facility, snapshot);
            println!("{}", dashboard.render_text());
        }
        OutputFormat::Json => match render_json(snapshot) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "Failed to serialize snapshot"),
        },
    }
}
