//! Capacity Tracker Library
//!
//! This library provides components for a simulated gym capacity tracker:
//!
//! - **config**: Environment-based configuration for the tracker
//! - **sample_generator**: Synthetic capacity history from injected randomness and time
//! - **rolling**: Fixed-capacity FIFO buffers for samples and change events
//! - **tracker**: The tracker state (count, samples, event log)
//! - **ticker**: Timer task that drives the tracker and publishes snapshots
//! - **presentation**: Count tile, recent changes and chart derived from a snapshot
//!
//! # Example
//!
//! ```no_run
//! use capacity_tracker::config::Config;
//! use capacity_tracker::presentation::Dashboard;
//! use capacity_tracker::sample_generator::SystemClock;
//! use capacity_tracker::ticker::Ticker;
//! use capacity_tracker::tracker::CapacityTracker;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Load configuration from environment
//!     let config = Config::from_env().expect("Failed to load config");
//!
//!     // Arm the ticker with a fresh tracker
//!     let ticker = Ticker::arm(
//!         CapacityTracker::from_config(&config),
//!         config.tick_interval,
//!         StdRng::from_entropy(),
//!         SystemClock,
//!     );
//!
//!     // Render the first tick
//!     let mut updates = ticker.subscribe();
//!     updates.changed().await.ok();
//!     let dashboard = Dashboard::from_snapshot(&config.facility, &updates.borrow());
//!     println!("{}", dashboard.render_text());
//!
//!     ticker.disarm().await.ok();
//! }
//! ```

// Module declarations
pub mod config;
pub mod presentation;
pub mod rolling;
pub mod sample_generator;
pub mod ticker;
pub mod tracker;

// Re-export commonly used types at crate root for convenience
pub use config::{Config, ConfigError, OutputFormat, TickMode};
pub use presentation::{AxisDomain, Dashboard};
pub use rolling::{RollingBuffer, RollingStats};
pub use sample_generator::{
    ChangeEvent, ChangeKind, Clock, FixedClock, GeneratorConfig, Sample, SampleGenerator,
    SystemClock,
};
pub use ticker::{Ticker, TickerError, TickerState};
pub use tracker::{CapacityTracker, TrackerError, TrackerSnapshot};
