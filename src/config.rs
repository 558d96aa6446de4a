//! Configuration module for the capacity tracker.
//!
//! This module provides environment-based configuration for the tracker,
//! including the tick interval, the shape of the synthetic history and the
//! output format of the binary.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::sample_generator::GeneratorConfig;

/// Default facility name shown in the count tile
const DEFAULT_FACILITY: &str = "Fitstar Schwabing";

/// Default tick interval in seconds
const DEFAULT_TICK_INTERVAL_SECS: u64 = 5;

/// Minimum tick interval
const MIN_TICK_INTERVAL_SECS: u64 = 1;

/// Maximum tick interval
const MAX_TICK_INTERVAL_SECS: u64 = 300;

/// Default number of retained samples and events
pub const DEFAULT_HISTORY_LEN: usize = 10;

/// Maximum retained history to keep renders small
const MAX_HISTORY_LEN: usize = 1_000;

/// Default spacing between synthetic history points, in minutes
const DEFAULT_HISTORY_STEP_MINS: u64 = 30;

/// One day
const MAX_HISTORY_STEP_MINS: u64 = 1_440;

const DEFAULT_BASE: u32 = 30;
const DEFAULT_SPREAD: u32 = 5;
const DEFAULT_OFFSET: u32 = 2;
const MAX_SPREAD: u32 = 1_000;

/// How the binary renders each state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable tile, event list and chart
    Text,
    /// One JSON snapshot per line
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "'{}' is not a supported output format (text, json)",
                other
            )),
        }
    }
}

/// What a tick does to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickMode {
    /// Replace the history with a freshly fabricated batch
    #[default]
    SyntheticHistory,
    /// Append one sample of the live count, oldest dropped past capacity
    LiveSample,
}

impl FromStr for TickMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synthetic" => Ok(TickMode::SyntheticHistory),
            "live" => Ok(TickMode::LiveSample),
            other => Err(format!(
                "'{}' is not a supported tick mode (synthetic, live)",
                other
            )),
        }
    }
}

/// Configuration for the capacity tracker.
///
/// All settings can be configured via environment variables:
/// - `CAPACITY_TRACKER_TICK_INTERVAL_SECS`: Seconds between ticks (default: 5)
/// - `CAPACITY_TRACKER_HISTORY_LEN`: Retained samples/events (default: 10)
/// - `CAPACITY_TRACKER_HISTORY_STEP_MINS`: Minutes between history points (default: 30)
/// - `CAPACITY_TRACKER_BASE`, `CAPACITY_TRACKER_SPREAD`, `CAPACITY_TRACKER_OFFSET`:
///   Synthetic count constants (defaults: 30, 5, 2)
/// - `CAPACITY_TRACKER_FACILITY`: Facility name (default: Fitstar Schwabing)
/// - `CAPACITY_TRACKER_TICK_MODE`: `synthetic` or `live` (default: synthetic)
/// - `CAPACITY_TRACKER_OUTPUT`: `text` or `json` (default: text)
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the tracked facility
    pub facility: String,

    /// Duration between two ticks of the generator
    pub tick_interval: Duration,

    /// Number of samples and events retained by the rolling buffers
    pub history_len: usize,

    /// Behavior of each tick
    pub tick_mode: TickMode,

    /// Synthetic generator settings
    pub generator: GeneratorConfig,

    /// Rendering format used by the binary
    pub output: OutputFormat,
}

/// Error type for configuration loading failures
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub env_var: Option<String>,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.env_var {
            Some(var) => write!(f, "Configuration error for {}: {}", var, self.message),
            None => write!(f, "Configuration error: {}", self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to the defaults listed on [`Config`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any variable is set but is not a valid number,
    /// lies outside its allowed range, or (for the tick mode and output
    /// format) names an unknown variant.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use capacity_tracker::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// println!("Tick interval: {:?}", config.tick_interval);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let facility = match env::var("CAPACITY_TRACKER_FACILITY") {
            Ok(value) if value.trim().is_empty() => {
                return Err(ConfigError {
                    message: "facility name must not be empty".to_string(),
                    env_var: Some("CAPACITY_TRACKER_FACILITY".to_string()),
                });
            }
            Ok(value) => value.trim().to_string(),
            Err(_) => DEFAULT_FACILITY.to_string(),
        };

        let tick_interval_secs = parse_bounded(
            "CAPACITY_TRACKER_TICK_INTERVAL_SECS",
            DEFAULT_TICK_INTERVAL_SECS,
            MIN_TICK_INTERVAL_SECS,
            MAX_TICK_INTERVAL_SECS,
        )?;

        let history_len = parse_bounded(
            "CAPACITY_TRACKER_HISTORY_LEN",
            DEFAULT_HISTORY_LEN,
            1,
            MAX_HISTORY_LEN,
        )?;

        let step_mins = parse_bounded(
            "CAPACITY_TRACKER_HISTORY_STEP_MINS",
            DEFAULT_HISTORY_STEP_MINS,
            1,
            MAX_HISTORY_STEP_MINS,
        )?;

        let base = parse_bounded("CAPACITY_TRACKER_BASE", DEFAULT_BASE, 0, u32::MAX)?;
        let spread = parse_bounded("CAPACITY_TRACKER_SPREAD", DEFAULT_SPREAD, 1, MAX_SPREAD)?;
        let offset = parse_bounded("CAPACITY_TRACKER_OFFSET", DEFAULT_OFFSET, 0, u32::MAX)?;

        let tick_mode = match env::var("CAPACITY_TRACKER_TICK_MODE") {
            Ok(value) => value.parse().map_err(|message| ConfigError {
                message,
                env_var: Some("CAPACITY_TRACKER_TICK_MODE".to_string()),
            })?,
            Err(_) => TickMode::default(),
        };

        let output = match env::var("CAPACITY_TRACKER_OUTPUT") {
            Ok(value) => value.parse().map_err(|message| ConfigError {
                message,
                env_var: Some("CAPACITY_TRACKER_OUTPUT".to_string()),
            })?,
            Err(_) => OutputFormat::Text,
        };

        Ok(Self {
            facility,
            tick_interval: Duration::from_secs(tick_interval_secs),
            history_len,
            tick_mode,
            generator: GeneratorConfig {
                base,
                spread,
                offset,
                batch_len: history_len,
                step: chrono::Duration::minutes(step_mins as i64),
            },
            output,
        })
    }
}

impl Default for Config {
    /// Create a default configuration using default values.
    ///
    /// This is useful for testing or when environment variables are not set.
    fn default() -> Self {
        Self {
            facility: DEFAULT_FACILITY.to_string(),
            tick_interval: Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS),
            history_len: DEFAULT_HISTORY_LEN,
            tick_mode: TickMode::SyntheticHistory,
            generator: GeneratorConfig::default(),
            output: OutputFormat::Text,
        }
    }
}

/// Parse a numeric environment variable, enforcing `min..=max`.
fn parse_bounded<T>(env_var: &str, default: T, min: T, max: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + std::fmt::Display + Copy,
{
    match env::var(env_var) {
        Ok(value) => {
            let parsed: T = value.trim().parse().map_err(|_| ConfigError {
                message: format!("'{}' is not a valid number", value),
                env_var: Some(env_var.to_string()),
            })?;

            if parsed < min {
                return Err(ConfigError {
                    message: format!("value {} is below minimum ({})", parsed, min),
                    env_var: Some(env_var.to_string()),
                });
            }

            if parsed > max {
                return Err(ConfigError {
                    message: format!("value {} exceeds maximum ({})", parsed, max),
                    env_var: Some(env_var.to_string()),
                });
            }

            Ok(parsed)
        }
        Err(_) => Ok(default),
    }
}
