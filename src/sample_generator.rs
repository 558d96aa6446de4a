//! Synthetic sample generator for the capacity tracker.
//!
//! Produces a fabricated capacity history: a fixed-size batch of
//! `{time, count}` samples stepping backward from "now", plus one synthetic
//! increment event per generated point. Randomness and time are injected so
//! callers (and tests) decide where they come from.

use chrono::{DateTime, Local};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_HISTORY_LEN;

/// Display format for sample times.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Kind of change recorded in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Increment,
    Decrement,
}

impl ChangeKind {
    /// Label used by the recent changes list.
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Increment => "Increment",
            ChangeKind::Decrement => "Decrement",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Increment => write!(f, "increment"),
            ChangeKind::Decrement => write!(f, "decrement"),
        }
    }
}

/// One charted data point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Display-formatted time (`HH:MM:SS`)
    pub time: String,

    /// Attendee count at that time
    pub count: u32,
}

impl Sample {
    /// Create a sample stamped with the display form of `at`.
    pub fn new(at: DateTime<Local>, count: u32) -> Self {
        Self {
            time: at.format(TIME_FORMAT).to_string(),
            count,
        }
    }
}

/// One logged increment/decrement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub kind: ChangeKind,

    pub timestamp: DateTime<Local>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, timestamp: DateTime<Local>) -> Self {
        Self { kind, timestamp }
    }
}

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Configuration for the sample generator.
///
/// Each count is `base + floor(random() * spread) + offset`, with `random()`
/// uniform in `[0, 1)`.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub base: u32,

    pub spread: u32,

    pub offset: u32,

    /// Number of samples per batch
    pub batch_len: usize,

    /// Spacing between consecutive history points
    pub step: chrono::Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base: 30,
            spread: 5,
            offset: 2,
            batch_len: DEFAULT_HISTORY_LEN,
            step: chrono::Duration::minutes(30),
        }
    }
}

impl GeneratorConfig {
    /// Smallest count this configuration can produce.
    pub fn min_count(&self) -> u32 {
        self.base.saturating_add(self.offset)
    }

    /// Largest count this configuration can produce.
    pub fn max_count(&self) -> u32 {
        self.min_count()
            .saturating_add(self.spread.saturating_sub(1))
    }
}

/// Output of one generator run, oldest entry first.
#[derive(Debug, Clone, Default)]
pub struct SyntheticBatch {
    pub samples: Vec<Sample>,
    pub events: Vec<ChangeEvent>,
}

impl SyntheticBatch {
    /// Count of the newest sample, if any.
    pub fn latest_count(&self) -> Option<u32> {
        self.samples.last().map(|s| s.count)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Generator for fabricated capacity history.
///
/// The history timestamps are derived from the injected `now` and the
/// configured step, not from how often the generator runs.
#[derive(Debug, Clone, Default)]
pub struct SampleGenerator {
    config: GeneratorConfig,
}

impl SampleGenerator {
    /// Create a generator; a `batch_len` of zero is bumped to one so every
    /// batch has a newest sample.
    pub fn new(mut config: GeneratorConfig) -> Self {
        config.batch_len = config.batch_len.max(1);
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(GeneratorConfig::default())
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Draw a single synthetic count.
    pub fn generate_count<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let unit: f64 = rng.gen();
        let jitter = (unit * f64::from(self.config.spread)).floor() as u32;

        self.config
            .base
            .saturating_add(jitter.min(self.config.spread.saturating_sub(1)))
            .saturating_add(self.config.offset)
    }

    /// Generate a full batch ending at `now`.
    ///
    /// Entry `i` is stamped `now - (len - 1 - i) * step`, so the final entry
    /// is `now` and the batch is in chronological order.
    pub fn generate_batch<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        now: DateTime<Local>,
    ) -> SyntheticBatch {
        let len = self.config.batch_len;
        let mut samples = Vec::with_capacity(len);
        let mut events = Vec::with_capacity(len);

        for i in 0..len {
            let steps_back = (len - 1 - i) as i32;
            let at = now - self.config.step * steps_back;
            let count = self.generate_count(rng);

            samples.push(Sample::new(at, count));
            events.push(ChangeEvent::new(ChangeKind::Increment, at));
        }

        SyntheticBatch { samples, events }
    }
}
