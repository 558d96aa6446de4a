//! Tracker state: the live count, the sample history and the event log.
//!
//! `CapacityTracker` exclusively owns all mutable state. It is mutated only
//! through [`CapacityTracker::tick`] and the manual adjustments, and
//! hands out owned [`TrackerSnapshot`]s for rendering.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{Config, TickMode};
use crate::rolling::RollingBuffer;
use crate::sample_generator::{
    ChangeEvent, ChangeKind, Clock, GeneratorConfig, Sample, SampleGenerator,
};

/// Errors returned by manual count adjustments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// Decrement requested while the count is already zero
    CountUnderflow,
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerError::CountUnderflow => write!(f, "Attendee count cannot go below zero"),
        }
    }
}

impl std::error::Error for TrackerError {}

/// Owned view of the tracker state, suitable for rendering or serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub count: u32,

    /// Oldest first
    pub samples: Vec<Sample>,

    /// Oldest first
    pub events: Vec<ChangeEvent>,

    /// Number of ticks applied so far
    pub ticks: u64,
}

/// The capacity tracker state.
#[derive(Debug, Clone)]
pub struct CapacityTracker {
    generator: SampleGenerator,
    count: u32,
    samples: RollingBuffer<Sample>,
    events: RollingBuffer<ChangeEvent>,
    tick_mode: TickMode,
    ticks: u64,
}

impl CapacityTracker {
    /// Create an empty tracker retaining `history_len` samples and events.
    pub fn new(generator: GeneratorConfig, history_len: usize) -> Self {
        Self {
            generator: SampleGenerator::new(generator),
            count: 0,
            samples: RollingBuffer::new(history_len),
            events: RollingBuffer::new(history_len),
            tick_mode: TickMode::default(),
            ticks: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.generator.clone(), config.history_len)
            .with_tick_mode(config.tick_mode)
    }

    /// Select what [`CapacityTracker::tick`] does.
    pub fn with_tick_mode(mut self, tick_mode: TickMode) -> Self {
        self.tick_mode = tick_mode;
        self
    }

    /// Run one tick in the configured mode.
    pub fn tick<R, C>(&mut self, rng: &mut R, clock: &C)
    where
        R: Rng + ?Sized,
        C: Clock + ?Sized,
    {
        match self.tick_mode {
            TickMode::SyntheticHistory => self.apply_tick(rng, clock),
            TickMode::LiveSample => self.sample_live(clock),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(GeneratorConfig::default(), crate::config::DEFAULT_HISTORY_LEN)
    }

    /// Run the generator once and overwrite the history with its batch.
    ///
    /// The sample buffer and event log are replaced (keeping at most their
    /// capacity) and the count is set to the newest generated sample.
    pub fn apply_tick<R, C>(&mut self, rng: &mut R, clock: &C)
    where
        R: Rng + ?Sized,
        C: Clock + ?Sized,
    {
        let batch = self.generator.generate_batch(rng, clock.now());

        if let Some(latest) = batch.latest_count() {
            self.count = latest;
        }
        self.samples.replace(batch.samples);
        self.events.replace(batch.events);
        self.ticks += 1;

        debug!(
            tick = self.ticks,
            count = self.count,
            samples = self.samples.len(),
            events = self.events.len(),
            "Applied tick"
        );
    }

    /// Append one sample of the current count, stamped now.
    ///
    /// Count and event log are left alone; the oldest sample is dropped once
    /// the buffer is full.
    pub fn sample_live<C: Clock + ?Sized>(&mut self, clock: &C) {
        self.samples.push(Sample::new(clock.now(), self.count));
        self.ticks += 1;

        debug!(
            tick = self.ticks,
            count = self.count,
            samples = self.samples.len(),
            "Sampled live count"
        );
    }

    /// Record one attendee arriving.
    pub fn increment<C: Clock + ?Sized>(&mut self, clock: &C) -> u32 {
        self.count = self.count.saturating_add(1);
        self.record_change(ChangeKind::Increment, clock);
        self.count
    }

    /// Record one attendee leaving.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::CountUnderflow` when the count is zero; the
    /// state is left untouched in that case.
    pub fn decrement<C: Clock + ?Sized>(&mut self, clock: &C) -> Result<u32, TrackerError> {
        if self.count == 0 {
            warn!("Rejected decrement: count is already zero");
            return Err(TrackerError::CountUnderflow);
        }

        self.count -= 1;
        self.record_change(ChangeKind::Decrement, clock);
        Ok(self.count)
    }

    // Keeps the newest sample in step with the live count.
    fn record_change<C: Clock + ?Sized>(&mut self, kind: ChangeKind, clock: &C) {
        let now = clock.now();
        self.events.push(ChangeEvent::new(kind, now));
        self.samples.push(Sample::new(now, self.count));

        debug!(kind = %kind, count = self.count, "Recorded change");
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn samples(&self) -> &RollingBuffer<Sample> {
        &self.samples
    }

    pub fn events(&self) -> &RollingBuffer<ChangeEvent> {
        &self.events
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick_mode(&self) -> TickMode {
        self.tick_mode
    }

    pub fn generator(&self) -> &SampleGenerator {
        &self.generator
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            count: self.count,
            samples: self.samples.to_vec(),
            events: self.events.to_vec(),
            ticks: self.ticks,
        }
    }
}

impl Default for CapacityTracker {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_generator::FixedClock;
    use chrono::{DateTime, Local, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn clock() -> FixedClock {
        let at: DateTime<Local> = Local.with_ymd_and_hms(2024, 5, 1, 18, 15, 0).single().unwrap();
        FixedClock(at)
    }

    #[test]
    fn test_new_tracker_is_empty() {
        let tracker = CapacityTracker::with_defaults();

        assert_eq!(tracker.count(), 0);
        assert!(tracker.samples().is_empty());
        assert!(tracker.events().is_empty());
        assert_eq!(tracker.ticks(), 0);
    }

    #[test]
    fn test_tick_fills_buffers() {
        let mut tracker = CapacityTracker::with_defaults();
        let mut rng = StdRng::seed_from_u64(5);

        tracker.apply_tick(&mut rng, &clock());

        assert_eq!(tracker.samples().len(), 10);
        assert_eq!(tracker.events().len(), 10);
        assert_eq!(tracker.ticks(), 1);
    }

    #[test]
    fn test_buffer_length_after_many_ticks() {
        let mut tracker = CapacityTracker::with_defaults();
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..25 {
            tracker.apply_tick(&mut rng, &clock());
            assert_eq!(tracker.samples().len(), 10);
            assert!(tracker.events().len() <= 10);
        }
        assert_eq!(tracker.ticks(), 25);
    }

    #[test]
    fn test_count_matches_latest_sample_after_tick() {
        let mut tracker = CapacityTracker::with_defaults();
        let mut rng = StdRng::seed_from_u64(23);

        for _ in 0..5 {
            tracker.apply_tick(&mut rng, &clock());
            assert_eq!(tracker.count(), tracker.samples().latest().unwrap().count);
            assert!((32..=36).contains(&tracker.count()));
        }
    }

    #[test]
    fn test_tick_replaces_previous_history() {
        let mut tracker = CapacityTracker::with_defaults();
        let mut rng = StdRng::seed_from_u64(8);
        tracker.increment(&clock());
        tracker.increment(&clock());

        tracker.apply_tick(&mut rng, &clock());

        assert!(tracker
            .events()
            .iter()
            .all(|e| e.kind == ChangeKind::Increment));
        assert_eq!(tracker.samples().oldest().unwrap().time, "13:45:00");
    }

    #[test]
    fn test_larger_batch_is_truncated_to_capacity() {
        let generator = GeneratorConfig {
            batch_len: 25,
            ..GeneratorConfig::default()
        };
        let mut tracker = CapacityTracker::new(generator, 10);
        let mut rng = StdRng::seed_from_u64(2);

        tracker.apply_tick(&mut rng, &clock());

        assert_eq!(tracker.samples().len(), 10);
        assert_eq!(tracker.events().len(), 10);
        assert_eq!(tracker.samples().latest().unwrap().time, "18:15:00");
    }

    #[test]
    fn test_zero_batch_len_keeps_count_on_newest_sample() {
        let generator = GeneratorConfig {
            batch_len: 0,
            ..GeneratorConfig::default()
        };
        let mut tracker = CapacityTracker::new(generator, 10);
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..5 {
            tracker.increment(&clock());
        }

        tracker.apply_tick(&mut rng, &clock());

        assert_eq!(tracker.samples().len(), 1);
        assert_eq!(tracker.count(), tracker.samples().latest().unwrap().count);
        assert!((32..=36).contains(&tracker.count()));
    }

    #[test]
    fn test_live_ticks_keep_last_samples_in_order() {
        let mut tracker =
            CapacityTracker::with_defaults().with_tick_mode(TickMode::LiveSample);
        let mut rng = StdRng::seed_from_u64(12);
        tracker.increment(&clock());
        tracker.increment(&clock());
        tracker.increment(&clock());
        let events_before = tracker.events().to_vec();

        let start = clock().0;
        for i in 0..12 {
            let at = FixedClock(start + chrono::Duration::seconds(5 * i));
            tracker.tick(&mut rng, &at);
        }

        assert_eq!(tracker.count(), 3);
        assert_eq!(tracker.ticks(), 12);
        assert_eq!(tracker.events().to_vec(), events_before);

        let times: Vec<String> = tracker.samples().iter().map(|s| s.time.clone()).collect();
        let expected: Vec<String> = (2..12)
            .map(|i| Sample::new(start + chrono::Duration::seconds(5 * i), 3).time)
            .collect();
        assert_eq!(times, expected);
        assert!(tracker.samples().iter().all(|s| s.count == 3));
    }

    #[test]
    fn test_tick_dispatches_on_mode() {
        let mut rng = StdRng::seed_from_u64(13);

        let mut synthetic = CapacityTracker::with_defaults();
        synthetic.tick(&mut rng, &clock());
        assert_eq!(synthetic.tick_mode(), TickMode::SyntheticHistory);
        assert_eq!(synthetic.samples().len(), 10);

        let mut live =
            CapacityTracker::with_defaults().with_tick_mode(TickMode::LiveSample);
        live.tick(&mut rng, &clock());
        assert_eq!(live.samples().len(), 1);
        assert_eq!(live.count(), 0);
        assert!(live.events().is_empty());
    }

    #[test]
    fn test_increment_and_decrement() {
        let mut tracker = CapacityTracker::with_defaults();

        assert_eq!(tracker.increment(&clock()), 1);
        assert_eq!(tracker.increment(&clock()), 2);
        assert_eq!(tracker.decrement(&clock()), Ok(1));

        let kinds: Vec<ChangeKind> = tracker.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![ChangeKind::Increment, ChangeKind::Increment, ChangeKind::Decrement]
        );
        assert_eq!(tracker.samples().latest().unwrap().count, 1);
    }

    #[test]
    fn test_decrement_at_zero_is_rejected() {
        let mut tracker = CapacityTracker::with_defaults();

        assert_eq!(tracker.decrement(&clock()), Err(TrackerError::CountUnderflow));
        assert_eq!(tracker.count(), 0);
        assert!(tracker.events().is_empty());
        assert!(tracker.samples().is_empty());
    }

    #[test]
    fn test_manual_changes_bounded() {
        let mut tracker = CapacityTracker::with_defaults();
        for _ in 0..40 {
            tracker.increment(&clock());
        }

        assert_eq!(tracker.count(), 40);
        assert_eq!(tracker.events().len(), 10);
        assert_eq!(tracker.samples().len(), 10);
    }

    #[test]
    fn test_snapshot_is_owned_copy() {
        let mut tracker = CapacityTracker::with_defaults();
        let mut rng = StdRng::seed_from_u64(4);
        tracker.apply_tick(&mut rng, &clock());

        let snapshot = tracker.snapshot();
        tracker.increment(&clock());

        assert_eq!(snapshot.samples.len(), 10);
        assert_eq!(snapshot.ticks, 1);
        assert_ne!(snapshot.count, tracker.count());
    }

    #[test]
    fn test_tracker_error_display() {
        assert_eq!(
            format!("{}", TrackerError::CountUnderflow),
            "Attendee count cannot go below zero"
        );
    }
}
