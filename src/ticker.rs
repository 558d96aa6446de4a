//! Timer module driving the tracker on a fixed interval.
//!
//! Arming a [`Ticker`] moves the tracker into a single tokio task that owns
//! it exclusively. The task wakes on every tick, runs the tracker's tick mode
//! and publishes a snapshot on a `watch` channel. Manual adjustments
//! reach the task over an mpsc channel, so all mutation stays on one path.
//! Disarming stops the task and hands the tracker back.

use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::sample_generator::Clock;
use crate::tracker::{CapacityTracker, TrackerError, TrackerSnapshot};

/// Capacity of the command channel.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Lifecycle state of a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerState {
    /// Timer running, tracker owned by the tick task
    Armed,
    /// Tick task no longer running, no further mutation
    ///
    /// `disarm` consumes the handle, so a live `Ticker` only reports this
    /// after its task ended abnormally.
    Disarmed,
}

/// Errors that can occur while talking to a ticker.
#[derive(Debug)]
pub enum TickerError {
    /// The ticker has already been disarmed
    Disarmed,

    /// The tracker rejected a manual adjustment
    Tracker(TrackerError),

    /// The tick task panicked or was cancelled unexpectedly
    TaskFailed(String),
}

impl std::fmt::Display for TickerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickerError::Disarmed => write!(f, "Ticker has been disarmed"),
            TickerError::Tracker(e) => write!(f, "Tracker error: {}", e),
            TickerError::TaskFailed(e) => write!(f, "Tick task failed: {}", e),
        }
    }
}

impl std::error::Error for TickerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TickerError::Tracker(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TrackerError> for TickerError {
    fn from(err: TrackerError) -> Self {
        TickerError::Tracker(err)
    }
}

enum Command {
    Increment(oneshot::Sender<u32>),
    Decrement(oneshot::Sender<Result<u32, TrackerError>>),
    Shutdown,
}

/// Handle to an armed tick task.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use capacity_tracker::sample_generator::SystemClock;
/// use capacity_tracker::ticker::Ticker;
/// use capacity_tracker::tracker::CapacityTracker;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// #[tokio::main]
/// async fn main() {
///     let ticker = Ticker::arm(
///         CapacityTracker::with_defaults(),
///         Duration::from_secs(5),
///         StdRng::from_entropy(),
///         SystemClock,
///     );
///
///     let mut updates = ticker.subscribe();
///     updates.changed().await.ok();
///     println!("count = {}", updates.borrow().count);
///
///     let tracker = ticker.disarm().await.expect("tick task failed");
///     println!("ticks = {}", tracker.ticks());
/// }
/// ```
pub struct Ticker {
    handle: Option<JoinHandle<CapacityTracker>>,
    commands: mpsc::Sender<Command>,
    updates: watch::Receiver<TrackerSnapshot>,
    period: Duration,
}

impl Ticker {
    /// Move `tracker` into a new tick task firing every `period`.
    ///
    /// The first tick fires one full period after arming. Must be called
    /// from within a tokio runtime.
    pub fn arm<R, C>(tracker: CapacityTracker, period: Duration, rng: R, clock: C) -> Self
    where
        R: Rng + Send + 'static,
        C: Clock + 'static,
    {
        let (snapshot_tx, updates) = watch::channel(tracker.snapshot());
        let (commands, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        info!(period_ms = period.as_millis() as u64, "Ticker armed");

        // Anchor the first deadline here, not at the task's first poll.
        let first_tick = Instant::now() + period;
        let handle = tokio::spawn(tick_task(
            tracker,
            first_tick,
            period,
            rng,
            clock,
            command_rx,
            snapshot_tx,
        ));

        Self {
            handle: Some(handle),
            commands,
            updates,
            period,
        }
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.updates.clone()
    }

    /// Most recently published snapshot.
    pub fn snapshot(&self) -> TrackerSnapshot {
        self.updates.borrow().clone()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> TickerState {
        match &self.handle {
            Some(handle) if !handle.is_finished() => TickerState::Armed,
            _ => TickerState::Disarmed,
        }
    }

    /// Ask the tick task to record an arrival.
    pub async fn increment(&self) -> Result<u32, TickerError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Increment(reply))
            .await
            .map_err(|_| TickerError::Disarmed)?;
        rx.await.map_err(|_| TickerError::Disarmed)
    }

    /// Ask the tick task to record a departure.
    pub async fn decrement(&self) -> Result<u32, TickerError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Decrement(reply))
            .await
            .map_err(|_| TickerError::Disarmed)?;
        Ok(rx.await.map_err(|_| TickerError::Disarmed)??)
    }

    /// Stop the timer and return the tracker.
    ///
    /// Once this returns, no further tick will mutate the tracker.
    pub async fn disarm(mut self) -> Result<CapacityTracker, TickerError> {
        let handle = self.handle.take().ok_or(TickerError::Disarmed)?;

        // Queued behind pending adjustments; a closed channel means the task
        // already ended and the join below reports how.
        if self.commands.send(Command::Shutdown).await.is_err() {
            debug!("Tick task already gone before shutdown");
        }

        match handle.await {
            Ok(tracker) => {
                info!(ticks = tracker.ticks(), "Ticker disarmed");
                Ok(tracker)
            }
            Err(e) => {
                warn!(error = %e, "Tick task ended abnormally");
                Err(TickerError::TaskFailed(e.to_string()))
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Ticker dropped while armed, aborting tick task");
            handle.abort();
        }
    }
}

/// Body of the tick task.
///
/// Runs until a shutdown command arrives or every command sender is gone,
/// then returns the tracker.
async fn tick_task<R, C>(
    mut tracker: CapacityTracker,
    first_tick: Instant,
    period: Duration,
    mut rng: R,
    clock: C,
    mut commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<TrackerSnapshot>,
) -> CapacityTracker
where
    R: Rng + Send + 'static,
    C: Clock + 'static,
{
    let mut ticker = interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tracker.tick(&mut rng, &clock);
                snapshots.send_replace(tracker.snapshot());
            }

            maybe_command = commands.recv() => {
                match maybe_command {
                    Some(Command::Increment(reply)) => {
                        let count = tracker.increment(&clock);
                        snapshots.send_replace(tracker.snapshot());
                        let _ = reply.send(count);
                    }
                    Some(Command::Decrement(reply)) => {
                        let result = tracker.decrement(&clock);
                        if result.is_ok() {
                            snapshots.send_replace(tracker.snapshot());
                        }
                        let _ = reply.send(result);
                    }
                    Some(Command::Shutdown) | None => {
                        debug!(ticks = tracker.ticks(), "Tick task stopping");
                        break;
                    }
                }
            }
        }
    }

    tracker
}
