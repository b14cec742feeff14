//! Event producers and clocks consumed by the ingestion loop.

use crate::core::event::RawActivityEvent;
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};

/// Default channel capacity for [`ChannelSource`].
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Supplies zero or more new events once per tick.
pub trait EventSource {
    fn poll(&mut self, now: DateTime<Utc>) -> Vec<RawActivityEvent>;
}

impl<F> EventSource for F
where
    F: FnMut(DateTime<Utc>) -> Vec<RawActivityEvent>,
{
    fn poll(&mut self, now: DateTime<Utc>) -> Vec<RawActivityEvent> {
        self(now)
    }
}

/// An event source fed through a bounded channel.
///
/// Producers on any thread push into the [`Sender`]; each tick drains
/// whatever is queued, up to `max_batch` events.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: Receiver<RawActivityEvent>,
    max_batch: usize,
}

impl ChannelSource {
    /// Create a channel with the given capacity.
    pub fn bounded(capacity: usize) -> (Sender<RawActivityEvent>, Self) {
        let (sender, receiver) = bounded(capacity);
        (
            sender,
            Self {
                receiver,
                max_batch: capacity.max(1),
            },
        )
    }

    /// Limit how many queued events one tick takes.
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    /// Number of events currently queued.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for ChannelSource {
    fn default() -> Self {
        Self::bounded(DEFAULT_CHANNEL_CAPACITY).1
    }
}

impl EventSource for ChannelSource {
    fn poll(&mut self, _now: DateTime<Utc>) -> Vec<RawActivityEvent> {
        self.receiver.try_iter().take(self.max_batch).collect()
    }
}

/// Source of "now" for each tick.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall-clock time anchored once, then advanced by the tokio clock.
///
/// Follows paused or auto-advanced runtime time, which keeps timestamps and
/// timer ticks consistent in tests.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeClock {
    origin_wall: DateTime<Utc>,
    origin: tokio::time::Instant,
}

impl RuntimeClock {
    /// Anchor the clock at `origin_wall` as of the current runtime instant.
    pub fn starting_at(origin_wall: DateTime<Utc>) -> Self {
        Self {
            origin_wall,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for RuntimeClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = tokio::time::Instant::now().duration_since(self.origin);
        chrono::Duration::from_std(elapsed)
            .ok()
            .and_then(|d| self.origin_wall.checked_add_signed(d))
            .unwrap_or(self.origin_wall)
    }
}
