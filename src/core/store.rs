//! The pattern store: the bounded set of live events and its eviction policy.
//!
//! Membership changes mark the store dirty. [`PatternStore::publish`] consumes
//! the flag, builds one [`Snapshot`] and hands it to every subscriber.

use crate::core::event::{ActivityEvent, IntoActivityEvent, InvalidEventError};
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;

/// An immutable, ordered copy of the retained events.
#[derive(Debug, Clone)]
pub struct Snapshot {
    events: Arc<[ActivityEvent]>,
    generation: u64,
}

impl Snapshot {
    /// A snapshot with no events.
    pub fn empty() -> Self {
        Self {
            events: Arc::from(Vec::new()),
            generation: 0,
        }
    }

    /// Events in insertion order.
    pub fn events(&self) -> &[ActivityEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActivityEvent> {
        self.events.iter()
    }

    /// Membership-change counter of the store when this snapshot was taken.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Handle returned by [`PatternStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Snapshot)>;

/// Holds the current set of retained events.
pub struct PatternStore {
    /// Retained events, insertion order
    events: Vec<ActivityEvent>,
    /// Set by any membership change, cleared by `publish`
    dirty: bool,
    /// Incremented on every membership change
    generation: u64,
    /// Optional hard cap on retained events
    max_events: Option<usize>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl PatternStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            dirty: false,
            generation: 0,
            max_events: None,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Create an empty store that never holds more than `max_events` events.
    ///
    /// When the cap is exceeded the oldest-inserted events are dropped.
    pub fn with_capacity_limit(max_events: usize) -> Self {
        let mut store = Self::new();
        store.max_events = Some(max_events);
        store
    }

    /// Append an event after validating it.
    pub fn insert(&mut self, event: impl IntoActivityEvent) -> Result<(), InvalidEventError> {
        let event = event.into_activity_event()?;
        self.events.push(event);

        if let Some(max) = self.max_events {
            if self.events.len() > max {
                let excess = self.events.len() - max;
                self.events.drain(..excess);
                tracing::debug!(dropped = excess, max, "store capacity limit reached");
            }
        }

        self.mark_changed();
        Ok(())
    }

    /// Remove every event with `end_time < now - retention`.
    ///
    /// Returns the number of events removed. Calling again with the same
    /// `now` removes nothing.
    pub fn evict(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return 0;
        };

        let before = self.events.len();
        self.events.retain(|e| e.end_time() >= cutoff);
        let evicted = before - self.events.len();

        if evicted > 0 {
            self.mark_changed();
        }
        evicted
    }

    /// Copy the retained events into an immutable snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            events: Arc::from(self.events.as_slice()),
            generation: self.generation,
        }
    }

    /// Events whose `end_time` is later than `now - window`.
    ///
    /// This is a read-only query; it does not evict.
    pub fn recent(&self, now: DateTime<Utc>, window: Duration) -> Vec<ActivityEvent> {
        match now.checked_sub_signed(window) {
            Some(cutoff) => self
                .events
                .iter()
                .filter(|e| e.end_time() > cutoff)
                .cloned()
                .collect(),
            None => self.events.clone(),
        }
    }

    /// Check whether membership changed since the last `publish`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Register a callback invoked once per published snapshot.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Snapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove a subscriber. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Consume the dirty flag.
    ///
    /// If the store changed since the last call, takes one snapshot, notifies
    /// every subscriber with it and returns it. Otherwise returns `None` and
    /// notifies nobody.
    pub fn publish(&mut self) -> Option<Snapshot> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;

        let snapshot = self.snapshot();
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&snapshot);
        }
        Some(snapshot)
    }

    fn mark_changed(&mut self) {
        self.dirty = true;
        self.generation += 1;
    }
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PatternStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternStore")
            .field("events", &self.events.len())
            .field("dirty", &self.dirty)
            .field("generation", &self.generation)
            .field("max_events", &self.max_events)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
