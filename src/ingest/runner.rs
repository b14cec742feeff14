//! The periodic ingestion loop.
//!
//! Runs as a local task on the current thread: every period it polls the
//! source, then inserts, evicts and renders through [`HeatmapView::tick`].

use crate::ingest::source::{Clock, EventSource, DEFAULT_CHANNEL_CAPACITY};
use crate::view::HeatmapView;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Most events held back while the view is borrowed elsewhere.
const MAX_DEFERRED_EVENTS: usize = DEFAULT_CHANNEL_CAPACITY;

/// Spawns ingestion loops.
pub struct IngestionLoop;

impl IngestionLoop {
    /// Start ticking `view` at its configured `ingest_period`.
    ///
    /// # Panics
    ///
    /// Must be called from within a [`tokio::task::LocalSet`].
    pub fn spawn<S, C>(view: Rc<RefCell<HeatmapView>>, source: S, clock: C) -> IngestionHandle
    where
        S: EventSource + 'static,
        C: Clock + 'static,
    {
        let period = view.borrow().config().ingest_period;
        Self::spawn_with_period(view, source, clock, period)
    }

    /// Start ticking `view` every `period`.
    ///
    /// # Panics
    ///
    /// Must be called from within a [`tokio::task::LocalSet`], and `period`
    /// must be non-zero.
    pub fn spawn_with_period<S, C>(
        view: Rc<RefCell<HeatmapView>>,
        mut source: S,
        clock: C,
        period: Duration,
    ) -> IngestionHandle
    where
        S: EventSource + 'static,
        C: Clock + 'static,
    {
        let stopped = Rc::new(Cell::new(false));
        let ticks = Rc::new(Cell::new(0u64));

        let task_stopped = stopped.clone();
        let task_ticks = ticks.clone();
        let task = tokio::task::spawn_local(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut pending = Vec::new();

            info!(period_ms = period.as_millis() as u64, "ingestion loop started");
            loop {
                interval.tick().await;
                if task_stopped.get() {
                    break;
                }

                let now = clock.now();
                pending.extend(source.poll(now));
                if pending.len() > MAX_DEFERRED_EVENTS {
                    let dropped = pending.len() - MAX_DEFERRED_EVENTS;
                    pending.drain(..dropped);
                    warn!(dropped, "deferred events over capacity, dropping oldest");
                }

                // A caller may hold the view across this tick; keep the batch for the next one.
                let Ok(mut guard) = view.try_borrow_mut() else {
                    warn!(pending = pending.len(), "view busy, deferring batch");
                    continue;
                };
                guard.tick(pending.drain(..), now);
                drop(guard);

                task_ticks.set(task_ticks.get() + 1);
                debug!(tick = task_ticks.get(), "ingestion tick");
            }
        });

        IngestionHandle {
            stopped,
            ticks,
            task: Some(task),
        }
    }
}

/// Handle to a running ingestion loop.
///
/// Stopping (or dropping) the handle guarantees no further inserts and
/// releases the timer.
#[derive(Debug)]
pub struct IngestionHandle {
    stopped: Rc<Cell<bool>>,
    ticks: Rc<Cell<u64>>,
    task: Option<JoinHandle<()>>,
}

impl IngestionHandle {
    /// Stop the loop. Idempotent.
    pub fn stop(&mut self) {
        self.stopped.set(true);
        if let Some(task) = self.task.take() {
            task.abort();
            info!(ticks = self.ticks.get(), "ingestion loop stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }

    /// Number of ticks that reached the view.
    pub fn ticks(&self) -> u64 {
        self.ticks.get()
    }
}

impl Drop for IngestionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::event::RawActivityEvent;
    use crate::ingest::source::RuntimeClock;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn instant(now: DateTime<Utc>) -> RawActivityEvent {
        RawActivityEvent {
            category: "typing".to_string(),
            start_time: now,
            end_time: now,
            intensity: 0.5,
            confidence: 0.8,
            metrics: BTreeMap::new(),
        }
    }

    fn view_at(start: DateTime<Utc>) -> Rc<RefCell<HeatmapView>> {
        Rc::new(RefCell::new(HeatmapView::new(Config::default(), start).unwrap()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_view_defers_batch_to_next_tick() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let start = at(0);
                let view = view_at(start);
                let source = |now: DateTime<Utc>| vec![instant(now)];
                let handle =
                    IngestionLoop::spawn(view.clone(), source, RuntimeClock::starting_at(start));

                tokio::time::sleep(Duration::from_secs(1)).await;
                assert_eq!(handle.ticks(), 1);

                // Held across the tick at 5s
                let busy = view.borrow_mut();
                tokio::time::sleep(Duration::from_secs(5)).await;
                drop(busy);
                assert_eq!(handle.ticks(), 1);
                assert_eq!(view.borrow().store().len(), 1);

                tokio::time::sleep(Duration::from_secs(5)).await;
                assert_eq!(handle.ticks(), 2);
                let snapshot = view.borrow().store().snapshot();
                let starts: Vec<_> = snapshot.iter().map(|e| e.start_time()).collect();
                assert_eq!(starts, vec![at(0), at(5), at(10)]);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_events_are_capped() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let start = at(0);
                let view = view_at(start);
                let mut polls = 0;
                let source = move |now: DateTime<Utc>| -> Vec<RawActivityEvent> {
                    polls += 1;
                    match polls {
                        1 => vec![instant(now)],
                        2..=4 => (0..4_000).map(|_| instant(now)).collect(),
                        _ => Vec::new(),
                    }
                };
                let handle =
                    IngestionLoop::spawn(view.clone(), source, RuntimeClock::starting_at(start));

                tokio::time::sleep(Duration::from_secs(1)).await;

                // Held across the ticks at 5s, 10s and 15s
                let busy = view.borrow_mut();
                tokio::time::sleep(Duration::from_secs(16)).await;
                drop(busy);

                tokio::time::sleep(Duration::from_secs(5)).await;
                assert_eq!(handle.ticks(), 2);

                let snapshot = view.borrow().store().snapshot();
                assert_eq!(snapshot.len(), 1 + MAX_DEFERRED_EVENTS);
                let from_first_deferred = snapshot
                    .iter()
                    .filter(|e| e.start_time() == at(5))
                    .count();
                assert_eq!(from_first_deferred, 2_000);
            })
            .await;
    }
}
