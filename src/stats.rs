//! Running counters for a heat-map view.
//!
//! Tracks what the view has ingested, dropped and drawn without retaining
//! any event content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the lifetime of one view.
#[derive(Debug)]
pub struct ViewStats {
    /// Ingestion ticks completed
    ticks: AtomicU64,
    /// Events accepted by the store
    inserted: AtomicU64,
    /// Events refused at the store boundary
    rejected: AtomicU64,
    /// Events removed by eviction
    evicted: AtomicU64,
    /// Scenes drawn
    renders: AtomicU64,
    /// Pointer queries answered
    hit_queries: AtomicU64,
    /// Pointer queries that matched an event
    hits: AtomicU64,
    started_at: DateTime<Utc>,
}

impl ViewStats {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            ticks: AtomicU64::new(0),
            inserted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            renders: AtomicU64::new(0),
            hit_queries: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            started_at,
        }
    }

    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inserted(&self, count: u64) {
        self.inserted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_rejected(&self, count: u64) {
        self.rejected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_evicted(&self, count: u64) {
        self.evicted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_render(&self) {
        self.renders.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a pointer query and whether it matched.
    pub fn record_hit_query(&self, hit: bool) {
        self.hit_queries.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> ViewStatsSnapshot {
        ViewStatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            inserted: self.inserted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            renders: self.renders.load(Ordering::Relaxed),
            hit_queries: self.hit_queries.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            started_at: self.started_at,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Heat-map Statistics:\n\
             - Ticks: {}\n\
             - Events inserted: {}\n\
             - Events rejected: {}\n\
             - Events evicted: {}\n\
             - Scenes rendered: {}\n\
             - Pointer queries: {} ({} hits)\n\
             - Started: {}",
            stats.ticks,
            stats.inserted,
            stats.rejected,
            stats.evicted,
            stats.renders,
            stats.hit_queries,
            stats.hits,
            stats.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Snapshot of view statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewStatsSnapshot {
    pub ticks: u64,
    pub inserted: u64,
    pub rejected: u64,
    pub evicted: u64,
    pub renders: u64,
    pub hit_queries: u64,
    pub hits: u64,
    pub started_at: DateTime<Utc>,
}
