//! Activity Heatmap - a sliding-window heat-map of activity intensity.
//!
//! This library consumes a stream of timestamped activity events, keeps the
//! ones inside a trailing retention window, and renders them as a
//! gradient-filled heat-map with point-in-time lookup for hover and click.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Activity Heatmap                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  Ingestion  │──▶│   Pattern   │──▶│   Scales    │        │
//! │  │ (5s period) │   │    Store    │   │ (per frame) │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │                           │                 │               │
//! │                           ▼                 ▼               │
//! │                    ┌─────────────┐   ┌─────────────┐        │
//! │                    │ Hit Tester  │   │  Renderer   │        │
//! │                    │  (pointer)  │   │   (SVG)     │        │
//! │                    └─────────────┘   └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use activity_heatmap::{ActivityEvent, Config, HeatmapView};
//! use chrono::{Duration, Utc};
//!
//! let now = Utc::now();
//! let mut view = HeatmapView::new(Config::default(), now).unwrap();
//!
//! let event = ActivityEvent::new("typing", now - Duration::seconds(60), now, 0.7, 0.9).unwrap();
//! view.tick([event], now);
//!
//! let svg = view.scene().to_svg();
//! assert!(svg.contains("class=\"area\""));
//! ```

pub mod config;
pub mod core;
pub mod ingest;
pub mod logging;
pub mod render;
pub mod stats;
pub mod view;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, DrawingArea, GradientConfig, Margin};
pub use core::{
    hit_test, ActivityEvent, HitResult, IntensityScale, InvalidEventError, PatternStore,
    PatternValidator, RawActivityEvent, Scales, Snapshot, TimeScale, ValidationResult,
};
pub use ingest::{ChannelSource, Clock, EventSource, IngestionHandle, IngestionLoop, SystemClock};
pub use render::{Renderer, Scene};
pub use stats::{ViewStats, ViewStatsSnapshot};
pub use view::{Frame, HeatmapView, TickReport, Tooltip};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
