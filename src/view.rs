//! The embeddable heat-map component.
//!
//! A [`HeatmapView`] wires the pattern store, scales, renderer and hit tester
//! together. One call to [`HeatmapView::tick`] inserts a batch, evicts, and
//! re-renders at most once, so every frame sees a fully evicted store.

use crate::config::{Config, ConfigError};
use crate::core::event::{ActivityEvent, IntoActivityEvent};
use crate::core::hit_test::{hit_test, HitResult};
use crate::core::scale::Scales;
use crate::core::store::{PatternStore, Snapshot, SubscriptionId};
use crate::core::validation::{PatternValidator, ValidationResult};
use crate::render::{Renderer, Scene};
use crate::stats::ViewStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info_span, warn};
use uuid::Uuid;

/// Everything needed to draw and query the current state.
#[derive(Debug, Clone)]
pub struct Frame {
    pub snapshot: Snapshot,
    pub scales: Scales,
    pub scene: Scene,
    /// The `now` the scales were derived with
    pub rendered_at: DateTime<Utc>,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub inserted: usize,
    pub rejected: usize,
    pub evicted: usize,
    /// Whether the tick produced a new scene
    pub rendered: bool,
}

/// Tooltip content for the event under the pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    pub event: ActivityEvent,
    /// The time the pointer maps to
    pub time: DateTime<Utc>,
    pub label: String,
    pub validation: ValidationResult,
}

type SelectCallback = Box<dyn FnMut(&ActivityEvent)>;
type RenderCallback = Box<dyn FnMut(&Scene)>;

/// A live, windowed heat-map of activity events.
pub struct HeatmapView {
    id: Uuid,
    config: Config,
    store: PatternStore,
    renderer: Renderer,
    validator: PatternValidator,
    frame: Frame,
    stats: ViewStats,
    on_select: Option<SelectCallback>,
    render_listeners: Vec<RenderCallback>,
}

impl HeatmapView {
    /// Create a view with an empty store; the first frame is axes only.
    pub fn new(config: Config, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        config.validate()?;

        let id = Uuid::new_v4();
        let store = match config.max_events {
            Some(max) => PatternStore::with_capacity_limit(max),
            None => PatternStore::new(),
        };
        let renderer = Renderer::new(format!("heatmap-{id}"), &config);
        let snapshot = store.snapshot();
        let scales = Scales::from_events(
            snapshot.events(),
            now,
            config.retention(),
            config.drawing_area(),
        );
        let scene = renderer.render(&snapshot, &scales);

        Ok(Self {
            id,
            config,
            store,
            renderer,
            validator: PatternValidator::default(),
            frame: Frame {
                snapshot,
                scales,
                scene,
                rendered_at: now,
            },
            stats: ViewStats::new(now),
            on_select: None,
            render_listeners: Vec::new(),
        })
    }

    /// Replace the thresholds used for tooltip validation.
    pub fn with_validator(mut self, validator: PatternValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Run one ingestion cycle: insert the batch, evict, render if changed.
    pub fn tick<I>(&mut self, batch: I, now: DateTime<Utc>) -> TickReport
    where
        I: IntoIterator,
        I::Item: IntoActivityEvent,
    {
        let span = info_span!("heatmap", instance = %self.id);
        let _guard = span.enter();

        let mut report = TickReport::default();
        for event in batch {
            match self.store.insert(event) {
                Ok(()) => report.inserted += 1,
                Err(e) => {
                    warn!(error = %e, "rejected activity event");
                    report.rejected += 1;
                }
            }
        }

        report.evicted = self.store.evict(now, self.config.retention());

        if let Some(snapshot) = self.store.publish() {
            self.render(snapshot, now);
            report.rendered = true;
        }

        self.stats.record_tick();
        self.stats.record_inserted(report.inserted as u64);
        self.stats.record_rejected(report.rejected as u64);
        self.stats.record_evicted(report.evicted as u64);

        debug!(
            inserted = report.inserted,
            rejected = report.rejected,
            evicted = report.evicted,
            retained = self.store.len(),
            rendered = report.rendered,
            "tick complete"
        );
        report
    }

    /// Query the event under pixel `x` for tooltip display.
    pub fn hover(&self, x: f64) -> Option<Tooltip> {
        let events = self.frame.snapshot.events();
        let hit = hit_test(events, &self.frame.scales.time, x);
        self.stats.record_hit_query(hit.is_hit());

        match hit {
            HitResult::Hit { time, event } => Some(Tooltip {
                event: event.clone(),
                time,
                label: self.label(event),
                validation: self.validator.validate(event, events),
            }),
            HitResult::Miss { .. } => None,
        }
    }

    /// Handle a click at pixel `x`, firing the selection callback on a match.
    pub fn click(&mut self, x: f64) -> Option<ActivityEvent> {
        let selected = hit_test(self.frame.snapshot.events(), &self.frame.scales.time, x)
            .event()
            .cloned();
        self.stats.record_hit_query(selected.is_some());

        if let (Some(event), Some(callback)) = (&selected, self.on_select.as_mut()) {
            callback(event);
        }
        selected
    }

    /// Change the surface size and redraw the current snapshot.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), ConfigError> {
        let config = Config {
            width,
            height,
            ..self.config.clone()
        };
        config.validate()?;

        self.config = config;
        self.renderer.resize(width, height);
        let snapshot = self.frame.snapshot.clone();
        let now = self.frame.rendered_at;
        self.render(snapshot, now);
        Ok(())
    }

    /// Register the callback fired with the clicked event.
    pub fn on_select(&mut self, callback: impl FnMut(&ActivityEvent) + 'static) {
        self.on_select = Some(Box::new(callback));
    }

    /// Register a callback fired with every freshly rendered scene.
    pub fn on_render(&mut self, callback: impl FnMut(&Scene) + 'static) {
        self.render_listeners.push(Box::new(callback));
    }

    /// Subscribe to store snapshots, published once per membership change.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Snapshot) + 'static) -> SubscriptionId {
        self.store.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn scene(&self) -> &Scene {
        &self.frame.scene
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.frame.snapshot
    }

    pub fn stats(&self) -> &ViewStats {
        &self.stats
    }

    fn render(&mut self, snapshot: Snapshot, now: DateTime<Utc>) {
        let scales = Scales::from_events(
            snapshot.events(),
            now,
            self.config.retention(),
            self.config.drawing_area(),
        );
        let scene = self.renderer.render(&snapshot, &scales);

        self.frame = Frame {
            snapshot,
            scales,
            scene,
            rendered_at: now,
        };
        self.stats.record_render();

        for listener in self.render_listeners.iter_mut() {
            listener(&self.frame.scene);
        }
    }

    fn label(&self, event: &ActivityEvent) -> String {
        let tz = self.config.timezone;
        format!(
            "{}: {:.0}% intensity ({} - {})",
            event.category(),
            event.intensity() * 100.0,
            event.start_time().with_timezone(&tz).format("%H:%M:%S"),
            event.end_time().with_timezone(&tz).format("%H:%M:%S")
        )
    }
}

impl fmt::Debug for HeatmapView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeatmapView")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("store", &self.store)
            .field("generation", &self.frame.snapshot.generation())
            .field("on_select", &self.on_select.is_some())
            .field("render_listeners", &self.render_listeners.len())
            .finish()
    }
}
