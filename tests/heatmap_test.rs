//! Integration tests for the windowed heat-map pipeline

use activity_heatmap::core::event::RawActivityEvent;
use activity_heatmap::core::hit_test::hit_test;
use activity_heatmap::ingest::RuntimeClock;
use activity_heatmap::{
    ActivityEvent, ChannelSource, Clock, Config, HeatmapView, IngestionLoop, PatternStore, Scales,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

fn wall(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 22, 10, 0, 0).unwrap() + Duration::seconds(secs)
}

fn event(category: &str, start: i64, end: i64, intensity: f64) -> ActivityEvent {
    ActivityEvent::new(category, wall(start), wall(end), intensity, 0.8).unwrap()
}

fn raw(start: DateTime<Utc>, end: DateTime<Utc>, intensity: f64) -> RawActivityEvent {
    RawActivityEvent {
        category: "typing".to_string(),
        start_time: start,
        end_time: end,
        intensity,
        confidence: 0.8,
        metrics: BTreeMap::new(),
    }
}

fn pixel_for(view: &HeatmapView, t: DateTime<Utc>) -> f64 {
    view.frame().scales.time.to_pixel(t)
}

#[test]
fn test_scenario_a_hit_second_event() {
    let mut view = HeatmapView::new(Config::default(), wall(0)).unwrap();
    view.tick(
        [event("typing", 0, 60, 0.2), event("typing", 60, 120, 0.9)],
        wall(120),
    );

    let tooltip = view.hover(pixel_for(&view, wall(90))).unwrap();
    assert_eq!(tooltip.event.start_time(), wall(60));
    assert_eq!(tooltip.event.intensity(), 0.9);
}

#[test]
fn test_scenario_b_expired_event_is_evicted() {
    let now = wall(10_000);
    let mut store = PatternStore::new();
    let expired = ActivityEvent::new(
        "typing",
        now - Duration::seconds(1900),
        now - Duration::seconds(1801),
        0.5,
        0.5,
    )
    .unwrap();
    store.insert(expired).unwrap();

    store.evict(now, Duration::seconds(1800));
    assert!(store.is_empty());

    let mut view = HeatmapView::new(Config::default(), now).unwrap();
    let report = view.tick(
        [raw(now - Duration::seconds(1900), now - Duration::seconds(1801), 0.5)],
        now,
    );
    assert_eq!(report.inserted, 1);
    assert_eq!(report.evicted, 1);
    assert!(view.store().is_empty());
    assert!(view.scene().area.is_none());
}

#[test]
fn test_scenario_c_empty_store() {
    let now = wall(3_600);
    let view = HeatmapView::new(Config::default(), now).unwrap();

    let scene = view.scene();
    assert!(scene.area.is_none());
    assert!(!scene.time_axis.ticks.is_empty());
    assert!(!scene.intensity_axis.ticks.is_empty());

    let svg = scene.to_svg();
    assert!(!svg.contains("class=\"area\""));
    assert!(svg.contains("axis-time"));

    for x in [-100.0, 0.0, 40.0, 400.0, 770.0, 2000.0] {
        assert!(view.hover(x).is_none());
    }
}

#[test]
fn test_scenario_d_overlap_first_in_order_wins() {
    let mut view = HeatmapView::new(Config::default(), wall(0)).unwrap();
    let b = event("b", 40, 80, 0.3);
    let a = event("a", 0, 100, 0.7);
    view.tick([b.clone(), a], wall(100));

    let tooltip = view.hover(pixel_for(&view, wall(50))).unwrap();
    assert_eq!(tooltip.event, b);
}

#[test]
fn test_intensity_above_one_is_clamped() {
    let mut view = HeatmapView::new(Config::default(), wall(0)).unwrap();
    let report = view.tick([raw(wall(0), wall(10), 1.5)], wall(10));

    assert_eq!(report.inserted, 1);
    assert_eq!(view.snapshot().events()[0].intensity(), 1.0);
}

#[test]
fn test_inverted_range_rejected_at_boundary() {
    let mut view = HeatmapView::new(Config::default(), wall(0)).unwrap();
    let report = view.tick([raw(wall(10), wall(0), 0.5)], wall(10));

    assert_eq!(report.rejected, 1);
    assert!(view.store().is_empty());
    assert!(!report.rendered);
}

#[test]
fn test_eviction_invariant_over_many_ticks() {
    let config = Config {
        retention_duration: std::time::Duration::from_secs(300),
        ..Config::default()
    };
    let retention = config.retention();
    let mut view = HeatmapView::new(config, wall(0)).unwrap();

    for tick in 0..200 {
        let now = wall(tick * 5);
        let batch: Vec<RawActivityEvent> = (0..3)
            .map(|i| {
                raw(
                    now - Duration::seconds(4 + i),
                    now - Duration::seconds(i),
                    0.1 * i as f64,
                )
            })
            .collect();
        view.tick(batch, now);

        let cutoff = now - retention;
        assert!(view.store().snapshot().iter().all(|e| e.end_time() >= cutoff));
        // 61 ticks fit in the window, three events each
        assert!(view.store().len() <= 61 * 3);
    }
}

#[test]
fn test_idempotent_eviction_yields_identical_snapshots() {
    let now = wall(4_000);
    let mut store = PatternStore::new();
    for i in 0..20 {
        store.insert(event("typing", i * 200, i * 200 + 150, 0.5)).unwrap();
    }

    store.evict(now, Duration::seconds(1800));
    let first = store.snapshot();
    store.evict(now, Duration::seconds(1800));
    let second = store.snapshot();

    assert_eq!(first.events(), second.events());
    assert_eq!(first.generation(), second.generation());
}

#[test]
fn test_scale_round_trip_across_range() {
    let events = vec![event("typing", 0, 1_800, 0.5)];
    let config = Config::default();
    let area = config.drawing_area();
    let scales = Scales::from_events(&events, wall(1_800), config.retention(), area);

    let steps = 1_000;
    for i in 0..=steps {
        let x = area.left + (area.right - area.left) * i as f64 / steps as f64;
        let t = scales.time.invert(x).unwrap();
        let back = scales.time.to_pixel(t);
        assert!(((back - x) / x).abs() <= 1e-6, "x={x} back={back}");
    }
}

#[test]
fn test_hit_coverage_for_every_event() {
    let events = vec![
        event("typing", 0, 120, 0.2),
        event("tool", 100, 400, 0.6),
        event("typing", 900, 960, 0.9),
        event("typing", 1_000, 1_000, 0.4),
    ];
    let config = Config::default();
    let scales = Scales::from_events(
        &events,
        wall(1_000),
        config.retention(),
        config.drawing_area(),
    );

    for e in &events {
        let mut t = e.start_time();
        loop {
            let hit = hit_test(&events, &scales.time, scales.time.to_pixel(t));
            let found = hit.event().expect("time inside an event must hit");
            assert!(found.contains(t));
            if t >= e.end_time() {
                break;
            }
            t = (t + Duration::seconds(7)).min(e.end_time());
        }
    }
}

#[test]
fn test_one_render_per_change() {
    let mut view = HeatmapView::new(Config::default(), wall(0)).unwrap();
    let renders = Rc::new(Cell::new(0));
    let published = Rc::new(Cell::new(0));
    let r = renders.clone();
    let p = published.clone();
    view.on_render(move |_| r.set(r.get() + 1));
    view.subscribe(move |_| p.set(p.get() + 1));

    view.tick(
        [
            event("typing", 0, 10, 0.1),
            event("typing", 10, 20, 0.2),
            event("typing", 20, 30, 0.3),
        ],
        wall(30),
    );
    assert_eq!(renders.get(), 1);
    assert_eq!(published.get(), 1);

    view.tick(Vec::<ActivityEvent>::new(), wall(31));
    assert_eq!(renders.get(), 1);

    // Eviction alone is a membership change
    view.tick(Vec::<ActivityEvent>::new(), wall(10_000));
    assert_eq!(renders.get(), 2);
    assert!(view.scene().area.is_none());
}

#[test]
fn test_select_callback_receives_clicked_event() {
    let mut view = HeatmapView::new(Config::default(), wall(0)).unwrap();
    let chosen = Rc::new(RefCell::new(None));
    let sink = chosen.clone();
    view.on_select(move |e| *sink.borrow_mut() = Some(e.clone()));

    view.tick(
        [event("tool", 0, 30, 0.6), event("typing", 60, 90, 0.3)],
        wall(90),
    );

    view.click(pixel_for(&view, wall(45)));
    assert!(chosen.borrow().is_none());

    view.click(pixel_for(&view, wall(75)));
    assert_eq!(
        chosen.borrow().as_ref().map(|e| e.category().to_string()),
        Some("typing".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_ingestion_loop_ticks_and_stops() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let start = wall(0);
            let view = Rc::new(RefCell::new(
                HeatmapView::new(Config::default(), start).unwrap(),
            ));
            let polls = Rc::new(Cell::new(0));
            let counter = polls.clone();
            let source = move |now: DateTime<Utc>| {
                counter.set(counter.get() + 1);
                vec![raw(now - Duration::seconds(1), now, 0.5)]
            };

            let mut handle =
                IngestionLoop::spawn(view.clone(), source, RuntimeClock::starting_at(start));

            // Ticks at 0s, 5s and 10s
            tokio::time::sleep(std::time::Duration::from_secs(12)).await;
            assert_eq!(handle.ticks(), 3);
            assert_eq!(view.borrow().store().len(), 3);

            handle.stop();
            assert!(handle.is_stopped());

            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            assert_eq!(polls.get(), 3);
            assert_eq!(view.borrow().store().len(), 3);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_loop() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let start = wall(0);
            let view = Rc::new(RefCell::new(
                HeatmapView::new(Config::default(), start).unwrap(),
            ));
            let polls = Rc::new(Cell::new(0));
            let counter = polls.clone();
            let source = move |_now: DateTime<Utc>| -> Vec<RawActivityEvent> {
                counter.set(counter.get() + 1);
                Vec::new()
            };

            let handle =
                IngestionLoop::spawn(view.clone(), source, RuntimeClock::starting_at(start));
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            drop(handle);

            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            assert_eq!(polls.get(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_memory_bounded_with_steady_producer() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let start = wall(0);
            let config = Config {
                retention_duration: std::time::Duration::from_secs(60),
                ..Config::default()
            };
            let view = Rc::new(RefCell::new(HeatmapView::new(config, start).unwrap()));
            let (sender, source) = ChannelSource::bounded(64);
            let clock = RuntimeClock::starting_at(start);

            let mut handle = IngestionLoop::spawn(view.clone(), source, clock);

            for _ in 0..120 {
                let now = clock.now();
                sender.send(raw(now - Duration::seconds(2), now, 0.7)).unwrap();
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                // One event per tick, 60s window at a 5s cadence
                assert!(view.borrow().store().len() <= 13);
            }

            handle.stop();
            assert!(handle.ticks() >= 100);
            assert!(view.borrow().stats().snapshot().evicted > 0);
        })
        .await;
}
