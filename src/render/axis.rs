//! Axis tick generation and labeling.

use crate::core::scale::{IntensityScale, TimeScale};
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Which edge of the plot an axis is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrientation {
    Bottom,
    Left,
}

/// A labeled tick, positioned along its axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Pixel position along the axis direction
    pub position: f64,
    pub label: String,
}

/// A drawable axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub orientation: AxisOrientation,
    /// y of a bottom axis, x of a left axis
    pub offset: f64,
    /// Extent of the axis line along its direction
    pub range: (f64, f64),
    pub ticks: Vec<Tick>,
}

/// Tick instants aligned to multiples of `cadence_minutes` inside the domain.
///
/// The cadence doubles until at most `max_ticks` ticks remain.
pub fn time_ticks(scale: &TimeScale, cadence_minutes: u32, max_ticks: usize) -> Vec<DateTime<Utc>> {
    let (start, end) = scale.domain();
    let start_s = start.timestamp() + i64::from(start.timestamp_subsec_nanos() > 0);
    let end_s = end.timestamp();

    let mut step = i64::from(cadence_minutes.max(1)) * 60;
    let first = loop {
        let mut first = start_s.div_euclid(step) * step;
        if first < start_s {
            first += step;
        }
        if first > end_s {
            return Vec::new();
        }
        let count = (end_s - first) / step + 1;
        if count as usize <= max_ticks.max(1) {
            break first;
        }
        step = step.saturating_mul(2);
    };

    let mut ticks = Vec::new();
    let mut t = first;
    while t <= end_s {
        if let Some(instant) = Utc.timestamp_opt(t, 0).single() {
            ticks.push(instant);
        }
        t += step;
    }
    ticks
}

/// Bottom time axis with clock-time labels in `timezone`.
pub fn time_axis(
    scale: &TimeScale,
    cadence_minutes: u32,
    max_ticks: usize,
    timezone: Tz,
    y: f64,
) -> Axis {
    let ticks = time_ticks(scale, cadence_minutes, max_ticks)
        .into_iter()
        .map(|t| Tick {
            position: scale.to_pixel(t),
            label: t.with_timezone(&timezone).format("%H:%M").to_string(),
        })
        .collect();

    Axis {
        orientation: AxisOrientation::Bottom,
        offset: y,
        range: scale.range(),
        ticks,
    }
}

/// Left intensity axis with `intervals + 1` percentage ticks from 0% to 100%.
pub fn intensity_axis(scale: &IntensityScale, intervals: u32, x: f64) -> Axis {
    let intervals = intervals.max(1);
    let ticks = (0..=intervals)
        .map(|i| {
            let value = f64::from(i) / f64::from(intervals);
            Tick {
                position: scale.to_pixel(value),
                label: format!("{}%", (value * 100.0).round() as i64),
            }
        })
        .collect();

    Axis {
        orientation: AxisOrientation::Left,
        offset: x,
        range: scale.range(),
        ticks,
    }
}
