//! Coordinate transforms between data space and pixel space.
//!
//! Scales are derived fresh from each snapshot. The time domain follows the
//! data; the intensity domain is fixed to `[0, 1]` so colors keep the same
//! meaning from frame to frame.

use crate::config::DrawingArea;
use crate::core::event::ActivityEvent;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Half-width used to widen a time domain that collapsed to a single instant.
const DEGENERATE_PADDING_SECS: i64 = 30;

/// Linear map from timestamps to horizontal pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScale {
    domain_start: DateTime<Utc>,
    domain_end: DateTime<Utc>,
    /// Domain length in nanoseconds
    span_ns: f64,
    range: (f64, f64),
}

impl TimeScale {
    /// Build a scale over `[start, end]` mapped onto `range`.
    ///
    /// A domain of zero length is widened symmetrically so the map stays
    /// invertible. The endpoints are swapped if given in reverse.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, range: (f64, f64)) -> Self {
        let (mut start, mut end) = if end < start { (end, start) } else { (start, end) };
        if start == end {
            let pad = Duration::seconds(DEGENERATE_PADDING_SECS);
            start = start.checked_sub_signed(pad).unwrap_or(start);
            end = end.checked_add_signed(pad).unwrap_or(end);
        }

        Self {
            domain_start: start,
            domain_end: end,
            span_ns: nanos_between(start, end),
            range,
        }
    }

    pub fn domain(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.domain_start, self.domain_end)
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Map a timestamp to an x coordinate. Values outside the domain
    /// extrapolate linearly.
    pub fn to_pixel(&self, time: DateTime<Utc>) -> f64 {
        let (r0, r1) = self.range;
        if self.span_ns == 0.0 {
            return (r0 + r1) / 2.0;
        }
        let offset = nanos_between(self.domain_start, time);
        r0 + offset / self.span_ns * (r1 - r0)
    }

    /// Map an x coordinate back to a timestamp, rounded to the nanosecond.
    ///
    /// Coordinates outside the range extrapolate linearly rather than clamp.
    /// Returns `None` only for non-finite input, a zero-width range, or a
    /// result chrono cannot represent.
    pub fn invert(&self, x: f64) -> Option<DateTime<Utc>> {
        let (r0, r1) = self.range;
        if !x.is_finite() || r1 == r0 {
            return None;
        }

        let offset = (x - r0) / (r1 - r0) * self.span_ns;
        if !offset.is_finite() || offset.abs() >= i64::MAX as f64 {
            return None;
        }
        self.domain_start
            .checked_add_signed(Duration::nanoseconds(offset.round() as i64))
    }
}

/// Linear map from intensity `[0, 1]` to vertical pixels.
///
/// The range runs bottom to top, so higher intensity draws higher up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityScale {
    range: (f64, f64),
}

impl IntensityScale {
    /// `bottom` is the pixel for intensity 0, `top` for intensity 1.
    pub fn new(bottom: f64, top: f64) -> Self {
        Self { range: (bottom, top) }
    }

    pub fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn to_pixel(&self, intensity: f64) -> f64 {
        let (r0, r1) = self.range;
        r0 + intensity * (r1 - r0)
    }
}

/// Both transforms for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scales {
    pub time: TimeScale,
    pub intensity: IntensityScale,
}

impl Scales {
    /// Derive scales from the events of a snapshot.
    ///
    /// The time domain spans the earliest start to the latest end; an empty
    /// snapshot falls back to `[now - retention, now]`.
    pub fn from_events(
        events: &[ActivityEvent],
        now: DateTime<Utc>,
        retention: Duration,
        area: DrawingArea,
    ) -> Self {
        let (start, end) = time_domain(events).unwrap_or_else(|| {
            let start = now.checked_sub_signed(retention).unwrap_or(now);
            (start, now)
        });

        Self {
            time: TimeScale::new(start, end, (area.left, area.right)),
            intensity: IntensityScale::new(area.bottom, area.top),
        }
    }
}

/// `[min(start_time), max(end_time)]` over the events, if any.
fn time_domain(events: &[ActivityEvent]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = events.iter().map(ActivityEvent::start_time).min()?;
    let end = events.iter().map(ActivityEvent::end_time).max()?;
    Some((start, end))
}

/// Signed distance in nanoseconds; spans past the i64 range fall back to
/// millisecond resolution.
fn nanos_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to.signed_duration_since(from);
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64,
        None => delta.num_milliseconds() as f64 * 1e6,
    }
}
