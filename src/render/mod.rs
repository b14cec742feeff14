//! Heat-map rendering.
//!
//! A [`Renderer`] turns a snapshot plus its scales into a [`Scene`]: a
//! gradient-filled area under the smoothed intensity curve and the two axes.
//! An empty snapshot renders axes only.

pub mod axis;
pub mod curve;
pub mod scene;

pub use axis::{Axis, AxisOrientation, Tick};
pub use curve::{basis_area, PathCommand, Point};
pub use scene::{Gradient, GradientStop, Scene};

use crate::config::{Config, GradientConfig};
use crate::core::scale::Scales;
use crate::core::store::Snapshot;
use chrono_tz::Tz;

/// Upper bound on time-axis ticks before the cadence is widened.
const MAX_TIME_TICKS: usize = 24;

/// Draws scenes with a fixed style.
#[derive(Debug, Clone)]
pub struct Renderer {
    id: String,
    width: f64,
    height: f64,
    gradient: GradientConfig,
    time_tick_minutes: u32,
    intensity_ticks: u32,
    timezone: Tz,
}

impl Renderer {
    /// Create a renderer whose SVG elements are namespaced under `id`.
    pub fn new(id: impl Into<String>, config: &Config) -> Self {
        Self {
            id: id.into(),
            width: config.width,
            height: config.height,
            gradient: config.gradient.clone(),
            time_tick_minutes: config.time_tick_minutes,
            intensity_ticks: config.intensity_ticks,
            timezone: config.timezone,
        }
    }

    /// Update the surface size used for subsequent scenes.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Draw one frame.
    pub fn render(&self, snapshot: &Snapshot, scales: &Scales) -> Scene {
        let baseline = scales.intensity.to_pixel(0.0);
        let (left, _) = scales.time.range();

        let area = if snapshot.is_empty() {
            None
        } else {
            let top: Vec<Point> = snapshot
                .iter()
                .map(|e| {
                    Point::new(
                        scales.time.to_pixel(e.start_time()),
                        scales.intensity.to_pixel(e.intensity()),
                    )
                })
                .collect();
            Some(basis_area(&top, baseline))
        };

        let scene = Scene {
            id: self.id.clone(),
            width: self.width,
            height: self.height,
            generation: snapshot.generation(),
            gradient: self.gradient(scales),
            area,
            time_axis: axis::time_axis(
                &scales.time,
                self.time_tick_minutes,
                MAX_TIME_TICKS,
                self.timezone,
                baseline,
            ),
            intensity_axis: axis::intensity_axis(&scales.intensity, self.intensity_ticks, left),
        };

        tracing::trace!(
            events = snapshot.len(),
            generation = snapshot.generation(),
            area = scene.has_area(),
            "rendered scene"
        );
        scene
    }

    /// Gradient pinned to the intensity axis: low at the bottom, high on top.
    fn gradient(&self, scales: &Scales) -> Gradient {
        let stop = |offset: f64, c: &crate::config::ColorStop| GradientStop {
            offset,
            color: c.color.clone(),
            opacity: c.opacity,
        };

        Gradient {
            id: format!("{}-fill", self.id),
            y_low: scales.intensity.to_pixel(0.0),
            y_high: scales.intensity.to_pixel(1.0),
            stops: vec![
                stop(0.0, &self.gradient.low),
                stop(0.5, &self.gradient.mid),
                stop(1.0, &self.gradient.high),
            ],
        }
    }
}
