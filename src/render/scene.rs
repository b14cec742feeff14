//! Drawable output of one render pass, serializable to SVG.

use crate::render::axis::{Axis, AxisOrientation};
use crate::render::curve::{num, PathCommand, PathData};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of an axis tick mark, in pixels.
const TICK_SIZE: f64 = 6.0;

/// Gap between a tick mark and its label.
const TICK_PADDING: f64 = 3.0;

/// A stop of the vertical fill gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient in [0, 1]
    pub offset: f64,
    pub color: String,
    pub opacity: f64,
}

/// Vertical linear gradient in user space.
///
/// `y_low` is the pixel row of intensity 0 and `y_high` that of intensity 1,
/// so colors stay pinned to the intensity axis regardless of the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub id: String,
    pub y_low: f64,
    pub y_high: f64,
    pub stops: Vec<GradientStop>,
}

/// A complete frame: gradient definition, optional area, both axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub width: f64,
    pub height: f64,
    /// Store generation this frame was drawn from
    pub generation: u64,
    pub gradient: Gradient,
    /// Filled heat-map area; `None` for an empty snapshot
    pub area: Option<Vec<PathCommand>>,
    pub time_axis: Axis,
    pub intensity_axis: Axis,
}

impl Scene {
    pub fn has_area(&self) -> bool {
        self.area.is_some()
    }

    /// Render the scene as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" id="{}" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            escape(&self.id),
            num(self.width),
            num(self.height),
            num(self.width),
            num(self.height)
        )?;

        writeln!(f, "  <defs>")?;
        writeln!(
            f,
            r#"    <linearGradient id="{}" gradientUnits="userSpaceOnUse" x1="0" y1="{}" x2="0" y2="{}">"#,
            escape(&self.gradient.id),
            num(self.gradient.y_low),
            num(self.gradient.y_high)
        )?;
        for stop in &self.gradient.stops {
            writeln!(
                f,
                r#"      <stop offset="{}%" stop-color="{}" stop-opacity="{}"/>"#,
                num(stop.offset * 100.0),
                escape(&stop.color),
                num(stop.opacity)
            )?;
        }
        writeln!(f, "    </linearGradient>")?;
        writeln!(f, "  </defs>")?;

        if let Some(area) = &self.area {
            writeln!(
                f,
                r#"  <path class="area" d="{}" fill="url(#{})"/>"#,
                PathData(area),
                escape(&self.gradient.id)
            )?;
        }

        write_axis(f, "axis axis-time", &self.time_axis)?;
        write_axis(f, "axis axis-intensity", &self.intensity_axis)?;

        writeln!(f, "</svg>")
    }
}

fn write_axis(f: &mut fmt::Formatter<'_>, class: &str, axis: &Axis) -> fmt::Result {
    let (start, end) = axis.range;
    let offset = num(axis.offset);
    writeln!(f, r#"  <g class="{class}" fill="none" font-size="10">"#)?;

    match axis.orientation {
        AxisOrientation::Bottom => {
            writeln!(
                f,
                r#"    <line class="domain" x1="{}" y1="{offset}" x2="{}" y2="{offset}" stroke="currentColor"/>"#,
                num(start),
                num(end)
            )?;
            for tick in &axis.ticks {
                let x = num(tick.position);
                write!(
                    f,
                    r#"    <g class="tick"><line x1="{x}" y1="{offset}" x2="{x}" y2="{}" stroke="currentColor"/>"#,
                    num(axis.offset + TICK_SIZE)
                )?;
                writeln!(
                    f,
                    r#"<text x="{x}" y="{}" fill="currentColor" text-anchor="middle" dy="0.71em">{}</text></g>"#,
                    num(axis.offset + TICK_SIZE + TICK_PADDING),
                    escape(&tick.label)
                )?;
            }
        }
        AxisOrientation::Left => {
            writeln!(
                f,
                r#"    <line class="domain" x1="{offset}" y1="{}" x2="{offset}" y2="{}" stroke="currentColor"/>"#,
                num(start),
                num(end)
            )?;
            for tick in &axis.ticks {
                let y = num(tick.position);
                write!(
                    f,
                    r#"    <g class="tick"><line x1="{offset}" y1="{y}" x2="{}" y2="{y}" stroke="currentColor"/>"#,
                    num(axis.offset - TICK_SIZE)
                )?;
                writeln!(
                    f,
                    r#"<text x="{}" y="{y}" fill="currentColor" text-anchor="end" dy="0.32em">{}</text></g>"#,
                    num(axis.offset - TICK_SIZE - TICK_PADDING),
                    escape(&tick.label)
                )?;
            }
        }
    }

    writeln!(f, "  </g>")
}

/// Escape text for XML attribute and element content.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::axis::Tick;
    use crate::render::curve::Point;

    fn scene(area: Option<Vec<PathCommand>>) -> Scene {
        Scene {
            id: "heatmap-1".to_string(),
            width: 800.0,
            height: 400.0,
            generation: 3,
            gradient: Gradient {
                id: "heatmap-1-fill".to_string(),
                y_low: 370.0,
                y_high: 20.0,
                stops: vec![
                    GradientStop {
                        offset: 0.0,
                        color: "#3b82f6".to_string(),
                        opacity: 0.2,
                    },
                    GradientStop {
                        offset: 1.0,
                        color: "#ef4444".to_string(),
                        opacity: 0.8,
                    },
                ],
            },
            area,
            time_axis: Axis {
                orientation: AxisOrientation::Bottom,
                offset: 370.0,
                range: (40.0, 770.0),
                ticks: vec![Tick {
                    position: 40.0,
                    label: "10:00".to_string(),
                }],
            },
            intensity_axis: Axis {
                orientation: AxisOrientation::Left,
                offset: 40.0,
                range: (370.0, 20.0),
                ticks: vec![Tick {
                    position: 20.0,
                    label: "100%".to_string(),
                }],
            },
        }
    }

    #[test]
    fn test_svg_without_area() {
        let svg = scene(None).to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(!svg.contains(r#"class="area""#));
        assert!(svg.contains(">10:00</text>"));
        assert!(svg.contains(">100%</text>"));
        assert!(svg.contains(r##"<stop offset="100%" stop-color="#ef4444" stop-opacity="0.8"/>"##));
    }

    #[test]
    fn test_svg_with_area() {
        let area = vec![
            PathCommand::MoveTo(Point::new(40.0, 100.0)),
            PathCommand::LineTo(Point::new(40.0, 370.0)),
            PathCommand::Close,
        ];
        let svg = scene(Some(area)).to_svg();
        assert!(svg.contains(
            r#"<path class="area" d="M40,100L40,370Z" fill="url(#heatmap-1-fill)"/>"#
        ));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a<b>&"c""#), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
