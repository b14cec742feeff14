//! Uniform cubic B-spline ("basis") smoothing for the area outline.
//!
//! The curve passes near, not through, its control points. It is drawn only;
//! hit-testing never consults it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One drawing instruction of a path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo { c1: Point, c2: Point, to: Point },
    Close,
}

/// Path builder implementing the basis curve state machine.
///
/// Mirrors the behavior of the common `curveBasis` area generator: the first
/// line opens with a move, the second line (the baseline drawn in reverse)
/// continues it and closes the shape.
struct Basis {
    commands: Vec<PathCommand>,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    point: u8,
    /// False while drawing the top edge, true for the baseline
    line: bool,
}

impl Basis {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
            x0: f64::NAN,
            y0: f64::NAN,
            x1: f64::NAN,
            y1: f64::NAN,
            point: 0,
            line: false,
        }
    }

    fn line_start(&mut self) {
        self.x0 = f64::NAN;
        self.y0 = f64::NAN;
        self.x1 = f64::NAN;
        self.y1 = f64::NAN;
        self.point = 0;
    }

    fn line_end(&mut self) {
        match self.point {
            3 => {
                self.segment(self.x1, self.y1);
                self.commands
                    .push(PathCommand::LineTo(Point::new(self.x1, self.y1)));
            }
            2 => self
                .commands
                .push(PathCommand::LineTo(Point::new(self.x1, self.y1))),
            _ => {}
        }
        if self.line {
            self.commands.push(PathCommand::Close);
        }
        self.line = !self.line;
    }

    fn point(&mut self, p: Point) {
        match self.point {
            0 => {
                self.point = 1;
                self.commands.push(if self.line {
                    PathCommand::LineTo(p)
                } else {
                    PathCommand::MoveTo(p)
                });
            }
            1 => self.point = 2,
            2 => {
                self.point = 3;
                self.commands.push(PathCommand::LineTo(Point::new(
                    (5.0 * self.x0 + self.x1) / 6.0,
                    (5.0 * self.y0 + self.y1) / 6.0,
                )));
                self.segment(p.x, p.y);
            }
            _ => self.segment(p.x, p.y),
        }
        self.x0 = self.x1;
        self.x1 = p.x;
        self.y0 = self.y1;
        self.y1 = p.y;
    }

    fn segment(&mut self, x: f64, y: f64) {
        self.commands.push(PathCommand::CubicTo {
            c1: Point::new(
                (2.0 * self.x0 + self.x1) / 3.0,
                (2.0 * self.y0 + self.y1) / 3.0,
            ),
            c2: Point::new(
                (self.x0 + 2.0 * self.x1) / 3.0,
                (self.y0 + 2.0 * self.y1) / 3.0,
            ),
            to: Point::new(
                (self.x0 + 4.0 * self.x1 + x) / 6.0,
                (self.y0 + 4.0 * self.y1 + y) / 6.0,
            ),
        });
    }
}

/// Build a closed area whose upper edge is the basis curve through `top` and
/// whose lower edge is the horizontal line `y = baseline`.
///
/// Returns an empty path when `top` is empty.
pub fn basis_area(top: &[Point], baseline: f64) -> Vec<PathCommand> {
    if top.is_empty() {
        return Vec::new();
    }

    let mut basis = Basis::new();
    basis.line_start();
    for p in top {
        basis.point(*p);
    }
    basis.line_end();

    basis.line_start();
    for p in top.iter().rev() {
        basis.point(Point::new(p.x, baseline));
    }
    basis.line_end();

    basis.commands
}

/// SVG path data for a command list.
pub struct PathData<'a>(pub &'a [PathCommand]);

impl fmt::Display for PathData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for command in self.0 {
            match command {
                PathCommand::MoveTo(p) => write!(f, "M{},{}", num(p.x), num(p.y))?,
                PathCommand::LineTo(p) => write!(f, "L{},{}", num(p.x), num(p.y))?,
                PathCommand::CubicTo { c1, c2, to } => write!(
                    f,
                    "C{},{},{},{},{},{}",
                    num(c1.x),
                    num(c1.y),
                    num(c2.x),
                    num(c2.y),
                    num(to.x),
                    num(to.y)
                )?,
                PathCommand::Close => f.write_str("Z")?,
            }
        }
        Ok(())
    }
}

/// Format a coordinate with at most three decimals and no trailing zeros.
pub(crate) fn num(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let text = format!("{rounded:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
