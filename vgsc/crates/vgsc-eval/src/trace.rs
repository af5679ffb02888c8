//! A recording back-end.
//!
//! [`TraceCanvas`] logs every drawing call as a [`CanvasCall`] value while
//! modelling just enough canvas state to honour the read-back surface:
//! current point, a flattened copy of the path, and the dash array. Tests
//! assert against the call log; `vgst trace` prints it.
//!
//! Transforms are recorded but not applied to the modelled geometry; the
//! trace exists to observe the instruction stream, not to rasterise it.

use std::fmt;

use crate::backend::{Canvas, FillRule, GradientStop, LineCap, LineJoin, PathSegment};
use crate::curve;

/// One recorded drawing call.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "call", rename_all = "snake_case"))]
pub enum CanvasCall {
    Save,
    Restore,
    Translate { tx: f64, ty: f64 },
    Scale { sx: f64, sy: f64 },
    Rotate { angle: f64 },
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    RelMoveTo { dx: f64, dy: f64 },
    RelLineTo { dx: f64, dy: f64 },
    CurveTo { x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64 },
    RelCurveTo { dx1: f64, dy1: f64, dx2: f64, dy2: f64, dx: f64, dy: f64 },
    Arc { cx: f64, cy: f64, radius: f64, angle1: f64, angle2: f64 },
    ArcNegative { cx: f64, cy: f64, radius: f64, angle1: f64, angle2: f64 },
    ClosePath,
    NewSubPath,
    Rectangle { x: f64, y: f64, width: f64, height: f64 },
    SetSourceRgba { r: f64, g: f64, b: f64, a: f64 },
    SetSourceLinearGradient { x0: f64, y0: f64, x1: f64, y1: f64, stops: Vec<GradientStop> },
    SetSourceRadialGradient {
        c0x: f64,
        c0y: f64,
        r0: f64,
        c1x: f64,
        c1y: f64,
        r1: f64,
        stops: Vec<GradientStop>,
    },
    SetFillRule { rule: FillRule },
    SetLineWidth { width: f64 },
    SetLineCap { cap: LineCap },
    SetLineJoin { join: LineJoin },
    SetMiterLimit { limit: f64 },
    SetDash { dashes: Vec<f64>, offset: f64 },
    Fill,
    FillPreserve,
    Stroke,
    StrokePreserve,
    Clip,
    ClipPreserve,
    ResetClip,
}

impl fmt::Display for CanvasCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn stops(f: &mut fmt::Formatter<'_>, stops: &[GradientStop]) -> fmt::Result {
            for stop in stops {
                write!(
                    f,
                    " {}:{} {} {} {}",
                    stop.offset, stop.rgba[0], stop.rgba[1], stop.rgba[2], stop.rgba[3]
                )?;
            }
            Ok(())
        }

        match self {
            CanvasCall::Save => write!(f, "save"),
            CanvasCall::Restore => write!(f, "restore"),
            CanvasCall::Translate { tx, ty } => write!(f, "translate {tx} {ty}"),
            CanvasCall::Scale { sx, sy } => write!(f, "scale {sx} {sy}"),
            CanvasCall::Rotate { angle } => write!(f, "rotate {angle}"),
            CanvasCall::MoveTo { x, y } => write!(f, "move_to {x} {y}"),
            CanvasCall::LineTo { x, y } => write!(f, "line_to {x} {y}"),
            CanvasCall::RelMoveTo { dx, dy } => write!(f, "rel_move_to {dx} {dy}"),
            CanvasCall::RelLineTo { dx, dy } => write!(f, "rel_line_to {dx} {dy}"),
            CanvasCall::CurveTo { x1, y1, x2, y2, x, y } => {
                write!(f, "curve_to {x1} {y1} {x2} {y2} {x} {y}")
            }
            CanvasCall::RelCurveTo { dx1, dy1, dx2, dy2, dx, dy } => {
                write!(f, "rel_curve_to {dx1} {dy1} {dx2} {dy2} {dx} {dy}")
            }
            CanvasCall::Arc { cx, cy, radius, angle1, angle2 } => {
                write!(f, "arc {cx} {cy} {radius} {angle1} {angle2}")
            }
            CanvasCall::ArcNegative { cx, cy, radius, angle1, angle2 } => {
                write!(f, "arc_negative {cx} {cy} {radius} {angle1} {angle2}")
            }
            CanvasCall::ClosePath => write!(f, "close_path"),
            CanvasCall::NewSubPath => write!(f, "new_sub_path"),
            CanvasCall::Rectangle { x, y, width, height } => {
                write!(f, "rectangle {x} {y} {width} {height}")
            }
            CanvasCall::SetSourceRgba { r, g, b, a } => {
                write!(f, "set_source_rgba {r} {g} {b} {a}")
            }
            CanvasCall::SetSourceLinearGradient { x0, y0, x1, y1, stops: s } => {
                write!(f, "set_source_linear_gradient {x0} {y0} {x1} {y1}")?;
                stops(f, s)
            }
            CanvasCall::SetSourceRadialGradient { c0x, c0y, r0, c1x, c1y, r1, stops: s } => {
                write!(f, "set_source_radial_gradient {c0x} {c0y} {r0} {c1x} {c1y} {r1}")?;
                stops(f, s)
            }
            CanvasCall::SetFillRule { rule } => write!(f, "set_fill_rule {rule:?}"),
            CanvasCall::SetLineWidth { width } => write!(f, "set_line_width {width}"),
            CanvasCall::SetLineCap { cap } => write!(f, "set_line_cap {cap:?}"),
            CanvasCall::SetLineJoin { join } => write!(f, "set_line_join {join:?}"),
            CanvasCall::SetMiterLimit { limit } => write!(f, "set_miter_limit {limit}"),
            CanvasCall::SetDash { dashes, offset } => {
                write!(f, "set_dash {dashes:?} {offset}")
            }
            CanvasCall::Fill => write!(f, "fill"),
            CanvasCall::FillPreserve => write!(f, "fill_preserve"),
            CanvasCall::Stroke => write!(f, "stroke"),
            CanvasCall::StrokePreserve => write!(f, "stroke_preserve"),
            CanvasCall::Clip => write!(f, "clip"),
            CanvasCall::ClipPreserve => write!(f, "clip_preserve"),
            CanvasCall::ResetClip => write!(f, "reset_clip"),
        }
    }
}

/// The recording canvas.
#[derive(Clone, Debug, Default)]
pub struct TraceCanvas {
    calls: Vec<CanvasCall>,

    // Modelled geometry, untransformed.
    current: Option<(f64, f64)>,
    subpath_start: Option<(f64, f64)>,
    path: Vec<PathSegment>,

    dashes: Vec<f64>,
    dash_offset: f64,
    saved_dashes: Vec<(Vec<f64>, f64)>,
}

impl TraceCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded call log.
    pub fn calls(&self) -> &[CanvasCall] {
        &self.calls
    }

    /// Takes the call log, leaving the canvas empty of recorded calls.
    pub fn take_calls(&mut self) -> Vec<CanvasCall> {
        std::mem::take(&mut self.calls)
    }

    fn push_point(&mut self, x: f64, y: f64, line: bool) {
        if line && self.current.is_some() {
            self.path.push(PathSegment::LineTo(x, y));
        } else {
            self.path.push(PathSegment::MoveTo(x, y));
            self.subpath_start = Some((x, y));
        }
        self.current = Some((x, y));
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.current = None;
        self.subpath_start = None;
    }

    fn flatten_line_points(&mut self, points: Vec<(f64, f64)>) {
        for (x, y) in points {
            self.push_point(x, y, true);
        }
    }

    /// Appends a flattened arc. The first point connects to an open
    /// sub-path with a line, matching the drawing-library convention.
    fn append_arc_points(&mut self, points: Vec<(f64, f64)>) {
        let mut iter = points.into_iter();
        if let Some((x, y)) = iter.next() {
            self.push_point(x, y, self.current.is_some());
        }
        for (x, y) in iter {
            self.push_point(x, y, true);
        }
    }
}

impl Canvas for TraceCanvas {
    fn save(&mut self) {
        self.calls.push(CanvasCall::Save);
        self.saved_dashes.push((self.dashes.clone(), self.dash_offset));
    }

    fn restore(&mut self) {
        self.calls.push(CanvasCall::Restore);
        if let Some((dashes, offset)) = self.saved_dashes.pop() {
            self.dashes = dashes;
            self.dash_offset = offset;
        }
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        self.calls.push(CanvasCall::Translate { tx, ty });
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.calls.push(CanvasCall::Scale { sx, sy });
    }

    fn rotate(&mut self, angle: f64) {
        self.calls.push(CanvasCall::Rotate { angle });
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.calls.push(CanvasCall::MoveTo { x, y });
        self.push_point(x, y, false);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.calls.push(CanvasCall::LineTo { x, y });
        self.push_point(x, y, true);
    }

    fn rel_move_to(&mut self, dx: f64, dy: f64) {
        self.calls.push(CanvasCall::RelMoveTo { dx, dy });
        if let Some((cx, cy)) = self.current {
            self.push_point(cx + dx, cy + dy, false);
        }
    }

    fn rel_line_to(&mut self, dx: f64, dy: f64) {
        self.calls.push(CanvasCall::RelLineTo { dx, dy });
        if let Some((cx, cy)) = self.current {
            self.push_point(cx + dx, cy + dy, true);
        }
    }

    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.calls.push(CanvasCall::CurveTo { x1, y1, x2, y2, x, y });
        let p0 = self.current.unwrap_or((x1, y1));
        if self.current.is_none() {
            self.push_point(x1, y1, false);
        }
        let mut points = Vec::new();
        curve::flatten_cubic(p0, (x1, y1), (x2, y2), (x, y), &mut points);
        self.flatten_line_points(points);
    }

    fn rel_curve_to(&mut self, dx1: f64, dy1: f64, dx2: f64, dy2: f64, dx: f64, dy: f64) {
        self.calls.push(CanvasCall::RelCurveTo { dx1, dy1, dx2, dy2, dx, dy });
        if let Some((cx, cy)) = self.current {
            let p0 = (cx, cy);
            let mut points = Vec::new();
            curve::flatten_cubic(
                p0,
                (cx + dx1, cy + dy1),
                (cx + dx2, cy + dy2),
                (cx + dx, cy + dy),
                &mut points,
            );
            self.flatten_line_points(points);
        }
    }

    fn arc(&mut self, cx: f64, cy: f64, radius: f64, angle1: f64, angle2: f64) {
        self.calls.push(CanvasCall::Arc { cx, cy, radius, angle1, angle2 });
        let sweep = (angle2 - angle1).rem_euclid(2.0 * std::f64::consts::PI);
        let sweep = if sweep == 0.0 && angle2 != angle1 {
            2.0 * std::f64::consts::PI
        } else {
            sweep
        };
        let mut points = Vec::new();
        curve::flatten_arc(cx, cy, radius, angle1, sweep, &mut points);
        self.append_arc_points(points);
    }

    fn arc_negative(&mut self, cx: f64, cy: f64, radius: f64, angle1: f64, angle2: f64) {
        self.calls.push(CanvasCall::ArcNegative { cx, cy, radius, angle1, angle2 });
        let sweep = -((angle1 - angle2).rem_euclid(2.0 * std::f64::consts::PI));
        let mut points = Vec::new();
        curve::flatten_arc(cx, cy, radius, angle1, sweep, &mut points);
        self.append_arc_points(points);
    }

    fn close_path(&mut self) {
        self.calls.push(CanvasCall::ClosePath);
        if let Some(start) = self.subpath_start {
            self.path.push(PathSegment::Close);
            self.current = Some(start);
        }
    }

    fn new_sub_path(&mut self) {
        self.calls.push(CanvasCall::NewSubPath);
        self.current = None;
        self.subpath_start = None;
    }

    fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.calls.push(CanvasCall::Rectangle { x, y, width, height });
        self.push_point(x, y, false);
        self.push_point(x + width, y, true);
        self.push_point(x + width, y + height, true);
        self.push_point(x, y + height, true);
        self.path.push(PathSegment::Close);
        self.current = Some((x, y));
    }

    fn set_source_rgba(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.calls.push(CanvasCall::SetSourceRgba { r, g, b, a });
    }

    fn set_source_linear_gradient(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        stops: &[GradientStop],
    ) {
        self.calls.push(CanvasCall::SetSourceLinearGradient {
            x0,
            y0,
            x1,
            y1,
            stops: stops.to_vec(),
        });
    }

    fn set_source_radial_gradient(
        &mut self,
        c0x: f64,
        c0y: f64,
        r0: f64,
        c1x: f64,
        c1y: f64,
        r1: f64,
        stops: &[GradientStop],
    ) {
        self.calls.push(CanvasCall::SetSourceRadialGradient {
            c0x,
            c0y,
            r0,
            c1x,
            c1y,
            r1,
            stops: stops.to_vec(),
        });
    }

    fn set_fill_rule(&mut self, rule: FillRule) {
        self.calls.push(CanvasCall::SetFillRule { rule });
    }

    fn set_line_width(&mut self, width: f64) {
        self.calls.push(CanvasCall::SetLineWidth { width });
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.calls.push(CanvasCall::SetLineCap { cap });
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.calls.push(CanvasCall::SetLineJoin { join });
    }

    fn set_miter_limit(&mut self, limit: f64) {
        self.calls.push(CanvasCall::SetMiterLimit { limit });
    }

    fn set_dash(&mut self, dashes: &[f64], offset: f64) {
        self.calls.push(CanvasCall::SetDash {
            dashes: dashes.to_vec(),
            offset,
        });
        self.dashes = dashes.to_vec();
        self.dash_offset = offset;
    }

    fn dash(&self) -> (Vec<f64>, f64) {
        (self.dashes.clone(), self.dash_offset)
    }

    fn fill(&mut self) {
        self.calls.push(CanvasCall::Fill);
        self.clear_path();
    }

    fn fill_preserve(&mut self) {
        self.calls.push(CanvasCall::FillPreserve);
    }

    fn stroke(&mut self) {
        self.calls.push(CanvasCall::Stroke);
        self.clear_path();
    }

    fn stroke_preserve(&mut self) {
        self.calls.push(CanvasCall::StrokePreserve);
    }

    fn clip(&mut self) {
        self.calls.push(CanvasCall::Clip);
        self.clear_path();
    }

    fn clip_preserve(&mut self) {
        self.calls.push(CanvasCall::ClipPreserve);
    }

    fn reset_clip(&mut self) {
        self.calls.push(CanvasCall::ResetClip);
    }

    fn current_point(&self) -> Option<(f64, f64)> {
        self.current
    }

    fn flat_path(&self) -> Vec<PathSegment> {
        self.path.clone()
    }
}
