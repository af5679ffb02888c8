//! Curve construction helpers.
//!
//! Quadratic Béziers are lowered to cubics with the standard control-point
//! formula; `ellipse` leans on the back-end's circular arc under a
//! temporary non-uniform scale; `roundedrect` stitches four quarter arcs.
//! The flattening routines exist for back-ends that model the path
//! themselves (the trace canvas) so `pathlen` has a polyline to measure.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::backend::Canvas;

/// Control points of the cubic equivalent of a quadratic Bézier:
/// `CP1 = (P0 + 2Q)/3`, `CP2 = (P + 2Q)/3`.
pub fn quad_to_cubic(
    p0: (f64, f64),
    q: (f64, f64),
    p: (f64, f64),
) -> ((f64, f64), (f64, f64)) {
    let cp1 = ((p0.0 + 2.0 * q.0) / 3.0, (p0.1 + 2.0 * q.1) / 3.0);
    let cp2 = ((p.0 + 2.0 * q.0) / 3.0, (p.1 + 2.0 * q.1) / 3.0);
    (cp1, cp2)
}

/// Appends an axis-aligned ellipse centred on `(cx, cy)`.
///
/// The back-end only draws circular arcs, so the ellipse is an `rx` circle
/// under a `(1, ry/rx)` scale. The transform is scoped with save/restore;
/// the path itself survives, as paths are not part of the graphics state.
pub fn ellipse<C: Canvas>(canvas: &mut C, cx: f64, cy: f64, rx: f64, ry: f64) {
    let ratio = if rx == 0.0 { 1.0 } else { ry / rx };
    canvas.save();
    canvas.translate(cx, cy);
    canvas.scale(1.0, ratio);
    canvas.new_sub_path();
    canvas.arc(0.0, 0.0, rx, 0.0, 2.0 * PI);
    canvas.restore();
}

/// Appends a rectangle with rounded corners. The radius is clamped to
/// `[0, min(width, height)/2]`; at radius 0 this degenerates to `rect`.
pub fn rounded_rect<C: Canvas>(
    canvas: &mut C,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    radius: f64,
) {
    let r = radius.clamp(0.0, (width.min(height) / 2.0).max(0.0));

    canvas.new_sub_path();
    canvas.arc(x + width - r, y + r, r, -FRAC_PI_2, 0.0);
    canvas.arc(x + width - r, y + height - r, r, 0.0, FRAC_PI_2);
    canvas.arc(x + r, y + height - r, r, FRAC_PI_2, PI);
    canvas.arc(x + r, y + r, r, PI, 1.5 * PI);
    canvas.close_path();
}

/// Number of line segments a flattened cubic uses.
const CUBIC_STEPS: usize = 16;

/// Flattens a cubic Bézier into points after `p0`, `p0` excluded.
pub fn flatten_cubic(
    p0: (f64, f64),
    c1: (f64, f64),
    c2: (f64, f64),
    p: (f64, f64),
    out: &mut Vec<(f64, f64)>,
) {
    for step in 1..=CUBIC_STEPS {
        let t = step as f64 / CUBIC_STEPS as f64;
        let u = 1.0 - t;
        let x = u * u * u * p0.0
            + 3.0 * u * u * t * c1.0
            + 3.0 * u * t * t * c2.0
            + t * t * t * p.0;
        let y = u * u * u * p0.1
            + 3.0 * u * u * t * c1.1
            + 3.0 * u * t * t * c2.1
            + t * t * t * p.1;
        out.push((x, y));
    }
}

/// Flattens a circular arc into points, start angle included as the first
/// point. `sweep` may be negative for the reverse direction.
pub fn flatten_arc(
    cx: f64,
    cy: f64,
    radius: f64,
    angle1: f64,
    sweep: f64,
    out: &mut Vec<(f64, f64)>,
) {
    // Between 2 and 64 chords depending on the swept angle.
    let steps = ((sweep.abs() / (PI / 16.0)).ceil() as usize).clamp(2, 64);
    for step in 0..=steps {
        let angle = angle1 + sweep * (step as f64 / steps as f64);
        out.push((cx + radius * angle.cos(), cy + radius * angle.sin()));
    }
}
