//! Host callbacks reachable from expressions.
//!
//! The expression evaluator sees the interpreter through the
//! [`HostContext`] trait; this is the implementation, borrowing the
//! per-frame state mutably and the canvas for read-back.

use vgsc_par::{HostContext, USER_VARS, VAR_U0};

use crate::backend::{Canvas, PathSegment};
use crate::state::EvalState;

pub struct HostCtx<'a, 'p, C: Canvas> {
    pub state: &'a mut EvalState<'p>,
    pub canvas: &'a C,
}

impl<C: Canvas> HostContext for HostCtx<'_, '_, C> {
    fn getvar(&mut self, index: f64) -> f64 {
        if !index.is_finite() {
            return f64::NAN;
        }
        let slot = index as i64;
        if (0..USER_VARS as i64).contains(&slot) {
            self.state.vars[VAR_U0.0 as usize + slot as usize]
        } else {
            f64::NAN
        }
    }

    fn pathlen(&mut self, limit: f64) -> f64 {
        path_length(&self.canvas.flat_path(), limit)
    }

    fn randomg(&mut self, seed: f64) -> f64 {
        self.state.rng.next(seed)
    }

    fn peek(&mut self, key: f64) -> f64 {
        self.state.stack.peek(key)
    }

    fn pop(&mut self, key: f64) -> f64 {
        self.state.stack.pop(key)
    }
}

/// Sums segment lengths over a flattened path. A `Close` counts as a
/// segment back to the origin of its sub-path; move segments position but
/// do not count. With `limit > 0`, summing stops after that many segments.
pub fn path_length(path: &[PathSegment], limit: f64) -> f64 {
    let max_segments = if limit > 0.0 { limit.floor() } else { f64::INFINITY };

    let mut total = 0.0;
    let mut counted = 0.0;
    let mut prev: Option<(f64, f64)> = None;
    let mut start: Option<(f64, f64)> = None;

    for segment in path {
        match segment {
            PathSegment::MoveTo(x, y) => {
                prev = Some((*x, *y));
                start = prev;
            }
            PathSegment::LineTo(x, y) => {
                if let Some((px, py)) = prev {
                    total += (x - px).hypot(y - py);
                    counted += 1.0;
                }
                prev = Some((*x, *y));
            }
            PathSegment::Close => {
                if let (Some((px, py)), Some((sx, sy))) = (prev, start) {
                    total += (sx - px).hypot(sy - py);
                    counted += 1.0;
                }
                prev = start;
            }
        }
        if counted >= max_segments {
            break;
        }
    }

    total
}
