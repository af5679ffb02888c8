//! vgsc-eval - Evaluate parsed VGS scripts against a drawing back-end.
//!
//! The host surface is two calls: [`vgsc_par::parse`] compiles the script
//! once, and [`render_frame`] evaluates it for one frame against any
//! [`Canvas`]. Evaluation is synchronous and single-threaded; all per-frame
//! state lives in a stack-owned structure created and dropped inside
//! [`render_frame`].
//!
//! ```
//! use vgsc_eval::{render_frame, Frame, TraceCanvas};
//!
//! let script = vgsc_par::parse("M 0 0 l (w) (h) stroke").unwrap();
//! let mut canvas = TraceCanvas::new();
//! render_frame(&script, &Frame::new(320.0, 240.0), &mut canvas).unwrap();
//! assert_eq!(canvas.calls().len(), 3);
//! ```

pub mod backend;
pub mod color;
pub mod curve;
mod frame;
mod hostfn;
mod interp;
mod state;
pub mod trace;

pub use backend::{Canvas, FillRule, GradientStop, LineCap, LineJoin, PathSegment};
pub use frame::Frame;
pub use trace::{CanvasCall, TraceCanvas};
pub use vgsc_util::RuntimeError;

use vgsc_par::Script;

/// Draws one frame: walks the script's instruction tree, driving `canvas`.
///
/// The caller owns the back-end and its lifecycle; the drawing calls this
/// makes are the only interaction. Errors are rare: bad runtime conditions
/// (undefined procedures, stray colour stops, failed metadata lookups) are
/// logged through `tracing` and skipped instead.
pub fn render_frame<C: Canvas>(
    script: &Script,
    frame: &Frame,
    canvas: &mut C,
) -> Result<(), RuntimeError> {
    interp::run_frame(script, frame, canvas)
}
