//! The tree-walking interpreter.
//!
//! One statement executes as a fixed cycle: refresh `cx`/`cy` from the
//! back-end's current point, evaluate the arguments left to right, flush
//! the pending paint pattern when the opcode consumes it, dispatch, then
//! advance the reflected-control-point state machine. Sub-programs
//! (`repeat`, `if`, procedure bodies) recurse on the host stack; the only
//! non-local control transfer is the `interrupted` flag written by `break`
//! and consumed by the enclosing `repeat` or `call`.

use vgsc_par::{Argument, Opcode, ProcId, Program, Script, Statement, VarId, VAR_CX, VAR_CY, VAR_I};
use vgsc_util::RuntimeError;

use crate::backend::{Canvas, FillRule, GradientStop, LineCap, LineJoin};
use crate::color;
use crate::curve;
use crate::frame::Frame;
use crate::hostfn::HostCtx;
use crate::state::{EvalState, PendingPattern, ProcEntry, RcpStatus, ReflectedPoints};

/// Evaluated-argument buffer size. Every fixed grammar is far below this;
/// only a runaway variadic tail can reach it.
const MAX_STMT_ARGS: usize = 24;

/// Nested `call` limit. Beyond it the call is skipped with a logged error,
/// like a call to an undefined procedure.
const MAX_CALL_DEPTH: usize = 100;

/// Evaluates one frame of `script` against `canvas`.
pub fn run_frame<C: Canvas>(
    script: &Script,
    frame: &Frame,
    canvas: &mut C,
) -> Result<(), RuntimeError> {
    let body = &script.body;
    let mut evaluator = Evaluator {
        script,
        state: EvalState::new(script, frame),
        canvas,
    };
    evaluator.run_program(body)
}

/// One evaluated argument.
#[derive(Clone, Copy)]
enum Val<'p> {
    Num(f64),
    /// A variable reference: the slot (for write targets) and its value at
    /// evaluation time (for reads).
    VarNum(VarId, f64),
    Col([f64; 4]),
    Const(i32),
    ProcRef(ProcId),
    Sub(&'p Program),
    Key(&'p str),
}

struct Args<'p> {
    values: [Val<'p>; MAX_STMT_ARGS],
    len: usize,
}

impl<'p> Args<'p> {
    fn num(&self, index: usize) -> f64 {
        match self.values[index] {
            Val::Num(value) | Val::VarNum(_, value) => value,
            _ => f64::NAN,
        }
    }

    fn color(&self, index: usize) -> [f64; 4] {
        match self.values[index] {
            Val::Col(rgba) => rgba,
            _ => [0.0; 4],
        }
    }

    fn constant(&self, index: usize) -> i32 {
        match self.values[index] {
            Val::Const(value) => value,
            _ => 0,
        }
    }

    fn var(&self, index: usize) -> Option<VarId> {
        match self.values[index] {
            Val::VarNum(id, _) => Some(id),
            _ => None,
        }
    }

    fn proc_id(&self, index: usize) -> Option<ProcId> {
        match self.values[index] {
            Val::ProcRef(id) => Some(id),
            _ => None,
        }
    }

    fn sub(&self, index: usize) -> Option<&'p Program> {
        match self.values[index] {
            Val::Sub(program) => Some(program),
            _ => None,
        }
    }

    fn key(&self, index: usize) -> &'p str {
        match self.values[index] {
            Val::Key(key) => key,
            _ => "",
        }
    }

    fn nums_from(&self, start: usize) -> impl Iterator<Item = f64> + '_ {
        (start..self.len).map(|index| self.num(index))
    }
}

struct Evaluator<'p, 'c, C: Canvas> {
    script: &'p Script,
    state: EvalState<'p>,
    canvas: &'c mut C,
}

impl<'p, C: Canvas> Evaluator<'p, '_, C> {
    fn run_program(&mut self, program: &'p Program) -> Result<(), RuntimeError> {
        for statement in &program.statements {
            self.run_statement(statement)?;
            if self.state.interrupted {
                break;
            }
        }
        Ok(())
    }

    fn run_statement(&mut self, statement: &'p Statement) -> Result<(), RuntimeError> {
        let current = self.canvas.current_point();
        self.state.vars[VAR_CX.0 as usize] = current.map_or(f64::NAN, |p| p.0);
        self.state.vars[VAR_CY.0 as usize] = current.map_or(f64::NAN, |p| p.1);

        let args = self.eval_args(statement)?;

        if matches!(
            statement.opcode,
            Opcode::Fill | Opcode::EoFill | Opcode::Stroke | Opcode::Save | Opcode::Restore
        ) {
            self.apply_pending();
        }

        self.dispatch(statement.opcode, &args)?;

        match self.state.reflected.status {
            RcpStatus::Updated => self.state.reflected.status = RcpStatus::Valid,
            _ if statement.opcode.modifies_path() => {
                self.state.reflected = ReflectedPoints::default();
            }
            _ => {}
        }

        Ok(())
    }

    fn eval_args(&mut self, statement: &'p Statement) -> Result<Args<'p>, RuntimeError> {
        if statement.args.len() > MAX_STMT_ARGS {
            return Err(RuntimeError::TooManyArguments {
                limit: MAX_STMT_ARGS,
            });
        }

        let mut args = Args {
            values: [Val::Num(f64::NAN); MAX_STMT_ARGS],
            len: statement.args.len(),
        };

        for (index, argument) in statement.args.iter().enumerate() {
            args.values[index] = match argument {
                Argument::Literal(value) => Val::Num(*value),
                Argument::Expr(expr) => {
                    let vars = self.state.vars;
                    let mut host = HostCtx {
                        state: &mut self.state,
                        canvas: &*self.canvas,
                    };
                    Val::Num(expr.eval(&vars, &mut host))
                }
                Argument::Var(id) => Val::VarNum(*id, self.state.vars[id.0 as usize]),
                Argument::ColorVar(id) => {
                    let packed = color::from_var(self.state.vars[id.0 as usize]);
                    Val::Col(color::unpack(packed))
                }
                Argument::Color(rgba) => Val::Col(color::normalize(*rgba)),
                Argument::Constant(value) => Val::Const(*value),
                Argument::Proc(id) => Val::ProcRef(*id),
                Argument::SubProgram(program) => Val::Sub(program.as_ref()),
                Argument::Key(key) => Val::Key(key.as_str()),
            };
        }

        Ok(args)
    }

    /// Applies and clears the pending paint pattern.
    fn apply_pending(&mut self) {
        let Some(pattern) = self.state.pending.take() else {
            return;
        };
        match pattern {
            PendingPattern::Solid([r, g, b, a]) => self.canvas.set_source_rgba(r, g, b, a),
            PendingPattern::LinearGradient { x0, y0, x1, y1, stops } => {
                self.canvas.set_source_linear_gradient(x0, y0, x1, y1, &stops);
            }
            PendingPattern::RadialGradient { c0x, c0y, r0, c1x, c1y, r1, stops } => {
                self.canvas
                    .set_source_radial_gradient(c0x, c0y, r0, c1x, c1y, r1, &stops);
            }
        }
    }

    fn current_or_origin(&self) -> (f64, f64) {
        self.canvas.current_point().unwrap_or((0.0, 0.0))
    }

    fn dispatch(&mut self, opcode: Opcode, args: &Args<'p>) -> Result<(), RuntimeError> {
        match opcode {
            Opcode::MoveTo => self.canvas.move_to(args.num(0), args.num(1)),
            Opcode::RMoveTo => self.canvas.rel_move_to(args.num(0), args.num(1)),
            Opcode::LineTo => self.canvas.line_to(args.num(0), args.num(1)),
            Opcode::RLineTo => self.canvas.rel_line_to(args.num(0), args.num(1)),

            // Horizontal/vertical lines synthesise a line_to from the
            // current point; without one they are no-ops.
            Opcode::HLineTo => {
                if let Some((_, cy)) = self.canvas.current_point() {
                    self.canvas.line_to(args.num(0), cy);
                }
            }
            Opcode::RHLineTo => {
                if let Some((cx, cy)) = self.canvas.current_point() {
                    self.canvas.line_to(cx + args.num(0), cy);
                }
            }
            Opcode::VLineTo => {
                if let Some((cx, _)) = self.canvas.current_point() {
                    self.canvas.line_to(cx, args.num(0));
                }
            }
            Opcode::RVLineTo => {
                if let Some((cx, cy)) = self.canvas.current_point() {
                    self.canvas.line_to(cx, cy + args.num(0));
                }
            }

            Opcode::ClosePath => self.canvas.close_path(),
            Opcode::NewPath => self.canvas.new_sub_path(),

            Opcode::CurveTo => {
                let (x1, y1) = (args.num(0), args.num(1));
                let (x2, y2) = (args.num(2), args.num(3));
                let (x, y) = (args.num(4), args.num(5));
                self.canvas.curve_to(x1, y1, x2, y2, x, y);
                self.state
                    .reflected
                    .update((2.0 * x - x2, 2.0 * y - y2), (x, y));
            }
            Opcode::RCurveTo => {
                let (px, py) = self.current_or_origin();
                let (dx1, dy1) = (args.num(0), args.num(1));
                let (dx2, dy2) = (args.num(2), args.num(3));
                let (dx, dy) = (args.num(4), args.num(5));
                self.canvas.rel_curve_to(dx1, dy1, dx2, dy2, dx, dy);
                let (x2, y2) = (px + dx2, py + dy2);
                let (x, y) = (px + dx, py + dy);
                self.state
                    .reflected
                    .update((2.0 * x - x2, 2.0 * y - y2), (x, y));
            }
            Opcode::SmoothCurveTo => {
                let p0 = self.current_or_origin();
                let (x1, y1) = self.state.reflected.cubic_point().unwrap_or(p0);
                let (x2, y2) = (args.num(0), args.num(1));
                let (x, y) = (args.num(2), args.num(3));
                self.canvas.curve_to(x1, y1, x2, y2, x, y);
                self.state
                    .reflected
                    .update((2.0 * x - x2, 2.0 * y - y2), (x, y));
            }
            Opcode::RSmoothCurveTo => {
                let p0 = self.current_or_origin();
                let (x1, y1) = self.state.reflected.cubic_point().unwrap_or(p0);
                let (x2, y2) = (p0.0 + args.num(0), p0.1 + args.num(1));
                let (x, y) = (p0.0 + args.num(2), p0.1 + args.num(3));
                self.canvas.curve_to(x1, y1, x2, y2, x, y);
                self.state
                    .reflected
                    .update((2.0 * x - x2, 2.0 * y - y2), (x, y));
            }
            Opcode::QuadTo => {
                let p0 = self.current_or_origin();
                let q = (args.num(0), args.num(1));
                let p = (args.num(2), args.num(3));
                self.emit_quad(p0, q, p);
            }
            Opcode::RQuadTo => {
                let p0 = self.current_or_origin();
                let q = (p0.0 + args.num(0), p0.1 + args.num(1));
                let p = (p0.0 + args.num(2), p0.1 + args.num(3));
                self.emit_quad(p0, q, p);
            }
            Opcode::SmoothQuadTo => {
                let p0 = self.current_or_origin();
                let q = self.state.reflected.quad_point().unwrap_or(p0);
                let p = (args.num(0), args.num(1));
                self.emit_quad(p0, q, p);
            }
            Opcode::RSmoothQuadTo => {
                let p0 = self.current_or_origin();
                let q = self.state.reflected.quad_point().unwrap_or(p0);
                let p = (p0.0 + args.num(0), p0.1 + args.num(1));
                self.emit_quad(p0, q, p);
            }

            Opcode::Arc => self.canvas.arc(
                args.num(0),
                args.num(1),
                args.num(2),
                args.num(3),
                args.num(4),
            ),
            Opcode::ArcNeg => self.canvas.arc_negative(
                args.num(0),
                args.num(1),
                args.num(2),
                args.num(3),
                args.num(4),
            ),
            Opcode::Circle => {
                let r = args.num(2);
                curve::ellipse(&mut *self.canvas, args.num(0), args.num(1), r, r);
            }
            Opcode::Ellipse => curve::ellipse(
                &mut *self.canvas,
                args.num(0),
                args.num(1),
                args.num(2),
                args.num(3),
            ),
            Opcode::Rect => {
                self.canvas
                    .rectangle(args.num(0), args.num(1), args.num(2), args.num(3));
            }
            Opcode::RoundedRect => curve::rounded_rect(
                &mut *self.canvas,
                args.num(0),
                args.num(1),
                args.num(2),
                args.num(3),
                args.num(4),
            ),

            Opcode::Save => self.canvas.save(),
            Opcode::Restore => self.canvas.restore(),
            Opcode::Translate => self.canvas.translate(args.num(0), args.num(1)),
            Opcode::Rotate => self.canvas.rotate(args.num(0)),
            Opcode::Scale => {
                let s = args.num(0);
                self.canvas.scale(s, s);
            }
            Opcode::ScaleXY => self.canvas.scale(args.num(0), args.num(1)),

            Opcode::SetLineWidth => self.canvas.set_line_width(args.num(0)),
            Opcode::SetLineCap => {
                self.canvas
                    .set_line_cap(LineCap::from_constant(args.constant(0)));
            }
            Opcode::SetLineJoin => {
                self.canvas
                    .set_line_join(LineJoin::from_constant(args.constant(0)));
            }
            Opcode::SetMiterLimit => self.canvas.set_miter_limit(args.num(0)),

            Opcode::SetDash => {
                let (mut dashes, offset) = self.canvas.dash();
                dashes.push(args.num(0));
                self.canvas.set_dash(&dashes, offset);
            }
            Opcode::SetDashOffset => {
                let (dashes, _) = self.canvas.dash();
                self.canvas.set_dash(&dashes, args.num(0));
            }
            Opcode::ResetDash => self.canvas.set_dash(&[], 0.0),

            Opcode::SetColor => {
                self.state.pending = Some(PendingPattern::Solid(args.color(0)));
            }
            Opcode::SetRgba => {
                self.state.pending = Some(PendingPattern::Solid([
                    args.num(0),
                    args.num(1),
                    args.num(2),
                    args.num(3),
                ]));
            }
            Opcode::SetHsla => {
                let (r, g, b) = color::hsl_to_rgb(args.num(0), args.num(1), args.num(2));
                self.state.pending = Some(PendingPattern::Solid([r, g, b, args.num(3)]));
            }
            Opcode::DefRgba => {
                if let Some(id) = args.var(0) {
                    let packed =
                        color::pack_rgba(args.num(1), args.num(2), args.num(3), args.num(4));
                    self.state.vars[id.0 as usize] = f64::from(packed);
                }
            }
            Opcode::DefHsla => {
                if let Some(id) = args.var(0) {
                    let (r, g, b) = color::hsl_to_rgb(args.num(1), args.num(2), args.num(3));
                    let packed = color::pack_rgba(r, g, b, args.num(4));
                    self.state.vars[id.0 as usize] = f64::from(packed);
                }
            }
            Opcode::LinearGrad => {
                self.state.pending = Some(PendingPattern::LinearGradient {
                    x0: args.num(0),
                    y0: args.num(1),
                    x1: args.num(2),
                    y1: args.num(3),
                    stops: Vec::new(),
                });
            }
            Opcode::RadialGrad => {
                self.state.pending = Some(PendingPattern::RadialGradient {
                    c0x: args.num(0),
                    c0y: args.num(1),
                    r0: args.num(2),
                    c1x: args.num(3),
                    c1y: args.num(4),
                    r1: args.num(5),
                    stops: Vec::new(),
                });
            }
            Opcode::ColorStop => match &mut self.state.pending {
                Some(PendingPattern::LinearGradient { stops, .. })
                | Some(PendingPattern::RadialGradient { stops, .. }) => {
                    stops.push(GradientStop {
                        offset: args.num(0),
                        rgba: args.color(1),
                    });
                }
                _ => tracing::warn!("colorstop with no gradient in progress"),
            },

            Opcode::Fill => {
                self.canvas.set_fill_rule(FillRule::Winding);
                if std::mem::take(&mut self.state.preserve) {
                    self.canvas.fill_preserve();
                } else {
                    self.canvas.fill();
                }
            }
            Opcode::EoFill => {
                self.canvas.set_fill_rule(FillRule::EvenOdd);
                if std::mem::take(&mut self.state.preserve) {
                    self.canvas.fill_preserve();
                } else {
                    self.canvas.fill();
                }
            }
            Opcode::Stroke => {
                if std::mem::take(&mut self.state.preserve) {
                    self.canvas.stroke_preserve();
                } else {
                    self.canvas.stroke();
                }
            }
            Opcode::Clip => {
                self.canvas.set_fill_rule(FillRule::Winding);
                if std::mem::take(&mut self.state.preserve) {
                    self.canvas.clip_preserve();
                } else {
                    self.canvas.clip();
                }
            }
            Opcode::EoClip => {
                self.canvas.set_fill_rule(FillRule::EvenOdd);
                if std::mem::take(&mut self.state.preserve) {
                    self.canvas.clip_preserve();
                } else {
                    self.canvas.clip();
                }
            }
            Opcode::ResetClip => self.canvas.reset_clip(),
            Opcode::Preserve => self.state.preserve = true,

            Opcode::If => {
                if let Some(body) = args.sub(1) {
                    let condition = args.num(0);
                    if condition.is_finite() && condition != 0.0 {
                        self.run_program(body)?;
                    }
                }
            }
            Opcode::Repeat => {
                if let Some(body) = args.sub(1) {
                    self.run_repeat(args.num(0), body)?;
                }
            }
            Opcode::Break => self.state.interrupted = true,

            Opcode::Proc => self.register_proc(args, 0),
            Opcode::Proc1 => self.register_proc(args, 1),
            Opcode::Proc2 => self.register_proc(args, 2),
            Opcode::Call => self.run_call(args, 0)?,
            Opcode::Call1 => self.run_call(args, 1)?,
            Opcode::Call2 => self.run_call(args, 2)?,

            Opcode::SetVar => {
                if let Some(id) = args.var(0) {
                    self.state.vars[id.0 as usize] = args.num(1);
                }
            }
            Opcode::GetMetadata => {
                let key = args.key(1);
                let value = self
                    .state
                    .metadata
                    .get(key)
                    .and_then(|raw| raw.trim().parse::<f64>().ok());
                if value.is_none() {
                    tracing::debug!(key, "metadata lookup failed, storing NaN");
                }
                if let Some(id) = args.var(0) {
                    self.state.vars[id.0 as usize] = value.unwrap_or(f64::NAN);
                }
            }
            Opcode::Push => self.state.stack.push(args.num(0), args.num(1)),
            Opcode::Print => {
                use std::fmt::Write;
                let mut message = String::from(args.key(0));
                for value in args.nums_from(1) {
                    let _ = write!(message, " {value}");
                }
                tracing::info!(target: "vgs::script", "{}", message);
            }
        }

        Ok(())
    }

    /// Lowers a quadratic Bézier to the back-end cubic and stores the
    /// reflection for a following `T`/`t`.
    fn emit_quad(&mut self, p0: (f64, f64), q: (f64, f64), p: (f64, f64)) {
        let (cp1, cp2) = curve::quad_to_cubic(p0, q, p);
        self.canvas.curve_to(cp1.0, cp1.1, cp2.0, cp2.1, p.0, p.1);
        self.state
            .reflected
            .update(p, (2.0 * p.0 - q.0, 2.0 * p.1 - q.1));
    }

    fn run_repeat(&mut self, count: f64, body: &'p Program) -> Result<(), RuntimeError> {
        let saved = self.state.vars[VAR_I.0 as usize];

        if count.is_finite() {
            let iterations = count.floor().max(0.0) as u64;
            for index in 0..iterations {
                self.state.vars[VAR_I.0 as usize] = index as f64;
                self.run_program(body)?;
                if self.state.interrupted {
                    self.state.interrupted = false;
                    break;
                }
            }
        }

        self.state.vars[VAR_I.0 as usize] = saved;
        Ok(())
    }

    fn register_proc(&mut self, args: &Args<'p>, param_count: usize) {
        let Some(id) = args.proc_id(0) else { return };
        let Some(body) = args.sub(1 + param_count) else {
            return;
        };
        let mut params = [None, None];
        for (slot, param) in params.iter_mut().enumerate().take(param_count) {
            *param = args.var(1 + slot);
        }
        self.state.procs[id.0 as usize] = Some(ProcEntry { body, params });
    }

    fn run_call(&mut self, args: &Args<'p>, supplied: usize) -> Result<(), RuntimeError> {
        let Some(id) = args.proc_id(0) else {
            return Ok(());
        };

        let Some(entry) = self.state.procs[id.0 as usize] else {
            tracing::error!(
                procedure = %self.script.procedures[id.0 as usize],
                "call to undefined procedure"
            );
            return Ok(());
        };
        if self.state.call_depth >= MAX_CALL_DEPTH {
            tracing::error!(
                procedure = %self.script.procedures[id.0 as usize],
                limit = MAX_CALL_DEPTH,
                "call depth limit reached, skipping call"
            );
            return Ok(());
        }

        let mut saved: [Option<(VarId, f64)>; 2] = [None, None];
        for slot in 0..supplied.min(2) {
            if let Some(param) = entry.params[slot] {
                saved[slot] = Some((param, self.state.vars[param.0 as usize]));
                self.state.vars[param.0 as usize] = args.num(1 + slot);
            }
        }

        self.state.call_depth += 1;
        let result = self.run_program(entry.body);
        self.state.call_depth -= 1;

        // A break inside a procedure ends the procedure, not the caller.
        self.state.interrupted = false;

        for binding in saved.iter().rev().flatten() {
            self.state.vars[binding.0 .0 as usize] = binding.1;
        }

        result
    }
}
