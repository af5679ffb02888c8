//! Per-frame evaluation state.
//!
//! One [`EvalState`] is created per frame from the script's name tables and
//! the host's [`Frame`](crate::Frame), lives for exactly one evaluation,
//! and is dropped afterwards. The interpreter owns it on its stack; nothing
//! here is shared or global.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use vgsc_par::{Program, Script, VarId, VAR_COUNT, VAR_DURATION, VAR_H, VAR_N, VAR_T, VAR_W};
use vgsc_util::FxHashMap;

use crate::backend::GradientStop;
use crate::frame::Frame;

/// State of the reflected control points used by `S`/`s`/`T`/`t`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RcpStatus {
    /// No usable reflection; smooth curves fall back to the current point.
    #[default]
    None,
    /// A curve in an earlier statement left a usable reflection.
    Valid,
    /// The statement being executed just stored a reflection; promoted to
    /// `Valid` once the statement completes.
    Updated,
}

/// Reflected control points. Every curve stores both families: its own
/// reflection, and the new endpoint for the other family, which makes the
/// "fall back to the current point" rule come out naturally.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReflectedPoints {
    pub status: RcpStatus,
    /// Reflection for the next `S`/`s` first control point.
    pub cubic: (f64, f64),
    /// Reflection for the next `T`/`t` control point.
    pub quad: (f64, f64),
}

impl ReflectedPoints {
    /// Stores fresh reflection points from the statement being executed.
    pub fn update(&mut self, cubic: (f64, f64), quad: (f64, f64)) {
        self.cubic = cubic;
        self.quad = quad;
        self.status = RcpStatus::Updated;
    }

    /// The cubic reflection, when valid.
    pub fn cubic_point(&self) -> Option<(f64, f64)> {
        (self.status == RcpStatus::Valid).then_some(self.cubic)
    }

    /// The quadratic reflection, when valid.
    pub fn quad_point(&self) -> Option<(f64, f64)> {
        (self.status == RcpStatus::Valid).then_some(self.quad)
    }
}

/// The paint pattern being assembled by `setcolor`/`*grad`/`colorstop`,
/// applied to the back-end by the next fill/stroke/save/restore.
#[derive(Clone, Debug, PartialEq)]
pub enum PendingPattern {
    Solid([f64; 4]),
    LinearGradient {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        stops: Vec<GradientStop>,
    },
    RadialGradient {
        c0x: f64,
        c0y: f64,
        r0: f64,
        c1x: f64,
        c1y: f64,
        r1: f64,
        stops: Vec<GradientStop>,
    },
}

/// A procedure registered by `proc`/`proc1`/`proc2`.
#[derive(Clone, Copy, Debug)]
pub struct ProcEntry<'p> {
    /// The procedure body, borrowed from the script tree.
    pub body: &'p Program,
    /// Variable slots of the formal parameters, outermost first.
    pub params: [Option<VarId>; 2],
}

/// The `push`/`peek`/`pop` associative stack. Keys compare bit-equal, so
/// `-0.0` and `0.0` are distinct and NaN never matches.
#[derive(Clone, Debug, Default)]
pub struct ValueStack {
    entries: Vec<(f64, f64)>,
}

impl ValueStack {
    /// Pushes an entry. Non-finite keys and NaN values are silently
    /// dropped, matching the language contract.
    pub fn push(&mut self, key: f64, value: f64) {
        if !key.is_finite() || value.is_nan() {
            return;
        }
        self.entries.push((key, value));
    }

    /// The newest value stored under `key`, NaN if none.
    pub fn peek(&self, key: f64) -> f64 {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k.to_bits() == key.to_bits())
            .map_or(f64::NAN, |(_, v)| *v)
    }

    /// Like [`ValueStack::peek`], but removes the entry.
    pub fn pop(&mut self, key: f64) -> f64 {
        match self
            .entries
            .iter()
            .rposition(|(k, _)| k.to_bits() == key.to_bits())
        {
            Some(index) => self.entries.remove(index).1,
            None => f64::NAN,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been pushed (or everything popped).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The four PRNG slots behind `randomg(seed)`. The slot is selected by
/// `floor(seed) mod 4` and lazily seeded from the full seed value, so
/// fractional seeds give distinct streams on the same slot index.
#[derive(Clone, Debug, Default)]
pub struct RngSlots {
    slots: [Option<SmallRng>; 4],
}

impl RngSlots {
    /// Draws the next value in `[0, 1]` from the slot `seed` selects;
    /// NaN for a non-finite seed.
    pub fn next(&mut self, seed: f64) -> f64 {
        if !seed.is_finite() {
            return f64::NAN;
        }
        let index = (seed.floor() as i64).rem_euclid(4) as usize;
        let rng = self.slots[index].get_or_insert_with(|| SmallRng::seed_from_u64(seed.to_bits()));
        rng.next_u64() as f64 / u64::MAX as f64
    }
}

/// Everything mutable during one frame's evaluation.
pub struct EvalState<'p> {
    /// The variable-value array: fixed slots then user slots; NaN = unset.
    pub vars: [f64; VAR_COUNT],
    /// Procedure slots, indexed by [`vgsc_par::ProcId`]; filled at runtime
    /// as `proc` statements execute.
    pub procs: Vec<Option<ProcEntry<'p>>>,
    pub reflected: ReflectedPoints,
    pub pending: Option<PendingPattern>,
    /// One-shot flag set by `preserve`, consumed by the next
    /// fill/clip/stroke.
    pub preserve: bool,
    /// Set by `break`; observed and cleared by `repeat` and `call`.
    pub interrupted: bool,
    pub stack: ValueStack,
    pub rng: RngSlots,
    /// Depth of nested `call`s, for the runaway-recursion guard.
    pub call_depth: usize,
    /// The frame's metadata dictionary.
    pub metadata: &'p FxHashMap<String, String>,
}

impl<'p> EvalState<'p> {
    /// Builds the state for one frame.
    pub fn new(script: &'p Script, frame: &'p Frame) -> Self {
        let mut vars = [f64::NAN; VAR_COUNT];
        vars[VAR_N.0 as usize] = frame.n;
        vars[VAR_T.0 as usize] = frame.t;
        vars[VAR_W.0 as usize] = frame.w;
        vars[VAR_H.0 as usize] = frame.h;
        vars[VAR_DURATION.0 as usize] = frame.duration;

        Self {
            vars,
            procs: script.procedures.iter().map(|_| None).collect(),
            reflected: ReflectedPoints::default(),
            pending: None,
            preserve: false,
            interrupted: false,
            stack: ValueStack::default(),
            rng: RngSlots::default(),
            call_depth: 0,
            metadata: &frame.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_stack_lifo_per_key() {
        let mut stack = ValueStack::default();
        stack.push(7.0, 42.0);
        assert_eq!(stack.peek(7.0), 42.0);
        assert_eq!(stack.pop(7.0), 42.0);
        assert!(stack.pop(7.0).is_nan());

        stack.push(1.0, 10.0);
        stack.push(1.0, 20.0);
        assert_eq!(stack.pop(1.0), 20.0);
        assert_eq!(stack.pop(1.0), 10.0);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_value_stack_keys_are_bit_equal() {
        let mut stack = ValueStack::default();
        stack.push(0.0, 1.0);
        assert!(stack.peek(-0.0).is_nan());
        assert_eq!(stack.peek(0.0), 1.0);
    }

    #[test]
    fn test_value_stack_rejects_bad_entries() {
        let mut stack = ValueStack::default();
        stack.push(f64::NAN, 1.0);
        stack.push(f64::INFINITY, 1.0);
        stack.push(1.0, f64::NAN);
        assert!(stack.is_empty());
        assert_eq!(stack.len(), 0);
    }

    #[test]
    fn test_rng_slots_are_deterministic() {
        let mut a = RngSlots::default();
        let mut b = RngSlots::default();
        let first = a.next(3.0);
        assert_eq!(first, b.next(3.0));
        assert!((0.0..=1.0).contains(&first));
        // Initialised once; the stream advances.
        assert_ne!(a.next(3.0), first);
    }

    #[test]
    fn test_rng_slot_selection() {
        let mut slots = RngSlots::default();
        assert!(slots.next(f64::NAN).is_nan());
        assert!(slots.next(f64::INFINITY).is_nan());
        // Negative seeds select a slot via Euclidean remainder.
        assert!((0.0..=1.0).contains(&slots.next(-1.0)));
        // Fractional seeds land in slot floor(seed) but seed the stream
        // with the exact value.
        let mut x = RngSlots::default();
        let mut y = RngSlots::default();
        assert_ne!(x.next(2.25), y.next(2.75));
    }
}
