//! The instruction table.
//!
//! Every instruction declares its parameter grammar as a short slot list.
//! The table is sorted by name in byte order, case-sensitive, so the SVG
//! single-letter commands sort before the lowercase long names. Lookup is
//! a binary search; a unit test pins the ordering.

use crate::ast::Opcode;

/// One element of a parameter grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// A numeric argument: literal, expression, or variable name.
    Num,
    /// A variable name, allocated on first use.
    Var,
    /// A keyword from a fixed set; the payload maps spellings to values.
    Const(&'static [(&'static str, i32)]),
    /// A colour literal or colour-valued user variable.
    Color,
    /// A `{ … }` sub-program.
    Sub,
    /// A bare identifier kept as a string.
    Ident,
    /// A procedure name, interned per script.
    Proc,
    /// Terminator: remaining numeric arguments form a variable tail.
    Variadic,
    /// Terminator: the whole slot list may repeat while numeric input
    /// follows, emitting one statement per repetition.
    MayRepeat,
}

/// Keyword set for `setlinecap`.
pub const LINE_CAPS: &[(&str, i32)] = &[("butt", 0), ("round", 1), ("square", 2)];

/// Keyword set for `setlinejoin`.
pub const LINE_JOINS: &[(&str, i32)] = &[("miter", 0), ("round", 1), ("bevel", 2)];

/// An instruction-table entry.
#[derive(Debug)]
pub struct Instruction {
    pub name: &'static str,
    pub opcode: Opcode,
    pub slots: &'static [Slot],
}

use Slot::{Color, Const, Ident, MayRepeat, Num, Proc, Sub, Var, Variadic};

const XY: &[Slot] = &[Num, Num, MayRepeat];
const SINGLE: &[Slot] = &[Num, MayRepeat];
const CUBIC: &[Slot] = &[Num, Num, Num, Num, Num, Num, MayRepeat];
const QUAD: &[Slot] = &[Num, Num, Num, Num, MayRepeat];
const NONE: &[Slot] = &[];

/// The instruction set, sorted by name.
pub static INSTRUCTIONS: &[Instruction] = &[
    Instruction { name: "C", opcode: Opcode::CurveTo, slots: CUBIC },
    Instruction { name: "H", opcode: Opcode::HLineTo, slots: SINGLE },
    Instruction { name: "L", opcode: Opcode::LineTo, slots: XY },
    Instruction { name: "M", opcode: Opcode::MoveTo, slots: XY },
    Instruction { name: "Q", opcode: Opcode::QuadTo, slots: QUAD },
    Instruction { name: "S", opcode: Opcode::SmoothCurveTo, slots: QUAD },
    Instruction { name: "T", opcode: Opcode::SmoothQuadTo, slots: XY },
    Instruction { name: "V", opcode: Opcode::VLineTo, slots: SINGLE },
    Instruction { name: "Z", opcode: Opcode::ClosePath, slots: NONE },
    Instruction { name: "arc", opcode: Opcode::Arc, slots: &[Num, Num, Num, Num, Num] },
    Instruction { name: "arcn", opcode: Opcode::ArcNeg, slots: &[Num, Num, Num, Num, Num] },
    Instruction { name: "break", opcode: Opcode::Break, slots: NONE },
    Instruction { name: "c", opcode: Opcode::RCurveTo, slots: CUBIC },
    Instruction { name: "call", opcode: Opcode::Call, slots: &[Proc] },
    Instruction { name: "call1", opcode: Opcode::Call1, slots: &[Proc, Num] },
    Instruction { name: "call2", opcode: Opcode::Call2, slots: &[Proc, Num, Num] },
    Instruction { name: "circle", opcode: Opcode::Circle, slots: &[Num, Num, Num] },
    Instruction { name: "clip", opcode: Opcode::Clip, slots: NONE },
    Instruction { name: "closepath", opcode: Opcode::ClosePath, slots: NONE },
    Instruction { name: "colorstop", opcode: Opcode::ColorStop, slots: &[Num, Color, MayRepeat] },
    Instruction { name: "curveto", opcode: Opcode::CurveTo, slots: CUBIC },
    Instruction { name: "defhsla", opcode: Opcode::DefHsla, slots: &[Var, Num, Num, Num, Num] },
    Instruction { name: "defrgba", opcode: Opcode::DefRgba, slots: &[Var, Num, Num, Num, Num] },
    Instruction { name: "ellipse", opcode: Opcode::Ellipse, slots: &[Num, Num, Num, Num] },
    Instruction { name: "eoclip", opcode: Opcode::EoClip, slots: NONE },
    Instruction { name: "eofill", opcode: Opcode::EoFill, slots: NONE },
    Instruction { name: "fill", opcode: Opcode::Fill, slots: NONE },
    Instruction { name: "getmetadata", opcode: Opcode::GetMetadata, slots: &[Var, Ident] },
    Instruction { name: "h", opcode: Opcode::RHLineTo, slots: SINGLE },
    Instruction { name: "if", opcode: Opcode::If, slots: &[Num, Sub] },
    Instruction { name: "l", opcode: Opcode::RLineTo, slots: XY },
    Instruction { name: "lineargrad", opcode: Opcode::LinearGrad, slots: &[Num, Num, Num, Num] },
    Instruction { name: "lineto", opcode: Opcode::LineTo, slots: XY },
    Instruction { name: "m", opcode: Opcode::RMoveTo, slots: XY },
    Instruction { name: "moveto", opcode: Opcode::MoveTo, slots: XY },
    Instruction { name: "newpath", opcode: Opcode::NewPath, slots: NONE },
    Instruction { name: "preserve", opcode: Opcode::Preserve, slots: NONE },
    Instruction { name: "print", opcode: Opcode::Print, slots: &[Ident, Variadic] },
    Instruction { name: "proc", opcode: Opcode::Proc, slots: &[Proc, Sub] },
    Instruction { name: "proc1", opcode: Opcode::Proc1, slots: &[Proc, Var, Sub] },
    Instruction { name: "proc2", opcode: Opcode::Proc2, slots: &[Proc, Var, Var, Sub] },
    Instruction { name: "push", opcode: Opcode::Push, slots: XY },
    Instruction { name: "q", opcode: Opcode::RQuadTo, slots: QUAD },
    Instruction { name: "radialgrad", opcode: Opcode::RadialGrad, slots: &[Num, Num, Num, Num, Num, Num] },
    Instruction { name: "rcurveto", opcode: Opcode::RCurveTo, slots: CUBIC },
    Instruction { name: "rect", opcode: Opcode::Rect, slots: &[Num, Num, Num, Num] },
    Instruction { name: "repeat", opcode: Opcode::Repeat, slots: &[Num, Sub] },
    Instruction { name: "resetclip", opcode: Opcode::ResetClip, slots: NONE },
    Instruction { name: "resetdash", opcode: Opcode::ResetDash, slots: NONE },
    Instruction { name: "restore", opcode: Opcode::Restore, slots: NONE },
    Instruction { name: "rlineto", opcode: Opcode::RLineTo, slots: XY },
    Instruction { name: "rmoveto", opcode: Opcode::RMoveTo, slots: XY },
    Instruction { name: "rotate", opcode: Opcode::Rotate, slots: &[Num] },
    Instruction { name: "roundedrect", opcode: Opcode::RoundedRect, slots: &[Num, Num, Num, Num, Num] },
    Instruction { name: "s", opcode: Opcode::RSmoothCurveTo, slots: QUAD },
    Instruction { name: "save", opcode: Opcode::Save, slots: NONE },
    Instruction { name: "scale", opcode: Opcode::Scale, slots: &[Num] },
    Instruction { name: "scalexy", opcode: Opcode::ScaleXY, slots: &[Num, Num] },
    Instruction { name: "setcolor", opcode: Opcode::SetColor, slots: &[Color] },
    Instruction { name: "setdash", opcode: Opcode::SetDash, slots: &[Num] },
    Instruction { name: "setdashoffset", opcode: Opcode::SetDashOffset, slots: &[Num] },
    Instruction { name: "sethsla", opcode: Opcode::SetHsla, slots: &[Num, Num, Num, Num] },
    Instruction { name: "setlinecap", opcode: Opcode::SetLineCap, slots: &[Const(LINE_CAPS)] },
    Instruction { name: "setlinejoin", opcode: Opcode::SetLineJoin, slots: &[Const(LINE_JOINS)] },
    Instruction { name: "setlinewidth", opcode: Opcode::SetLineWidth, slots: &[Num] },
    Instruction { name: "setmiterlimit", opcode: Opcode::SetMiterLimit, slots: &[Num] },
    Instruction { name: "setrgba", opcode: Opcode::SetRgba, slots: &[Num, Num, Num, Num] },
    Instruction { name: "setvar", opcode: Opcode::SetVar, slots: &[Var, Num] },
    Instruction { name: "stroke", opcode: Opcode::Stroke, slots: NONE },
    Instruction { name: "t", opcode: Opcode::RSmoothQuadTo, slots: XY },
    Instruction { name: "translate", opcode: Opcode::Translate, slots: &[Num, Num] },
    Instruction { name: "v", opcode: Opcode::RVLineTo, slots: SINGLE },
    Instruction { name: "z", opcode: Opcode::ClosePath, slots: NONE },
];

/// Finds an instruction by name.
pub fn lookup(name: &str) -> Option<&'static Instruction> {
    INSTRUCTIONS
        .binary_search_by(|entry| entry.name.cmp(name))
        .ok()
        .map(|idx| &INSTRUCTIONS[idx])
}

/// Finds the constant keyword set for an opcode, for the canonical printer.
pub fn const_set(opcode: Opcode) -> Option<&'static [(&'static str, i32)]> {
    match opcode {
        Opcode::SetLineCap => Some(LINE_CAPS),
        Opcode::SetLineJoin => Some(LINE_JOINS),
        _ => None,
    }
}
