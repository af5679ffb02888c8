//! Instruction tree definitions.
//!
//! A parsed script is a [`Script`]: the top-level [`Program`] plus the two
//! name tables discovered during parsing (procedure names and variable
//! names). Programs own their statements; statements own their arguments;
//! `{ … }` blocks become owned sub-programs, so the whole structure is a
//! tree freed as one unit.

use vgsc_util::{define_idx, Span};

use crate::expr::Expr;

define_idx!(
    /// Index into the variable table.
    VarId
);

define_idx!(
    /// Index into a script's procedure-name table.
    ProcId
);

/// Number of host-provided variables (`n t w h duration cx cy i`).
pub const FIXED_VARS: usize = 8;

/// Number of script-allocatable user variables.
pub const USER_VARS: usize = 10;

/// Total size of the variable table.
pub const VAR_COUNT: usize = FIXED_VARS + USER_VARS;

pub const VAR_N: VarId = VarId(0);
pub const VAR_T: VarId = VarId(1);
pub const VAR_W: VarId = VarId(2);
pub const VAR_H: VarId = VarId(3);
pub const VAR_DURATION: VarId = VarId(4);
pub const VAR_CX: VarId = VarId(5);
pub const VAR_CY: VarId = VarId(6);
pub const VAR_I: VarId = VarId(7);

/// First user-variable slot.
pub const VAR_U0: VarId = VarId(FIXED_VARS as u32);

/// Names of the fixed variables, in slot order.
pub const FIXED_NAMES: [&str; FIXED_VARS] = ["n", "t", "w", "h", "duration", "cx", "cy", "i"];

/// Returns true if `name` is one of the reserved (fixed) variable names.
pub fn is_reserved_name(name: &str) -> bool {
    FIXED_NAMES.contains(&name)
}

/// Returns true if `name` is a legal identifier: `[A-Za-z_]` followed by
/// `[A-Za-z0-9_]*`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Every instruction in the language.
///
/// SVG-style aliases (`moveto` for `M`, `rlineto` for `l`, …) share the
/// opcode of their canonical spelling; the distinction disappears at parse
/// time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Path construction.
    MoveTo,
    RMoveTo,
    LineTo,
    RLineTo,
    HLineTo,
    RHLineTo,
    VLineTo,
    RVLineTo,
    ClosePath,
    CurveTo,
    RCurveTo,
    SmoothCurveTo,
    RSmoothCurveTo,
    QuadTo,
    RQuadTo,
    SmoothQuadTo,
    RSmoothQuadTo,
    Arc,
    ArcNeg,
    Circle,
    Ellipse,
    Rect,
    RoundedRect,
    NewPath,

    // Graphics state.
    Save,
    Restore,
    Translate,
    Rotate,
    Scale,
    ScaleXY,
    SetLineWidth,
    SetLineCap,
    SetLineJoin,
    SetMiterLimit,
    SetDash,
    SetDashOffset,
    ResetDash,

    // Sources.
    SetColor,
    SetRgba,
    SetHsla,
    DefRgba,
    DefHsla,
    LinearGrad,
    RadialGrad,
    ColorStop,

    // Painting.
    Fill,
    EoFill,
    Stroke,
    Clip,
    EoClip,
    ResetClip,
    Preserve,

    // Control flow and state.
    If,
    Repeat,
    Break,
    Proc,
    Proc1,
    Proc2,
    Call,
    Call1,
    Call2,
    SetVar,
    GetMetadata,
    Push,
    Print,
}

impl Opcode {
    /// The canonical spelling, used by the canonical printer. Where an SVG
    /// single-letter form exists it wins over the long alias.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::MoveTo => "M",
            Opcode::RMoveTo => "m",
            Opcode::LineTo => "L",
            Opcode::RLineTo => "l",
            Opcode::HLineTo => "H",
            Opcode::RHLineTo => "h",
            Opcode::VLineTo => "V",
            Opcode::RVLineTo => "v",
            Opcode::ClosePath => "Z",
            Opcode::CurveTo => "C",
            Opcode::RCurveTo => "c",
            Opcode::SmoothCurveTo => "S",
            Opcode::RSmoothCurveTo => "s",
            Opcode::QuadTo => "Q",
            Opcode::RQuadTo => "q",
            Opcode::SmoothQuadTo => "T",
            Opcode::RSmoothQuadTo => "t",
            Opcode::Arc => "arc",
            Opcode::ArcNeg => "arcn",
            Opcode::Circle => "circle",
            Opcode::Ellipse => "ellipse",
            Opcode::Rect => "rect",
            Opcode::RoundedRect => "roundedrect",
            Opcode::NewPath => "newpath",
            Opcode::Save => "save",
            Opcode::Restore => "restore",
            Opcode::Translate => "translate",
            Opcode::Rotate => "rotate",
            Opcode::Scale => "scale",
            Opcode::ScaleXY => "scalexy",
            Opcode::SetLineWidth => "setlinewidth",
            Opcode::SetLineCap => "setlinecap",
            Opcode::SetLineJoin => "setlinejoin",
            Opcode::SetMiterLimit => "setmiterlimit",
            Opcode::SetDash => "setdash",
            Opcode::SetDashOffset => "setdashoffset",
            Opcode::ResetDash => "resetdash",
            Opcode::SetColor => "setcolor",
            Opcode::SetRgba => "setrgba",
            Opcode::SetHsla => "sethsla",
            Opcode::DefRgba => "defrgba",
            Opcode::DefHsla => "defhsla",
            Opcode::LinearGrad => "lineargrad",
            Opcode::RadialGrad => "radialgrad",
            Opcode::ColorStop => "colorstop",
            Opcode::Fill => "fill",
            Opcode::EoFill => "eofill",
            Opcode::Stroke => "stroke",
            Opcode::Clip => "clip",
            Opcode::EoClip => "eoclip",
            Opcode::ResetClip => "resetclip",
            Opcode::Preserve => "preserve",
            Opcode::If => "if",
            Opcode::Repeat => "repeat",
            Opcode::Break => "break",
            Opcode::Proc => "proc",
            Opcode::Proc1 => "proc1",
            Opcode::Proc2 => "proc2",
            Opcode::Call => "call",
            Opcode::Call1 => "call1",
            Opcode::Call2 => "call2",
            Opcode::SetVar => "setvar",
            Opcode::GetMetadata => "getmetadata",
            Opcode::Push => "push",
            Opcode::Print => "print",
        }
    }

    /// Returns true for instructions that change the current path without
    /// producing a reflected control point: these reset the smooth-curve
    /// state, while state/control instructions leave it alone.
    pub fn modifies_path(self) -> bool {
        matches!(
            self,
            Opcode::MoveTo
                | Opcode::RMoveTo
                | Opcode::LineTo
                | Opcode::RLineTo
                | Opcode::HLineTo
                | Opcode::RHLineTo
                | Opcode::VLineTo
                | Opcode::RVLineTo
                | Opcode::ClosePath
                | Opcode::Arc
                | Opcode::ArcNeg
                | Opcode::Circle
                | Opcode::Ellipse
                | Opcode::Rect
                | Opcode::RoundedRect
                | Opcode::NewPath
                | Opcode::Fill
                | Opcode::EoFill
                | Opcode::Stroke
                | Opcode::Clip
                | Opcode::EoClip
        )
    }
}

/// One evaluated-per-frame argument of a statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Argument {
    /// A numeric literal, fixed at parse time.
    Literal(f64),
    /// A compiled expression, evaluated each time the statement runs.
    Expr(Expr),
    /// A read of a variable slot.
    Var(VarId),
    /// A colour literal as straight RGBA bytes.
    Color([u8; 4]),
    /// A colour read from a user variable holding `0xRRGGBBAA`.
    ColorVar(VarId),
    /// An enumerated constant (line caps, line joins).
    Constant(i32),
    /// A procedure slot.
    Proc(ProcId),
    /// An owned `{ … }` block.
    SubProgram(Box<Program>),
    /// A raw identifier: metadata key or print label.
    Key(String),
}

/// One instruction plus its arguments. Immutable after parsing.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub opcode: Opcode,
    pub args: Vec<Argument>,
    /// Span of the instruction name, for diagnostics.
    pub span: Span,
}

/// An ordered sequence of statements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// A fully parsed script: the top-level program plus the name tables every
/// evaluation of it needs.
#[derive(Clone, Debug, PartialEq)]
pub struct Script {
    pub body: Program,
    /// Procedure names in first-reference order; [`ProcId`]s index here.
    pub procedures: Vec<String>,
    /// All `VAR_COUNT` variable names; unallocated user slots are empty.
    pub var_names: Vec<String>,
}

impl Script {
    /// Name of a variable slot, if allocated.
    pub fn var_name(&self, id: VarId) -> Option<&str> {
        self.var_names
            .get(id.0 as usize)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }
}
