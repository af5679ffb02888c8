//! Error taxonomy for the VGS pipeline.
//!
//! Parsing aborts at the first error: every [`ParseError`] carries a
//! [`ParseErrorKind`], the line/column where it was detected, and a
//! human-readable message that usually names the offending lexeme and what
//! was expected instead. Runtime errors are rare by design; most bad
//! conditions during evaluation are logged and skipped (see the interpreter
//! crate).

use std::fmt;

use thiserror::Error;

use crate::span::Span;

/// What went wrong while parsing a script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A `(` with no matching `)`, or a stray `)`.
    UnmatchedParen,
    /// A `{`/`}` imbalance at the program level.
    UnmatchedBrace,
    /// Input ended in the middle of a statement or sub-program.
    UnexpectedEnd,
    /// A word in statement position that names no instruction.
    UnknownInstruction,
    /// A literal token that does not parse as a number.
    InvalidNumber,
    /// A numeric slot received something that is not a number, expression,
    /// or known variable name.
    ExpectedNumeric,
    /// A colour slot received something that is not a colour literal or a
    /// user variable name.
    ExpectedColor,
    /// An identifier slot received a non-word token.
    ExpectedIdentifier,
    /// An identifier with illegal characters.
    InvalidIdentifier,
    /// An attempt to use a reserved variable name as a user variable.
    ReservedVariableName,
    /// All user-variable slots are already allocated.
    TooManyUserVariables,
    /// A keyword slot received a word outside its fixed set.
    InvalidConstant,
    /// The text inside `( … )` is not a valid expression.
    ExpressionParseFailed,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseErrorKind::UnmatchedParen => "unmatched parenthesis",
            ParseErrorKind::UnmatchedBrace => "unmatched brace",
            ParseErrorKind::UnexpectedEnd => "unexpected end of script",
            ParseErrorKind::UnknownInstruction => "unknown instruction",
            ParseErrorKind::InvalidNumber => "invalid number",
            ParseErrorKind::ExpectedNumeric => "expected a numeric argument",
            ParseErrorKind::ExpectedColor => "expected a color",
            ParseErrorKind::ExpectedIdentifier => "expected an identifier",
            ParseErrorKind::InvalidIdentifier => "invalid identifier",
            ParseErrorKind::ReservedVariableName => "reserved variable name",
            ParseErrorKind::TooManyUserVariables => "too many user variables",
            ParseErrorKind::InvalidConstant => "invalid constant",
            ParseErrorKind::ExpressionParseFailed => "invalid expression",
        };
        f.write_str(name)
    }
}

/// A parse failure with its source location.
///
/// # Example
///
/// ```
/// use vgsc_util::{ParseError, ParseErrorKind, Span};
///
/// let err = ParseError::new(
///     ParseErrorKind::UnknownInstruction,
///     Span::new(0, 4, 1, 1),
///     "'spam' is not an instruction",
/// );
/// assert_eq!(err.line(), 1);
/// assert_eq!(err.kind(), ParseErrorKind::UnknownInstruction);
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind} at {}:{}: {message}", .span.line, .span.column)]
pub struct ParseError {
    kind: ParseErrorKind,
    span: Span,
    message: String,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// The error category.
    #[inline]
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// The source span where the error was detected.
    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Line of the error (1-based).
    #[inline]
    pub fn line(&self) -> u32 {
        self.span.line
    }

    /// Column of the error (1-based).
    #[inline]
    pub fn column(&self) -> u32 {
        self.span.column
    }

    /// The detail message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An error raised while evaluating a frame.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    /// A statement carried more arguments than the evaluator's buffer
    /// holds. Parsing bounds every grammar, so this indicates a parser bug.
    #[error("statement has more than {limit} arguments")]
    TooManyArguments { limit: usize },

    /// The drawing back-end could not be set up or failed fatally.
    #[error("backend failure: {0}")]
    BackendFailure(String),
}
