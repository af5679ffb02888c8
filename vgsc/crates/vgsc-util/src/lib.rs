//! vgsc-util - Foundation types shared by every phase of the VGS pipeline.
//!
//! This crate holds the pieces the lexer, parser, and interpreter all agree
//! on: source spans, the error taxonomy, and the typed-index machinery used
//! for variable and procedure slots.

pub mod error;
pub mod idx;
pub mod span;

pub use error::{ParseError, ParseErrorKind, RuntimeError};
pub use idx::Idx;
pub use span::Span;

// Re-export the hash collections used across the workspace.
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
