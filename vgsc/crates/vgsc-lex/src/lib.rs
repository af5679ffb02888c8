//! vgsc-lex - Tokenizer for VGS scripts.
//!
//! VGS has an unusually small token alphabet: bare words, numeric-looking
//! literals, whole parenthesised expressions (kept as opaque slices for the
//! expression compiler), braces delimiting sub-programs, and end of input.
//! Whitespace and commas separate tokens; `//` starts a line comment.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{Token, TokenKind};
