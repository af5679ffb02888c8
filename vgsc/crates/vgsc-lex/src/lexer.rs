//! The VGS scanner.
//!
//! Separators are space, TAB, CR, LF, and comma; runs of them are skipped
//! silently, so `M 10,20` and `M 10 20` tokenize identically. A `//`
//! outside an expression starts a comment that runs to the end of the line.
//!
//! Parenthesised expressions are returned as single opaque tokens spanning
//! from the `(` to its matching `)`; nesting is honoured and an unmatched
//! `(` is a hard error.

use vgsc_util::{ParseError, ParseErrorKind, Span};

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Characters that end any token run.
#[inline]
fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | ',')
}

/// Characters that delimit token runs without being separators.
#[inline]
fn is_bracket(c: char) -> bool {
    matches!(c, '(' | ')' | '{' | '}')
}

/// Characters that open a [`TokenKind::Literal`] run.
#[inline]
fn is_literal_start(c: char) -> bool {
    matches!(c, '+' | '-' | '.') || c.is_ascii_digit()
}

/// The scanner. Produces one [`Token`] per call; positions advance on
/// [`Lexer::next_token`] and stay put on [`Lexer::peek_token`].
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer over `source`.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Scans and consumes the next token.
    pub fn next_token(&mut self) -> Result<Token<'src>, ParseError> {
        self.skip_separators_and_comments();

        let start = self.cursor.position();
        let line = self.cursor.line();
        let column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Ok(Token {
                kind: TokenKind::End,
                lexeme: "",
                span: Span::point(start, line, column),
            });
        }

        let kind = match self.cursor.current_char() {
            '{' => {
                self.cursor.advance();
                TokenKind::LeftBrace
            }
            '}' => {
                self.cursor.advance();
                TokenKind::RightBrace
            }
            '(' => {
                self.scan_expression(line, column)?;
                TokenKind::Expression
            }
            ')' => {
                return Err(ParseError::new(
                    ParseErrorKind::UnmatchedParen,
                    Span::new(start, start + 1, line, column),
                    "')' without a matching '('",
                ));
            }
            c if is_literal_start(c) => {
                self.scan_run();
                TokenKind::Literal
            }
            _ => {
                self.scan_run();
                TokenKind::Word
            }
        };

        Ok(Token {
            kind,
            lexeme: self.cursor.slice_from(start),
            span: Span::new(start, self.cursor.position(), line, column),
        })
    }

    /// Scans the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<Token<'src>, ParseError> {
        let saved = self.cursor.snapshot();
        let token = self.next_token();
        self.cursor.restore(saved);
        token
    }

    /// Current line number, for diagnostics.
    pub fn line(&self) -> u32 {
        self.cursor.line()
    }

    /// Current column number, for diagnostics.
    pub fn column(&self) -> u32 {
        self.cursor.column()
    }

    /// Consumes a maximal run of non-separator, non-bracket characters.
    fn scan_run(&mut self) {
        while !self.cursor.is_at_end() {
            let c = self.cursor.current_char();
            if is_separator(c) || is_bracket(c) {
                break;
            }
            self.cursor.advance();
        }
    }

    /// Consumes a balanced `( … )` group. The opening parenthesis is at the
    /// cursor on entry; `line`/`column` locate it for error reporting.
    fn scan_expression(&mut self, line: u32, column: u32) -> Result<(), ParseError> {
        let open = self.cursor.position();
        self.cursor.advance(); // consume '('
        let mut depth = 1usize;

        while depth > 0 {
            if self.cursor.is_at_end() {
                return Err(ParseError::new(
                    ParseErrorKind::UnmatchedParen,
                    Span::new(open, self.cursor.position(), line, column),
                    "'(' without a matching ')'",
                ));
            }
            match self.cursor.current_char() {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            self.cursor.advance();
        }
        Ok(())
    }

    /// Skips separator runs and `//` line comments.
    fn skip_separators_and_comments(&mut self) {
        loop {
            while !self.cursor.is_at_end() && is_separator(self.cursor.current_char()) {
                self.cursor.advance();
            }

            if self.cursor.current_char() == '/' && self.cursor.peek_char(1) == '/' {
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                    self.cursor.advance();
                }
                continue;
            }

            break;
        }
    }
}
