//! vgsc-par - Statement parser for VGS scripts.
//!
//! The parser drives the lexer according to the parameter grammar declared
//! in the instruction table: it identifies each instruction by binary
//! search, reads the arguments its slot list asks for, and emits typed
//! [`Statement`]s into an owned [`Program`] tree. Parenthesised expressions
//! are compiled here, once, against the variable-name table; `{ … }`
//! blocks recurse.
//!
//! Parsing is all-or-nothing: the first error aborts with a
//! [`ParseError`] carrying line/column and a message naming what was found
//! and what was expected.

pub mod ast;
pub mod color;
pub mod expr;
mod print;
pub mod table;

use indexmap::IndexMap;
use vgsc_lex::{Lexer, Token, TokenKind};
use vgsc_util::{Idx, ParseError, ParseErrorKind, Span};

pub use ast::{
    Argument, Opcode, ProcId, Program, Script, Statement, VarId, FIXED_NAMES, FIXED_VARS,
    USER_VARS, VAR_COUNT, VAR_CX, VAR_CY, VAR_DURATION, VAR_H, VAR_I, VAR_N, VAR_T, VAR_U0, VAR_W,
};
pub use expr::{Expr, HostContext, NullHost};
pub use table::{Instruction, Slot};

/// Parses a whole script.
///
/// # Example
///
/// ```
/// let script = vgsc_par::parse("M 10 20 l 5 5 stroke").unwrap();
/// assert_eq!(script.body.statements.len(), 3);
/// ```
pub fn parse(source: &str) -> Result<Script, ParseError> {
    let mut parser = Parser::new(source);
    let body = parser.parse_program(true)?;
    Ok(Script {
        body,
        procedures: parser.procedures.into_keys().collect(),
        var_names: parser.var_names,
    })
}

struct Parser<'src> {
    lexer: Lexer<'src>,

    /// Procedure names in first-reference order; the position is the
    /// [`ProcId`], so forward references work.
    procedures: IndexMap<String, ProcId>,

    /// All `VAR_COUNT` variable names. Fixed names are pre-filled;
    /// a user slot is allocated by giving it a non-empty name.
    var_names: Vec<String>,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str) -> Self {
        let mut var_names: Vec<String> = FIXED_NAMES.iter().map(|s| s.to_string()).collect();
        var_names.resize(VAR_COUNT, String::new());
        Self {
            lexer: Lexer::new(source),
            procedures: IndexMap::new(),
            var_names,
        }
    }

    /// Parses statements up to `End` (top level) or a closing `}`
    /// (sub-program).
    fn parse_program(&mut self, top_level: bool) -> Result<Program, ParseError> {
        let mut statements = Vec::new();

        loop {
            let token = self.lexer.next_token()?;
            match token.kind {
                TokenKind::End if top_level => break,
                TokenKind::End => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedEnd,
                        token.span,
                        "expected '}' before end of script",
                    ));
                }
                TokenKind::RightBrace if !top_level => break,
                TokenKind::RightBrace => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnmatchedBrace,
                        token.span,
                        "'}' without a matching '{'",
                    ));
                }
                TokenKind::Word => {
                    let instruction = table::lookup(token.lexeme).ok_or_else(|| {
                        ParseError::new(
                            ParseErrorKind::UnknownInstruction,
                            token.span,
                            format!("'{}' is not an instruction", token.lexeme),
                        )
                    })?;
                    self.parse_statement(instruction, token.span, &mut statements)?;
                }
                _ => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnknownInstruction,
                        token.span,
                        format!("expected an instruction name, found '{}'", token.lexeme),
                    ));
                }
            }
        }

        Ok(Program { statements })
    }

    /// Emits one statement for `instruction`, or several when its grammar
    /// ends in `MAY_REPEAT` and more numeric input follows.
    fn parse_statement(
        &mut self,
        instruction: &'static Instruction,
        span: Span,
        out: &mut Vec<Statement>,
    ) -> Result<(), ParseError> {
        loop {
            let mut args = Vec::new();
            let mut may_repeat = false;

            for &slot in instruction.slots {
                match slot {
                    Slot::MayRepeat => may_repeat = true,
                    Slot::Num => args.push(self.parse_numeric()?),
                    Slot::Variadic => {
                        while self.lexer.peek_token()?.is_numeric_start() {
                            args.push(self.parse_numeric()?);
                        }
                    }
                    Slot::Var => {
                        let id = self.parse_variable(instruction.name)?;
                        args.push(Argument::Var(id));
                    }
                    Slot::Const(set) => args.push(self.parse_constant(set)?),
                    Slot::Color => args.push(self.parse_color()?),
                    Slot::Sub => {
                        let block = self.parse_block(instruction.name)?;
                        args.push(Argument::SubProgram(Box::new(block)));
                    }
                    Slot::Ident => {
                        let token = self.slot_token("an identifier")?;
                        args.push(Argument::Key(self.identifier(token)?.to_string()));
                    }
                    Slot::Proc => {
                        let token = self.slot_token("a procedure name")?;
                        let name = self.identifier(token)?;
                        let next = ProcId::from_usize(self.procedures.len());
                        let id = *self.procedures.entry(name.to_string()).or_insert(next);
                        args.push(Argument::Proc(id));
                    }
                }
            }

            out.push(Statement {
                opcode: instruction.opcode,
                args,
                span,
            });

            if !(may_repeat && self.lexer.peek_token()?.is_numeric_start()) {
                return Ok(());
            }
        }
    }

    /// Fetches the next token for a slot, rejecting end-of-input.
    fn slot_token(&mut self, expected: &str) -> Result<Token<'src>, ParseError> {
        let token = self.lexer.next_token()?;
        if token.kind == TokenKind::End {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedEnd,
                token.span,
                format!("expected {expected}, found end of script"),
            ));
        }
        Ok(token)
    }

    /// Parses a numeric slot: literal, expression, or variable name.
    fn parse_numeric(&mut self) -> Result<Argument, ParseError> {
        let token = self.slot_token("a number")?;
        match token.kind {
            TokenKind::Literal => token.lexeme.parse::<f64>().map(Argument::Literal).map_err(
                |_| {
                    ParseError::new(
                        ParseErrorKind::InvalidNumber,
                        token.span,
                        format!("'{}' is not a number", token.lexeme),
                    )
                },
            ),
            TokenKind::Expression => {
                let compiled = expr::compile(token.expression_body(), &self.var_names, token.span)?;
                Ok(Argument::Expr(compiled))
            }
            TokenKind::Word => self
                .var_names
                .iter()
                .position(|name| !name.is_empty() && name == token.lexeme)
                .map(|slot| Argument::Var(VarId::from_usize(slot)))
                .ok_or_else(|| {
                    ParseError::new(
                        ParseErrorKind::ExpectedNumeric,
                        token.span,
                        format!(
                            "'{}' is not a number, expression, or known variable",
                            token.lexeme
                        ),
                    )
                }),
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedNumeric,
                token.span,
                format!("expected a number, found '{}'", token.lexeme),
            )),
        }
    }

    /// Parses a `V` slot: a user variable, allocating its slot on first use.
    fn parse_variable(&mut self, instruction: &str) -> Result<VarId, ParseError> {
        let token = self.slot_token("a variable name")?;
        let name = self.identifier(token)?;

        if ast::is_reserved_name(name) {
            return Err(ParseError::new(
                ParseErrorKind::ReservedVariableName,
                token.span,
                format!("'{name}' is reserved and cannot be assigned by '{instruction}'"),
            ));
        }

        if let Some(slot) = self.var_names.iter().position(|n| n == name) {
            return Ok(VarId::from_usize(slot));
        }

        match self.var_names[FIXED_VARS..].iter().position(|n| n.is_empty()) {
            Some(free) => {
                let slot = FIXED_VARS + free;
                self.var_names[slot] = name.to_string();
                Ok(VarId::from_usize(slot))
            }
            None => Err(ParseError::new(
                ParseErrorKind::TooManyUserVariables,
                token.span,
                format!("no free slot for '{name}': all {USER_VARS} user variables are in use"),
            )),
        }
    }

    /// Parses a keyword from a fixed constant set.
    fn parse_constant(
        &mut self,
        set: &'static [(&'static str, i32)],
    ) -> Result<Argument, ParseError> {
        let expected = || {
            set.iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(" ")
        };

        let token = self.slot_token("a keyword")?;
        if token.kind != TokenKind::Word {
            return Err(ParseError::new(
                ParseErrorKind::InvalidConstant,
                token.span,
                format!("expected one of: {}, found '{}'", expected(), token.lexeme),
            ));
        }

        set.iter()
            .find(|(name, _)| *name == token.lexeme)
            .map(|(_, value)| Argument::Constant(*value))
            .ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::InvalidConstant,
                    token.span,
                    format!("'{}' is not one of: {}", token.lexeme, expected()),
                )
            })
    }

    /// Parses a `COLOR` slot: keyword, hex, `rgba(…)`, or a colour-valued
    /// user variable. A colour keyword wins over a user variable of the
    /// same name. Keyword and hex forms take an optional `@alpha` suffix
    /// (`red@0.2`, `#336699@0.5`) scaling the alpha channel.
    fn parse_color(&mut self) -> Result<Argument, ParseError> {
        let token = self.slot_token("a color")?;
        if token.kind != TokenKind::Word {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedColor,
                token.span,
                format!("expected a color, found '{}'", token.lexeme),
            ));
        }

        if token.lexeme == "rgba" {
            let args = self.slot_token("rgba arguments")?;
            if args.kind != TokenKind::Expression {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedColor,
                    args.span,
                    "expected '(r,g,b,a)' after 'rgba'",
                ));
            }
            return color::parse_rgba_args(args.expression_body())
                .map(Argument::Color)
                .ok_or_else(|| {
                    ParseError::new(
                        ParseErrorKind::ExpectedColor,
                        args.span,
                        format!("'rgba{}' is not a valid color", args.lexeme),
                    )
                });
        }

        if let Some((base, raw_alpha)) = token.lexeme.split_once('@') {
            let rgba = color::parse(base).ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::ExpectedColor,
                    token.span,
                    format!("'{base}' is not a color"),
                )
            })?;
            let alpha = raw_alpha.parse::<f64>().map_err(|_| {
                ParseError::new(
                    ParseErrorKind::ExpectedColor,
                    token.span,
                    format!("'{raw_alpha}' is not an alpha value"),
                )
            })?;
            return Ok(Argument::Color(color::with_alpha(rgba, alpha)));
        }

        if let Some(rgba) = color::parse(token.lexeme) {
            return Ok(Argument::Color(rgba));
        }

        // A user variable holding a packed 0xRRGGBBAA value.
        if let Some(slot) = self.var_names[FIXED_VARS..]
            .iter()
            .position(|name| !name.is_empty() && name == token.lexeme)
        {
            return Ok(Argument::ColorVar(VarId::from_usize(FIXED_VARS + slot)));
        }

        Err(ParseError::new(
            ParseErrorKind::ExpectedColor,
            token.span,
            format!("'{}' is not a color or user variable", token.lexeme),
        ))
    }

    /// Parses a `{ … }` sub-program.
    fn parse_block(&mut self, instruction: &str) -> Result<Program, ParseError> {
        let token = self.slot_token("'{'")?;
        if token.kind != TokenKind::LeftBrace {
            return Err(ParseError::new(
                ParseErrorKind::UnmatchedBrace,
                token.span,
                format!("expected '{{' after '{instruction}', found '{}'", token.lexeme),
            ));
        }
        self.parse_program(false)
    }

    /// Validates a word token as an identifier.
    fn identifier(&self, token: Token<'src>) -> Result<&'src str, ParseError> {
        if token.kind != TokenKind::Word {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedIdentifier,
                token.span,
                format!("expected an identifier, found '{}'", token.lexeme),
            ));
        }
        if !ast::is_valid_identifier(token.lexeme) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidIdentifier,
                token.span,
                format!("'{}' is not a legal identifier", token.lexeme),
            ));
        }
        Ok(token.lexeme)
    }
}

#[cfg(test)]
mod tests;
