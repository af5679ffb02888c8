//! The numeric expression sub-language.
//!
//! Everything between `(` and `)` in a script is an infix expression over
//! `f64`: literals, the named variables of the current variable table, the
//! operators `+ - * / % ^` (with `^` binding tightest and associating to
//! the right), parentheses, and a fixed set of functions. Expressions are
//! compiled once, at script parse time, into an owned [`Expr`] tree bound
//! to variable slots; evaluation needs only the variable-value array and a
//! [`HostContext`] for the host callbacks.
//!
//! Comparisons are functions rather than operators (`lt(a,b)`, `eq(a,b)`,
//! `if(c,a,b)`), which keeps the operator grammar to the arithmetic core.
//! Non-finite values propagate; nothing in here traps.

use vgsc_util::{ParseError, ParseErrorKind, Span};

use crate::ast::VarId;

/// Binding powers for the Pratt loop. Higher binds tighter.
mod bp {
    /// Start of expression.
    pub const MIN: u8 = 0;

    /// Additive: `+`, `-`.
    pub const ADDITIVE: u8 = 10;

    /// Multiplicative: `*`, `/`, `%`.
    pub const MULTIPLICATIVE: u8 = 20;

    /// Unary `-`/`+`: looser than `^`, tighter than `*`, so `-x^2` is
    /// `-(x^2)` but `-x*y` is `(-x)*y`.
    pub const PREFIX: u8 = 25;

    /// Power: `^`, right-associative.
    pub const POW: u8 = 30;
}

/// A compiled expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A numeric literal.
    Number(f64),
    /// A variable load.
    Var(VarId),
    /// Unary negation.
    Neg(Box<Expr>),
    /// A binary operation.
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// A function call with parse-time-checked arity.
    Call(Func, Vec<Expr>),
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl BinOp {
    /// The operator's source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Pow => "^",
        }
    }
}

/// Functions callable from expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Func {
    // Math library, evaluated in place.
    Sin,
    Cos,
    Tan,
    Atan,
    Atan2,
    Sqrt,
    Hypot,
    Abs,
    Floor,
    Ceil,
    Round,
    Trunc,
    Exp,
    Log,
    Min,
    Max,
    Mod,
    Sgn,
    If,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,

    // Host callbacks, routed through [`HostContext`].
    GetVar,
    PathLen,
    RandomG,
    Peek,
    Pop,
}

impl Func {
    /// Resolves a function name.
    pub fn from_name(name: &str) -> Option<Func> {
        Some(match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "atan" => Func::Atan,
            "atan2" => Func::Atan2,
            "sqrt" => Func::Sqrt,
            "hypot" => Func::Hypot,
            "abs" => Func::Abs,
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "round" => Func::Round,
            "trunc" => Func::Trunc,
            "exp" => Func::Exp,
            "log" => Func::Log,
            "min" => Func::Min,
            "max" => Func::Max,
            "mod" => Func::Mod,
            "sgn" => Func::Sgn,
            "if" => Func::If,
            "lt" => Func::Lt,
            "lte" => Func::Lte,
            "gt" => Func::Gt,
            "gte" => Func::Gte,
            "eq" => Func::Eq,
            "getvar" => Func::GetVar,
            "pathlen" => Func::PathLen,
            "randomg" => Func::RandomG,
            "peek" => Func::Peek,
            "pop" => Func::Pop,
            _ => return None,
        })
    }

    /// The function's source spelling.
    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Atan => "atan",
            Func::Atan2 => "atan2",
            Func::Sqrt => "sqrt",
            Func::Hypot => "hypot",
            Func::Abs => "abs",
            Func::Floor => "floor",
            Func::Ceil => "ceil",
            Func::Round => "round",
            Func::Trunc => "trunc",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Min => "min",
            Func::Max => "max",
            Func::Mod => "mod",
            Func::Sgn => "sgn",
            Func::If => "if",
            Func::Lt => "lt",
            Func::Lte => "lte",
            Func::Gt => "gt",
            Func::Gte => "gte",
            Func::Eq => "eq",
            Func::GetVar => "getvar",
            Func::PathLen => "pathlen",
            Func::RandomG => "randomg",
            Func::Peek => "peek",
            Func::Pop => "pop",
        }
    }

    /// Number of arguments the function takes.
    pub fn arity(self) -> usize {
        match self {
            Func::If => 3,
            Func::Atan2
            | Func::Hypot
            | Func::Min
            | Func::Max
            | Func::Mod
            | Func::Lt
            | Func::Lte
            | Func::Gt
            | Func::Gte
            | Func::Eq => 2,
            _ => 1,
        }
    }
}

/// Host services reachable from inside expressions.
///
/// The interpreter implements this over its per-frame state and the drawing
/// back-end; tests that do not care use [`NullHost`].
pub trait HostContext {
    /// User variable `i` of the current evaluation, NaN when out of range.
    fn getvar(&mut self, index: f64) -> f64;

    /// Length of the current path as a flattened polyline; `limit > 0`
    /// stops after that many segments.
    fn pathlen(&mut self, limit: f64) -> f64;

    /// Next output of the seeded PRNG slot, in `[0, 1]`.
    fn randomg(&mut self, seed: f64) -> f64;

    /// Reads the newest value-stack entry with the given key, NaN if absent.
    fn peek(&mut self, key: f64) -> f64;

    /// Like `peek`, but removes the entry.
    fn pop(&mut self, key: f64) -> f64;
}

/// A [`HostContext`] with no state: every callback answers NaN.
pub struct NullHost;

impl HostContext for NullHost {
    fn getvar(&mut self, _index: f64) -> f64 {
        f64::NAN
    }

    fn pathlen(&mut self, _limit: f64) -> f64 {
        f64::NAN
    }

    fn randomg(&mut self, _seed: f64) -> f64 {
        f64::NAN
    }

    fn peek(&mut self, _key: f64) -> f64 {
        f64::NAN
    }

    fn pop(&mut self, _key: f64) -> f64 {
        f64::NAN
    }
}

impl Expr {
    /// Evaluates the expression against a variable-value array and a host.
    pub fn eval(&self, vars: &[f64], host: &mut dyn HostContext) -> f64 {
        match self {
            Expr::Number(value) => *value,
            Expr::Var(id) => vars[id.0 as usize],
            Expr::Neg(inner) => -inner.eval(vars, host),
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval(vars, host);
                let b = rhs.eval(vars, host);
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Rem => a % b,
                    BinOp::Pow => a.powf(b),
                }
            }
            Expr::Call(func, args) => eval_call(*func, args, vars, host),
        }
    }
}

fn eval_call(func: Func, args: &[Expr], vars: &[f64], host: &mut dyn HostContext) -> f64 {
    // `if` chooses which branch to evaluate, so host callbacks in the
    // untaken branch never run.
    if func == Func::If {
        let cond = args[0].eval(vars, host);
        let taken = if cond != 0.0 { &args[1] } else { &args[2] };
        return taken.eval(vars, host);
    }

    let a = args[0].eval(vars, host);
    let b = if args.len() > 1 {
        args[1].eval(vars, host)
    } else {
        0.0
    };

    match func {
        Func::Sin => a.sin(),
        Func::Cos => a.cos(),
        Func::Tan => a.tan(),
        Func::Atan => a.atan(),
        Func::Atan2 => a.atan2(b),
        Func::Sqrt => a.sqrt(),
        Func::Hypot => a.hypot(b),
        Func::Abs => a.abs(),
        Func::Floor => a.floor(),
        Func::Ceil => a.ceil(),
        Func::Round => a.round(),
        Func::Trunc => a.trunc(),
        Func::Exp => a.exp(),
        Func::Log => a.ln(),
        Func::Min => a.min(b),
        Func::Max => a.max(b),
        Func::Mod => a % b,
        Func::Sgn => {
            if a > 0.0 {
                1.0
            } else if a < 0.0 {
                -1.0
            } else {
                0.0
            }
        }
        Func::Lt => f64::from(a < b),
        Func::Lte => f64::from(a <= b),
        Func::Gt => f64::from(a > b),
        Func::Gte => f64::from(a >= b),
        Func::Eq => f64::from(a == b),
        Func::GetVar => host.getvar(a),
        Func::PathLen => host.pathlen(a),
        Func::RandomG => host.randomg(a),
        Func::Peek => host.peek(a),
        Func::Pop => host.pop(a),
        Func::If => unreachable!("handled above"),
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compiles the text between the parentheses of an expression token.
///
/// `names` is the full variable-name table (unallocated user slots are
/// empty strings and never match). `span` locates the expression token for
/// error reporting; every failure comes back as
/// [`ParseErrorKind::ExpressionParseFailed`] with a detail message.
pub fn compile(body: &str, names: &[String], span: Span) -> Result<Expr, ParseError> {
    let tokens = tokenize(body, span)?;
    let mut parser = ExprParser {
        tokens,
        position: 0,
        names,
        span,
    };
    let expr = parser.parse_expr(bp::MIN)?;
    match parser.peek() {
        ExprToken::End => Ok(expr),
        other => Err(parser.error(format!("unexpected '{}' after expression", other))),
    }
}

#[derive(Clone, Debug, PartialEq)]
enum ExprToken {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
    End,
}

impl std::fmt::Display for ExprToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprToken::Number(v) => write!(f, "{v}"),
            ExprToken::Ident(name) => f.write_str(name),
            ExprToken::Plus => f.write_str("+"),
            ExprToken::Minus => f.write_str("-"),
            ExprToken::Star => f.write_str("*"),
            ExprToken::Slash => f.write_str("/"),
            ExprToken::Percent => f.write_str("%"),
            ExprToken::Caret => f.write_str("^"),
            ExprToken::LParen => f.write_str("("),
            ExprToken::RParen => f.write_str(")"),
            ExprToken::Comma => f.write_str(","),
            ExprToken::End => f.write_str("end of expression"),
        }
    }
}

fn tokenize(body: &str, span: Span) -> Result<Vec<ExprToken>, ParseError> {
    let bytes = body.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '+' => {
                tokens.push(ExprToken::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(ExprToken::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(ExprToken::Star);
                i += 1;
            }
            '/' => {
                tokens.push(ExprToken::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(ExprToken::Percent);
                i += 1;
            }
            '^' => {
                tokens.push(ExprToken::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(ExprToken::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(ExprToken::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(ExprToken::Comma);
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                // Optional exponent.
                if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                    let mut j = i + 1;
                    if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                        j += 1;
                    }
                    if j < bytes.len() && bytes[j].is_ascii_digit() {
                        i = j;
                        while i < bytes.len() && bytes[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text = &body[start..i];
                let value = text.parse::<f64>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::ExpressionParseFailed,
                        span,
                        format!("'{text}' is not a number"),
                    )
                })?;
                tokens.push(ExprToken::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                tokens.push(ExprToken::Ident(body[start..i].to_string()));
            }
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::ExpressionParseFailed,
                    span,
                    format!("unexpected character '{other}' in expression"),
                ));
            }
        }
    }

    tokens.push(ExprToken::End);
    Ok(tokens)
}

struct ExprParser<'a> {
    tokens: Vec<ExprToken>,
    position: usize,
    names: &'a [String],
    span: Span,
}

impl ExprParser<'_> {
    fn peek(&self) -> &ExprToken {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> ExprToken {
        let token = self.tokens[self.position.min(self.tokens.len() - 1)].clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(ParseErrorKind::ExpressionParseFailed, self.span, message)
    }

    fn expect(&mut self, expected: ExprToken) -> Result<(), ParseError> {
        let token = self.bump();
        if token == expected {
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}', found '{token}'")))
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let (op, lbp, rbp) = match self.peek() {
                ExprToken::Plus => (BinOp::Add, bp::ADDITIVE, bp::ADDITIVE + 1),
                ExprToken::Minus => (BinOp::Sub, bp::ADDITIVE, bp::ADDITIVE + 1),
                ExprToken::Star => (BinOp::Mul, bp::MULTIPLICATIVE, bp::MULTIPLICATIVE + 1),
                ExprToken::Slash => (BinOp::Div, bp::MULTIPLICATIVE, bp::MULTIPLICATIVE + 1),
                ExprToken::Percent => (BinOp::Rem, bp::MULTIPLICATIVE, bp::MULTIPLICATIVE + 1),
                // Right-associative: recurse at the same binding power.
                ExprToken::Caret => (BinOp::Pow, bp::POW, bp::POW),
                _ => break,
            };
            if lbp < min_bp {
                break;
            }
            self.bump();
            let rhs = self.parse_expr(rbp)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        match self.bump() {
            ExprToken::Number(value) => Ok(Expr::Number(value)),
            ExprToken::Minus => Ok(Expr::Neg(Box::new(self.parse_expr(bp::PREFIX)?))),
            ExprToken::Plus => self.parse_expr(bp::PREFIX),
            ExprToken::LParen => {
                let inner = self.parse_expr(bp::MIN)?;
                self.expect(ExprToken::RParen)?;
                Ok(inner)
            }
            ExprToken::Ident(name) => self.parse_ident(&name),
            other => Err(self.error(format!("expected a value, found '{other}'"))),
        }
    }

    fn parse_ident(&mut self, name: &str) -> Result<Expr, ParseError> {
        // Function call?
        if *self.peek() == ExprToken::LParen {
            let func = Func::from_name(name)
                .ok_or_else(|| self.error(format!("unknown function '{name}'")))?;
            self.bump();
            let mut args = Vec::new();
            if *self.peek() != ExprToken::RParen {
                loop {
                    args.push(self.parse_expr(bp::MIN)?);
                    if *self.peek() == ExprToken::Comma {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
            self.expect(ExprToken::RParen)?;
            if args.len() != func.arity() {
                return Err(self.error(format!(
                    "'{name}' takes {} argument(s), found {}",
                    func.arity(),
                    args.len()
                )));
            }
            return Ok(Expr::Call(func, args));
        }

        // Named constants.
        match name {
            "PI" => return Ok(Expr::Number(std::f64::consts::PI)),
            "E" => return Ok(Expr::Number(std::f64::consts::E)),
            "TAU" => return Ok(Expr::Number(std::f64::consts::TAU)),
            _ => {}
        }

        // Variable reference.
        self.names
            .iter()
            .position(|n| !n.is_empty() && n == name)
            .map(|slot| Expr::Var(VarId(slot as u32)))
            .ok_or_else(|| self.error(format!("unknown variable '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FIXED_NAMES, VAR_COUNT};

    fn names() -> Vec<String> {
        let mut names: Vec<String> = FIXED_NAMES.iter().map(|s| s.to_string()).collect();
        names.resize(VAR_COUNT, String::new());
        names[8] = "a".to_string();
        names
    }

    fn eval(body: &str) -> f64 {
        eval_with(body, &[0.0; VAR_COUNT])
    }

    fn eval_with(body: &str, vars: &[f64]) -> f64 {
        let expr = compile(body, &names(), Span::DUMMY).expect("compile failure");
        expr.eval(vars, &mut NullHost)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1+2*3"), 7.0);
        assert_eq!(eval("(1+2)*3"), 9.0);
        assert_eq!(eval("8-4-2"), 2.0);
        assert_eq!(eval("8/4/2"), 1.0);
        assert_eq!(eval("7%4"), 3.0);
    }

    #[test]
    fn test_pow_is_right_associative() {
        assert_eq!(eval("2^3^2"), 512.0);
        assert_eq!(eval("2*3^2"), 18.0);
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(eval("-3"), -3.0);
        assert_eq!(eval("-3+5"), 2.0);
        assert_eq!(eval("-2*3"), -6.0);
        // Like the source language of the formulas: -x^2 == -(x^2).
        assert_eq!(eval("-2^2"), -4.0);
        assert_eq!(eval("+4"), 4.0);
    }

    #[test]
    fn test_variables() {
        let mut vars = [0.0; VAR_COUNT];
        vars[2] = 640.0; // w
        vars[3] = 480.0; // h
        vars[8] = 2.5; // a
        assert_eq!(eval_with("w/2", &vars), 320.0);
        assert_eq!(eval_with("w-h", &vars), 160.0);
        assert_eq!(eval_with("a*2", &vars), 5.0);
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("min(3, 7)"), 3.0);
        assert_eq!(eval("max(3, 7)"), 7.0);
        assert_eq!(eval("abs(-2)"), 2.0);
        assert_eq!(eval("floor(2.9)"), 2.0);
        assert_eq!(eval("hypot(3, 4)"), 5.0);
        assert_eq!(eval("sgn(-9)"), -1.0);
        assert_eq!(eval("sgn(0)"), 0.0);
        assert!((eval("sin(PI)")).abs() < 1e-12);
        assert_eq!(eval("if(lt(1, 2), 10, 20)"), 10.0);
        assert_eq!(eval("if(0, 10, 20)"), 20.0);
    }

    #[test]
    fn test_constants() {
        assert_eq!(eval("TAU"), 2.0 * std::f64::consts::PI);
        assert!((eval("log(E)") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scientific_notation() {
        assert_eq!(eval("1e3"), 1000.0);
        assert_eq!(eval("2.5e-1"), 0.25);
        assert_eq!(eval(".5"), 0.5);
    }

    #[test]
    fn test_non_finite_propagation() {
        assert!(eval("1/0").is_infinite());
        assert!(eval("0/0").is_nan());
        assert!(eval("sqrt(-1)").is_nan());
    }

    #[test]
    fn test_host_functions_reach_the_host() {
        struct Fixed;
        impl HostContext for Fixed {
            fn getvar(&mut self, index: f64) -> f64 {
                index * 10.0
            }
            fn pathlen(&mut self, _limit: f64) -> f64 {
                42.0
            }
            fn randomg(&mut self, _seed: f64) -> f64 {
                0.5
            }
            fn peek(&mut self, key: f64) -> f64 {
                key + 1.0
            }
            fn pop(&mut self, key: f64) -> f64 {
                key + 2.0
            }
        }

        let vars = [0.0; VAR_COUNT];
        let expr = compile("getvar(3) + pathlen(0) + peek(1) + pop(1)", &names(), Span::DUMMY)
            .expect("compile failure");
        assert_eq!(expr.eval(&vars, &mut Fixed), 30.0 + 42.0 + 2.0 + 3.0);
    }

    #[test]
    fn test_if_is_lazy() {
        struct Counting(u32);
        impl HostContext for Counting {
            fn getvar(&mut self, _index: f64) -> f64 {
                self.0 += 1;
                1.0
            }
            fn pathlen(&mut self, _limit: f64) -> f64 {
                f64::NAN
            }
            fn randomg(&mut self, _seed: f64) -> f64 {
                f64::NAN
            }
            fn peek(&mut self, _key: f64) -> f64 {
                f64::NAN
            }
            fn pop(&mut self, _key: f64) -> f64 {
                f64::NAN
            }
        }

        let mut host = Counting(0);
        let expr = compile("if(1, 5, getvar(0))", &names(), Span::DUMMY).unwrap();
        assert_eq!(expr.eval(&[0.0; VAR_COUNT], &mut host), 5.0);
        assert_eq!(host.0, 0);
    }

    #[test]
    fn test_errors() {
        let errs = [
            "1 +",
            "* 2",
            "foo",
            "spam(1)",
            "min(1)",
            "min(1, 2, 3)",
            "1 2",
            "(1",
            "$",
            "1..2",
        ];
        for body in errs {
            let err = compile(body, &names(), Span::DUMMY).unwrap_err();
            assert_eq!(
                err.kind(),
                ParseErrorKind::ExpressionParseFailed,
                "for {body:?}"
            );
        }
    }

    #[test]
    fn test_unallocated_user_slots_do_not_match() {
        let err = compile("u9", &names(), Span::DUMMY).unwrap_err();
        assert!(err.message().contains("unknown variable"));
    }
}
