//! Canonical printing.
//!
//! [`Script::canonical`] renders a parsed script back to source: canonical
//! instruction names, one top-level statement per line, sub-programs inline
//! in braces, expressions fully parenthesised. Re-parsing the output yields
//! an instruction tree equal to the original, which the round-trip tests
//! rely on.

use std::fmt::Write;

use crate::ast::{Argument, Opcode, Program, Script, Statement};
use crate::expr::Expr;
use crate::table;

impl Script {
    /// Renders the canonical form of the whole script.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        for (index, statement) in self.body.statements.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            self.write_statement(&mut out, statement);
        }
        out
    }

    fn write_statement(&self, out: &mut String, statement: &Statement) {
        out.push_str(statement.opcode.name());
        for arg in &statement.args {
            out.push(' ');
            self.write_arg(out, statement.opcode, arg);
        }
    }

    fn write_program(&self, out: &mut String, program: &Program) {
        out.push('{');
        for statement in &program.statements {
            out.push(' ');
            self.write_statement(out, statement);
        }
        out.push_str(" }");
    }

    fn write_arg(&self, out: &mut String, opcode: Opcode, arg: &Argument) {
        match arg {
            Argument::Literal(value) => {
                let _ = write!(out, "{value}");
            }
            Argument::Expr(expr) => {
                out.push('(');
                write_expr(out, expr, &self.var_names, true);
                out.push(')');
            }
            Argument::Var(id) | Argument::ColorVar(id) => {
                out.push_str(self.var_name(*id).unwrap_or("?"));
            }
            Argument::Color([r, g, b, a]) => {
                let _ = write!(out, "#{r:02x}{g:02x}{b:02x}{a:02x}");
            }
            Argument::Constant(value) => {
                let keyword = table::const_set(opcode)
                    .and_then(|set| set.iter().find(|(_, v)| v == value))
                    .map(|(name, _)| *name)
                    .unwrap_or("?");
                out.push_str(keyword);
            }
            Argument::Proc(id) => {
                out.push_str(self.procedures.get(id.0 as usize).map_or("?", |s| s.as_str()));
            }
            Argument::SubProgram(program) => self.write_program(out, program),
            Argument::Key(key) => out.push_str(key),
        }
    }
}

/// Writes an expression; compound sub-expressions are parenthesised so the
/// output re-parses to the identical tree.
fn write_expr(out: &mut String, expr: &Expr, names: &[String], top: bool) {
    let compound = matches!(expr, Expr::Binary(..) | Expr::Neg(_));
    if compound && !top {
        out.push('(');
    }
    match expr {
        Expr::Number(value) => {
            let _ = write!(out, "{value}");
        }
        Expr::Var(id) => out.push_str(&names[id.0 as usize]),
        Expr::Neg(inner) => {
            out.push('-');
            write_expr(out, inner, names, false);
        }
        Expr::Binary(op, lhs, rhs) => {
            write_expr(out, lhs, names, false);
            out.push_str(op.symbol());
            write_expr(out, rhs, names, false);
        }
        Expr::Call(func, args) => {
            out.push_str(func.name());
            out.push('(');
            for (index, arg) in args.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_expr(out, arg, names, true);
            }
            out.push(')');
        }
    }
    if compound && !top {
        out.push(')');
    }
}
