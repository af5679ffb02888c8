//! `vgst check` - parse a script and report the outcome.

use std::path::PathBuf;

use clap::Args;

use crate::commands::load_script;
use crate::error::Result;

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Script file to check.
    pub script: PathBuf,
}

/// Parses the script; a parse error propagates with its line/column and
/// fails the process.
pub fn run_check(args: &CheckArgs) -> Result<()> {
    let script = load_script(&args.script)?;

    let statements = count_statements(&script.body);
    println!(
        "{}: ok ({statements} statements, {} procedures, {} user variables)",
        args.script.display(),
        script.procedures.len(),
        script
            .var_names
            .iter()
            .skip(vgsc_par::FIXED_VARS)
            .filter(|name| !name.is_empty())
            .count(),
    );
    Ok(())
}

/// Statements in a program, sub-programs included.
fn count_statements(program: &vgsc_par::Program) -> usize {
    let mut count = 0;
    for statement in &program.statements {
        count += 1;
        for argument in &statement.args {
            if let vgsc_par::Argument::SubProgram(inner) = argument {
                count += count_statements(inner);
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_statements_recurses() {
        let script = vgsc_par::parse("M 0 0 repeat 2 { l 1 1 if 1 { stroke } }").unwrap();
        assert_eq!(count_statements(&script.body), 4);
    }
}
