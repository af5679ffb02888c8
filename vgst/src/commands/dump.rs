//! `vgst dump` - print a script's canonical form.

use std::path::PathBuf;

use clap::Args;

use crate::commands::load_script;
use crate::error::Result;

/// Arguments for the `dump` subcommand.
#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Script file to dump.
    pub script: PathBuf,
}

/// Parses the script and prints the canonical rendering: one top-level
/// statement per line, aliases normalised, expressions re-serialised.
pub fn run_dump(args: &DumpArgs) -> Result<()> {
    let script = load_script(&args.script)?;
    println!("{}", script.canonical());
    Ok(())
}
