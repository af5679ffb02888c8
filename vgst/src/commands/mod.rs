//! Command implementations for the vgst CLI.
//!
//! Each subcommand lives in its own file and exposes a `run_*` function
//! plus a clap `Args` struct, re-exported here for `main`.

pub mod check;
pub mod dump;
pub mod trace;

pub use check::{run_check, CheckArgs};
pub use dump::{run_dump, DumpArgs};
pub use trace::{run_trace, TraceArgs};

use std::path::Path;

use vgsc_par::Script;

use crate::error::Result;

/// Reads and parses a script file; shared by every subcommand.
pub fn load_script(path: &Path) -> Result<Script> {
    let source = std::fs::read_to_string(path)?;
    Ok(vgsc_par::parse(&source)?)
}
