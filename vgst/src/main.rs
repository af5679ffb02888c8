//! vgst - command-line companion for VGS vector-graphics scripts.
//!
//! Three subcommands cover the development loop: `check` validates a
//! script and reports parse errors with line/column, `dump` prints the
//! canonical form, and `trace` evaluates frames against the recording
//! back-end so the produced drawing calls can be inspected or diffed.

mod commands;
mod config;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{run_check, run_dump, run_trace, CheckArgs, DumpArgs, TraceArgs};
use config::Config;

/// vgst - tools for VGS scripts
#[derive(Parser, Debug)]
#[command(name = "vgst")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check, normalise, and trace VGS vector-graphics scripts", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (script `print` output, skipped calls, …)
    #[arg(short, long, global = true, env = "VGST_VERBOSE")]
    verbose: bool,

    /// Path to a configuration file (defaults to ./vgst.toml when present)
    #[arg(short, long, global = true, env = "VGST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a script and report errors with line/column
    Check(CheckArgs),

    /// Parse a script and print its canonical form
    Dump(DumpArgs),

    /// Evaluate frames and print the drawing-call sequence
    Trace(TraceArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Check(args) => run_check(args)?,
        Commands::Dump(args) => run_dump(args)?,
        Commands::Trace(args) => run_trace(args, &config)?,
    }

    Ok(())
}

/// Installs the tracing subscriber. Script-level log records (the `print`
/// instruction, skipped calls, stray colour stops) surface at info/warn;
/// `--verbose` lowers the floor to debug.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
