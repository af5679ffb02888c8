//! Error handling for the vgst CLI.

use thiserror::Error;

/// Errors produced by vgst commands.
#[derive(Error, Debug)]
pub enum VgstError {
    /// Problems with the configuration file.
    #[error("configuration error: {0}")]
    Config(String),

    /// The script failed to parse.
    #[error("parse error: {0}")]
    Parse(#[from] vgsc_util::ParseError),

    /// A frame failed to evaluate.
    #[error("render error: {0}")]
    Render(#[from] vgsc_util::RuntimeError),

    /// File system failures.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialisation failures in `trace --json`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the CLI.
pub type Result<T> = std::result::Result<T, VgstError>;
