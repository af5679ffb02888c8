//! `vgst trace` - evaluate frames against the recording back-end and print
//! the drawing-call sequence.
//!
//! This is the scriptable equivalent of the original test driver that
//! mocked every drawing call to print its arguments: one line per call,
//! or one JSON object per call with `--json`.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use vgsc_eval::{render_frame, CanvasCall, Frame, TraceCanvas};

use crate::commands::load_script;
use crate::config::Config;
use crate::error::Result;

/// Arguments for the `trace` subcommand.
#[derive(Args, Debug)]
pub struct TraceArgs {
    /// Script file to evaluate.
    pub script: PathBuf,

    /// Frame width in pixels (overrides the config file).
    #[arg(long)]
    pub width: Option<u32>,

    /// Frame height in pixels (overrides the config file).
    #[arg(long)]
    pub height: Option<u32>,

    /// Number of frames to evaluate (overrides the config file).
    #[arg(long)]
    pub frames: Option<u32>,

    /// Extra metadata entries, as key=value (may repeat).
    #[arg(long = "meta", value_parser = parse_key_value)]
    pub meta: Vec<(String, String)>,

    /// Emit one JSON object per drawing call instead of plain text.
    #[arg(long)]
    pub json: bool,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("'{raw}' is not in key=value form"))
}

#[derive(Serialize)]
struct TraceEvent<'a> {
    frame: u32,
    #[serde(flatten)]
    call: &'a CanvasCall,
}

/// Runs the script for the configured number of frames, printing every
/// back-end call in order.
pub fn run_trace(args: &TraceArgs, config: &Config) -> Result<()> {
    let script = load_script(&args.script)?;

    let width = f64::from(args.width.unwrap_or(config.width));
    let height = f64::from(args.height.unwrap_or(config.height));
    let frames = args.frames.unwrap_or(config.frames);
    let duration = config.frame_duration;

    for index in 0..frames {
        let mut frame = Frame::new(width, height)
            .at(f64::from(index), f64::from(index) * duration)
            .with_duration(duration);
        for (key, value) in &config.metadata {
            frame = frame.with_metadata(key.clone(), value.clone());
        }
        for (key, value) in &args.meta {
            frame = frame.with_metadata(key.clone(), value.clone());
        }

        let mut canvas = TraceCanvas::new();
        render_frame(&script, &frame, &mut canvas)?;
        tracing::debug!(frame = index, calls = canvas.calls().len(), "frame evaluated");

        if args.json {
            for call in canvas.calls() {
                println!("{}", serde_json::to_string(&TraceEvent { frame: index, call })?);
            }
        } else {
            println!("# frame {index}");
            for call in canvas.calls() {
                println!("{call}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("score=42").unwrap(),
            ("score".to_string(), "42".to_string())
        );
        assert_eq!(
            parse_key_value("title=a=b").unwrap(),
            ("title".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("nope").is_err());
    }
}
