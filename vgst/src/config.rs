//! Configuration for the vgst CLI.
//!
//! An optional `vgst.toml` provides defaults for frame geometry and the
//! metadata dictionary handed to scripts through `getmetadata`. Command
//! line flags override file values.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VgstError};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "vgst.toml";

/// Tool configuration.
///
/// Every field has a serde default, so a partial (or absent) file works.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Frame width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Frame height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Number of frames evaluated by `trace`.
    #[serde(default = "default_frames")]
    pub frames: u32,

    /// Seconds per frame; drives the `t` and `duration` script variables.
    #[serde(default = "default_frame_duration")]
    pub frame_duration: f64,

    /// Metadata entries visible to `getmetadata`.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

fn default_width() -> u32 {
    320
}

fn default_height() -> u32 {
    240
}

fn default_frames() -> u32 {
    1
}

fn default_frame_duration() -> f64 {
    1.0 / 25.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            frames: default_frames(),
            frame_duration: default_frame_duration(),
            metadata: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads configuration.
    ///
    /// With an explicit path the file must exist; without one,
    /// `vgst.toml` is used when present and defaults apply otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(VgstError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let default = Path::new(CONFIG_FILE_NAME);
                if !default.exists() {
                    return Ok(Config::default());
                }
                default.to_path_buf()
            }
        };

        let text = std::fs::read_to_string(&path)?;
        toml::from_str(&text)
            .map_err(|err| VgstError::Config(format!("{}: {err}", path.display())))
    }
}
