//! Configuration module for filemon
//!
//! Configuration is layered: built-in defaults, then a TOML file, then
//! `FILEMON_*` environment variables. Command-line flags are applied on top
//! by the binary.

mod defaults;
mod loading;

#[cfg(test)]
mod tests;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.filemon/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".filemon").join("config.toml"))
}

/// Main configuration structure for filemon
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which operations to report and how raw events are collected
    #[serde(default)]
    pub watch: WatchConfig,

    /// How reports are presented
    #[serde(default)]
    pub output: OutputConfig,
}

/// Operation toggles and watch source tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Report content writes ("changed")
    #[serde(default)]
    pub writes: bool,

    /// Report moves and renames
    #[serde(default)]
    pub moves: bool,

    /// Report creation
    #[serde(default)]
    pub creation: bool,

    /// Report deletion
    #[serde(default)]
    pub deletion: bool,

    /// How long one half of a move waits for its partner, in milliseconds
    #[serde(default = "default_move_pair_window_ms")]
    pub move_pair_window_ms: u64,

    /// Writes to one path closer together than this, in milliseconds, are
    /// reported once. Zero reports every write.
    #[serde(default = "default_change_coalesce_ms")]
    pub change_coalesce_ms: u64,

    /// Capacity of the channel between watch backends and the dispatch loop
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,

    /// File name glob patterns whose events are dropped at the source
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            writes: false,
            moves: false,
            creation: false,
            deletion: false,
            move_pair_window_ms: default_move_pair_window_ms(),
            change_coalesce_ms: default_change_coalesce_ms(),
            max_queue_size: default_max_queue_size(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

impl WatchConfig {
    /// Get the move pairing window
    pub fn move_pair_window(&self) -> Duration {
        Duration::from_millis(self.move_pair_window_ms)
    }

    /// Get the window within which writes to one path are merged
    pub fn change_coalesce_window(&self) -> Duration {
        Duration::from_millis(self.change_coalesce_ms)
    }

    /// Whether any operation toggle is enabled
    pub fn any_enabled(&self) -> bool {
        self.writes || self.moves || self.creation || self.deletion
    }
}

/// Presentation backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Desktop notifications with a contextual action (default)
    #[default]
    Notify,
    /// One plain text line per event on stdout
    Print,
}

impl OutputMode {
    /// Configuration string for this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notify => "notify",
            Self::Print => "print",
        }
    }
}

/// Presentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Selected presentation backend
    #[serde(default)]
    pub mode: OutputMode,

    /// Application name announced to the notification server
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::default(),
            app_name: default_app_name(),
        }
    }
}

impl Config {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.watch.move_pair_window_ms == 0 {
            return Err(Error::config(
                "watch.move_pair_window_ms must be greater than 0".to_string(),
            ));
        }

        if self.watch.max_queue_size == 0 {
            return Err(Error::config(
                "watch.max_queue_size must be greater than 0".to_string(),
            ));
        }

        for pattern in &self.watch.ignore_patterns {
            glob::Pattern::new(pattern).map_err(|e| {
                Error::config(format!("Invalid ignore pattern '{pattern}': {e}"))
            })?;
        }

        if self.output.app_name.trim().is_empty() {
            return Err(Error::config(
                "output.app_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
