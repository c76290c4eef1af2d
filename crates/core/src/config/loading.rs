//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{
    Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File, FileFormat,
};
use std::path::Path;
use tracing::debug;

use super::defaults::*;
use super::{global_config_path, Config, OutputMode};

type Builder = LibConfigBuilder<config::builder::DefaultState>;

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: Builder,
    key: &str,
    value: T,
) -> Result<Builder> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

/// Seeds every key so that partial files and bare environment overrides deserialize
fn with_defaults(builder: Builder) -> Result<Builder> {
    let builder = set_config_default(builder, "watch.writes", false)?;
    let builder = set_config_default(builder, "watch.moves", false)?;
    let builder = set_config_default(builder, "watch.creation", false)?;
    let builder = set_config_default(builder, "watch.deletion", false)?;
    let builder = set_config_default(
        builder,
        "watch.move_pair_window_ms",
        default_move_pair_window_ms() as i64,
    )?;
    let builder = set_config_default(
        builder,
        "watch.change_coalesce_ms",
        default_change_coalesce_ms() as i64,
    )?;
    let builder = set_config_default(
        builder,
        "watch.max_queue_size",
        default_max_queue_size() as i64,
    )?;
    let builder =
        set_config_default(builder, "watch.ignore_patterns", default_ignore_patterns())?;
    let builder = set_config_default(builder, "output.mode", OutputMode::default().as_str())?;
    set_config_default(builder, "output.app_name", default_app_name())
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// A missing file is not an error; defaults and the environment still apply.
    /// Environment variables are prefixed with `FILEMON_` and use double underscores
    /// for nested values. For example:
    /// - `FILEMON_WATCH__WRITES=true`
    /// - `FILEMON_OUTPUT__MODE=print`
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut builder = with_defaults(ConfigLib::builder())?;

        // Add the config file if it exists
        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        // Add environment variables with FILEMON_ prefix
        builder = builder.add_source(
            Environment::with_prefix("FILEMON")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.filemon/config.toml or custom --config path)
    /// 3. Environment variables (FILEMON_*)
    ///
    /// An explicitly requested file must exist.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(p) if !p.exists() => Err(Error::config(format!(
                "Configuration file {} does not exist",
                p.display()
            ))),
            Some(p) => Self::from_file(p),
            None => Self::from_file(&global_config_path()?),
        }
    }
}
