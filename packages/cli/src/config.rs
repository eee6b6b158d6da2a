//! JSON config file handling.
//!
//! The config lives next to the binary as `config.json`. A missing file
//! yields the defaults; a present file is validated field by field, with
//! zero or empty values falling back to their defaults so a hand-edited
//! file can't silently disable pacing or budgets.

use std::path::Path;

use lemoscan_models::Config;

/// Default config file path.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Errors that can occur while reading or writing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid config JSON.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Loads the config from `path`, or the defaults when the file is missing.
///
/// Zero numeric fields and empty paths are replaced with their defaults.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let data = std::fs::read_to_string(path)?;
    let mut config: Config = serde_json::from_str(&data)?;

    let defaults = Config::default();
    if config.interval_ms == 0 {
        config.interval_ms = defaults.interval_ms;
    }
    if config.duration_secs == 0 {
        config.duration_secs = defaults.duration_secs;
    }
    if config.max_blocks == 0 {
        config.max_blocks = defaults.max_blocks;
    }
    if config.output_db.as_os_str().is_empty() {
        config.output_db = defaults.output_db;
    }
    if config.output_csv.as_os_str().is_empty() {
        config.output_csv = defaults.output_csv;
    }

    Ok(config)
}

/// Saves the config to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`ConfigError`] if serialization or the write fails.
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let data = serde_json::to_string_pretty(config)?;
    std::fs::write(path, data)?;
    Ok(())
}
