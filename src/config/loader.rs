#![warn(clippy::all, clippy::pedantic)]

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{CONFIG, Config};

// Default config file path used when no config directory is available
const CONFIG_FILE_PATH: &str = "config/mineralfall.toml";

/// Loads the configuration from the resolved path and publishes it into
/// the global `CONFIG` slot. A missing file is replaced with saved
/// defaults.
pub fn load_config_from_file() -> Result<Config, ConfigError> {
    let config = load_config_from_path(get_config_file_path())?;
    if let Ok(mut slot) = CONFIG.write() {
        *slot = config.clone();
    }
    Ok(config)
}

pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        let default_config = Config::default();
        save_config_to_path(&default_config, path)?;
        return Ok(default_config);
    }

    let contents = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

pub fn save_config_to_file(config: &Config) -> Result<(), ConfigError> {
    save_config_to_path(config, get_config_file_path())
}

pub fn save_config_to_path<P: AsRef<Path>>(config: &Config, path: P) -> Result<(), ConfigError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let toml_string = toml::to_string_pretty(config)?;
    fs::write(path, toml_string)?;
    Ok(())
}

/// Resolution order: `MINERALFALL_CONFIG` env var, the platform config
/// directory, then a path relative to the working directory.
fn get_config_file_path() -> PathBuf {
    if let Ok(path) = std::env::var("MINERALFALL_CONFIG") {
        return PathBuf::from(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("mineralfall").join("config.toml")
    } else {
        PathBuf::from(CONFIG_FILE_PATH)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Serialize(err)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "config io error: {err}"),
            ConfigError::Parse(err) => write!(f, "config parse error: {err}"),
            ConfigError::Serialize(err) => write!(f, "config serialize error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}
