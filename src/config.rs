#![warn(clippy::all, clippy::pedantic)]

pub mod loader;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::RwLock;

use crate::catalog::SpawnWeighting;
use crate::game;

/// Process-wide configuration slot, populated once by the loader at
/// startup and read-only afterwards.
pub static CONFIG: Lazy<RwLock<Config>> = Lazy::new(|| RwLock::new(Config::default()));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Level played at launch.
    pub level: u32,
    /// Spawn selection strategy; uniform matches the original behavior.
    pub spawn_weighting: SpawnWeighting,
    /// Optional TOML catalog overriding the built-in mineral/level table.
    pub catalog_path: Option<PathBuf>,
    /// Environment variable holding the Telegram bot token.
    pub bot_token_env: String,
    /// Environment variable holding the launch `initData` payload.
    pub init_data_env: String,
    pub show_hud: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: game::STARTING_LEVEL,
            spawn_weighting: SpawnWeighting::Uniform,
            catalog_path: None,
            bot_token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            init_data_env: "TELEGRAM_INIT_DATA".to_string(),
            show_hud: true,
        }
    }
}

/// Snapshot of the current configuration.
#[must_use]
pub fn current() -> Config {
    CONFIG.read().map(|config| config.clone()).unwrap_or_default()
}
