#![warn(clippy::all, clippy::pedantic)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// One catalog entry: an immutable mineral kind shared by every falling
/// entity of that kind. `frequency` is carried for the weighted spawn
/// strategy; the default uniform strategy ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineralType {
    pub symbol: String,
    pub name: String,
    pub sprite: String,
    pub value: u32,
    #[serde(default = "default_frequency")]
    pub frequency: u32,
}

fn default_frequency() -> u32 {
    1
}

/// Static per-level tuning. `minerals` is `None` for "all catalog types".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level: u32,
    pub spawn_interval_ms: u64,
    pub min_fall_speed: f32,
    pub max_fall_speed: f32,
    pub duration_secs: u32,
    #[serde(default)]
    pub minerals: Option<Vec<String>>,
}

/// How the spawner picks a mineral kind. Uniform matches the observed
/// behavior of the original game; Frequency honors the per-type
/// `frequency` fields as an opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnWeighting {
    #[default]
    Uniform,
    Frequency,
}

/// The full mineral/level table, loaded once at process start and
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub minerals: Vec<MineralType>,
    pub levels: Vec<LevelConfig>,
}

/// A level resolved against the catalog: the config plus the concrete
/// mineral kinds it permits. Shared read-only by a running session.
#[derive(Debug, Clone)]
pub struct LevelRuntime {
    pub config: LevelConfig,
    pub minerals: Vec<Arc<MineralType>>,
}

impl Catalog {
    /// The built-in periodic-table catalog and level set used when no
    /// catalog file is configured.
    #[must_use]
    pub fn builtin() -> Self {
        let mineral = |symbol: &str, name: &str, sprite: &str, value: u32, frequency: u32| {
            MineralType {
                symbol: symbol.to_string(),
                name: name.to_string(),
                sprite: sprite.to_string(),
                value,
                frequency,
            }
        };

        let minerals = vec![
            mineral("H", "Hydrogen", "◦", 1, 100),
            mineral("He", "Helium", "◎", 2, 80),
            mineral("Li", "Lithium", "✶", 3, 60),
            mineral("C", "Carbon", "◆", 4, 60),
            mineral("N", "Nitrogen", "❋", 5, 50),
            mineral("O", "Oxygen", "●", 6, 50),
            mineral("Na", "Sodium", "▲", 7, 40),
            mineral("Fe", "Iron", "■", 10, 30),
            mineral("Cu", "Copper", "⬟", 12, 25),
            mineral("Ag", "Silver", "✦", 20, 12),
            mineral("Au", "Gold", "★", 50, 5),
            mineral("Pt", "Platinum", "✹", 75, 2),
        ];

        let symbols = |list: &[&str]| Some(list.iter().map(ToString::to_string).collect());

        let levels = vec![
            LevelConfig {
                level: 1,
                spawn_interval_ms: 800,
                min_fall_speed: 120.0,
                max_fall_speed: 220.0,
                duration_secs: 60,
                minerals: symbols(&["H", "He", "Li", "C", "N", "O"]),
            },
            LevelConfig {
                level: 2,
                spawn_interval_ms: 600,
                min_fall_speed: 160.0,
                max_fall_speed: 280.0,
                duration_secs: 60,
                minerals: symbols(&["H", "He", "Li", "C", "N", "O", "Na", "Fe", "Cu"]),
            },
            LevelConfig {
                level: 3,
                spawn_interval_ms: 450,
                min_fall_speed: 200.0,
                max_fall_speed: 360.0,
                duration_secs: 45,
                minerals: None,
            },
        ];

        Self { minerals, levels }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(contents)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    #[must_use]
    pub fn find_mineral(&self, symbol: &str) -> Option<&MineralType> {
        self.minerals.iter().find(|m| m.symbol == symbol)
    }

    #[must_use]
    pub fn level(&self, level: u32) -> Option<&LevelConfig> {
        self.levels.iter().find(|l| l.level == level)
    }

    /// Resolves a level's permitted symbol list against the catalog,
    /// producing the read-only runtime a session is built from.
    pub fn resolve_level(&self, level: u32) -> Result<LevelRuntime, CatalogError> {
        let config = self
            .level(level)
            .ok_or(CatalogError::UnknownLevel(level))?
            .clone();

        let minerals: Vec<Arc<MineralType>> = match &config.minerals {
            None => self.minerals.iter().cloned().map(Arc::new).collect(),
            Some(symbols) => symbols
                .iter()
                .map(|symbol| {
                    self.find_mineral(symbol)
                        .cloned()
                        .map(Arc::new)
                        .ok_or_else(|| CatalogError::UnknownMineral(symbol.clone()))
                })
                .collect::<Result<_, _>>()?,
        };

        if minerals.is_empty() {
            return Err(CatalogError::Invalid(format!(
                "level {level} permits no minerals"
            )));
        }

        Ok(LevelRuntime { config, minerals })
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.minerals.is_empty() {
            return Err(CatalogError::Invalid("empty mineral table".into()));
        }
        if self.levels.is_empty() {
            return Err(CatalogError::Invalid("empty level table".into()));
        }
        for (i, mineral) in self.minerals.iter().enumerate() {
            if mineral.symbol.is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "mineral #{i} has an empty symbol"
                )));
            }
            if self.minerals[..i].iter().any(|m| m.symbol == mineral.symbol) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate mineral symbol {}",
                    mineral.symbol
                )));
            }
        }
        for level in &self.levels {
            if level.spawn_interval_ms == 0 {
                return Err(CatalogError::Invalid(format!(
                    "level {} has a zero spawn interval",
                    level.level
                )));
            }
            if level.duration_secs == 0 {
                return Err(CatalogError::Invalid(format!(
                    "level {} has a zero duration",
                    level.level
                )));
            }
            if !(level.min_fall_speed > 0.0 && level.max_fall_speed >= level.min_fall_speed) {
                return Err(CatalogError::Invalid(format!(
                    "level {} has a bad fall-speed range",
                    level.level
                )));
            }
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Picks one mineral kind for the next spawn.
#[must_use]
pub fn choose_mineral(
    minerals: &[Arc<MineralType>],
    weighting: SpawnWeighting,
) -> Option<&Arc<MineralType>> {
    if minerals.is_empty() {
        return None;
    }
    match weighting {
        SpawnWeighting::Uniform => Some(&minerals[fastrand::usize(..minerals.len())]),
        SpawnWeighting::Frequency => {
            let total: u64 = minerals.iter().map(|m| u64::from(m.frequency)).sum();
            if total == 0 {
                // All frequencies zero: degrade to uniform
                return Some(&minerals[fastrand::usize(..minerals.len())]);
            }
            let mut roll = fastrand::u64(..total);
            for mineral in minerals {
                let weight = u64::from(mineral.frequency);
                if roll < weight {
                    return Some(mineral);
                }
                roll -= weight;
            }
            minerals.last()
        }
    }
}

#[derive(Debug)]
pub enum CatalogError {
    Io(io::Error),
    Parse(toml::de::Error),
    UnknownLevel(u32),
    UnknownMineral(String),
    Invalid(String),
}

impl From<io::Error> for CatalogError {
    fn from(err: io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<toml::de::Error> for CatalogError {
    fn from(err: toml::de::Error) -> Self {
        CatalogError::Parse(err)
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "catalog io error: {err}"),
            CatalogError::Parse(err) => write!(f, "catalog parse error: {err}"),
            CatalogError::UnknownLevel(level) => write!(f, "unknown level {level}"),
            CatalogError::UnknownMineral(symbol) => write!(f, "unknown mineral {symbol}"),
            CatalogError::Invalid(reason) => write!(f, "invalid catalog: {reason}"),
        }
    }
}

impl std::error::Error for CatalogError {}
