//! TOML configuration: game settings plus named strategy profiles.
//!
//! ```toml
//! [game]
//! players = ["Alpha", "Beta"]
//! strategies = ["greedy", "cautious"]
//! target_score = 400
//! seed = 42
//!
//! [profiles.cautious]
//! strategy = "defensive"
//! description = "keeps high tiles back"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::engine::models::GameConfig;
use crate::engine::strategy::StrategyKind;
use crate::games::triomino::scoring::DEFAULT_TARGET_SCORE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown strategy or profile '{0}'")]
    UnknownStrategy(String),
}

/// A named strategy with an optional note.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StrategyProfile {
    pub description: Option<String>,
    #[serde(default)]
    pub strategy: StrategyKind,
}

/// `[game]` as written. Strategy entries may name a profile or a built-in strategy.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct GameSection {
    pub players: Option<Vec<String>>,
    #[serde(default)]
    pub strategies: Vec<String>,
    pub target_score: Option<i32>,
    pub seed: Option<u64>,
}

/// Top-level TOML file structure.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub game: GameSection,
    #[serde(default)]
    pub profiles: HashMap<String, StrategyProfile>,
}

impl ConfigFile {
    /// Profile names win over built-in strategy names.
    pub fn resolve_strategy(&self, name: &str) -> Result<StrategyKind, ConfigError> {
        if let Some(profile) = self.profiles.get(name) {
            return Ok(profile.strategy);
        }
        name.parse()
            .map_err(|_| ConfigError::UnknownStrategy(name.to_string()))
    }

    pub fn game_config(&self) -> Result<GameConfig, ConfigError> {
        let defaults = GameConfig::default();
        let strategies = self
            .game
            .strategies
            .iter()
            .map(|s| self.resolve_strategy(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GameConfig {
            players: self.game.players.clone().unwrap_or(defaults.players),
            strategies,
            target_score: self.game.target_score.unwrap_or(DEFAULT_TARGET_SCORE),
            seed: self.game.seed,
        })
    }
}

pub fn parse_config(content: &str, path: &Path) -> Result<ConfigFile, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, path)
}

/// Try well-known paths, falling back to built-in defaults.
pub fn load_default_config() -> ConfigFile {
    let candidates = ["triomino.toml", "../triomino.toml"];
    for path in &candidates {
        let p = Path::new(path);
        if p.exists() {
            match load_config(p) {
                Ok(config) => {
                    tracing::info!(path = %p.display(), profiles = config.profiles.len(), "loaded config");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "failed to load config");
                }
            }
        }
    }
    tracing::info!("no triomino.toml found, using built-in defaults");
    ConfigFile::default()
}
