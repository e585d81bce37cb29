//! Runner-level data types shared by the binaries, the config loader and the arena.

use serde::{Deserialize, Serialize};

use crate::engine::strategy::StrategyKind;
use crate::games::triomino::game::GameResult;
use crate::games::triomino::scoring::DEFAULT_TARGET_SCORE;

/// Settings for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_players")]
    pub players: Vec<String>,
    /// One per player. Empty means greedy for everyone.
    #[serde(default)]
    pub strategies: Vec<StrategyKind>,
    #[serde(default = "default_target_score")]
    pub target_score: i32,
    /// Round `n` shuffles with `seed + n`. A random seed is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_players() -> Vec<String> {
    vec!["Computer 1".into(), "Computer 2".into()]
}

fn default_target_score() -> i32 {
    DEFAULT_TARGET_SCORE
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            players: default_players(),
            strategies: Vec::new(),
            target_score: default_target_score(),
            seed: None,
        }
    }
}

impl GameConfig {
    /// Strategy for every seat, padding with greedy when none were given.
    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        if self.strategies.is_empty() {
            vec![StrategyKind::Greedy; self.players.len()]
        } else {
            self.strategies.clone()
        }
    }
}

/// A named entrant in an arena run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contestant {
    pub name: String,
    pub strategy: StrategyKind,
}

impl Contestant {
    pub fn new(name: impl Into<String>, strategy: StrategyKind) -> Self {
        Self {
            name: name.into(),
            strategy,
        }
    }
}

/// One finished arena game.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRecord {
    pub index: usize,
    pub seed: u64,
    /// Contestant names in seat order.
    pub seats: Vec<String>,
    pub result: GameResult,
    pub duration_ms: f64,
}
