//! Move-choosing strategies for computer players.
//!
//! The game engine only sees the [`Strategy`] trait; each seat owns its own
//! boxed strategy so stateful ones (the seeded random player) stay per-seat.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::games::triomino::board::Board;
use crate::games::triomino::player::Player;
use crate::games::triomino::scoring;
use crate::games::triomino::types::Move;

/// Picks a placement for `player` on `board`, or `None` when nothing fits.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    fn choose_move(&mut self, player: &Player, board: &Board) -> Option<Move>;
}

/// A legal move with the points it would earn before draw penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredMove {
    pub mv: Move,
    pub base_score: i32,
    pub bonus_score: i32,
}

impl ScoredMove {
    pub fn total_score(&self) -> i32 {
        self.base_score + self.bonus_score
    }
}

/// Every legal move for every tile in hand, in hand order.
pub fn scored_moves(player: &Player, board: &Board) -> Vec<ScoredMove> {
    let mut moves = Vec::new();
    for tile in &player.hand {
        for placement in board.find_valid_placements(tile) {
            let (bonus_score, _) = scoring::placement_bonus(placement.bridges, placement.hexagons);
            moves.push(ScoredMove {
                mv: Move {
                    tile: *tile,
                    placement,
                },
                base_score: tile.sum_value(),
                bonus_score,
            });
        }
    }
    moves
}

/// First move with the strictly highest key.
fn best_by<K: PartialOrd>(moves: &[ScoredMove], key: impl Fn(&ScoredMove) -> K) -> Option<Move> {
    let mut best: Option<(&ScoredMove, K)> = None;
    for m in moves {
        let k = key(m);
        if best.as_ref().map_or(true, |(_, b)| k > *b) {
            best = Some((m, k));
        }
    }
    best.map(|(m, _)| m.mv)
}

/// Always plays the highest-scoring move.
pub struct GreedyStrategy;

impl Strategy for GreedyStrategy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn choose_move(&mut self, player: &Player, board: &Board) -> Option<Move> {
        best_by(&scored_moves(player, board), ScoredMove::total_score)
    }
}

/// Weighs score against getting rid of extreme tiles that are hard to match later.
pub struct BalancedStrategy;

impl BalancedStrategy {
    fn weight(m: &ScoredMove) -> i32 {
        let mut w = m.total_score();
        if m.base_score >= 12 {
            w += 3;
        } else if m.base_score <= 3 {
            w += 2;
        }
        if m.mv.placement.hexagons > 0 {
            w += 10;
        } else if m.mv.placement.bridges > 0 {
            w += 5;
        }
        w
    }
}

impl Strategy for BalancedStrategy {
    fn name(&self) -> &str {
        "balanced"
    }

    fn choose_move(&mut self, player: &Player, board: &Board) -> Option<Move> {
        best_by(&scored_moves(player, board), Self::weight)
    }
}

/// Takes any bonus on offer, otherwise dumps the cheapest tile and keeps high ones.
pub struct DefensiveStrategy;

impl Strategy for DefensiveStrategy {
    fn name(&self) -> &str {
        "defensive"
    }

    fn choose_move(&mut self, player: &Player, board: &Board) -> Option<Move> {
        best_by(&scored_moves(player, board), |m| (m.bonus_score, -m.base_score))
    }
}

/// Uniformly random legal move from a seeded generator.
pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Strategy for RandomStrategy {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_move(&mut self, player: &Player, board: &Board) -> Option<Move> {
        scored_moves(player, board)
            .choose(&mut self.rng)
            .map(|m| m.mv)
    }
}

/// Named strategy, usable from the command line and from TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Greedy,
    Balanced,
    Defensive,
    Random,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Greedy,
        StrategyKind::Balanced,
        StrategyKind::Defensive,
        StrategyKind::Random,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Greedy => "greedy",
            StrategyKind::Balanced => "balanced",
            StrategyKind::Defensive => "defensive",
            StrategyKind::Random => "random",
        }
    }

    /// `seed` only matters for the random strategy.
    pub fn build(self, seed: u64) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Greedy => Box::new(GreedyStrategy),
            StrategyKind::Balanced => Box::new(BalancedStrategy),
            StrategyKind::Defensive => Box::new(DefensiveStrategy),
            StrategyKind::Random => Box::new(RandomStrategy::new(seed)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| format!("unknown strategy '{s}'"))
    }
}

/// Look up a strategy by name, falling back to greedy.
pub fn get_strategy(name: &str, seed: u64) -> Box<dyn Strategy> {
    match name.parse::<StrategyKind>() {
        Ok(kind) => kind.build(seed),
        Err(e) => {
            tracing::warn!(error = %e, "falling back to greedy");
            Box::new(GreedyStrategy)
        }
    }
}
