//! Point tables and scoring functions. Nothing here holds state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::board::Placement;
use super::tiles::Tile;
use super::types::{GameError, PlayerIndex};

pub const MAX_DRAWS_PER_TURN: u32 = 3;
pub const DEFAULT_TARGET_SCORE: i32 = 400;

pub const TRIPLE_OPENING_BONUS: i32 = 10;
pub const TRIPLE_ZERO_OPENING_POINTS: i32 = 40;
pub const HEXAGON_BONUS: i32 = 50;
pub const BRIDGE_BONUS: i32 = 40;
pub const DRAW_PENALTY: i32 = -5;
pub const DRAW_FAILURE_PENALTY: i32 = -25;
pub const PASS_PENALTY: i32 = -10;
pub const ROUND_WIN_BONUS: i32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreType {
    TilePlaced,
    TripleOpening,
    TripleZeroOpening,
    Hexagon,
    DoubleHexagon,
    Bridge,
    DrawPenalty,
    DrawFailure,
    PassPenalty,
    RoundWin,
    OpponentTiles,
    BlockedWin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub kind: ScoreType,
    pub points: i32,
    pub description: String,
}

impl ScoreEvent {
    pub fn new(kind: ScoreType, points: i32, description: impl Into<String>) -> Self {
        Self {
            kind,
            points,
            description: description.into(),
        }
    }
}

impl fmt::Display for ScoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:+}", self.description, self.points)
    }
}

/// Tiles dealt to each player at the start of a round.
pub fn initial_tile_count(num_players: usize) -> Result<usize, GameError> {
    match num_players {
        2 => Ok(9),
        3 | 4 => Ok(7),
        5 | 6 => Ok(6),
        n => Err(GameError::InvalidPlayerCount(n)),
    }
}

/// Total points for the opening tile, including the tile's own value.
pub fn opening_score(tile: &Tile, is_triple: bool) -> (i32, ScoreEvent) {
    let value = tile.sum_value();
    if is_triple && tile.is_triple_zero() {
        (
            TRIPLE_ZERO_OPENING_POINTS,
            ScoreEvent::new(ScoreType::TripleZeroOpening, TRIPLE_ZERO_OPENING_POINTS, "Opening with 0-0-0"),
        )
    } else if is_triple {
        let total = value + TRIPLE_OPENING_BONUS;
        (
            total,
            ScoreEvent::new(
                ScoreType::TripleOpening,
                total,
                format!("Opening with triple ({value} + {TRIPLE_OPENING_BONUS} bonus)"),
            ),
        )
    } else {
        (value, ScoreEvent::new(ScoreType::TilePlaced, value, "Opening tile (no triple)"))
    }
}

/// Bonus for the bridges and completed hexagons of one placement.
///
/// A hexagon replaces the bridge award: bridges only score when no hexagon
/// was completed.
pub fn placement_bonus(bridges: usize, hexagons: usize) -> (i32, Vec<ScoreEvent>) {
    let events = match hexagons {
        0 => (0..bridges)
            .map(|_| ScoreEvent::new(ScoreType::Bridge, BRIDGE_BONUS, "Bridge formed"))
            .collect(),
        1 => vec![ScoreEvent::new(ScoreType::Hexagon, HEXAGON_BONUS, "Hexagon completed")],
        n => vec![ScoreEvent::new(
            ScoreType::DoubleHexagon,
            HEXAGON_BONUS * n as i32,
            format!("{n} hexagons completed"),
        )],
    };
    (events.iter().map(|e| e.points).sum(), events)
}

/// Net points for a committed placement after `draws` tiles were drawn this turn.
pub fn placement_score(placement: &Placement, draws: u32) -> (i32, Vec<ScoreEvent>) {
    let mut events = vec![ScoreEvent::new(
        ScoreType::TilePlaced,
        placement.base_points,
        "Tile placed",
    )];
    events.extend(placement.events.iter().cloned());
    if draws > 0 {
        events.push(ScoreEvent::new(
            ScoreType::DrawPenalty,
            DRAW_PENALTY * draws as i32,
            format!("Drew {draws} tile(s)"),
        ));
    }
    (events.iter().map(|e| e.points).sum(), events)
}

/// Penalty for ending a turn without a play after drawing. Three draws cost a flat 25.
pub fn draw_failure_penalty(draws: u32) -> ScoreEvent {
    if draws >= MAX_DRAWS_PER_TURN {
        ScoreEvent::new(
            ScoreType::DrawFailure,
            DRAW_FAILURE_PENALTY,
            format!("Cannot play after {MAX_DRAWS_PER_TURN} draws"),
        )
    } else {
        ScoreEvent::new(
            ScoreType::DrawPenalty,
            DRAW_PENALTY * draws as i32,
            format!("Drew {draws} tile(s)"),
        )
    }
}

pub fn pass_penalty() -> ScoreEvent {
    ScoreEvent::new(ScoreType::PassPenalty, PASS_PENALTY, "Pass (pool empty)")
}

/// Bonus for emptying one's hand: a flat 25 plus everything left in opponents' hands.
pub fn round_win_bonus(opponent_hand_values: &[i32]) -> (i32, Vec<ScoreEvent>) {
    let mut events = vec![ScoreEvent::new(ScoreType::RoundWin, ROUND_WIN_BONUS, "Round win bonus")];
    let opponents: i32 = opponent_hand_values.iter().sum();
    if opponents > 0 {
        events.push(ScoreEvent::new(
            ScoreType::OpponentTiles,
            opponents,
            "Opponent tiles value",
        ));
    }
    (ROUND_WIN_BONUS + opponents, events)
}

/// Award for the lowest hand in a blocked round. No flat bonus.
pub fn blocked_win_bonus(winner_hand_value: i32, opponent_hand_values: &[i32]) -> ScoreEvent {
    let total: i32 = opponent_hand_values
        .iter()
        .map(|v| v - winner_hand_value)
        .sum();
    ScoreEvent::new(ScoreType::BlockedWin, total, "Blocked round won on lowest hand")
}

/// Seat with the lowest hand value; the earliest seat wins ties.
pub fn blocked_winner(hand_values: &[i32]) -> Option<PlayerIndex> {
    let mut best: Option<(PlayerIndex, i32)> = None;
    for (i, &v) in hand_values.iter().enumerate() {
        if best.map_or(true, |(_, b)| v < b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// First seat at or past the target, if any.
pub fn first_to_reach_target(scores: &[i32], target: i32) -> Option<PlayerIndex> {
    scores.iter().position(|s| *s >= target)
}

/// Seat with the highest score; the earliest seat wins ties.
pub fn final_winner(scores: &[i32]) -> Option<PlayerIndex> {
    let mut best: Option<(PlayerIndex, i32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((i, s));
        }
    }
    best.map(|(i, _)| i)
}
