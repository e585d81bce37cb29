//! Fixed-size numeric view of a game for policy-driven players.
//!
//! The action space is `MAX_HAND_SIZE + 2` wide: hand slots, then draw, then
//! pass. [`action_mask`] and [`apply_action`] share one legality check, so a
//! masked-in action is never refused and a masked-out one always is.

use serde::Serialize;

use super::game::{TriominoGame, TurnAction, TurnResult};
use super::scoring::{self, MAX_DRAWS_PER_TURN};
use super::tiles::{Tile, DECK_SIZE, MAX_TILE_VALUE};
use super::types::{GameError, Orientation, PlayerIndex, ValidPlacement};

/// No hand can outgrow the deck, so every held tile has a slot.
pub const MAX_HAND_SIZE: usize = DECK_SIZE;
pub const GRID_SIZE: usize = 64;
/// Occupied flag and three vertex values, once per orientation.
pub const BOARD_CHANNELS: usize = 8;
pub const STATE_LEN: usize = 6;
pub const ACTION_COUNT: usize = MAX_HAND_SIZE + 2;
pub const DRAW_ACTION: usize = MAX_HAND_SIZE;
pub const PASS_ACTION: usize = MAX_HAND_SIZE + 1;

const HAND_SIZE_SCALE: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AgentAction {
    Play(usize),
    Draw,
    Pass,
}

impl AgentAction {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            i if i < MAX_HAND_SIZE => Some(AgentAction::Play(i)),
            DRAW_ACTION => Some(AgentAction::Draw),
            PASS_ACTION => Some(AgentAction::Pass),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            AgentAction::Play(i) => *i,
            AgentAction::Draw => DRAW_ACTION,
            AgentAction::Pass => PASS_ACTION,
        }
    }
}

/// Flat, row-major float buffers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// `BOARD_CHANNELS x GRID_SIZE x GRID_SIZE`, centred on the occupied area.
    pub board: Vec<f32>,
    /// `MAX_HAND_SIZE x 3` values scaled to 0..=1.
    pub hand: Vec<f32>,
    pub hand_mask: Vec<f32>,
    /// Own score, best opponent score, pool size, own hand, largest opponent hand, draws left.
    pub state: Vec<f32>,
}

impl Observation {
    pub fn encode(game: &TriominoGame, seat: PlayerIndex, draws_this_turn: u32) -> Result<Self, GameError> {
        let me = game.player(seat)?;

        let mut board = vec![0.0; BOARD_CHANNELS * GRID_SIZE * GRID_SIZE];
        if let Some(b) = game.board.bounds() {
            let centre_row = (b.min_row + b.max_row).div_euclid(2);
            let centre_col = (b.min_col + b.max_col).div_euclid(2);
            let half = (GRID_SIZE / 2) as i32;
            for placed in game.board.tiles() {
                let gr = placed.position.row - centre_row + half;
                let gc = placed.position.col - centre_col + half;
                if !(0..GRID_SIZE as i32).contains(&gr) || !(0..GRID_SIZE as i32).contains(&gc) {
                    continue;
                }
                let base = match placed.position.orientation {
                    Orientation::Up => 0,
                    Orientation::Down => 4,
                };
                let cell = gr as usize * GRID_SIZE + gc as usize;
                let plane = GRID_SIZE * GRID_SIZE;
                board[base * plane + cell] = 1.0;
                for (i, v) in placed.values().iter().enumerate() {
                    board[(base + 1 + i) * plane + cell] = *v as f32 / MAX_TILE_VALUE as f32;
                }
            }
        }

        let mut hand = vec![0.0; MAX_HAND_SIZE * 3];
        let mut hand_mask = vec![0.0; MAX_HAND_SIZE];
        for (slot, tile) in me.hand.iter().take(MAX_HAND_SIZE).enumerate() {
            for (i, v) in tile.values().iter().enumerate() {
                hand[slot * 3 + i] = *v as f32 / MAX_TILE_VALUE as f32;
            }
            hand_mask[slot] = 1.0;
        }

        let opponents = game.players.iter().enumerate().filter(|(i, _)| *i != seat);
        let best_opponent = opponents.clone().map(|(_, p)| p.score).max().unwrap_or(0);
        let largest_opponent_hand = opponents.map(|(_, p)| p.hand_size()).max().unwrap_or(0);
        let target = game.target_score.max(1) as f32;
        let draws_left = MAX_DRAWS_PER_TURN.saturating_sub(draws_this_turn);
        let state = [
            me.score as f32 / target,
            best_opponent as f32 / target,
            game.pool.remaining() as f32 / DECK_SIZE as f32,
            me.hand_size() as f32 / HAND_SIZE_SCALE,
            largest_opponent_hand as f32 / HAND_SIZE_SCALE,
            draws_left as f32 / MAX_DRAWS_PER_TURN as f32,
        ]
        .map(|v| v.clamp(-1.0, 1.0))
        .to_vec();

        Ok(Self {
            board,
            hand,
            hand_mask,
            state,
        })
    }
}

/// Which actions `seat` may take right now.
pub fn action_mask(game: &TriominoGame, seat: PlayerIndex, draws_this_turn: u32) -> Result<Vec<bool>, GameError> {
    let me = game.player(seat)?;
    let mut mask = vec![false; ACTION_COUNT];
    for (slot, tile) in me.hand.iter().take(MAX_HAND_SIZE).enumerate() {
        mask[slot] = game.board.has_valid_placement(tile);
    }
    let any_play = mask[..MAX_HAND_SIZE].iter().any(|m| *m);
    let can_draw = !game.pool.is_empty() && draws_this_turn < MAX_DRAWS_PER_TURN;
    mask[DRAW_ACTION] = !any_play && can_draw;
    mask[PASS_ACTION] = !any_play && !can_draw;
    Ok(mask)
}

/// Highest-scoring placement for a tile, first on ties.
fn best_placement(game: &TriominoGame, tile: &Tile) -> Option<ValidPlacement> {
    let mut best: Option<(ValidPlacement, i32)> = None;
    for vp in game.board.find_valid_placements(tile) {
        let points = tile.sum_value() + scoring::placement_bonus(vp.bridges, vp.hexagons).0;
        if best.map_or(true, |(_, b)| points > b) {
            best = Some((vp, points));
        }
    }
    best.map(|(vp, _)| vp)
}

/// Carry out one decoded action for `seat` through the engine's own turn operations.
///
/// `draws_this_turn` is bumped on a draw and reset when the turn ends. Actions the
/// mask rules out come back with `success == false` and change nothing.
pub fn apply_action(
    game: &mut TriominoGame,
    seat: PlayerIndex,
    action: AgentAction,
    draws_this_turn: &mut u32,
) -> Result<TurnResult, GameError> {
    let mask = action_mask(game, seat, *draws_this_turn)?;
    let allowed = mask.get(action.index()).copied().unwrap_or(false);
    let kind = match action {
        AgentAction::Play(_) => TurnAction::Place,
        AgentAction::Draw => TurnAction::Draw,
        AgentAction::Pass => TurnAction::Pass,
    };
    if !allowed {
        let message = format!("{action:?} is not allowed now");
        return Ok(TurnResult::rejected(seat, kind, *draws_this_turn, message));
    }

    match action {
        AgentAction::Play(slot) => {
            let tile = game.player(seat)?.hand.get(slot).copied();
            let Some((tile, placement)) = tile.and_then(|t| best_placement(game, &t).map(|p| (t, p))) else {
                let message = format!("slot {slot} has nothing to place");
                return Ok(TurnResult::rejected(seat, kind, *draws_this_turn, message));
            };
            let turn = game.execute_place(seat, &tile, &placement, *draws_this_turn)?;
            if turn.success {
                *draws_this_turn = 0;
            }
            Ok(turn)
        }
        AgentAction::Draw => {
            let drawn = game.execute_draw(seat)?;
            *draws_this_turn += drawn;
            Ok(TurnResult {
                player: seat,
                action: TurnAction::Draw,
                placed: None,
                tiles_drawn: drawn,
                points: 0,
                events: Vec::new(),
                success: drawn > 0,
                message: format!("drew {drawn}"),
            })
        }
        AgentAction::Pass => {
            let turn = game.end_turn_without_play(seat, *draws_this_turn)?;
            *draws_this_turn = 0;
            Ok(turn)
        }
    }
}
