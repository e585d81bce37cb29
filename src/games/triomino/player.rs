//! Player hands and scores.

use serde::{Deserialize, Serialize};

use super::tiles::{Deck, Tile};
use super::types::PlayerIndex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub hand: Vec<Tile>,
    /// Carried across rounds; may go negative.
    pub score: i32,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hand: Vec::new(),
            score: 0,
        }
    }

    pub fn hand_value(&self) -> i32 {
        self.hand.iter().map(Tile::sum_value).sum()
    }

    pub fn hand_size(&self) -> usize {
        self.hand.len()
    }

    pub fn has_empty_hand(&self) -> bool {
        self.hand.is_empty()
    }

    pub fn has_tile(&self, tile: &Tile) -> bool {
        self.hand.contains(tile)
    }

    /// Draw up to `count` tiles from the end of the pool. Returns how many were drawn.
    pub fn draw_from(&mut self, pool: &mut Deck, count: usize) -> usize {
        let mut drawn = 0;
        while drawn < count {
            match pool.draw() {
                Some(tile) => {
                    self.hand.push(tile);
                    drawn += 1;
                }
                None => break,
            }
        }
        drawn
    }

    /// Take a tile out of the hand, keeping the order of the rest.
    pub fn remove_tile(&mut self, tile: &Tile) -> Option<Tile> {
        let idx = self.hand.iter().position(|t| t == tile)?;
        Some(self.hand.remove(idx))
    }

    pub fn add_score(&mut self, points: i32) {
        self.score += points;
    }

    pub fn reset_for_new_round(&mut self) {
        self.hand.clear();
    }

    /// Highest-valued triple in hand; the first one held wins ties.
    pub fn highest_triple(&self) -> Option<Tile> {
        highest_by_value(self.hand.iter().filter(|t| t.is_triple()))
    }

    pub fn highest_tile(&self) -> Option<Tile> {
        highest_by_value(self.hand.iter())
    }
}

fn highest_by_value<'a>(tiles: impl Iterator<Item = &'a Tile>) -> Option<Tile> {
    let mut best: Option<Tile> = None;
    for t in tiles {
        if best.map_or(true, |b| t.sum_value() > b.sum_value()) {
            best = Some(*t);
        }
    }
    best
}

/// Who opens the round, with which tile, and whether it is a triple.
///
/// The highest triple anywhere wins. With no triple dealt, the highest tile
/// wins. Earlier seats win ties.
pub fn starting_player(players: &[Player]) -> Option<(PlayerIndex, Tile, bool)> {
    let mut best: Option<(PlayerIndex, Tile)> = None;
    for (i, p) in players.iter().enumerate() {
        if let Some(t) = p.highest_triple() {
            if best.map_or(true, |(_, b)| t.sum_value() > b.sum_value()) {
                best = Some((i, t));
            }
        }
    }
    if let Some((i, t)) = best {
        return Some((i, t, true));
    }
    for (i, p) in players.iter().enumerate() {
        if let Some(t) = p.highest_tile() {
            if best.map_or(true, |(_, b)| t.sum_value() > b.sum_value()) {
                best = Some((i, t));
            }
        }
    }
    best.map(|(i, t)| (i, t, false))
}
