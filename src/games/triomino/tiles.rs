//! Tile values, the canonical 56-piece set, and seeded shuffling.

use std::fmt;
use std::hash::{Hash, Hasher};

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::types::{Edge, GameError, PlacementError};

pub const MAX_TILE_VALUE: u8 = 5;
pub const DECK_SIZE: usize = 56;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    Triple,
    Double,
    Single,
}

/// A triangular piece: an immutable base triple plus the rotation it is shown in.
///
/// Identity ignores rotation and the order the values were given in, so
/// `Tile::new(2, 0, 1) == Tile::new(0, 1, 2).rotated(1)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawTile")]
pub struct Tile {
    base: [u8; 3],
    rotation: u8,
}

/// Serialized form of [`Tile`], checked before it becomes one.
#[derive(Deserialize)]
struct RawTile {
    base: [u8; 3],
    #[serde(default)]
    rotation: u8,
}

impl TryFrom<RawTile> for Tile {
    type Error = GameError;

    fn try_from(raw: RawTile) -> Result<Self, Self::Error> {
        let [a, b, c] = raw.base;
        let tile = Tile::try_new(a, b, c)?;
        if raw.rotation > 2 {
            return Err(PlacementError::InvalidRotation(raw.rotation).into());
        }
        Ok(tile.with_rotation(raw.rotation))
    }
}

impl Tile {
    /// Panics on a value above 5. Use [`Tile::try_new`] for untrusted input.
    pub fn new(a: u8, b: u8, c: u8) -> Self {
        assert!(
            a <= MAX_TILE_VALUE && b <= MAX_TILE_VALUE && c <= MAX_TILE_VALUE,
            "tile values must be in 0..=5, got ({a}, {b}, {c})"
        );
        Self {
            base: [a, b, c],
            rotation: 0,
        }
    }

    pub fn try_new(a: u8, b: u8, c: u8) -> Result<Self, GameError> {
        if let Some(&bad) = [a, b, c].iter().find(|v| **v > MAX_TILE_VALUE) {
            return Err(GameError::InvalidTileValue(bad));
        }
        Ok(Self::new(a, b, c))
    }

    pub fn base(&self) -> [u8; 3] {
        self.base
    }

    pub fn sorted_base(&self) -> [u8; 3] {
        let mut s = self.base;
        s.sort_unstable();
        s
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Values at vertices 0, 1, 2 under the current rotation.
    pub fn values(&self) -> [u8; 3] {
        self.values_at(self.rotation)
    }

    /// Values under an explicit rotation. Rotation 1 of (a, b, c) is (c, a, b).
    pub fn values_at(&self, rotation: u8) -> [u8; 3] {
        let r = (rotation % 3) as usize;
        [0, 1, 2].map(|i| self.base[(i + 3 - r) % 3])
    }

    pub fn rotate(&mut self, steps: u8) {
        self.rotation = (self.rotation + steps % 3) % 3;
    }

    pub fn rotated(mut self, steps: u8) -> Self {
        self.rotate(steps);
        self
    }

    pub fn with_rotation(mut self, rotation: u8) -> Self {
        self.rotation = rotation % 3;
        self
    }

    /// Values bounding side `side` (vertex `side` to vertex `side + 1`).
    pub fn edge(&self, side: usize) -> Edge {
        self.edge_at(self.rotation, side)
    }

    pub fn edge_at(&self, rotation: u8, side: usize) -> Edge {
        let v = self.values_at(rotation);
        (v[side % 3], v[(side + 1) % 3])
    }

    pub fn edges(&self) -> [Edge; 3] {
        [0, 1, 2].map(|side| self.edge(side))
    }

    pub fn sum_value(&self) -> i32 {
        self.base.iter().map(|v| *v as i32).sum()
    }

    pub fn is_triple(&self) -> bool {
        self.base[0] == self.base[1] && self.base[1] == self.base[2]
    }

    pub fn is_triple_zero(&self) -> bool {
        self.base == [0, 0, 0]
    }

    pub fn kind(&self) -> TileKind {
        let [a, b, c] = self.sorted_base();
        if a == c {
            TileKind::Triple
        } else if a == b || b == c {
            TileKind::Double
        } else {
            TileKind::Single
        }
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.sorted_base() == other.sorted_base()
    }
}

impl Eq for Tile {}

impl Hash for Tile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted_base().hash(state);
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.values();
        write!(f, "{a}-{b}-{c}")
    }
}

/// Every (a, b, c) with 0 <= a <= b <= c <= 5, in generation order.
pub static CANONICAL_TILES: Lazy<Vec<Tile>> = Lazy::new(|| {
    let mut tiles = Vec::with_capacity(DECK_SIZE);
    for a in 0..=MAX_TILE_VALUE {
        for b in a..=MAX_TILE_VALUE {
            for c in b..=MAX_TILE_VALUE {
                tiles.push(Tile::new(a, b, c));
            }
        }
    }
    tiles
});

pub fn canonical_tiles() -> &'static [Tile] {
    &CANONICAL_TILES
}

/// The undealt pool. Deals and draws take from the end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deck {
    tiles: Vec<Tile>,
}

impl Deck {
    pub fn shuffled(seed: u64) -> Self {
        let mut tiles = canonical_tiles().to_vec();
        let mut rng = StdRng::seed_from_u64(seed);
        tiles.shuffle(&mut rng);
        Self { tiles }
    }

    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    pub fn draw(&mut self) -> Option<Tile> {
        self.tiles.pop()
    }

    pub fn remaining(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn into_tiles(self) -> Vec<Tile> {
        self.tiles
    }
}

/// Shuffled copy of the full set for `seed`.
pub fn generate_deck(seed: u64) -> Vec<Tile> {
    Deck::shuffled(seed).into_tiles()
}
