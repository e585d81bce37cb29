//! Domain types for Triominó.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tiles::Tile;

/// Seat index of a player at the table.
pub type PlayerIndex = usize;

/// Ordered pair of vertex values bounding one side of a tile.
pub type Edge = (u8, u8);

/// Which way a triangle points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Up,
    Down,
}

/// A lattice cell address. Both orientations exist for every (row, col).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
    pub orientation: Orientation,
}

impl Position {
    /// Where the opening tile always goes.
    pub const ORIGIN: Position = Position {
        row: 0,
        col: 0,
        orientation: Orientation::Up,
    };

    pub const fn new(row: i32, col: i32, orientation: Orientation) -> Self {
        Self {
            row,
            col,
            orientation,
        }
    }

    pub const fn up(row: i32, col: i32) -> Self {
        Self::new(row, col, Orientation::Up)
    }

    pub const fn down(row: i32, col: i32) -> Self {
        Self::new(row, col, Orientation::Down)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = match self.orientation {
            Orientation::Up => "up",
            Orientation::Down => "down",
        };
        write!(f, "({}, {}, {})", self.row, self.col, o)
    }
}

/// A lattice point. `x` counts half side-lengths, `y` counts triangle heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}>", self.x, self.y)
    }
}

/// A tile frozen on the board. The embedded tile keeps the rotation it was placed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTile {
    pub tile: Tile,
    pub position: Position,
    pub owner: PlayerIndex,
}

impl PlacedTile {
    pub fn values(&self) -> [u8; 3] {
        self.tile.values()
    }

    pub fn rotation(&self) -> u8 {
        self.tile.rotation()
    }

    pub fn edge(&self, side: usize) -> Edge {
        self.tile.edge(side)
    }
}

/// A legal (position, rotation) for some tile, found by query and not yet committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidPlacement {
    pub position: Position,
    pub rotation: u8,
    pub edges_matched: usize,
    pub bridges: usize,
    pub hexagons: usize,
}

/// A tile from a hand together with where to put it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub tile: Tile,
    pub placement: ValidPlacement,
}

/// Why a placement was refused. Rejection never mutates the board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("position {0} is already occupied")]
    Occupied(Position),
    #[error("position {0} does not share an edge with any placed tile")]
    NotAdjacent(Position),
    #[error("side {side} at {position} needs {expected:?}, tile shows {found:?}")]
    EdgeMismatch {
        position: Position,
        side: usize,
        expected: Edge,
        found: Edge,
    },
    #[error("corner {point} at {position} carries {expected}, tile shows {found}")]
    VertexMismatch {
        position: Position,
        point: Point,
        expected: u8,
        found: u8,
    },
    #[error("the opening tile can only go on an empty board")]
    BoardNotEmpty,
    #[error("invalid rotation: {0}")]
    InvalidRotation(u8),
}

/// Setup and configuration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("player count must be between 2 and 6, got {0}")]
    InvalidPlayerCount(usize),
    #[error("{strategies} strategies given for {players} players")]
    StrategyCountMismatch { players: usize, strategies: usize },
    #[error("tile value {0} is outside 0..=5")]
    InvalidTileValue(u8),
    #[error("player name '{0}' is used twice")]
    DuplicatePlayerName(String),
    #[error("unknown player seat {0}")]
    UnknownPlayer(PlayerIndex),
    #[error("no player holds a tile to open the round")]
    NoOpeningTile,
    #[error(transparent)]
    Placement(#[from] PlacementError),
}
