//! Triominó: triangular tiles laid edge to edge on an unbounded lattice.

pub mod board;
pub mod game;
pub mod lattice;
pub mod observe;
pub mod player;
pub mod scoring;
pub mod tiles;
pub mod types;
