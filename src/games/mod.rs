pub mod triomino;
