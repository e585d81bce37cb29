pub mod arena;
pub mod config;
pub mod models;
pub mod strategy;
