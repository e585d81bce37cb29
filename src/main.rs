//! Play one Triominó game between computer players and print the result.
//!
//! Usage:
//!   cargo run --release -- --seed 42 --players Alpha,Beta --strategies greedy,balanced

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use triomino_engine::engine::config::{load_config, load_default_config};
use triomino_engine::engine::strategy::StrategyKind;
use triomino_engine::games::triomino::game::TriominoGame;

#[derive(Parser)]
#[command(name = "triomino", about = "Play a Triominó game between computer players")]
struct Cli {
    /// Path to triomino.toml (default: auto-discover)
    #[arg(long, env = "TRIOMINO_CONFIG")]
    config: Option<PathBuf>,

    /// Shuffle seed; round n uses seed + n
    #[arg(long, env = "TRIOMINO_SEED")]
    seed: Option<u64>,

    /// Comma-separated player names
    #[arg(long, value_delimiter = ',')]
    players: Option<Vec<String>>,

    /// Comma-separated strategies, one per player
    #[arg(long, value_delimiter = ',', value_enum)]
    strategies: Option<Vec<StrategyKind>>,

    /// Score that arms the final round
    #[arg(long)]
    target: Option<i32>,

    /// Print the final board snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_default_config(),
    };
    let mut config = file.game_config()?;
    if let Some(players) = cli.players {
        config.players = players;
        if cli.strategies.is_none() && config.strategies.len() != config.players.len() {
            config.strategies.clear();
        }
    }
    if let Some(strategies) = cli.strategies {
        config.strategies = strategies;
    }
    if let Some(target) = cli.target {
        config.target_score = target;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let mut game = TriominoGame::from_config(&config)?;
    tracing::info!(
        players = ?config.players,
        strategies = ?config.strategy_kinds(),
        seed = game.seed,
        target = config.target_score,
        "starting game"
    );

    let result = game.play_game()?;

    println!(
        "{} wins after {} rounds ({} turns)",
        result.winner_name, result.rounds_played, result.turns_played
    );
    for (name, score) in &result.final_scores {
        println!("  {:>12}: {}", name, score);
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&game.snapshot())?);
    }
    Ok(())
}
