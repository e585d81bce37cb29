//! Arena CLI: run strategy-vs-strategy series from the command line.
//!
//! Usage:
//!   cargo run --release --bin arena -- --games 100 --p1 greedy --p2 random
//!   cargo run --release --bin arena -- --games 50 --p1 balanced --p2 cautious --config triomino.toml
//!   cargo run --release --bin arena -- --games 20 --extra defensive --extra random --json

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use triomino_engine::engine::arena::run_arena;
use triomino_engine::engine::config::{load_config, load_default_config, ConfigFile};
use triomino_engine::engine::models::Contestant;
use triomino_engine::games::triomino::scoring::DEFAULT_TARGET_SCORE;

#[derive(Parser)]
#[command(name = "arena", about = "Run strategy-vs-strategy Triominó experiments")]
struct Cli {
    /// Number of games to play
    #[arg(long, default_value = "100")]
    games: usize,

    /// Base seed; game i uses seed + i
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Rotate seats between games (`--alternate-seats false` to keep them fixed)
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    alternate_seats: bool,

    /// Score that arms the final round
    #[arg(long, default_value_t = DEFAULT_TARGET_SCORE)]
    target: i32,

    /// Path to triomino.toml (profiles)
    #[arg(long, env = "TRIOMINO_CONFIG")]
    config: Option<PathBuf>,

    /// Player 1 strategy or profile name
    #[arg(long, default_value = "greedy")]
    p1: String,

    /// Player 2 strategy or profile name
    #[arg(long, default_value = "random")]
    p2: String,

    /// Additional players (up to six in total)
    #[arg(long)]
    extra: Vec<String>,

    /// Print the aggregate as JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// Unique display names: repeated strategies get a seat suffix.
fn build_contestants(names: &[String], config: &ConfigFile) -> Result<Vec<Contestant>, String> {
    let mut out: Vec<Contestant> = Vec::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        let strategy = config.resolve_strategy(name).map_err(|e| e.to_string())?;
        let display = if out.iter().any(|c| c.name == *name) || names[i + 1..].contains(name) {
            format!("{}#{}", name, i + 1)
        } else {
            name.clone()
        };
        out.push(Contestant::new(display, strategy));
    }
    Ok(out)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path).unwrap_or_else(|e| {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }),
        None => load_default_config(),
    };

    let mut names = vec![cli.p1.clone(), cli.p2.clone()];
    names.extend(cli.extra.iter().cloned());
    let contestants = build_contestants(&names, &config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("Available profiles: {:?}", config.profiles.keys().collect::<Vec<_>>());
        std::process::exit(1);
    });

    eprintln!(
        "Arena: {} games, seed={}, target={}, alternate_seats={}",
        cli.games, cli.seed, cli.target, cli.alternate_seats
    );
    for c in &contestants {
        eprintln!("  {}: strategy={}", c.name, c.strategy);
    }
    eprintln!();

    let total = cli.games;
    let progress_cb = move |done: usize, _total: usize| {
        eprint!("\r  [{}/{}] games completed", done, total);
    };

    let result = run_arena(
        &contestants,
        cli.games,
        cli.seed,
        cli.target,
        cli.alternate_seats,
        Some(&progress_cb),
    )
    .unwrap_or_else(|e| {
        eprintln!("\nError: {}", e);
        std::process::exit(1);
    });

    eprintln!("\r                                    "); // clear progress line
    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Error encoding result: {}", e),
        }
    } else {
        println!("{}", result.summary());
    }
}
