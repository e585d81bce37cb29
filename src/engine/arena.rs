//! Strategy-vs-strategy arena runner.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use crate::engine::models::{Contestant, GameConfig, MatchRecord};
use crate::games::triomino::game::TriominoGame;
use crate::games::triomino::scoring;
use crate::games::triomino::types::GameError;

/// Aggregated results from an arena run.
#[derive(Debug, Clone, Serialize)]
pub struct ArenaResult {
    pub num_games: usize,
    /// Contestant names in the order they were given.
    pub names: Vec<String>,
    pub wins: HashMap<String, usize>,
    pub total_scores: HashMap<String, Vec<f64>>,
    pub game_durations_ms: Vec<f64>,
    pub total_rounds: u64,
    pub total_turns: u64,
    pub highest_score: i32,
    pub highest_scorer: String,
}

impl ArenaResult {
    fn new(names: Vec<String>, num_games: usize) -> Self {
        Self {
            num_games,
            wins: names.iter().map(|n| (n.clone(), 0)).collect(),
            total_scores: names.iter().map(|n| (n.clone(), Vec::new())).collect(),
            names,
            game_durations_ms: Vec::new(),
            total_rounds: 0,
            total_turns: 0,
            highest_score: i32::MIN,
            highest_scorer: String::new(),
        }
    }

    fn record(&mut self, m: &MatchRecord) {
        self.total_rounds += m.result.rounds_played as u64;
        self.total_turns += m.result.turns_played as u64;
        self.game_durations_ms.push(m.duration_ms);
        // Seat names in the result are contestant names.
        if let Some(w) = self.wins.get_mut(&m.result.winner_name) {
            *w += 1;
        }
        for (name, score) in &m.result.final_scores {
            if let Some(s) = self.total_scores.get_mut(name) {
                s.push(*score as f64);
            }
            if *score > self.highest_score {
                self.highest_score = *score;
                self.highest_scorer = name.clone();
            }
        }
    }

    pub fn win_rate(&self, name: &str) -> f64 {
        *self.wins.get(name).unwrap_or(&0) as f64 / self.num_games.max(1) as f64
    }

    pub fn avg_score(&self, name: &str) -> f64 {
        let scores = self.total_scores.get(name);
        match scores {
            Some(s) if !s.is_empty() => s.iter().sum::<f64>() / s.len() as f64,
            _ => 0.0,
        }
    }

    pub fn score_stddev(&self, name: &str) -> f64 {
        let scores = match self.total_scores.get(name) {
            Some(s) if s.len() >= 2 => s,
            _ => return 0.0,
        };
        let avg = self.avg_score(name);
        let variance = scores.iter().map(|s| (s - avg).powi(2)).sum::<f64>() / (scores.len() - 1) as f64;
        variance.sqrt()
    }

    /// Wilson score interval for the win rate.
    pub fn confidence_interval_95(&self, name: &str) -> (f64, f64) {
        let n = self.num_games;
        if n == 0 {
            return (0.0, 0.0);
        }
        let p = self.win_rate(name);
        let z = 1.96_f64;
        let denom = 1.0 + z * z / n as f64;
        let center = (p + z * z / (2.0 * n as f64)) / denom;
        let margin = z * ((p * (1.0 - p) + z * z / (4.0 * n as f64)) / n as f64).sqrt() / denom;
        ((center - margin).max(0.0), (center + margin).min(1.0))
    }

    pub fn avg_rounds(&self) -> f64 {
        self.total_rounds as f64 / self.num_games.max(1) as f64
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Arena Results ({} games)", self.num_games)];
        lines.push("=".repeat(60));
        for name in &self.names {
            let wr = self.win_rate(name);
            let (ci_lo, ci_hi) = self.confidence_interval_95(name);
            let avg = self.avg_score(name);
            let std = self.score_stddev(name);
            lines.push(format!(
                "  {:>12}: {:3} wins ({:5.1}%)  [95% CI: {:.1}%-{:.1}%]  avg={:5.1} +/- {:4.1}",
                name,
                self.wins.get(name).copied().unwrap_or(0),
                wr * 100.0,
                ci_lo * 100.0,
                ci_hi * 100.0,
                avg,
                std,
            ));
        }
        lines.push(format!(
            "  Rounds: {} total, {:.1} per game  |  Turns: {}",
            self.total_rounds,
            self.avg_rounds(),
            self.total_turns
        ));
        if !self.highest_scorer.is_empty() {
            lines.push(format!("  Highest score: {} ({})", self.highest_score, self.highest_scorer));
        }
        if !self.game_durations_ms.is_empty() {
            let avg_ms = self.game_durations_ms.iter().sum::<f64>() / self.game_durations_ms.len() as f64;
            let total_s = self.game_durations_ms.iter().sum::<f64>() / 1000.0;
            lines.push(format!("  Avg game: {:.1}ms  |  Total: {:.1}s", avg_ms, total_s));
        }
        lines.join("\n")
    }
}

/// Play `num_games` independent games between `contestants` and aggregate the results.
///
/// Game `i` uses seed `base_seed + i`. With `alternate_seats`, the seating rotates
/// one place per game so nobody always opens first. Games run in parallel; the
/// result does not depend on scheduling.
pub fn run_arena(
    contestants: &[Contestant],
    num_games: usize,
    base_seed: u64,
    target_score: i32,
    alternate_seats: bool,
    progress_callback: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> Result<ArenaResult, GameError> {
    scoring::initial_tile_count(contestants.len())?;
    let mut seen = HashSet::new();
    for c in contestants {
        if !seen.insert(c.name.as_str()) {
            return Err(GameError::DuplicatePlayerName(c.name.clone()));
        }
    }

    let completed = AtomicUsize::new(0);
    let records = (0..num_games)
        .into_par_iter()
        .map(|game_idx| {
            let record = play_one_game(contestants, game_idx, base_seed, target_score, alternate_seats);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(cb) = progress_callback {
                cb(done, num_games);
            }
            record
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut result = ArenaResult::new(contestants.iter().map(|c| c.name.clone()).collect(), num_games);
    for record in &records {
        result.record(record);
    }
    tracing::info!(games = num_games, rounds = result.total_rounds, "arena finished");
    Ok(result)
}

/// Play one seeded game with the given seating rule.
pub fn play_one_game(
    contestants: &[Contestant],
    game_idx: usize,
    base_seed: u64,
    target_score: i32,
    alternate_seats: bool,
) -> Result<MatchRecord, GameError> {
    let n = contestants.len();
    let seed = base_seed.wrapping_add(game_idx as u64);
    let seating: Vec<&Contestant> = if alternate_seats {
        (0..n).map(|i| &contestants[(i + game_idx) % n]).collect()
    } else {
        contestants.iter().collect()
    };

    let config = GameConfig {
        players: seating.iter().map(|c| c.name.clone()).collect(),
        strategies: seating.iter().map(|c| c.strategy).collect(),
        target_score,
        seed: Some(seed),
    };

    let t0 = Instant::now();
    let mut game = TriominoGame::from_config(&config)?;
    let result = game.play_game()?;
    let duration_ms = t0.elapsed().as_secs_f64() * 1000.0;

    Ok(MatchRecord {
        index: game_idx,
        seed,
        seats: config.players,
        result,
        duration_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::strategy::StrategyKind;

    fn pair() -> Vec<Contestant> {
        vec![
            Contestant::new("greedy", StrategyKind::Greedy),
            Contestant::new("random", StrategyKind::Random),
        ]
    }

    #[test]
    fn test_arena_counts_every_game() {
        let result = run_arena(&pair(), 4, 42, 150, true, None).unwrap();
        assert_eq!(result.num_games, 4);
        assert_eq!(result.wins.values().sum::<usize>(), 4);
        assert_eq!(result.total_scores["greedy"].len(), 4);
        assert_eq!(result.game_durations_ms.len(), 4);
        assert!(result.total_rounds >= 4);
        assert!(result.summary().contains("Arena Results (4 games)"));
    }

    #[test]
    fn test_arena_is_deterministic() {
        let a = run_arena(&pair(), 3, 7, 150, true, None).unwrap();
        let b = run_arena(&pair(), 3, 7, 150, true, None).unwrap();
        assert_eq!(a.wins, b.wins);
        assert_eq!(a.total_scores, b.total_scores);
        assert_eq!(a.total_turns, b.total_turns);
    }

    #[test]
    fn test_alternate_seats_rotates() {
        let c = pair();
        let first = play_one_game(&c, 0, 1, 100, true).unwrap();
        let second = play_one_game(&c, 1, 1, 100, true).unwrap();
        assert_eq!(first.seats, vec!["greedy", "random"]);
        assert_eq!(second.seats, vec!["random", "greedy"]);
        let fixed = play_one_game(&c, 1, 1, 100, false).unwrap();
        assert_eq!(fixed.seats, vec!["greedy", "random"]);
    }

    #[test]
    fn test_arena_rejects_bad_tables() {
        let one = vec![Contestant::new("solo", StrategyKind::Greedy)];
        assert_eq!(run_arena(&one, 1, 0, 100, false, None).err(), Some(GameError::InvalidPlayerCount(1)));
        let dup = vec![
            Contestant::new("x", StrategyKind::Greedy),
            Contestant::new("x", StrategyKind::Random),
        ];
        assert_eq!(
            run_arena(&dup, 1, 0, 100, false, None).err(),
            Some(GameError::DuplicatePlayerName("x".into()))
        );
    }

    #[test]
    fn test_confidence_interval_bounds() {
        let mut r = ArenaResult::new(vec!["a".into()], 10);
        r.wins.insert("a".into(), 10);
        let (lo, hi) = r.confidence_interval_95("a");
        assert!(lo > 0.6 && hi <= 1.0);
        assert_eq!(ArenaResult::new(vec![], 0).confidence_interval_95("a"), (0.0, 0.0));
    }
}
