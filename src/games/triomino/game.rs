//! Turn, round and game flow for Triominó.
//!
//! A round deals fresh hands, lays the opening tile, then loops turns until a
//! hand empties or nobody can move. Reaching the target score arms a final
//! round; the game ends when that round closes.

use serde::Serialize;

use crate::engine::models::GameConfig;
use crate::engine::strategy::Strategy;

use super::board::Board;
use super::player::{starting_player, Player};
use super::scoring::{self, ScoreEvent, MAX_DRAWS_PER_TURN};
use super::tiles::{Deck, Tile};
use super::types::{GameError, Move, PlacedTile, PlayerIndex, Position, ValidPlacement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnAction {
    Place,
    Draw,
    Pass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnResult {
    pub player: PlayerIndex,
    pub action: TurnAction,
    pub placed: Option<PlacedTile>,
    pub tiles_drawn: u32,
    pub points: i32,
    pub events: Vec<ScoreEvent>,
    /// False when the action was refused; nothing changed in that case.
    pub success: bool,
    pub message: String,
}

impl TurnResult {
    pub(crate) fn rejected(player: PlayerIndex, action: TurnAction, tiles_drawn: u32, message: String) -> Self {
        Self {
            player,
            action,
            placed: None,
            tiles_drawn,
            points: 0,
            events: Vec::new(),
            success: false,
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundEndReason {
    EmptiedHand,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundResult {
    pub round: u32,
    pub winner: PlayerIndex,
    pub reason: RoundEndReason,
    pub bonus: i32,
    pub events: Vec<ScoreEvent>,
    pub scores: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameResult {
    pub winner: PlayerIndex,
    pub winner_name: String,
    pub rounds_played: u32,
    pub turns_played: u32,
    /// (name, score) in seat order.
    pub final_scores: Vec<(String, i32)>,
}

/// Fully committed view of the game for renderers and logs.
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub round: u32,
    pub current_player: String,
    pub board: Vec<SnapshotTile>,
    pub pool_remaining: usize,
    pub is_final_round: bool,
    pub scores: Vec<(String, i32)>,
    pub hand_sizes: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotTile {
    pub position: Position,
    pub values: [u8; 3],
    pub owner: PlayerIndex,
}

fn resolve_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(s) => s,
        None => {
            let s = rand::random::<u64>();
            tracing::info!(seed = s, "no seed configured, drew one");
            s
        }
    }
}

pub struct TriominoGame {
    pub players: Vec<Player>,
    pub board: Board,
    pub pool: Deck,
    pub current_player: PlayerIndex,
    pub round_number: u32,
    pub target_score: i32,
    pub seed: u64,
    pub is_final_round: bool,
    pub final_round_triggered: bool,
    pub game_over: bool,
    pub turns_played: u32,
    strategies: Vec<Box<dyn Strategy>>,
}

impl TriominoGame {
    pub fn new(config: &GameConfig, strategies: Vec<Box<dyn Strategy>>) -> Result<Self, GameError> {
        scoring::initial_tile_count(config.players.len())?;
        if strategies.len() != config.players.len() {
            return Err(GameError::StrategyCountMismatch {
                players: config.players.len(),
                strategies: strategies.len(),
            });
        }
        Ok(Self {
            players: config.players.iter().map(Player::new).collect(),
            board: Board::new(),
            pool: Deck::default(),
            current_player: 0,
            round_number: 0,
            target_score: config.target_score,
            seed: resolve_seed(config.seed),
            is_final_round: false,
            final_round_triggered: false,
            game_over: false,
            turns_played: 0,
            strategies,
        })
    }

    /// Build with the strategies named in the config. Seat `i` seeds its strategy with `seed + i`.
    pub fn from_config(config: &GameConfig) -> Result<Self, GameError> {
        scoring::initial_tile_count(config.players.len())?;
        let mut config = config.clone();
        let seed = resolve_seed(config.seed);
        config.seed = Some(seed);
        let strategies = config
            .strategy_kinds()
            .iter()
            .enumerate()
            .map(|(i, k)| k.build(seed.wrapping_add(i as u64)))
            .collect();
        Self::new(&config, strategies)
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, seat: PlayerIndex) -> Result<&Player, GameError> {
        self.players.get(seat).ok_or(GameError::UnknownPlayer(seat))
    }

    pub fn strategy_name(&self, seat: PlayerIndex) -> Option<&str> {
        self.strategies.get(seat).map(|s| s.name())
    }

    /// Fresh pool, empty board, new hands. Scores carry over.
    pub fn setup_round(&mut self) -> Result<(), GameError> {
        let per_player = scoring::initial_tile_count(self.players.len())?;
        self.round_number += 1;
        self.pool = Deck::shuffled(self.seed.wrapping_add(self.round_number as u64));
        self.board = Board::new();
        for player in &mut self.players {
            player.reset_for_new_round();
        }
        for player in &mut self.players {
            player.draw_from(&mut self.pool, per_player);
        }
        tracing::debug!(
            round = self.round_number,
            pool = self.pool.remaining(),
            "round dealt"
        );
        Ok(())
    }

    /// Lay the opening tile for whoever holds the best triple (or best tile).
    pub fn play_opening(&mut self) -> Result<TurnResult, GameError> {
        let (seat, tile, has_triple) =
            starting_player(&self.players).ok_or(GameError::NoOpeningTile)?;
        self.current_player = seat;
        let placement = self.board.place_first_tile(&tile, seat, has_triple)?;
        let player = &mut self.players[seat];
        player.remove_tile(&tile);
        let points = placement.total_points();
        player.add_score(points);
        tracing::debug!(
            round = self.round_number,
            player = %player.name,
            %tile,
            points,
            "opening"
        );
        Ok(TurnResult {
            player: seat,
            action: TurnAction::Place,
            placed: Some(placement.placed),
            tiles_drawn: 0,
            points,
            events: placement.events,
            success: true,
            message: format!("{} opens with {}", player.name, tile),
        })
    }

    /// Ask the seat's strategy for a move.
    pub fn find_move(&mut self, seat: PlayerIndex) -> Option<Move> {
        let player = self.players.get(seat)?;
        self.strategies.get_mut(seat)?.choose_move(player, &self.board)
    }

    pub fn can_player_move(&self, seat: PlayerIndex) -> bool {
        self.players
            .get(seat)
            .is_some_and(|p| p.hand.iter().any(|t| self.board.has_valid_placement(t)))
    }

    /// Draw one tile for `seat`. Returns 0 when the pool is empty.
    pub fn execute_draw(&mut self, seat: PlayerIndex) -> Result<u32, GameError> {
        let player = self
            .players
            .get_mut(seat)
            .ok_or(GameError::UnknownPlayer(seat))?;
        Ok(player.draw_from(&mut self.pool, 1) as u32)
    }

    /// Place `tile` from `seat`'s hand. A refused placement returns `success == false`
    /// and leaves hand, score and board as they were.
    ///
    /// The held copy is laid, turned by `placement.rotation`. The values of the
    /// `tile` argument only identify which tile; a mirror image of a held tile
    /// cannot be laid through it.
    pub fn execute_place(
        &mut self,
        seat: PlayerIndex,
        tile: &Tile,
        placement: &ValidPlacement,
        draws_made: u32,
    ) -> Result<TurnResult, GameError> {
        let player = self
            .players
            .get_mut(seat)
            .ok_or(GameError::UnknownPlayer(seat))?;
        let Some(tile) = player.hand.iter().find(|t| *t == tile).copied() else {
            return Ok(TurnResult::rejected(
                seat,
                TurnAction::Place,
                draws_made,
                format!("{} does not hold {}", player.name, tile),
            ));
        };
        let placed = match self
            .board
            .place_tile(&tile, placement.position, placement.rotation, seat)
        {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(player = %player.name, %tile, error = %e, "placement refused");
                return Ok(TurnResult::rejected(
                    seat,
                    TurnAction::Place,
                    draws_made,
                    e.to_string(),
                ));
            }
        };
        player.remove_tile(&tile);
        let (points, events) = scoring::placement_score(&placed, draws_made);
        player.add_score(points);
        tracing::debug!(
            player = %player.name,
            %tile,
            position = %placement.position,
            bridges = placed.bridges,
            hexagons = placed.hexagons,
            points,
            "placed"
        );
        Ok(TurnResult {
            player: seat,
            action: TurnAction::Place,
            placed: Some(placed.placed),
            tiles_drawn: draws_made,
            points,
            events,
            success: true,
            message: format!("{} places {}", player.name, tile),
        })
    }

    /// Close a turn with no play: the draw penalty after drawing, else the pass penalty.
    pub fn end_turn_without_play(
        &mut self,
        seat: PlayerIndex,
        draws_made: u32,
    ) -> Result<TurnResult, GameError> {
        let player = self
            .players
            .get_mut(seat)
            .ok_or(GameError::UnknownPlayer(seat))?;
        let (action, event, message) = if draws_made > 0 {
            (
                TurnAction::Draw,
                scoring::draw_failure_penalty(draws_made),
                format!("{} drew {} but can't play", player.name, draws_made),
            )
        } else {
            (
                TurnAction::Pass,
                scoring::pass_penalty(),
                format!("{} passes", player.name),
            )
        };
        player.add_score(event.points);
        tracing::debug!(player = %player.name, draws = draws_made, points = event.points, "no play");
        Ok(TurnResult {
            player: seat,
            action,
            placed: None,
            tiles_drawn: draws_made,
            points: event.points,
            events: vec![event],
            success: true,
            message,
        })
    }

    /// Let the current player's strategy play, drawing up to three times when stuck.
    pub fn play_turn(&mut self) -> Result<TurnResult, GameError> {
        let seat = self.current_player;
        let mut draws = 0u32;
        self.turns_played += 1;
        loop {
            if let Some(mv) = self.find_move(seat) {
                return self.execute_place(seat, &mv.tile, &mv.placement, draws);
            }
            if !self.pool.is_empty() && draws < MAX_DRAWS_PER_TURN {
                draws += self.execute_draw(seat)?;
                continue;
            }
            break;
        }
        self.end_turn_without_play(seat, draws)
    }

    pub fn next_player(&mut self) {
        self.current_player = (self.current_player + 1) % self.players.len();
    }

    /// Close the round if the current player emptied their hand or nobody can move.
    /// Applies the winner's bonus.
    pub fn check_round_end(&mut self) -> Option<RoundResult> {
        let seat = self.current_player;
        if self.players.get(seat)?.has_empty_hand() {
            let opponents: Vec<i32> = self
                .players
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != seat)
                .map(|(_, p)| p.hand_value())
                .collect();
            let (bonus, events) = scoring::round_win_bonus(&opponents);
            self.players[seat].add_score(bonus);
            return Some(self.round_result(seat, RoundEndReason::EmptiedHand, bonus, events));
        }
        if self.pool.is_empty() && !(0..self.players.len()).any(|i| self.can_player_move(i)) {
            return Some(self.resolve_blocked());
        }
        None
    }

    /// Lowest hand wins the difference to every other hand.
    fn resolve_blocked(&mut self) -> RoundResult {
        let values: Vec<i32> = self.players.iter().map(Player::hand_value).collect();
        let winner = scoring::blocked_winner(&values).unwrap_or_default();
        let opponents: Vec<i32> = values
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != winner)
            .map(|(_, v)| *v)
            .collect();
        let event = scoring::blocked_win_bonus(values[winner], &opponents);
        let bonus = event.points;
        self.players[winner].add_score(bonus);
        self.round_result(winner, RoundEndReason::Blocked, bonus, vec![event])
    }

    fn round_result(
        &self,
        winner: PlayerIndex,
        reason: RoundEndReason,
        bonus: i32,
        events: Vec<ScoreEvent>,
    ) -> RoundResult {
        tracing::info!(
            round = self.round_number,
            winner = %self.players[winner].name,
            ?reason,
            bonus,
            "round over"
        );
        RoundResult {
            round: self.round_number,
            winner,
            reason,
            bonus,
            events,
            scores: self.players.iter().map(|p| p.score).collect(),
        }
    }

    /// True once anyone has reached the target score.
    pub fn check_game_end(&self) -> bool {
        let scores: Vec<i32> = self.players.iter().map(|p| p.score).collect();
        scoring::first_to_reach_target(&scores, self.target_score).is_some()
    }

    /// Play one full round.
    ///
    /// Passes and refused placements count as turns without progress; after
    /// twice the player count in a row the round is resolved as blocked.
    pub fn play_round(&mut self) -> Result<RoundResult, GameError> {
        self.setup_round()?;
        self.play_opening()?;
        if let Some(result) = self.check_round_end() {
            return Ok(result);
        }
        self.next_player();

        let max_stalled = self.players.len() * 2;
        let mut stalled = 0;
        loop {
            let turn = self.play_turn()?;
            if turn.action == TurnAction::Pass || !turn.success {
                stalled += 1;
                if stalled >= max_stalled {
                    break;
                }
            } else {
                stalled = 0;
            }
            if let Some(result) = self.check_round_end() {
                return Ok(result);
            }
            self.next_player();
        }
        tracing::warn!(round = self.round_number, stalled, "no progress, forcing blocked round");
        Ok(self.resolve_blocked())
    }

    /// Play rounds until the armed final round has been completed.
    pub fn play_game(&mut self) -> Result<GameResult, GameError> {
        while !self.game_over {
            if self.final_round_triggered {
                self.is_final_round = true;
            }
            self.play_round()?;
            if self.is_final_round {
                self.game_over = true;
                break;
            }
            if self.check_game_end() {
                tracing::info!(round = self.round_number, "target reached, next round is the last");
                self.final_round_triggered = true;
            }
        }
        let scores: Vec<i32> = self.players.iter().map(|p| p.score).collect();
        let winner = scoring::final_winner(&scores).unwrap_or_default();
        let result = GameResult {
            winner,
            winner_name: self.players[winner].name.clone(),
            rounds_played: self.round_number,
            turns_played: self.turns_played,
            final_scores: self
                .players
                .iter()
                .map(|p| (p.name.clone(), p.score))
                .collect(),
        };
        tracing::info!(
            winner = %result.winner_name,
            rounds = result.rounds_played,
            turns = result.turns_played,
            "game over"
        );
        Ok(result)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            round: self.round_number,
            current_player: self
                .players
                .get(self.current_player)
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            board: self
                .board
                .tiles()
                .map(|t| SnapshotTile {
                    position: t.position,
                    values: t.values(),
                    owner: t.owner,
                })
                .collect(),
            pool_remaining: self.pool.remaining(),
            is_final_round: self.is_final_round,
            scores: self.players.iter().map(|p| (p.name.clone(), p.score)).collect(),
            hand_sizes: self
                .players
                .iter()
                .map(|p| (p.name.clone(), p.hand_size()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::strategy::StrategyKind;

    fn config(players: usize, seed: u64) -> GameConfig {
        GameConfig {
            players: (0..players).map(|i| format!("P{i}")).collect(),
            strategies: Vec::new(),
            target_score: 400,
            seed: Some(seed),
        }
    }

    fn game(players: usize, seed: u64) -> TriominoGame {
        TriominoGame::from_config(&config(players, seed)).unwrap()
    }

    #[test]
    fn test_player_count_validated() {
        assert_eq!(
            TriominoGame::from_config(&config(1, 0)).err(),
            Some(GameError::InvalidPlayerCount(1))
        );
        assert_eq!(
            TriominoGame::from_config(&config(7, 0)).err(),
            Some(GameError::InvalidPlayerCount(7))
        );
        let mut cfg = config(3, 0);
        cfg.strategies = vec![StrategyKind::Greedy; 2];
        assert_eq!(
            TriominoGame::from_config(&cfg).err(),
            Some(GameError::StrategyCountMismatch { players: 3, strategies: 2 })
        );
    }

    #[test]
    fn test_deal_sizes() {
        for (n, per) in [(2, 9), (3, 7), (4, 7), (5, 6), (6, 6)] {
            let mut g = game(n, 5);
            g.setup_round().unwrap();
            assert!(g.players.iter().all(|p| p.hand_size() == per));
            assert_eq!(g.pool.remaining(), 56 - n * per);
            assert_eq!(g.round_number, 1);
        }
    }

    #[test]
    fn test_round_seed_follows_round_number() {
        let mut a = game(2, 10);
        a.setup_round().unwrap();
        a.setup_round().unwrap();
        let mut b = game(2, 11);
        b.setup_round().unwrap();
        assert_eq!(a.players[0].hand, b.players[0].hand);
        assert_eq!(a.pool.tiles(), b.pool.tiles());
    }

    #[test]
    fn test_opening_places_at_origin_and_scores() {
        let mut g = game(2, 42);
        g.setup_round().unwrap();
        let turn = g.play_opening().unwrap();
        let placed = turn.placed.unwrap();
        assert_eq!(placed.position, Position::ORIGIN);
        assert_eq!(g.board.len(), 1);
        assert_eq!(g.players[turn.player].hand_size(), 8);
        assert_eq!(g.players[turn.player].score, turn.points);
    }

    #[test]
    fn test_refused_place_changes_nothing() {
        let mut g = game(2, 42);
        g.setup_round().unwrap();
        g.play_opening().unwrap();
        let seat = 1 - g.current_player;
        let tile = g.players[seat].hand[0];
        let bogus = ValidPlacement {
            position: Position::up(9, 9),
            rotation: 0,
            edges_matched: 1,
            bridges: 0,
            hexagons: 0,
        };
        let before = (g.players[seat].clone(), g.board.len());
        let first = g.execute_place(seat, &tile, &bogus, 0).unwrap();
        let second = g.execute_place(seat, &tile, &bogus, 0).unwrap();
        assert!(!first.success);
        assert_eq!(first, second);
        assert_eq!((g.players[seat].clone(), g.board.len()), before);
    }

    #[test]
    fn test_place_requires_tile_in_hand() {
        let mut g = game(2, 42);
        g.setup_round().unwrap();
        g.play_opening().unwrap();
        let seat = g.current_player;
        let foreign = g.players[1 - seat].hand[0];
        let vp = ValidPlacement {
            position: Position::down(0, 0),
            rotation: 0,
            edges_matched: 1,
            bridges: 0,
            hexagons: 0,
        };
        let turn = g.execute_place(seat, &foreign, &vp, 0).unwrap();
        assert!(!turn.success);
        assert!(turn.message.contains("does not hold"));
    }

    #[test]
    fn test_mirror_of_held_tile_is_refused() {
        let mut g = game(2, 1);
        g.board.place_first_tile(&Tile::new(0, 1, 2), 0, false).unwrap();
        let held = Tile::new(0, 2, 3);
        g.players[1].hand = vec![held];
        let gap = Position::down(-1, 0);
        assert!(g
            .board
            .find_valid_placements(&held)
            .iter()
            .all(|p| p.position != gap));

        // Same tile by value set, wound the other way round.
        let mirror = Tile::new(2, 0, 3);
        assert_eq!(mirror, held);
        let vp = g.board.evaluate(&mirror, gap, 0).unwrap();

        let turn = g.execute_place(1, &mirror, &vp, 0).unwrap();
        assert!(!turn.success);
        assert!(!g.board.is_occupied(&gap));
        assert_eq!(g.board.len(), 1);
        assert_eq!(g.players[1].hand, vec![held]);
        assert_eq!(g.players[1].score, 0);
    }

    #[test]
    fn test_place_lays_held_copy() {
        let mut g = game(2, 1);
        g.board.place_first_tile(&Tile::new(0, 1, 2), 0, false).unwrap();
        let held = Tile::new(1, 2, 5);
        g.players[1].hand = vec![held];
        let vp = g.board.evaluate(&held, Position::down(0, 0), 1).unwrap();

        // The caller's copy may carry any rotation; only `vp.rotation` counts.
        let turn = g.execute_place(1, &held.with_rotation(2), &vp, 0).unwrap();
        assert!(turn.success, "{}", turn.message);
        let placed = g.board.tile_at(&Position::down(0, 0)).unwrap();
        assert_eq!(placed.values(), [5, 1, 2]);
        assert_eq!(placed.tile.base(), held.base());
        assert!(g.players[1].has_empty_hand());
    }

    #[test]
    fn test_unknown_seat() {
        let mut g = game(2, 1);
        assert_eq!(g.execute_draw(5), Err(GameError::UnknownPlayer(5)));
        assert!(!g.can_player_move(5));
    }

    #[test]
    fn test_pass_with_empty_pool_costs_ten() {
        let mut g = game(2, 3);
        g.board.place_first_tile(&Tile::new(0, 1, 2), 0, false).unwrap();
        g.current_player = 1;
        g.players[1].hand.push(Tile::new(5, 5, 5));
        let turn = g.play_turn().unwrap();
        assert_eq!(turn.action, TurnAction::Pass);
        assert_eq!(turn.points, -10);
        assert_eq!(g.players[1].score, -10);
        assert_eq!(g.players[1].hand_size(), 1);
    }

    #[test]
    fn test_partial_draws_then_stuck() {
        let mut g = game(2, 3);
        g.board.place_first_tile(&Tile::new(0, 1, 2), 0, false).unwrap();
        g.current_player = 1;
        g.pool = Deck::from_tiles(vec![Tile::new(4, 4, 5), Tile::new(3, 4, 4)]);
        g.players[1].hand.push(Tile::new(5, 5, 5));
        let turn = g.play_turn().unwrap();
        assert_eq!(turn.action, TurnAction::Draw);
        assert_eq!(turn.tiles_drawn, 2);
        assert_eq!(turn.points, -10);
        assert_eq!(g.players[1].hand_size(), 3);
    }

    #[test]
    fn test_draw_penalty_comes_off_the_placement() {
        let mut g = game(2, 3);
        g.board.place_first_tile(&Tile::new(0, 1, 2), 0, false).unwrap();
        g.current_player = 1;
        // Drawn last-first: 4-4-5 misses, then 1-2-5 fits against the origin.
        g.pool = Deck::from_tiles(vec![Tile::new(1, 2, 5), Tile::new(4, 4, 5)]);
        g.players[1].hand.push(Tile::new(5, 5, 5));
        let turn = g.play_turn().unwrap();
        assert!(turn.success);
        assert_eq!(turn.action, TurnAction::Place);
        assert_eq!(turn.tiles_drawn, 2);
        assert_eq!(turn.points, 8 - 10);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut g = game(3, 9);
        g.setup_round().unwrap();
        g.play_opening().unwrap();
        let snap = g.snapshot();
        assert_eq!(snap.round, 1);
        assert_eq!(snap.board.len(), 1);
        assert_eq!(snap.pool_remaining, 56 - 21);
        assert_eq!(snap.hand_sizes.iter().map(|(_, n)| n).sum::<usize>(), 20);
        assert!(serde_json::to_string(&snap).unwrap().contains("\"round\":1"));
    }

    #[test]
    fn test_full_game_finishes() {
        let mut g = game(2, 2024);
        let result = g.play_game().unwrap();
        assert!(g.game_over);
        assert!(g.is_final_round);
        assert!(g.final_round_triggered);
        assert!(result.rounds_played >= 2);
        let top = result.final_scores.iter().map(|(_, s)| *s).max().unwrap();
        assert_eq!(result.final_scores[result.winner].1, top);
    }
}
