//! Board state for Triominó.
//!
//! Tracks placed tiles, which placed tiles meet at every lattice point, and the
//! open frontier. All validation goes through [`Board::evaluate`], which both the
//! placement query and the commit share.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::lattice;
use super::scoring::{self, ScoreEvent};
use super::tiles::Tile;
use super::types::{PlacedTile, PlacementError, PlayerIndex, Point, Position, ValidPlacement};

/// A committed placement and the points it earned on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub placed: PlacedTile,
    pub edges_matched: usize,
    pub bridges: usize,
    pub hexagons: usize,
    /// The tile's own value.
    pub base_points: i32,
    /// Opening, bridge and hexagon awards.
    pub bonus_points: i32,
    pub events: Vec<ScoreEvent>,
}

impl Placement {
    pub fn total_points(&self) -> i32 {
        self.base_points + self.bonus_points
    }
}

/// Axis-aligned extent of the occupied cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub min_row: i32,
    pub max_row: i32,
    pub min_col: i32,
    pub max_col: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Board {
    tiles: HashMap<Position, PlacedTile>,
    history: Vec<Position>,
    corners: HashMap<Point, Vec<Position>>,
    open: BTreeSet<Position>,
    neighbors: HashMap<Position, [Position; 3]>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile_at(&self, pos: &Position) -> Option<&PlacedTile> {
        self.tiles.get(pos)
    }

    pub fn is_occupied(&self, pos: &Position) -> bool {
        self.tiles.contains_key(pos)
    }

    /// Placed tiles in the order they were laid.
    pub fn tiles(&self) -> impl Iterator<Item = &PlacedTile> + '_ {
        self.history.iter().filter_map(|p| self.tiles.get(p))
    }

    pub fn history(&self) -> &[Position] {
        &self.history
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut it = self.tiles.keys();
        let first = it.next()?;
        let mut b = Bounds {
            min_row: first.row,
            max_row: first.row,
            min_col: first.col,
            max_col: first.col,
        };
        for p in it {
            b.min_row = b.min_row.min(p.row);
            b.max_row = b.max_row.max(p.row);
            b.min_col = b.min_col.min(p.col);
            b.max_col = b.max_col.max(p.col);
        }
        Some(b)
    }

    /// Unoccupied cells sharing a side with the board, sorted. Only the origin when empty.
    pub fn open_positions(&self) -> Vec<Position> {
        if self.is_empty() {
            return vec![Position::ORIGIN];
        }
        self.open.iter().copied().collect()
    }

    /// Cells across each side of `pos`.
    pub fn neighbors_of(&self, pos: Position) -> [Position; 3] {
        match self.neighbors.get(&pos) {
            Some(n) => *n,
            None => lattice::compute_neighbors(pos),
        }
    }

    /// Value a placed tile carries at `point`, if it touches it.
    fn value_at(&self, pos: &Position, point: Point) -> Option<u8> {
        let placed = self.tiles.get(pos)?;
        let values = placed.values();
        lattice::vertices(*pos)
            .iter()
            .position(|p| *p == point)
            .map(|i| values[i])
    }

    fn corner_count(&self, point: &Point) -> usize {
        self.corners.get(point).map_or(0, Vec::len)
    }

    /// Check one candidate. Nothing is mutated.
    pub fn evaluate(
        &self,
        tile: &Tile,
        position: Position,
        rotation: u8,
    ) -> Result<ValidPlacement, PlacementError> {
        if rotation > 2 {
            return Err(PlacementError::InvalidRotation(rotation));
        }
        if self.is_occupied(&position) {
            return Err(PlacementError::Occupied(position));
        }
        if self.is_empty() {
            if position != Position::ORIGIN {
                return Err(PlacementError::NotAdjacent(position));
            }
            return Ok(ValidPlacement {
                position,
                rotation,
                edges_matched: 0,
                bridges: 0,
                hexagons: 0,
            });
        }

        let values = tile.values_at(rotation);
        let corners = lattice::vertices(position);
        let neighbors = self.neighbors_of(position);

        let mut matched = [false; 3];
        for side in 0..3 {
            if !self.is_occupied(&neighbors[side]) {
                continue;
            }
            let (a, b) = lattice::side_points(position, side);
            let expected = (
                self.value_at(&neighbors[side], a).unwrap_or_default(),
                self.value_at(&neighbors[side], b).unwrap_or_default(),
            );
            let found = tile.edge_at(rotation, side);
            if expected != found {
                return Err(PlacementError::EdgeMismatch {
                    position,
                    side,
                    expected,
                    found,
                });
            }
            matched[side] = true;
        }
        let edges_matched = matched.iter().filter(|m| **m).count();
        if edges_matched == 0 {
            return Err(PlacementError::NotAdjacent(position));
        }

        // Every tile meeting at a corner, not only edge neighbours, must agree.
        for (i, point) in corners.iter().enumerate() {
            for other in self.corners.get(point).into_iter().flatten() {
                if let Some(expected) = self.value_at(other, *point) {
                    if expected != values[i] {
                        return Err(PlacementError::VertexMismatch {
                            position,
                            point: *point,
                            expected,
                            found: values[i],
                        });
                    }
                }
            }
        }

        let hexagons = corners
            .iter()
            .filter(|p| self.corner_count(p) == 5)
            .count();

        let mut bridges = 0;
        for side in (0..3).filter(|s| matched[*s]) {
            let tip = corners[lattice::opposite_vertex(side)];
            let through_corner = self
                .corners
                .get(&tip)
                .into_iter()
                .flatten()
                .any(|p| !neighbors.contains(p));
            if through_corner {
                bridges += 1;
            }
        }

        Ok(ValidPlacement {
            position,
            rotation,
            edges_matched,
            bridges,
            hexagons,
        })
    }

    /// Every legal (position, rotation) for `tile`. The tile is not touched.
    ///
    /// Rotations showing the same values as an earlier rotation at the same
    /// position are reported once.
    pub fn find_valid_placements(&self, tile: &Tile) -> Vec<ValidPlacement> {
        let mut out = Vec::new();
        for position in self.open_positions() {
            let mut seen: Vec<[u8; 3]> = Vec::with_capacity(3);
            for rotation in 0..3u8 {
                let values = tile.values_at(rotation);
                if seen.contains(&values) {
                    continue;
                }
                seen.push(values);
                if let Ok(vp) = self.evaluate(tile, position, rotation) {
                    out.push(vp);
                }
            }
        }
        out
    }

    pub fn has_valid_placement(&self, tile: &Tile) -> bool {
        self.open_positions().into_iter().any(|position| {
            (0..3u8).any(|rotation| self.evaluate(tile, position, rotation).is_ok())
        })
    }

    /// Validate again and commit. On error the board is unchanged.
    pub fn place_tile(
        &mut self,
        tile: &Tile,
        position: Position,
        rotation: u8,
        owner: PlayerIndex,
    ) -> Result<Placement, PlacementError> {
        let vp = self.evaluate(tile, position, rotation)?;
        let (bonus_points, events) = scoring::placement_bonus(vp.bridges, vp.hexagons);
        let placed = self.insert(tile.with_rotation(rotation), position, owner);
        Ok(Placement {
            placed,
            edges_matched: vp.edges_matched,
            bridges: vp.bridges,
            hexagons: vp.hexagons,
            base_points: tile.sum_value(),
            bonus_points,
            events,
        })
    }

    /// Lay the opening tile at the origin with the flat opening award.
    pub fn place_first_tile(
        &mut self,
        tile: &Tile,
        owner: PlayerIndex,
        is_triple: bool,
    ) -> Result<Placement, PlacementError> {
        if !self.is_empty() {
            return Err(PlacementError::BoardNotEmpty);
        }
        let (total, event) = scoring::opening_score(tile, is_triple);
        let base_points = tile.sum_value();
        let placed = self.insert(tile.with_rotation(0), Position::ORIGIN, owner);
        Ok(Placement {
            placed,
            edges_matched: 0,
            bridges: 0,
            hexagons: 0,
            base_points,
            bonus_points: total - base_points,
            events: vec![event],
        })
    }

    fn insert(&mut self, tile: Tile, position: Position, owner: PlayerIndex) -> PlacedTile {
        let placed = PlacedTile {
            tile,
            position,
            owner,
        };
        let neighbors = self.neighbors_of(position);
        self.tiles.insert(position, placed);
        self.history.push(position);
        for point in lattice::vertices(position) {
            self.corners.entry(point).or_default().push(position);
        }
        self.open.remove(&position);
        self.neighbors.insert(position, neighbors);
        for n in neighbors {
            if !self.tiles.contains_key(&n) {
                self.open.insert(n);
                self.neighbors
                    .entry(n)
                    .or_insert_with(|| lattice::compute_neighbors(n));
            }
        }
        placed
    }

    /// Put a tile down without any rule checks.
    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, tile: Tile, position: Position, owner: PlayerIndex) {
        self.insert(tile, position, owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Five tiles around the lattice point (1, 2), all showing 5 there, with the
    /// sixth cell Up(2, 0) still open.
    fn hexagon_board() -> Board {
        let mut board = Board::new();
        board.place_first_tile(&Tile::new(0, 1, 2), 0, false).unwrap();
        board.place_tile(&Tile::new(1, 2, 5), Position::down(0, 0), 1, 1).unwrap();
        board.place_tile(&Tile::new(0, 2, 5), Position::up(1, 0), 2, 0).unwrap();
        board.place_tile(&Tile::new(1, 3, 5), Position::up(1, -1), 0, 1).unwrap();
        board.place_tile(&Tile::new(0, 4, 5), Position::down(1, 0), 2, 0).unwrap();
        board.place_tile(&Tile::new(2, 3, 5), Position::down(1, -1), 0, 1).unwrap();
        board
    }

    #[test]
    fn test_empty_board_opens_at_origin() {
        let board = Board::new();
        assert_eq!(board.open_positions(), vec![Position::ORIGIN]);
        let placements = board.find_valid_placements(&Tile::new(1, 2, 3));
        assert_eq!(placements.len(), 3);
        assert!(placements.iter().all(|p| p.position == Position::ORIGIN));
        assert_eq!(
            board.find_valid_placements(&Tile::new(4, 4, 4)).len(),
            1,
            "identical rotations collapse"
        );
    }

    #[test]
    fn test_first_tile_opens_three_sides() {
        let mut board = Board::new();
        let placement = board.place_first_tile(&Tile::new(2, 2, 2), 0, true).unwrap();
        assert_eq!(placement.total_points(), 16);
        assert_eq!(board.len(), 1);
        assert_eq!(
            board.open_positions(),
            vec![Position::down(-1, -1), Position::down(-1, 0), Position::down(0, 0)]
        );
        assert_eq!(
            board.place_first_tile(&Tile::new(3, 3, 3), 0, true),
            Err(PlacementError::BoardNotEmpty)
        );
    }

    #[test]
    fn test_edge_match_is_same_direction() {
        let mut board = Board::new();
        board.place_first_tile(&Tile::new(0, 1, 2), 0, false).unwrap();
        // Down(0,0) shares the side running from value 1 to value 2.
        let tile = Tile::new(1, 2, 5);
        let ok = board.evaluate(&tile, Position::down(0, 0), 1).unwrap();
        assert_eq!(ok.edges_matched, 1);
        assert!(matches!(
            board.evaluate(&tile, Position::down(0, 0), 0),
            Err(PlacementError::EdgeMismatch { side: 1, expected: (1, 2), .. })
        ));
        // The mirrored tile shows (2, 1) along that side.
        let reversed = Tile::new(2, 1, 5);
        assert!(board.evaluate(&reversed, Position::down(0, 0), 1).is_err());
    }

    #[test]
    fn test_rejects_occupied_and_disconnected() {
        let mut board = Board::new();
        board.place_first_tile(&Tile::new(0, 1, 2), 0, false).unwrap();
        let tile = Tile::new(3, 4, 5);
        assert_eq!(
            board.evaluate(&tile, Position::ORIGIN, 0),
            Err(PlacementError::Occupied(Position::ORIGIN))
        );
        let far = Position::up(6, 6);
        assert_eq!(
            board.evaluate(&tile, far, 0),
            Err(PlacementError::NotAdjacent(far))
        );
        assert_eq!(
            board.evaluate(&tile, Position::down(0, 0), 3),
            Err(PlacementError::InvalidRotation(3))
        );
    }

    #[test]
    fn test_failed_placement_leaves_board_untouched() {
        let mut board = Board::new();
        board.place_first_tile(&Tile::new(0, 1, 2), 0, false).unwrap();
        let before_open = board.open_positions();
        let tile = Tile::new(3, 4, 5);
        let first = board.place_tile(&tile, Position::down(0, 0), 0, 1);
        let second = board.place_tile(&tile, Position::down(0, 0), 0, 1);
        assert!(first.is_err());
        assert_eq!(first, second);
        assert_eq!(board.len(), 1);
        assert_eq!(board.open_positions(), before_open);
    }

    #[test]
    fn test_placed_copy_is_frozen() {
        let mut board = Board::new();
        board.place_first_tile(&Tile::new(0, 1, 2), 0, false).unwrap();
        let mut tile = Tile::new(1, 2, 5);
        let placement = board.place_tile(&tile, Position::down(0, 0), 1, 1).unwrap();
        tile.rotate(2);
        let placed = board.tile_at(&Position::down(0, 0)).unwrap();
        assert_eq!(placed.values(), [5, 1, 2]);
        assert_eq!(placed.rotation(), 1);
        assert_eq!(placed.edge(1), (1, 2));
        assert_eq!(placement.placed, *placed);
        assert_eq!(tile.values(), [2, 5, 1]);
    }

    #[test]
    fn test_hexagon_detected_for_sixth_tile() {
        let board = hexagon_board();
        let tile = Tile::new(2, 4, 5);
        let at_gap: Vec<_> = board
            .find_valid_placements(&tile)
            .into_iter()
            .filter(|p| p.position == Position::up(2, 0))
            .collect();
        assert_eq!(at_gap.len(), 1);
        assert_eq!(at_gap[0].rotation, 1);
        assert_eq!(at_gap[0].hexagons, 1);
        assert_eq!(at_gap[0].edges_matched, 2);
        assert_eq!(at_gap[0].bridges, 0);
        assert!(board.evaluate(&tile, Position::up(2, 0), 0).is_err());
        assert!(board.evaluate(&tile, Position::up(2, 0), 2).is_err());

        let mut board = board;
        let placement = board.place_tile(&tile, Position::up(2, 0), 1, 0).unwrap();
        assert_eq!(placement.total_points(), 11 + 50);
    }

    #[test]
    fn test_hexagon_needs_five_existing() {
        let mut board = Board::new();
        board.place_first_tile(&Tile::new(0, 1, 2), 0, false).unwrap();
        board.place_tile(&Tile::new(1, 2, 5), Position::down(0, 0), 1, 1).unwrap();
        board.place_tile(&Tile::new(0, 2, 5), Position::up(1, 0), 2, 0).unwrap();
        let vp = board.evaluate(&Tile::new(1, 3, 5), Position::up(1, -1), 0).unwrap();
        assert_eq!(vp.hexagons, 0);
    }

    /// Every lattice point carries one fixed value, so any set of tiles cut
    /// from this pattern agrees at every corner and edge.
    fn painted(point: Point) -> u8 {
        (point.x + 3 * point.y).rem_euclid(6) as u8
    }

    fn painted_tile(position: Position) -> Tile {
        let [a, b, c] = lattice::vertices(position).map(painted);
        Tile::new(a, b, c)
    }

    #[test]
    fn test_double_hexagon_scores_once() {
        let gap = Position::up(2, 0);
        let [apex, _, right] = lattice::vertices(gap);
        let mut board = Board::new();
        for point in [apex, right] {
            for pos in lattice::positions_around(point) {
                if pos != gap && !board.is_occupied(&pos) {
                    board.insert_unchecked(painted_tile(pos), pos, 1);
                }
            }
        }
        assert_eq!(board.len(), 9);

        let tile = painted_tile(gap);
        assert_eq!(tile.base(), [1, 3, 5]);
        let vp = board.evaluate(&tile, gap, 0).unwrap();
        assert_eq!(vp.hexagons, 2);
        assert_eq!(vp.edges_matched, 3);

        let placement = board.place_tile(&tile, gap, 0, 0).unwrap();
        assert_eq!(placement.hexagons, 2);
        assert_eq!(placement.bonus_points, 100);
        assert_eq!(placement.events.len(), 1);
        assert_eq!(placement.events[0].kind, scoring::ScoreType::DoubleHexagon);
        assert_eq!(placement.events[0].points, 100);
        assert_eq!(placement.total_points(), 9 + 100);
    }

    #[test]
    fn test_bridge_through_corner() {
        let mut board = Board::new();
        board.place_first_tile(&Tile::new(0, 1, 2), 0, false).unwrap();
        let candidate = Tile::new(1, 2, 5);

        let plain = board.evaluate(&candidate, Position::down(0, 0), 1).unwrap();
        assert_eq!(plain.bridges, 0);

        // A tile below whose apex sits on the candidate's far corner and shows 5.
        let mut bridged = board.clone();
        bridged.insert_unchecked(Tile::new(0, 3, 5).with_rotation(1), Position::up(2, 0), 1);
        let vp = bridged.evaluate(&candidate, Position::down(0, 0), 1).unwrap();
        assert_eq!(vp.bridges, 1);
        assert_eq!(vp.edges_matched, 1);
        let placement = bridged
            .place_tile(&candidate, Position::down(0, 0), 1, 0)
            .unwrap();
        assert_eq!(placement.total_points(), 8 + 40);

        // Same corner carrying a different value is a vertex mismatch.
        let mut clash = board.clone();
        clash.insert_unchecked(Tile::new(0, 3, 4).with_rotation(1), Position::up(2, 0), 1);
        assert!(matches!(
            clash.evaluate(&candidate, Position::down(0, 0), 1),
            Err(PlacementError::VertexMismatch { expected: 4, found: 5, .. })
        ));
        assert!(clash
            .find_valid_placements(&candidate)
            .iter()
            .all(|p| p.position != Position::down(0, 0)));
    }

    #[test]
    fn test_tiles_iterate_in_placement_order() {
        let board = hexagon_board();
        let order: Vec<_> = board.tiles().map(|t| t.position).collect();
        assert_eq!(order, board.history());
        assert_eq!(order[0], Position::ORIGIN);
        assert_eq!(order.len(), 6);
    }

    #[test]
    fn test_bounds() {
        assert_eq!(Board::new().bounds(), None);
        let b = hexagon_board().bounds().unwrap();
        assert_eq!((b.min_row, b.max_row, b.min_col, b.max_col), (0, 1, -1, 0));
    }

    #[test]
    fn test_has_valid_placement_agrees_with_query() {
        let board = hexagon_board();
        for tile in crate::games::triomino::tiles::canonical_tiles() {
            assert_eq!(
                board.has_valid_placement(tile),
                !board.find_valid_placements(tile).is_empty(),
                "{tile}"
            );
        }
    }
}
