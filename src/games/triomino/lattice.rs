//! Triangular lattice geometry.
//!
//! Every position maps to three integer lattice points, so coincident corners
//! compare exactly. For a position at (row, col) let `x0 = 2*col + (row mod 2)`:
//!
//! ```text
//!   Up:    v0 = (x0+1, row)    v1 = (x0, row+1)    v2 = (x0+2, row+1)
//!   Down:  v0 = (x0+1, row+2)  v1 = (x0, row+1)    v2 = (x0+2, row+1)
//! ```
//!
//! Side `k` runs from `v_k` to `v_(k+1) mod 3`. Two triangles sharing a side walk
//! it in the same direction, so matching edges compare as equal pairs.

use super::types::{Orientation, Point, Position};

const ORIENTATIONS: [Orientation; 2] = [Orientation::Up, Orientation::Down];

fn x0(pos: Position) -> i32 {
    2 * pos.col + pos.row.rem_euclid(2)
}

/// The three corners of a position in vertex order.
pub fn vertices(pos: Position) -> [Point; 3] {
    let x = x0(pos);
    let r = pos.row;
    match pos.orientation {
        Orientation::Up => [
            Point::new(x + 1, r),
            Point::new(x, r + 1),
            Point::new(x + 2, r + 1),
        ],
        Orientation::Down => [
            Point::new(x + 1, r + 2),
            Point::new(x, r + 1),
            Point::new(x + 2, r + 1),
        ],
    }
}

/// Start and end point of side `side`.
pub fn side_points(pos: Position, side: usize) -> (Point, Point) {
    let v = vertices(pos);
    (v[side % 3], v[(side + 1) % 3])
}

/// Index of the corner not touching `side`.
pub fn opposite_vertex(side: usize) -> usize {
    (side + 2) % 3
}

/// The positions across each side, indexed by side.
///
/// Searches the surrounding 3x5 window of cells and keeps the triangle holding
/// both endpoints of each side.
pub fn compute_neighbors(pos: Position) -> [Position; 3] {
    let mut neighbors = [pos; 3];
    for (side, slot) in neighbors.iter_mut().enumerate() {
        let (a, b) = side_points(pos, side);
        'search: for row in pos.row - 1..=pos.row + 1 {
            for col in pos.col - 2..=pos.col + 2 {
                for orientation in ORIENTATIONS {
                    let candidate = Position::new(row, col, orientation);
                    if candidate == pos {
                        continue;
                    }
                    let corners = vertices(candidate);
                    if corners.contains(&a) && corners.contains(&b) {
                        *slot = candidate;
                        break 'search;
                    }
                }
            }
        }
    }
    neighbors
}

/// True when the two triangles share a full side.
pub fn are_adjacent(a: Position, b: Position) -> bool {
    let va = vertices(a);
    let vb = vertices(b);
    a != b && va.iter().filter(|p| vb.contains(p)).count() == 2
}

/// The six positions meeting at a lattice point.
pub fn positions_around(point: Point) -> Vec<Position> {
    let mut out = Vec::with_capacity(6);
    for row in point.y - 2..=point.y {
        for col in (point.x - 3).div_euclid(2)..=(point.x + 1).div_euclid(2) {
            for orientation in ORIENTATIONS {
                let pos = Position::new(row, col, orientation);
                if vertices(pos).contains(&point) {
                    out.push(pos);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_vertices() {
        assert_eq!(
            vertices(Position::ORIGIN),
            [Point::new(1, 0), Point::new(0, 1), Point::new(2, 1)]
        );
        assert_eq!(
            vertices(Position::down(0, 0)),
            [Point::new(1, 2), Point::new(0, 1), Point::new(2, 1)]
        );
    }

    #[test]
    fn test_odd_rows_shift_right() {
        assert_eq!(vertices(Position::up(1, 0))[0], Point::new(2, 1));
        assert_eq!(vertices(Position::up(-1, 0))[0], Point::new(2, -1));
    }

    #[test]
    fn test_lattice_points_have_odd_parity() {
        for row in -3..4 {
            for col in -3..4 {
                for orientation in ORIENTATIONS {
                    for p in vertices(Position::new(row, col, orientation)) {
                        assert_eq!((p.x + p.y).rem_euclid(2), 1, "{p} off lattice");
                    }
                }
            }
        }
    }

    #[test]
    fn test_neighbors_of_up_triangle() {
        let n = compute_neighbors(Position::up(0, 0));
        assert_eq!(n[0], Position::down(-1, -1));
        assert_eq!(n[1], Position::down(0, 0));
        assert_eq!(n[2], Position::down(-1, 0));
    }

    #[test]
    fn test_neighbors_of_down_triangle() {
        let n = compute_neighbors(Position::down(0, 0));
        assert_eq!(n[0], Position::up(1, -1));
        assert_eq!(n[1], Position::up(0, 0));
        assert_eq!(n[2], Position::up(1, 0));
    }

    #[test]
    fn test_neighbors_are_symmetric_and_same_direction() {
        for row in -2..3 {
            for col in -2..3 {
                for orientation in ORIENTATIONS {
                    let pos = Position::new(row, col, orientation);
                    for (side, n) in compute_neighbors(pos).into_iter().enumerate() {
                        assert_ne!(n, pos);
                        assert_ne!(n.orientation, pos.orientation);
                        assert!(are_adjacent(pos, n));
                        let back = compute_neighbors(n);
                        let their_side = back.iter().position(|p| *p == pos).unwrap();
                        assert_eq!(side_points(pos, side), side_points(n, their_side));
                    }
                }
            }
        }
    }

    #[test]
    fn test_six_triangles_meet_at_each_point() {
        let around = positions_around(Point::new(1, 2));
        assert_eq!(around.len(), 6);
        assert!(around.contains(&Position::up(2, 0)));
        assert!(around.contains(&Position::down(0, 0)));
        assert!(around.contains(&Position::up(1, -1)));
        assert!(around.contains(&Position::down(1, -1)));
    }

    #[test]
    fn test_corner_touch_is_not_adjacency() {
        assert!(!are_adjacent(Position::up(0, 0), Position::up(1, -1)));
        assert!(!are_adjacent(Position::up(0, 0), Position::up(0, 0)));
    }
}
