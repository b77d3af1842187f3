//! NoGo position representation and move execution.
//!
//! This module provides the core game logic for NoGo, including:
//! - Board state as two stone bitboards plus incremental group tracking
//! - Legal-move generation under the no-capture rule
//! - Two-liberty move classification for the playout policy
//!
//! NoGo has no captures and no ko: a move that would capture an opponent
//! group or leave one's own group without liberties is simply illegal.
//! Groups are kept in a union-find over occupied points, with the liberty
//! set of each group stored at its root. Every on-board group always has
//! at least one liberty.

use std::fmt;

use rand::Rng;
use thiserror::Error;

use crate::bitboard::Bitboard;
use crate::constants::{N, NN};

/// A point on the board, represented as a linear index `y*9 + x`.
pub type Point = usize;

/// Sentinel for "no point", used as the null move and the root tree slot.
pub const NONE_POINT: Point = NN;

#[inline]
pub fn pt(x: usize, y: usize) -> Point {
    debug_assert!(x < N && y < N);
    y * N + x
}

#[inline]
pub fn pt_x(p: Point) -> usize {
    p % N
}

#[inline]
pub fn pt_y(p: Point) -> usize {
    p / N
}

/// Format a point in the `(x,y)` convention, `x` columnar.
pub fn str_coord(p: Point) -> String {
    if p == NONE_POINT {
        return "none".into();
    }
    format!("({},{})", pt_x(p), pt_y(p))
}

/// Parse a `(x,y)` coordinate string back into a point.
///
/// Accepts the form produced by [`str_coord`] with or without parentheses.
/// Returns `None` for anything off-board or malformed.
pub fn parse_coord(s: &str) -> Option<Point> {
    let s = s.trim().trim_start_matches('(').trim_end_matches(')');
    let (x, y) = s.split_once(',')?;
    let x: usize = x.trim().parse().ok()?;
    let y: usize = y.trim().parse().ok()?;
    (x < N && y < N).then(|| pt(x, y))
}

/// Stone colour, which is also the player identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Black,
    White,
}

impl Side {
    #[inline]
    pub fn other(self) -> Side {
        match self {
            Side::Black => Side::White,
            Side::White => Side::Black,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Black => "black",
            Side::White => "white",
        })
    }
}

/// Result of attempting to play an illegal move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Point is not empty
    #[error("point not empty")]
    Occupied,
    /// Move would leave the mover's group without liberties
    #[error("group would be left without liberties")]
    SelfCapture,
    /// Move would take the last liberty of an opponent group
    #[error("move would capture an opponent group")]
    Capture,
}

/// A NoGo position.
///
/// Stones live in one bitboard per side. Group membership is a union-find
/// over occupied points; `liberties` is valid at group roots only and
/// satisfies `liberties = neighbors(group) \ (black ∪ white)`.
#[derive(Clone)]
pub struct Position {
    stones: [Bitboard; 2],
    parent: [u8; NN],
    liberties: [Bitboard; NN],
}

impl Position {
    pub fn new() -> Self {
        Position {
            stones: [Bitboard::EMPTY; 2],
            parent: [0; NN],
            liberties: [Bitboard::EMPTY; NN],
        }
    }

    /// The stones of one side.
    #[inline]
    pub fn stones(&self, side: Side) -> Bitboard {
        self.stones[side.index()]
    }

    /// All unoccupied points.
    #[inline]
    pub fn empty_points(&self) -> Bitboard {
        !(self.stones[0] | self.stones[1])
    }

    /// Root of the group containing the occupied point `p`.
    fn find(&self, mut p: Point) -> Point {
        while self.parent[p] as Point != p {
            p = self.parent[p] as Point;
        }
        p
    }

    /// Liberty set of the group containing the stone at `p`.
    pub fn group_liberties(&self, p: Point) -> Bitboard {
        debug_assert!(!self.empty_points().test(p), "no stone at {}", str_coord(p));
        self.liberties[self.find(p)]
    }

    /// Liberties the group containing a stone placed by `side` at `p`
    /// would have: the point's empty neighbours plus the liberties of
    /// every adjoining friendly group, minus the point itself.
    pub fn resulting_liberties(&self, side: Side, p: Point) -> Bitboard {
        let adjacent = Bitboard::single(p).neighbors();
        let mut libs = adjacent & self.empty_points();
        for q in (adjacent & self.stones[side.index()]).iter() {
            libs |= self.liberties[self.find(q)];
        }
        libs.clear(p);
        libs
    }

    /// Union of the last liberties of `side`'s groups in atari.
    fn atari_liberties(&self, side: Side) -> Bitboard {
        let mut acc = Bitboard::EMPTY;
        let mut seen = Bitboard::EMPTY;
        for p in self.stones[side.index()].iter() {
            let root = self.find(p);
            if seen.test(root) {
                continue;
            }
            seen.set(root);
            let libs = self.liberties[root];
            if libs.count() == 1 {
                acc |= libs;
            }
        }
        acc
    }

    /// All points where `side` may legally play.
    ///
    /// A point is legal iff it is empty, placing there leaves the mover's
    /// merged group with at least one liberty, and it is not the last
    /// liberty of an opponent group (capturing is forbidden).
    pub fn legal_moves(&self, side: Side) -> Bitboard {
        let empty = self.empty_points();
        // A point with an empty neighbour keeps a liberty outright.
        let mut legal = empty & empty.neighbors();
        // Points walled in by stones survive only through an adjoining
        // friendly group with a spare liberty.
        for p in (empty & !empty.neighbors()).iter() {
            if !self.resulting_liberties(side, p).is_empty() {
                legal.set(p);
            }
        }
        legal & !self.atari_liberties(side.other())
    }

    #[inline]
    pub fn has_legal_move(&self, side: Side) -> bool {
        !self.legal_moves(side).is_empty()
    }

    /// Legal points whose placement leaves the mover's group with two or
    /// more liberties. The playout policy prefers these over moves that
    /// fill the last pocket of the mover's own eye space.
    pub fn two_liberty_moves(&self, side: Side) -> Bitboard {
        let mut two_go = Bitboard::EMPTY;
        for p in self.legal_moves(side).iter() {
            if self.resulting_liberties(side, p).count() >= 2 {
                two_go.set(p);
            }
        }
        two_go
    }

    /// Draw a playout move for `side`: a uniformly random point from
    /// `legal ∩ two_go` when that is non-empty, otherwise from the full
    /// legal set. The flag reports whether the preferred set was used.
    /// Returns `None` when `side` has no legal move at all.
    pub fn heuristic_move<R: Rng>(
        &self,
        side: Side,
        two_go: Bitboard,
        rng: &mut R,
    ) -> Option<(Point, bool)> {
        let legal = self.legal_moves(side);
        if legal.is_empty() {
            return None;
        }
        let safe = legal & two_go;
        if !safe.is_empty() {
            Some((safe.random_point(rng), true))
        } else {
            Some((legal.random_point(rng), false))
        }
    }

    /// Place a stone of `side` at `p`.
    ///
    /// Merges the new stone with adjoining friendly groups and removes the
    /// point from the liberty sets of adjoining opponent groups.
    ///
    /// # Errors
    /// - `MoveError::Occupied` - the point is not empty
    /// - `MoveError::Capture` - an opponent group would lose its last liberty
    /// - `MoveError::SelfCapture` - the merged group would have no liberties
    pub fn place(&mut self, side: Side, p: Point) -> Result<(), MoveError> {
        debug_assert!(p < NN);
        if !self.empty_points().test(p) {
            return Err(MoveError::Occupied);
        }
        let adjacent = Bitboard::single(p).neighbors();
        let enemy = side.other();
        for q in (adjacent & self.stones[enemy.index()]).iter() {
            if self.liberties[self.find(q)] == Bitboard::single(p) {
                return Err(MoveError::Capture);
            }
        }
        let libs = self.resulting_liberties(side, p);
        if libs.is_empty() {
            return Err(MoveError::SelfCapture);
        }

        self.stones[side.index()].set(p);
        self.parent[p] = p as u8;
        for q in (adjacent & self.stones[side.index()]).iter() {
            let root = self.find(q);
            if root != p {
                self.parent[root] = p as u8;
            }
        }
        self.liberties[p] = libs;
        for q in (adjacent & self.stones[enemy.index()]).iter() {
            let root = self.find(q);
            self.liberties[root].clear(p);
        }
        Ok(())
    }

    /// Build a position from nine diagram rows, top row (`y = 8`) first.
    ///
    /// `X` is a black stone, `O` white, `.` empty; spaces are ignored.
    /// Group structure is rebuilt from scratch. Intended for tests and
    /// debugging; panics on malformed diagrams or liberty-less groups.
    pub fn from_diagram(rows: &[&str]) -> Position {
        assert_eq!(rows.len(), N, "expected {N} diagram rows");
        let mut pos = Position::new();
        for (i, row) in rows.iter().enumerate() {
            let y = N - 1 - i;
            let mut x = 0;
            for c in row.chars() {
                match c {
                    ' ' => continue,
                    '.' => {}
                    'X' => pos.stones[Side::Black.index()].set(pt(x, y)),
                    'O' => pos.stones[Side::White.index()].set(pt(x, y)),
                    other => panic!("unexpected diagram character {other:?}"),
                }
                x += 1;
            }
            assert_eq!(x, N, "expected {N} points in diagram row {i}");
        }
        pos.rebuild_groups();
        pos
    }

    /// Recompute union-find parents and liberty sets from the stone
    /// bitboards alone.
    fn rebuild_groups(&mut self) {
        let empty = self.empty_points();
        for side in [Side::Black, Side::White] {
            let stones = self.stones[side.index()];
            let mut seen = Bitboard::EMPTY;
            for p in stones.iter() {
                if seen.test(p) {
                    continue;
                }
                let mut group = Bitboard::single(p);
                loop {
                    let grown = group | (group.neighbors() & stones);
                    if grown == group {
                        break;
                    }
                    group = grown;
                }
                let libs = group.neighbors() & empty;
                assert!(!libs.is_empty(), "group without liberties in diagram");
                for q in group.iter() {
                    self.parent[q] = p as u8;
                }
                self.liberties[p] = libs;
                seen |= group;
            }
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let black = self.stones(Side::Black);
        let white = self.stones(Side::White);
        writeln!(
            f,
            "Black: {} stones   White: {} stones",
            black.count(),
            white.count()
        )?;
        for y in (0..N).rev() {
            write!(f, " {y} ")?;
            for x in 0..N {
                let p = pt(x, y);
                let c = if black.test(p) {
                    'X'
                } else if white.test(p) {
                    'O'
                } else {
                    '.'
                };
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "    0 1 2 3 4 5 6 7 8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_position() {
        let pos = Position::new();
        assert_eq!(pos.empty_points().count() as usize, NN);
        assert_eq!(pos.legal_moves(Side::Black).count() as usize, NN);
        assert_eq!(pos.legal_moves(Side::White).count() as usize, NN);
        // Every opening move leaves the new stone at least two liberties.
        assert_eq!(pos.two_liberty_moves(Side::Black).count() as usize, NN);
    }

    #[test]
    fn test_parse_str_coord_roundtrip() {
        for p in 0..NN {
            assert_eq!(parse_coord(&str_coord(p)), Some(p));
        }
        assert_eq!(str_coord(NONE_POINT), "none");
        assert_eq!(parse_coord("(9,0)"), None);
        assert_eq!(parse_coord("junk"), None);
    }

    #[test]
    fn test_single_stone_liberties() {
        let mut pos = Position::new();
        pos.place(Side::Black, pt(4, 4)).unwrap();
        assert_eq!(pos.group_liberties(pt(4, 4)).count(), 4);
        pos.place(Side::White, pt(0, 0)).unwrap();
        assert_eq!(pos.group_liberties(pt(0, 0)).count(), 2);
    }

    #[test]
    fn test_group_merge_liberties() {
        let mut pos = Position::new();
        pos.place(Side::Black, pt(3, 3)).unwrap();
        pos.place(Side::Black, pt(4, 3)).unwrap();
        // Two adjacent centre stones share a six-point liberty ring.
        assert_eq!(pos.group_liberties(pt(3, 3)).count(), 6);
        assert_eq!(pos.group_liberties(pt(4, 3)), pos.group_liberties(pt(3, 3)));
    }

    #[test]
    fn test_placement_removes_enemy_liberty() {
        let mut pos = Position::new();
        pos.place(Side::Black, pt(4, 4)).unwrap();
        pos.place(Side::White, pt(4, 5)).unwrap();
        assert_eq!(pos.group_liberties(pt(4, 4)).count(), 3);
        assert_eq!(pos.group_liberties(pt(4, 5)).count(), 3);
    }

    #[test]
    fn test_occupied_rejected() {
        let mut pos = Position::new();
        pos.place(Side::Black, pt(2, 2)).unwrap();
        assert_eq!(pos.place(Side::White, pt(2, 2)), Err(MoveError::Occupied));
        assert_eq!(pos.place(Side::Black, pt(2, 2)), Err(MoveError::Occupied));
    }

    #[test]
    fn test_capture_rejected() {
        let mut pos = Position::new();
        pos.place(Side::Black, pt(0, 0)).unwrap();
        pos.place(Side::White, pt(1, 0)).unwrap();
        // The corner stone is down to its last liberty; taking it is the
        // losing condition in NoGo, so the move is illegal.
        assert_eq!(pos.place(Side::White, pt(0, 1)), Err(MoveError::Capture));
        assert!(!pos.legal_moves(Side::White).test(pt(0, 1)));
        // Black itself may still connect there.
        assert!(pos.legal_moves(Side::Black).test(pt(0, 1)));
    }

    #[test]
    fn test_self_capture_rejected() {
        let mut pos = Position::new();
        pos.place(Side::Black, pt(1, 0)).unwrap();
        pos.place(Side::Black, pt(0, 1)).unwrap();
        assert_eq!(pos.place(Side::White, pt(0, 0)), Err(MoveError::SelfCapture));
        assert!(!pos.legal_moves(Side::White).test(pt(0, 0)));
    }

    #[test]
    fn test_walled_in_point_with_friendly_support() {
        let mut pos = Position::new();
        // Black surrounds (0,0) with a group that keeps outside liberties.
        pos.place(Side::Black, pt(1, 0)).unwrap();
        pos.place(Side::Black, pt(0, 1)).unwrap();
        pos.place(Side::Black, pt(1, 1)).unwrap();
        // (0,0) has no empty neighbour but joins a group with spare
        // liberties, so Black may fill it.
        assert!(pos.legal_moves(Side::Black).test(pt(0, 0)));
        pos.place(Side::Black, pt(0, 0)).unwrap();
        assert_eq!(pos.group_liberties(pt(0, 0)), pos.group_liberties(pt(1, 1)));
    }

    #[test]
    fn test_stones_disjoint_and_monotone() {
        let mut pos = Position::new();
        let moves = [
            (Side::Black, pt(4, 4)),
            (Side::White, pt(3, 4)),
            (Side::Black, pt(4, 5)),
            (Side::White, pt(3, 5)),
            (Side::Black, pt(5, 3)),
        ];
        let mut total = 0;
        for (side, p) in moves {
            pos.place(side, p).unwrap();
            total += 1;
            let black = pos.stones(Side::Black);
            let white = pos.stones(Side::White);
            assert!((black & white).is_empty());
            assert_eq!((black | white).count(), total);
        }
    }

    #[test]
    fn test_two_liberty_classification() {
        let pos = Position::from_diagram(&[
            "XXXO.XXO.",
            "XXXXXXXXO",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            ".XXXXXXXX",
        ]);
        // (0,0) is legal for Black but leaves the merged group a single
        // liberty, so it is not a two-liberty move.
        let legal = pos.legal_moves(Side::Black);
        assert!(legal.test(pt(0, 0)));
        assert!(!pos.two_liberty_moves(Side::Black).test(pt(0, 0)));
    }

    #[test]
    fn test_from_diagram_single_legal_move() {
        let pos = Position::from_diagram(&[
            "XXXO.XXO.",
            "XXXXXXXXO",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            ".XXXXXXXX",
        ]);
        // (4,8) captures the white stone at (3,8); (8,8) captures the two
        // white stones in the corner; only (0,0) remains.
        let legal = pos.legal_moves(Side::Black);
        assert_eq!(legal.count(), 1);
        assert!(legal.test(pt(0, 0)));
    }

    #[test]
    fn test_from_diagram_terminal_for_black() {
        let pos = Position::from_diagram(&[
            "XXXXXXXO.",
            "XXXXXXXXO",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            ".XXXXXXXX",
        ]);
        assert!(!pos.has_legal_move(Side::Black));
    }

    #[test]
    fn test_heuristic_move_prefers_safe_set() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let pos = Position::new();
        let mut rng = StdRng::seed_from_u64(3);
        let two_go = pos.two_liberty_moves(Side::Black);
        for _ in 0..20 {
            let (p, safe) = pos.heuristic_move(Side::Black, two_go, &mut rng).unwrap();
            assert!(safe);
            assert!(two_go.test(p));
        }
        // With an empty preferred set the draw falls back to any legal point.
        let (p, safe) = pos
            .heuristic_move(Side::Black, Bitboard::EMPTY, &mut rng)
            .unwrap();
        assert!(!safe);
        assert!(pos.legal_moves(Side::Black).test(p));
    }

    #[test]
    fn test_display_grid() {
        let mut pos = Position::new();
        pos.place(Side::Black, pt(0, 0)).unwrap();
        pos.place(Side::White, pt(8, 8)).unwrap();
        let shown = pos.to_string();
        assert!(shown.contains("Black: 1 stones"));
        assert!(shown.starts_with("Black"));
        assert!(shown.contains('X'));
        assert!(shown.contains('O'));
    }
}
