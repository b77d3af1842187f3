//! Heuristic playouts (random game simulation).
//!
//! A playout plays heuristic random moves until the side to move has no
//! legal point, which in NoGo ends the game: the stuck side loses. Along
//! the way the points played as "safe" two-liberty moves are recorded per
//! side; the tree search feeds these masks into its RAVE statistics.

use rand::Rng;

use crate::bitboard::Bitboard;
use crate::position::{Position, Side};

/// Run a playout from `board` with `to_move` to play, mutating the board
/// in place.
///
/// Safe moves are recorded in `rave[side]` for the side that played them.
/// Returns the winner: the side that made the last legal move.
pub fn run<R: Rng>(
    board: &mut Position,
    mut to_move: Side,
    rave: &mut [Bitboard; 2],
    rng: &mut R,
) -> Side {
    // The safe-move frame of reference is fixed once per playout, from
    // the starting position.
    let two_go = [
        board.two_liberty_moves(Side::Black),
        board.two_liberty_moves(Side::White),
    ];
    loop {
        let Some((p, safe)) = board.heuristic_move(to_move, two_go[to_move.index()], rng) else {
            return to_move.other();
        };
        board
            .place(to_move, p)
            .expect("heuristic move must be legal");
        if safe {
            rave[to_move.index()].set(p);
        }
        to_move = to_move.other();
    }
}
