//! NoGo-Rust: a Monte Carlo NoGo engine.
//!
//! NoGo is Go without captures: a move that would capture an opponent
//! group, or leave one's own group without liberties, is illegal, and the
//! first player without a legal move loses. This crate provides the
//! search engine for an automated 9×9 player: a bitboard move generator,
//! a heuristic playout policy, and MCTS with RAVE deciding a move within
//! a real-time budget.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions and engine parameters
//! - [`bitboard`] - 81-bit point sets with masked directional shifts
//! - [`position`] - Core game logic (stones, groups, legal moves)
//! - [`playout`] - Heuristic game simulation for position evaluation
//! - [`mcts`] - Monte Carlo Tree Search with RAVE
//! - [`agent`] - Players and their configuration
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//!
//! use nogo_rust::mcts::Search;
//! use nogo_rust::position::{Position, Side, NONE_POINT};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! // Search the empty board for Black's opening move.
//! let board = Position::new();
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut search = Search::new(100, Duration::from_millis(100));
//! let best = search.best_move(&board, Side::Black, &mut rng);
//! assert_ne!(best, NONE_POINT);
//! ```

pub mod agent;
pub mod bitboard;
pub mod constants;
pub mod mcts;
pub mod playout;
pub mod position;
