//! Monte Carlo Tree Search with RAVE.
//!
//! The tree lives in a flat arena: one `Vec` of node records linked by
//! 32-bit indices, with each node's children allocated as one contiguous
//! run at expansion time. A search owns its arena and clears it per call;
//! nothing survives between moves.
//!
//! Selection combines direct and RAVE statistics in a single score with
//! an exploration bonus of `0.25 * sqrt(parent_log_visits * visits)`.
//! Note the product inside the square root: this is not the classical
//! UCT `log_visits / visits` ratio.

use std::time::{Duration, Instant};

use arrayvec::ArrayVec;
use rand::Rng;
use tracing::debug;

use crate::bitboard::Bitboard;
use crate::constants::{
    EXPLORATION, NN, RAVE_PRIOR_VISITS, RAVE_PRIOR_WINS, TIE_EPSILON, TIME_CHECK_FLOOR,
};
use crate::playout;
use crate::position::{Point, Position, Side, NONE_POINT};

const NULL_NODE: u32 = u32::MAX;

/// One tree node: the position reached by `side` playing `pos` from the
/// parent. Wins are counted from `side`'s perspective (the player who
/// just moved). RAVE statistics start at optimistic priors so unvisited
/// children still score meaningfully.
struct Node {
    side: Side,
    pos: Point,
    parent: u32,
    children: u32,
    children_len: u32,
    is_leaf: bool,
    visits: u32,
    wins: u32,
    rave_visits: u32,
    rave_wins: u32,
    log_visits: f32,
}

impl Node {
    fn new(side: Side, pos: Point, parent: u32) -> Node {
        Node {
            side,
            pos,
            parent,
            children: NULL_NODE,
            children_len: 0,
            is_leaf: false,
            visits: 0,
            wins: 0,
            rave_visits: RAVE_PRIOR_VISITS,
            rave_wins: RAVE_PRIOR_WINS,
            log_visits: 0.0,
        }
    }

    #[inline]
    fn score(&self, parent_log_visits: f32) -> f32 {
        let wins = (self.rave_wins + self.wins) as f32;
        let explore = EXPLORATION * (parent_log_visits * self.visits as f32).sqrt();
        (wins + explore) / (self.rave_visits + self.visits) as f32
    }
}

/// A single-threaded MCTS/RAVE search with an iteration and a wall-clock
/// budget.
pub struct Search {
    nodes: Vec<Node>,
    iterations: u32,
    time_budget: Duration,
    playouts: u32,
}

impl Search {
    pub fn new(iterations: u32, time_budget: Duration) -> Search {
        Search {
            nodes: Vec::new(),
            iterations,
            time_budget,
            playouts: 0,
        }
    }

    /// Playouts performed by the last [`Search::best_move`] call.
    pub fn playouts(&self) -> u32 {
        self.playouts
    }

    /// Decide a move for `to_move` on `board`.
    ///
    /// Returns `NONE_POINT` when the side to move has no legal point, the
    /// terminal (losing) condition. Otherwise runs playout iterations
    /// until the budgets are spent and returns the root child with the
    /// highest visit count, ties broken by lowest point index.
    pub fn best_move<R: Rng>(&mut self, board: &Position, to_move: Side, rng: &mut R) -> Point {
        self.playouts = 0;
        if !board.has_legal_move(to_move) {
            return NONE_POINT;
        }
        let start = Instant::now();
        self.nodes.clear();
        self.nodes.push(Node::new(to_move.other(), NONE_POINT, NULL_NODE));
        // Expanding the root up front guarantees a best child even on a
        // single-playout budget.
        self.expand_children(0, board);

        // The clock is only consulted once this floor of playouts is done.
        let floor = (self.iterations / 5).min(TIME_CHECK_FLOOR);
        loop {
            let mut node = 0u32;
            let mut scratch = board.clone();
            let mut rave = [Bitboard::EMPTY; 2];
            // selection
            while self.nodes[node as usize].children_len > 0 {
                node = self.select_child(node, &mut scratch, &mut rave, rng);
            }
            // expansion
            if self.expand(node, &scratch) {
                node = self.select_child(node, &mut scratch, &mut rave, rng);
            }
            // simulation
            let to_play = self.nodes[node as usize].side.other();
            let winner = playout::run(&mut scratch, to_play, &mut rave, rng);
            // backpropagation
            let mut cur = node;
            while cur != NULL_NODE {
                self.update(cur, winner, &rave);
                cur = self.nodes[cur as usize].parent;
            }
            self.playouts += 1;
            if self.playouts >= self.iterations {
                break;
            }
            if self.playouts >= floor && start.elapsed() >= self.time_budget {
                break;
            }
        }
        debug!(
            playouts = self.playouts,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search finished"
        );

        let root = &self.nodes[0];
        let (first, len) = (root.children, root.children_len);
        let mut best_pos = NONE_POINT;
        let mut best_visits = 0;
        for i in first..first + len {
            let child = &self.nodes[i as usize];
            // Children are ordered by point index, so the strict compare
            // breaks visit ties toward the lowest point.
            if child.visits > best_visits {
                best_visits = child.visits;
                best_pos = child.pos;
            }
        }
        best_pos
    }

    /// Pick the highest-scoring child, apply its move to `board` and
    /// record it in the RAVE mask. Children within `TIE_EPSILON` of the
    /// maximum are drawn from uniformly, with the tie set collected in a
    /// bitboard of child ordinals.
    fn select_child<R: Rng>(
        &mut self,
        node: u32,
        board: &mut Position,
        rave: &mut [Bitboard; 2],
        rng: &mut R,
    ) -> u32 {
        let (first, len, log_visits) = {
            let n = &self.nodes[node as usize];
            (n.children, n.children_len, n.log_visits)
        };
        let mut scores: ArrayVec<f32, NN> = ArrayVec::new();
        let mut max = f32::NEG_INFINITY;
        for i in first..first + len {
            let s = self.nodes[i as usize].score(log_visits);
            if s > max {
                max = s;
            }
            scores.push(s);
        }
        let mut ties = Bitboard::EMPTY;
        for (ordinal, &s) in scores.iter().enumerate() {
            if s >= max - TIE_EPSILON {
                ties.set(ordinal);
            }
        }
        let child = first + ties.random_point(rng) as u32;
        let (side, pos) = {
            let c = &self.nodes[child as usize];
            (c.side, c.pos)
        };
        board.place(side, pos).expect("tree move must be legal");
        rave[side.index()].set(pos);
        child
    }

    /// Expand a node on its second visit. Returns false for fresh nodes
    /// (they get one full playout before branching) and for terminal
    /// nodes, marking the latter as leaves.
    fn expand(&mut self, node: u32, board: &Position) -> bool {
        let (visits, is_leaf) = {
            let n = &self.nodes[node as usize];
            (n.visits, n.is_leaf)
        };
        if visits == 0 || is_leaf {
            return false;
        }
        self.expand_children(node, board)
    }

    fn expand_children(&mut self, node: u32, board: &Position) -> bool {
        let side = self.nodes[node as usize].side.other();
        let legal = board.legal_moves(side);
        if legal.is_empty() {
            self.nodes[node as usize].is_leaf = true;
            return false;
        }
        let first = self.nodes.len() as u32;
        for p in legal.iter() {
            self.nodes.push(Node::new(side, p, node));
        }
        let n = &mut self.nodes[node as usize];
        n.children = first;
        n.children_len = legal.count();
        true
    }

    /// Record a playout result at `node`: bump the direct statistics, and
    /// bump the RAVE statistics of every child whose point was played by
    /// the side moving below this node.
    fn update(&mut self, node: u32, winner: Side, rave: &[Bitboard; 2]) {
        let (mover, first, len) = {
            let n = &mut self.nodes[node as usize];
            n.visits += 1;
            n.log_visits = (n.visits as f32).ln();
            if winner == n.side {
                n.wins += 1;
            }
            (n.side.other(), n.children, n.children_len)
        };
        let mask = rave[mover.index()];
        let credit = winner == mover;
        for i in first..first + len {
            let child = &mut self.nodes[i as usize];
            if mask.test(child.pos) {
                child.rave_visits += 1;
                if credit {
                    child.rave_wins += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::position::pt;

    fn long_budget() -> Duration {
        Duration::from_secs(60)
    }

    fn single_move_position() -> Position {
        Position::from_diagram(&[
            "XXXO.XXO.",
            "XXXXXXXXO",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXXXXXXX",
            ".XXXXXXXX",
        ])
    }

    #[test]
    fn test_terminal_root_returns_none() {
        let board = Position::from_diagram(&[
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
        let mut rng = StdRng::seed_from_u64(1);
        let mut search = Search::new(100, long_budget());
        assert_eq!(search.best_move(&board, Side::Black, &mut rng), NONE_POINT);
        assert_eq!(search.playouts(), 0);
    }

    #[test]
    fn test_single_legal_move_returned_even_with_one_playout() {
        let board = single_move_position();
        let mut rng = StdRng::seed_from_u64(2);
        for iterations in [1, 2, 64] {
            let mut search = Search::new(iterations, long_budget());
            assert_eq!(search.best_move(&board, Side::Black, &mut rng), pt(0, 0));
        }
    }

    #[test]
    fn test_iteration_budget_respected() {
        let board = Position::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut search = Search::new(50, long_budget());
        let best = search.best_move(&board, Side::Black, &mut rng);
        assert!(best < NN);
        assert_eq!(search.playouts(), 50);
    }

    #[test]
    fn test_children_carry_rave_priors() {
        let board = Position::new();
        let mut rng = StdRng::seed_from_u64(4);
        let mut search = Search::new(30, long_budget());
        search.best_move(&board, Side::Black, &mut rng);
        let root = &search.nodes[0];
        assert_eq!(root.children_len as usize, NN);
        for i in root.children..root.children + root.children_len {
            let child = &search.nodes[i as usize];
            assert_eq!(child.side, Side::Black);
            assert!(child.rave_visits >= RAVE_PRIOR_VISITS);
            assert!(child.rave_wins >= RAVE_PRIOR_WINS);
        }
    }

    #[test]
    fn test_statistics_consistent() {
        let board = Position::new();
        let mut rng = StdRng::seed_from_u64(5);
        let mut search = Search::new(200, long_budget());
        search.best_move(&board, Side::Black, &mut rng);
        let mut total_child_visits = 0;
        for node in &search.nodes {
            assert!(node.wins <= node.visits);
            assert!(node.rave_wins <= node.rave_visits);
        }
        let root = &search.nodes[0];
        for i in root.children..root.children + root.children_len {
            total_child_visits += search.nodes[i as usize].visits;
        }
        // Every playout descends through exactly one root child.
        assert_eq!(total_child_visits, search.playouts());
        assert_eq!(root.visits, search.playouts());
    }

    #[test]
    fn test_deterministic_under_seed() {
        let board = Position::new();
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut search = Search::new(150, long_budget());
            search.best_move(&board, Side::Black, &mut rng)
        };
        assert_eq!(run(42), run(42));
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_immediate_win_preferred() {
        // Black wins at once by playing (0,0) or (1,2): either leaves
        // White without a legal reply. Filling (4,4) instead loses.
        let board = Position::from_diagram(&[
            "XXXXXXXO.",
            "XXXXXXXXO",
            "XXXXXXXXX",
            "XXXXXXXXX",
            "XXXX.XXXX",
            "XXXXXXXXX",
            "X.XXXXXXX",
            "XOXXXXXXX",
            ".OXXXXXXX",
        ]);
        assert_eq!(board.legal_moves(Side::Black).count(), 3);
        let mut rng = StdRng::seed_from_u64(6);
        let mut search = Search::new(10_000, long_budget());
        let best = search.best_move(&board, Side::Black, &mut rng);
        assert!(
            best == pt(0, 0) || best == pt(1, 2),
            "expected a winning move, got {best}"
        );
    }
}
