//! Players and their configuration.
//!
//! The game runner speaks to every player through the [`Agent`] trait:
//! episode open/close hooks and `take_action`. Two players exist, the
//! baseline [`RandomPlayer`] and the [`MctsPlayer`], both built from a
//! [`PlayerConfig`] parsed out of the runner's `key=value` option text.
//!
//! ## Recognised keys
//!
//! - `name` - display name; must not contain `[]():;` or whitespace
//! - `role` - `black` or `white` (required)
//! - `seed` - integer PRNG seed (optional; OS entropy otherwise)
//! - `mcts` - flag selecting the search player over the baseline
//! - `T` - maximum playout iterations
//! - `time` - time budget in milliseconds
//! - `debug` - flag enabling per-move diagnostics

use std::fmt;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::debug;

use crate::constants::{DEFAULT_ITERATIONS, DEFAULT_TIME_MS};
use crate::mcts::Search;
use crate::position::{str_coord, Point, Position, Side, NONE_POINT};

/// What a player does on its turn: place a stone, or give up because no
/// legal point exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Place { pos: Point, side: Side },
    Resign,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Place { pos, side } => write!(f, "{} {}", str_coord(*pos), side),
            Action::Resign => f.write_str("resign"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid role: {0}")]
    InvalidRole(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Random,
    Mcts,
}

/// Typed player configuration.
#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub name: String,
    pub role: Side,
    pub seed: Option<u64>,
    pub method: Method,
    pub iterations: u32,
    pub time_budget_ms: u64,
    pub debug: bool,
}

impl PlayerConfig {
    /// Parse an option string such as
    /// `"name=engine role=black mcts T=50000 time=1000 seed=42"`.
    ///
    /// Bare tokens are flags; unknown keys are ignored so runners may
    /// carry extra metadata.
    pub fn parse(args: &str) -> Result<PlayerConfig, ConfigError> {
        let mut name = String::from("unknown");
        let mut role = None;
        let mut seed = None;
        let mut method = Method::Random;
        let mut iterations = DEFAULT_ITERATIONS;
        let mut time_budget_ms = DEFAULT_TIME_MS;
        let mut debug = false;
        for token in args.split_whitespace() {
            match token.split_once('=') {
                Some(("name", v)) => name = v.to_string(),
                Some(("role", v)) => role = Some(v.to_string()),
                Some(("seed", v)) => seed = Some(number("seed", v)?),
                Some(("T", v)) => {
                    iterations = number("T", v)?.try_into().map_err(|_| {
                        ConfigError::InvalidValue {
                            key: "T".into(),
                            value: v.into(),
                        }
                    })?
                }
                Some(("time", v)) => time_budget_ms = number("time", v)?,
                Some(("debug", v)) => debug = v != "0",
                Some(_) => {}
                None => match token {
                    "mcts" => method = Method::Mcts,
                    "debug" => debug = true,
                    _ => {}
                },
            }
        }
        if name.is_empty() || name.contains(|c| "[]():; ".contains(c)) {
            return Err(ConfigError::InvalidName(name));
        }
        let role = match role.as_deref() {
            Some("black") => Side::Black,
            Some("white") => Side::White,
            other => return Err(ConfigError::InvalidRole(other.unwrap_or("unknown").into())),
        };
        Ok(PlayerConfig {
            name,
            role,
            seed,
            method,
            iterations,
            time_budget_ms,
            debug,
        })
    }
}

fn number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.into(),
        value: value.into(),
    })
}

/// The capability set every player exposes to the game runner.
pub trait Agent {
    fn name(&self) -> &str;
    fn role(&self) -> Side;
    fn open_episode(&mut self, _flag: &str) {}
    fn close_episode(&mut self, _flag: &str) {}
    fn take_action(&mut self, board: &Position) -> Action;
    fn check_for_win(&self, _board: &Position) -> bool {
        false
    }
}

/// Build the player a configuration asks for.
pub fn player_from_config(config: PlayerConfig) -> Box<dyn Agent> {
    match config.method {
        Method::Random => Box::new(RandomPlayer::new(config)),
        Method::Mcts => Box::new(MctsPlayer::new(config)),
    }
}

fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Baseline player: a uniformly random legal placement.
pub struct RandomPlayer {
    config: PlayerConfig,
    rng: StdRng,
}

impl RandomPlayer {
    pub fn new(config: PlayerConfig) -> RandomPlayer {
        let rng = rng_from_seed(config.seed);
        RandomPlayer { config, rng }
    }
}

impl Agent for RandomPlayer {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn role(&self) -> Side {
        self.config.role
    }

    fn take_action(&mut self, board: &Position) -> Action {
        let legal = board.legal_moves(self.config.role);
        if legal.is_empty() {
            return Action::Resign;
        }
        Action::Place {
            pos: legal.random_point(&mut self.rng),
            side: self.config.role,
        }
    }
}

/// The tree-search player.
pub struct MctsPlayer {
    config: PlayerConfig,
    rng: StdRng,
    search: Search,
}

impl MctsPlayer {
    pub fn new(config: PlayerConfig) -> MctsPlayer {
        let rng = rng_from_seed(config.seed);
        let search = Search::new(
            config.iterations,
            Duration::from_millis(config.time_budget_ms),
        );
        MctsPlayer { config, rng, search }
    }
}

impl Agent for MctsPlayer {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn role(&self) -> Side {
        self.config.role
    }

    fn take_action(&mut self, board: &Position) -> Action {
        let pos = self
            .search
            .best_move(board, self.config.role, &mut self.rng);
        if pos == NONE_POINT {
            return Action::Resign;
        }
        if self.config.debug {
            debug!(
                player = %self.config.name,
                playouts = self.search.playouts(),
                chosen = %str_coord(pos),
                "move decided"
            );
        }
        Action::Place {
            pos,
            side: self.config.role,
        }
    }
}
