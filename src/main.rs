use std::io;

use anyhow::{bail, Result};
use clap::Parser;
use nogo_rust::agent::{player_from_config, Action, Agent, PlayerConfig};
use nogo_rust::position::{Position, Side};
use tracing::{info, warn};

/// NoGo game runner: plays episodes between two configured players.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Black player options, e.g. "name=engine role=black mcts T=50000 time=1000 seed=42"
    #[arg(long, default_value = "name=mcts role=black mcts")]
    black: String,
    /// White player options
    #[arg(long, default_value = "name=random role=white")]
    white: String,
    /// Number of games to play
    #[arg(long, default_value_t = 1)]
    games: u32,
    /// Print the board after every move
    #[arg(long)]
    show: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let args = Args::parse();

    let black_config = PlayerConfig::parse(&args.black)?;
    let white_config = PlayerConfig::parse(&args.white)?;
    if black_config.role != Side::Black {
        bail!("--black must be configured with role=black");
    }
    if white_config.role != Side::White {
        bail!("--white must be configured with role=white");
    }
    let mut black = player_from_config(black_config);
    let mut white = player_from_config(white_config);

    let mut wins = [0u32; 2];
    for game in 0..args.games {
        let winner = play_episode(black.as_mut(), white.as_mut(), args.show);
        wins[winner.index()] += 1;
        info!(game, winner = %winner, "episode finished");
    }
    println!(
        "{}: {}   {}: {}",
        black.name(),
        wins[Side::Black.index()],
        white.name(),
        wins[Side::White.index()]
    );
    Ok(())
}

/// Alternate turns from Black until one side resigns (has no legal move
/// or plays an illegal point); that side loses.
fn play_episode(black: &mut dyn Agent, white: &mut dyn Agent, show: bool) -> Side {
    let mut board = Position::new();
    black.open_episode("");
    white.open_episode("");
    let mut to_move = Side::Black;
    let winner = loop {
        let agent: &mut dyn Agent = match to_move {
            Side::Black => &mut *black,
            Side::White => &mut *white,
        };
        match agent.take_action(&board) {
            Action::Resign => break to_move.other(),
            Action::Place { pos, side } => {
                if side != to_move {
                    warn!(player = agent.name(), "action for the wrong side");
                    break to_move.other();
                }
                if let Err(err) = board.place(side, pos) {
                    warn!(player = agent.name(), %err, "illegal action");
                    break to_move.other();
                }
                if show {
                    println!("{board}");
                }
                to_move = to_move.other();
            }
        }
    };
    black.close_episode("");
    white.close_episode("");
    winner
}
