// Copyright 2022 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Context;
use checkmate::{Match, Position};
use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};
use structopt::StructOpt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Plays games of uniformly random legal moves, for shaking out rule bugs.
#[derive(Debug, StructOpt)]
struct Options {
    /// Seed for the move picker.
    #[structopt(long, default_value = "0")]
    seed: u64,
    /// Number of games to play.
    #[structopt(long, default_value = "1")]
    games: u32,
    /// Give up on a game after this many turns.
    #[structopt(long, default_value = "300")]
    max_turns: u32,
    /// Starting position, as `<placement> <side> [<turn>]`.
    #[structopt(long)]
    fen: Option<String>,
    /// Print a JSON snapshot at the end of every game.
    #[structopt(long)]
    json: bool,
}

enum Outcome {
    Checkmate,
    NoMoves,
    TurnLimit,
}

fn play_game(m: &mut Match, rng: &mut SmallRng, max_turns: u32) -> anyhow::Result<Outcome> {
    let mut turns = 0;
    while !m.is_terminated() {
        if turns == max_turns {
            return Ok(Outcome::TurnLimit);
        }

        let side = m.current_player();
        let moves: Vec<(Position, Position)> = m.legal_moves(side)?;
        let &(origin, destination) = match moves.choose(rng) {
            Some(mov) => mov,
            None => return Ok(Outcome::NoMoves),
        };

        m.play(origin, destination)
            .with_context(|| format!("legal move {}{} was rejected", origin, destination))?;
        turns += 1;
    }

    Ok(Outcome::Checkmate)
}

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_env("CHECKMATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let args = Options::from_args();
    let mut rng = SmallRng::seed_from_u64(args.seed);
    for game in 0..args.games {
        let mut m = match args.fen {
            Some(ref fen) => Match::from_fen(fen).context("invalid position")?,
            None => Match::new(),
        };

        let outcome = play_game(&mut m, &mut rng, args.max_turns)?;
        let summary = match outcome {
            Outcome::Checkmate => format!(
                "{} wins by checkmate",
                m.winner().map_or_else(|| "nobody".to_owned(), |c| c.to_string())
            ),
            Outcome::NoMoves => format!("{} has no legal moves", m.current_player()),
            Outcome::TurnLimit => "turn limit reached".to_owned(),
        };

        println!("game {:<4} turn {:<5} {}", game + 1, m.turn(), summary);
        if args.json {
            println!("{}", serde_json::to_string(&m.snapshot())?);
        }
    }

    Ok(())
}
