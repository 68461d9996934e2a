// Copyright 2022 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Two-player console chess. Each turn asks for the square of the piece to move, shows where it can go, and then
//! asks for the destination square.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context};
use checkmate::{ChessError, Match, Position};
use structopt::StructOpt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, StructOpt)]
struct Options {
    /// Start from this position instead of the standard one, as `<placement> <side> [<turn>]`.
    #[structopt(long)]
    fen: Option<String>,
    /// Print a JSON snapshot of the match after every turn.
    #[structopt(long)]
    json: bool,
}

fn install_subscriber() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_env("CHECKMATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

/// Prints `prompt` and reads one line. Returns `None` once input is exhausted.
fn read_line(input: &mut impl BufRead, prompt: &str) -> anyhow::Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }

    Ok(Some(line.trim().to_owned()))
}

/// Reads one move from the player and plays it. Rule violations are returned as `ChessError`s so the caller can
/// report them and ask again; I/O failures and end of input are returned through the outer result.
fn take_turn(m: &mut Match, input: &mut impl BufRead) -> anyhow::Result<Option<Result<(), ChessError>>> {
    let origin = match read_line(input, "Origin: ")? {
        Some(line) => line,
        None => return Ok(None),
    };

    let origin = match Position::from_algebraic(&origin) {
        Ok(pos) => pos,
        Err(err) => return Ok(Some(Err(err))),
    };

    if let Err(err) = m.validate_origin(origin) {
        return Ok(Some(Err(err)));
    }

    let mask = m.moves_mask(origin)?;
    println!();
    print!("{}", m.render_with_mask(mask));
    println!();

    let destination = match read_line(input, "Destination: ")? {
        Some(line) => line,
        None => return Ok(None),
    };

    let result = Position::from_algebraic(&destination).and_then(|destination| {
        m.validate_destination(origin, destination)?;
        m.perform_turn(origin, destination)
    });
    Ok(Some(result))
}

fn main() -> anyhow::Result<()> {
    install_subscriber();
    let args = Options::from_args();
    let mut m = match args.fen {
        Some(ref fen) => Match::from_fen(fen).with_context(|| format!("invalid position: {}", fen))?,
        None => Match::new(),
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        println!();
        print!("{}", m);
        if args.json {
            println!("{}", serde_json::to_string(&m.snapshot())?);
        }

        if m.is_terminated() {
            return Ok(());
        }

        println!();
        match take_turn(&mut m, &mut input)? {
            None => return Ok(()),
            Some(Ok(())) => {}
            Some(Err(err)) if err.is_fatal() => bail!(err),
            Some(Err(err)) => println!("error: {}", err),
        }
    }
}
