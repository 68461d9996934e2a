// Copyright 2022 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Context;
use checkmate::{Match, Position};
use structopt::StructOpt;

/// Shortcut program for inspecting the moves available in a position.
#[derive(Debug, StructOpt)]
struct Options {
    /// Position to inspect, as `<placement> <side> [<turn>]`.
    #[structopt(name = "FEN")]
    fen: String,
    /// Print the move mask of the piece on this square instead of every legal move.
    #[structopt(short, long)]
    square: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Options::from_args();
    let mut m = Match::from_fen(&args.fen).context("invalid position")?;
    if let Some(ref square) = args.square {
        let pos = Position::from_algebraic(square)?;
        let mask = m.moves_mask(pos)?;
        print!("{}", mask);
        println!();
        print!("{}", m.render_with_mask(mask));
        return Ok(());
    }

    let side = m.current_player();
    for (origin, destination) in m.legal_moves(side)? {
        println!("{}{}", origin, destination);
    }

    Ok(())
}
