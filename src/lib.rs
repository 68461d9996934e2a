// Copyright 2017-2022 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `checkmate` referees games of chess between two players.
//!
//! A [`Match`] owns a [`Board`] and enforces the rules of movement for every piece, including castling and en passant
//! captures. It rejects moves that would leave the mover's own king in check and detects check and checkmate after
//! every turn. Pawn promotion, stalemate and the draw rules are not part of the game as refereed here.
//!
//! The `checkmate` binary is a two-player console front end for the library.

pub mod core;
mod board;
pub mod error;
pub mod movegen;
mod r#match;

pub use crate::board::Board;
pub use crate::core::{Color, MoveMask, Piece, PieceId, PieceKind, Position};
pub use crate::error::ChessError;
pub use crate::movegen::MoveContext;
pub use crate::r#match::{Capture, FenParseError, Match, MatchSnapshot, PieceView};
