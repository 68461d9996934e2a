// Copyright 2022 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

use crate::core::{Color, Position};

/// Every way a board operation or a turn can fail. All variants except [`ChessError::NoKing`] are recoverable: the
/// match is left exactly as it was before the failing call and the caller may simply ask for another move.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ChessError {
    #[error("position {0} is off the board")]
    OutOfBounds(Position),
    #[error("there is already a piece on {0}")]
    OccupiedSquare(Position),
    #[error("there is no piece on {0}")]
    EmptyOrigin(Position),
    #[error("the piece on {square} is not {expected}'s")]
    WrongColor { square: Position, expected: Color },
    #[error("the piece on {0} has no possible moves")]
    NoLegalMoves(Position),
    #[error("the piece on {origin} cannot move to {destination}")]
    IllegalDestination {
        origin: Position,
        destination: Position,
    },
    #[error("moving from {origin} to {destination} would leave {color}'s king in check")]
    SelfCheck {
        origin: Position,
        destination: Position,
        color: Color,
    },
    #[error("{0} has no king in play")]
    NoKing(Color),
    #[error("the match is over")]
    GameOver,
    #[error("not a square: {0:?}")]
    InvalidSquare(String),
}

impl ChessError {
    /// Whether this error indicates a broken engine invariant rather than a bad move from the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ChessError::NoKing(_))
    }
}
