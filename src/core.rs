// Copyright 2021 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Module `core` contains core datatypes used pervasively throughout `checkmate`.

mod mask;
mod types;

pub use mask::{MoveMask, MoveMaskIterator};
pub use types::{
    colors, Color, Direction, File, FileParseError, Piece, PieceId, PieceKind, Position,
    Rank, RankParseError, ALL_DIRECTIONS, COLUMNS, DIAGONAL, ORTHOGONAL, ROWS,
};
