// Copyright 2021 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::core::{Position, COLUMNS, ROWS};
use std::fmt;

/// A boolean grid over the board, marking the squares a piece could move to. One bit per square, indexed row-major
/// from the eighth rank.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveMask(u64);

impl MoveMask {
    /// Creates a new, empty mask.
    pub const fn empty() -> MoveMask {
        MoveMask(0)
    }

    /// Tests whether the given position is marked. Off-board positions are never marked.
    pub const fn contains(&self, pos: Position) -> bool {
        pos.is_on_board() && self.0 & (1u64 << pos.index()) != 0
    }

    /// Marks the given position. Off-board positions are ignored.
    pub fn insert(&mut self, pos: Position) {
        if pos.is_on_board() {
            self.0 |= 1u64 << pos.index();
        }
    }

    pub const fn len(&self) -> u32 {
        self.0.count_ones()
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Position> for MoveMask {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        let mut mask = MoveMask::empty();
        for pos in iter {
            mask.insert(pos);
        }
        mask
    }
}

impl IntoIterator for MoveMask {
    type Item = Position;
    type IntoIter = MoveMaskIterator;

    fn into_iter(self) -> Self::IntoIter {
        MoveMaskIterator(self.0)
    }
}

impl fmt::Display for MoveMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..ROWS {
            write!(f, "{} ", ROWS - row)?;
            for column in 0..COLUMNS {
                if self.contains(Position::new(row, column)) {
                    write!(f, "1 ")?;
                } else {
                    write!(f, ". ")?;
                }
            }

            writeln!(f)?;
        }

        writeln!(f, "  a b c d e f g h")
    }
}

/// An iterator over the positions marked in a [`MoveMask`], in row-major order.
pub struct MoveMaskIterator(u64);

impl Iterator for MoveMaskIterator {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            None
        } else {
            let next = self.0.trailing_zeros() as usize;
            self.0 &= self.0 - 1;
            Some(Position::from_index(next))
        }
    }
}
