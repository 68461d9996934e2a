// Copyright 2017-2022 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

use crate::{
    core::{Piece, PieceId, Position, COLUMNS, ROWS},
    error::ChessError,
};

/// The chessboard: an 8x8 grid of cells, each holding at most one piece.
///
/// The board owns every piece that has ever been registered with it. Pieces are referred to by [`PieceId`] handles,
/// which stay valid after a piece leaves the grid so that captured pieces can be put back by an undo.
///
/// `place` and `remove` are the only operations that move pieces in and out of cells, and they keep each piece's
/// recorded position in agreement with the cell that holds it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    pieces: Vec<Piece>,
    cells: [Option<PieceId>; (ROWS * COLUMNS) as usize],
}

impl Board {
    pub fn new() -> Board {
        Board {
            pieces: Vec::new(),
            cells: [None; (ROWS * COLUMNS) as usize],
        }
    }

    pub const fn rows(&self) -> i8 {
        ROWS
    }

    pub const fn columns(&self) -> i8 {
        COLUMNS
    }

    /// Whether `pos` lies within the board.
    pub fn is_valid(&self, pos: Position) -> bool {
        pos.row() >= 0 && pos.row() < self.rows() && pos.column() >= 0 && pos.column() < self.columns()
    }

    pub fn validate(&self, pos: Position) -> Result<(), ChessError> {
        if !self.is_valid(pos) {
            return Err(ChessError::OutOfBounds(pos));
        }

        Ok(())
    }

    /// Hands a new, unplaced piece to the board and returns its handle.
    pub fn add_piece(&mut self, piece: Piece) -> PieceId {
        let id = PieceId(self.pieces.len());
        let mut piece = piece;
        piece.set_position(None);
        self.pieces.push(piece);
        id
    }

    /// Returns the piece behind a handle. Handles are only meaningful to the board that issued them; a handle from
    /// another board may name a different piece or panic.
    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.as_usize()]
    }

    pub(crate) fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.pieces[id.as_usize()]
    }

    /// Returns the handle of the piece on `pos`, if any.
    pub fn piece_at(&self, pos: Position) -> Result<Option<PieceId>, ChessError> {
        self.validate(pos)?;
        Ok(self.cells[pos.index()])
    }

    /// Returns the handle of the piece on `pos`, treating off-board positions as empty.
    pub fn id_at(&self, pos: Position) -> Option<PieceId> {
        if self.is_valid(pos) {
            self.cells[pos.index()]
        } else {
            None
        }
    }

    /// Returns the piece on `pos`, treating off-board positions as empty.
    pub fn get(&self, pos: Position) -> Option<&Piece> {
        self.id_at(pos).map(|id| self.piece(id))
    }

    pub fn has_piece(&self, pos: Position) -> Result<bool, ChessError> {
        Ok(self.piece_at(pos)?.is_some())
    }

    /// Puts the piece on `pos`. Fails if `pos` is off the board or already occupied.
    pub fn place(&mut self, id: PieceId, pos: Position) -> Result<(), ChessError> {
        if self.has_piece(pos)? {
            return Err(ChessError::OccupiedSquare(pos));
        }

        debug_assert!(
            self.piece(id).position().is_none(),
            "placing a piece that is already on the board"
        );
        self.cells[pos.index()] = Some(id);
        self.piece_mut(id).set_position(Some(pos));
        Ok(())
    }

    /// Takes whatever piece is on `pos` off the board and returns it.
    pub fn remove(&mut self, pos: Position) -> Result<Option<PieceId>, ChessError> {
        let existing = self.piece_at(pos)?;
        if let Some(id) = existing {
            self.cells[pos.index()] = None;
            self.piece_mut(id).set_position(None);
        }

        Ok(existing)
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows() {
            write!(f, "{} ", self.rows() - row)?;
            for column in 0..self.columns() {
                match self.get(Position::new(row, column)) {
                    Some(piece) => write!(f, "{} ", piece)?,
                    None => write!(f, ". ")?,
                }
            }

            writeln!(f)?;
        }

        writeln!(f, "  a b c d e f g h")
    }
}
