// Copyright 2017-2022 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt::{self, Write};

use serde::Serialize;
use thiserror::Error;

use crate::{
    core::*,
    error::ChessError,
    movegen::{self, MoveContext},
    Board,
};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w 1";

/// A piece taken off the board by a move, together with the square it was taken from. For ordinary captures that
/// square is the move's destination; for en passant it is the square beside the capturing pawn's origin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Capture {
    pub piece: PieceId,
    pub square: Position,
}

/// A game of chess in progress.
///
/// A match owns the board and everything needed to referee a game on it: whose turn it is, whether that side is in
/// check, whether the game is over, which pieces have been captured, and which pawn (if any) may be captured en
/// passant. A match is driven one turn at a time with [`Match::play`] or [`Match::perform_turn`]; any failed turn
/// leaves the match exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    board: Board,
    /// Turn number, starting at 1. Advances once per committed move.
    turn: u32,
    /// Color whose turn it is to move. After checkmate, the winner.
    current_player: Color,
    terminated: bool,
    /// The color in check after the most recent committed move, if any.
    check: Option<Color>,
    /// The pawn that made a double step on the previous turn.
    en_passant: Option<PieceId>,
    /// Every piece ever put into play, in order of placement.
    in_play: Vec<PieceId>,
    /// Captured pieces, in order of capture.
    captured: Vec<PieceId>,
}

impl Match {
    /// Creates a match with the standard starting position, White to move.
    pub fn new() -> Match {
        Match::from_fen(START_FEN).expect("starting position is valid")
    }

    fn empty() -> Match {
        Match {
            board: Board::new(),
            turn: 1,
            current_player: Color::White,
            terminated: false,
            check: None,
            en_passant: None,
            in_play: Vec::new(),
            captured: Vec::new(),
        }
    }

    /// Puts a new piece into play on `pos`.
    pub fn place_new_piece(&mut self, piece: Piece, pos: Position) -> Result<PieceId, ChessError> {
        self.board.validate(pos)?;
        if self.board.has_piece(pos)? {
            return Err(ChessError::OccupiedSquare(pos));
        }

        let id = self.board.add_piece(piece);
        self.board.place(id, pos)?;
        self.in_play.push(id);
        Ok(id)
    }
}

impl Match {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn current_player(&self) -> Color {
        self.current_player
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Whether the side to move is in check (or, once the match is over, whether the loser was checkmated).
    pub fn in_check(&self) -> bool {
        self.check.is_some()
    }

    /// The winner of a finished match.
    pub fn winner(&self) -> Option<Color> {
        if self.terminated {
            Some(self.current_player)
        } else {
            None
        }
    }

    pub fn en_passant_target(&self) -> Option<PieceId> {
        self.en_passant
    }

    /// Returns the piece on `pos`, if any.
    pub fn piece_at(&self, pos: Position) -> Result<Option<&Piece>, ChessError> {
        Ok(self.board.piece_at(pos)?.map(|id| self.board.piece(id)))
    }

    /// Pieces of the given color that are on the board.
    pub fn pieces_in_play(&self, color: Color) -> impl Iterator<Item = PieceId> + '_ {
        self.in_play.iter().copied().filter(move |&id| {
            self.board.piece(id).color() == color && !self.captured.contains(&id)
        })
    }

    /// Pieces of the given color that have been captured, in order of capture.
    pub fn captured(&self, color: Color) -> Vec<Piece> {
        self.captured
            .iter()
            .map(|&id| *self.board.piece(id))
            .filter(|piece| piece.color() == color)
            .collect()
    }

    fn context(&self) -> MoveContext {
        MoveContext {
            check: self.check,
            en_passant: self.en_passant,
        }
    }

    fn mask_of(&self, id: PieceId) -> MoveMask {
        movegen::moves_mask(&self.board, id, self.context())
    }

    /// Returns the squares the piece on `pos` could move to, without regard to whether the move would leave its own
    /// king in check.
    pub fn moves_mask(&self, pos: Position) -> Result<MoveMask, ChessError> {
        let id = self
            .board
            .piece_at(pos)?
            .ok_or(ChessError::EmptyOrigin(pos))?;
        Ok(self.mask_of(id))
    }

    fn king(&self, color: Color) -> Result<(PieceId, Position), ChessError> {
        self.pieces_in_play(color)
            .filter(|&id| self.board.piece(id).kind() == PieceKind::King)
            .find_map(|id| self.board.piece(id).position().map(|pos| (id, pos)))
            .ok_or_else(|| {
                tracing::error!(%color, "no king in play");
                ChessError::NoKing(color)
            })
    }
}

//
// Validation, move execution and rollback.
//

impl Match {
    /// Checks that `pos` holds a piece belonging to the side to move that has somewhere to go.
    pub fn validate_origin(&self, pos: Position) -> Result<(), ChessError> {
        let id = self
            .board
            .piece_at(pos)?
            .ok_or(ChessError::EmptyOrigin(pos))?;
        if self.board.piece(id).color() != self.current_player {
            return Err(ChessError::WrongColor {
                square: pos,
                expected: self.current_player,
            });
        }

        if self.mask_of(id).is_empty() {
            return Err(ChessError::NoLegalMoves(pos));
        }

        Ok(())
    }

    /// Checks that the piece on `origin` can move to `destination`.
    pub fn validate_destination(
        &self,
        origin: Position,
        destination: Position,
    ) -> Result<(), ChessError> {
        self.board.validate(destination)?;
        if !self.moves_mask(origin)?.contains(destination) {
            return Err(ChessError::IllegalDestination {
                origin,
                destination,
            });
        }

        Ok(())
    }

    /// Moves the piece on `origin` to `destination`, capturing whatever is in the way, and carries out the rook move
    /// of a castle or the pawn removal of an en passant capture. Nothing is validated beyond the squares being on the
    /// board and `origin` being occupied.
    ///
    /// The move must be one the piece's move mask offers. Castling and en passant are recognized by the shape of the
    /// move alone, so a king moved two columns sideways is always treated as castling and a pawn moved diagonally onto
    /// an empty square always takes the piece beside it.
    ///
    /// The returned capture must be handed back to [`Match::undo_move`] together with the same `origin` and
    /// `destination` to reverse the move.
    pub fn execute_move(
        &mut self,
        origin: Position,
        destination: Position,
    ) -> Result<Option<Capture>, ChessError> {
        self.board.validate(destination)?;
        let id = self
            .board
            .remove(origin)?
            .ok_or(ChessError::EmptyOrigin(origin))?;
        self.board.piece_mut(id).increment_move_count();
        let taken = self.board.remove(destination)?;
        self.board.place(id, destination)?;

        let mut capture = taken.map(|piece| Capture {
            piece,
            square: destination,
        });

        let row = origin.row();
        let column = origin.column();
        match self.board.piece(id).kind() {
            PieceKind::King if destination.column() == column + 2 => {
                self.shift_rook(Position::new(row, column + 3), Position::new(row, column + 1))?;
            }
            PieceKind::King if destination.column() == column - 2 => {
                self.shift_rook(Position::new(row, column - 4), Position::new(row, column - 1))?;
            }
            PieceKind::Pawn if destination.column() != column && capture.is_none() => {
                let square = Position::new(row, destination.column());
                capture = self
                    .board
                    .remove(square)?
                    .map(|piece| Capture { piece, square });
            }
            _ => {}
        }

        if let Some(capture) = capture {
            self.captured.push(capture.piece);
        }

        Ok(capture)
    }

    /// Reverses a move made by [`Match::execute_move`]. This is not a general "take back the last move": it must be
    /// called with the arguments and result of the `execute_move` call it reverses, before any other move is made.
    /// Like `execute_move`, it is only exact for moves the piece's move mask offers.
    pub fn undo_move(
        &mut self,
        origin: Position,
        destination: Position,
        capture: Option<Capture>,
    ) -> Result<(), ChessError> {
        let id = self
            .board
            .remove(destination)?
            .ok_or(ChessError::EmptyOrigin(destination))?;
        self.board.piece_mut(id).decrement_move_count();
        if let Some(capture) = capture {
            self.board.place(capture.piece, capture.square)?;
            self.captured.retain(|&piece| piece != capture.piece);
        }

        self.board.place(id, origin)?;

        let row = origin.row();
        let column = origin.column();
        if self.board.piece(id).kind() == PieceKind::King {
            if destination.column() == column + 2 {
                self.unshift_rook(Position::new(row, column + 1), Position::new(row, column + 3))?;
            } else if destination.column() == column - 2 {
                self.unshift_rook(Position::new(row, column - 1), Position::new(row, column - 4))?;
            }
        }

        Ok(())
    }

    fn shift_rook(&mut self, from: Position, to: Position) -> Result<(), ChessError> {
        if let Some(rook) = self.board.remove(from)? {
            self.board.piece_mut(rook).increment_move_count();
            self.board.place(rook, to)?;
        }

        Ok(())
    }

    fn unshift_rook(&mut self, from: Position, to: Position) -> Result<(), ChessError> {
        if let Some(rook) = self.board.remove(from)? {
            self.board.piece_mut(rook).decrement_move_count();
            self.board.place(rook, to)?;
        }

        Ok(())
    }
}

//
// Check detection and turn management.
//

impl Match {
    /// Whether any piece of the other color could move onto `color`'s king.
    pub fn is_in_check(&self, color: Color) -> Result<bool, ChessError> {
        let (_, king_square) = self.king(color)?;
        let ctx = self.context();
        Ok(self
            .pieces_in_play(color.toggle())
            .any(|id| movegen::moves_mask(&self.board, id, ctx).contains(king_square)))
    }

    /// Plays the move on the board, checks whether `color` is in check afterwards, and takes the move back.
    fn leaves_in_check(
        &mut self,
        color: Color,
        origin: Position,
        destination: Position,
    ) -> Result<bool, ChessError> {
        let capture = self.execute_move(origin, destination)?;
        let in_check = self.is_in_check(color);
        self.undo_move(origin, destination, capture)?;
        in_check
    }

    /// Whether `color` is in check and no move by any of its pieces gets it out of check.
    pub fn is_checkmate(&mut self, color: Color) -> Result<bool, ChessError> {
        if !self.is_in_check(color)? {
            return Ok(false);
        }

        let _span = tracing::debug_span!("is_checkmate", %color).entered();
        let mut trials = 0u32;
        let pieces: Vec<_> = self.pieces_in_play(color).collect();
        for id in pieces {
            let origin = match self.board.piece(id).position() {
                Some(pos) => pos,
                None => continue,
            };

            for destination in self.mask_of(id) {
                trials += 1;
                if !self.leaves_in_check(color, origin, destination)? {
                    tracing::debug!(trials, %origin, %destination, "found an escape");
                    return Ok(false);
                }
            }
        }

        tracing::debug!(trials, "no escape");
        Ok(true)
    }

    /// Every (origin, destination) pair that `color` could play without leaving its own king in check.
    pub fn legal_moves(&mut self, color: Color) -> Result<Vec<(Position, Position)>, ChessError> {
        let mut moves = Vec::new();
        let pieces: Vec<_> = self.pieces_in_play(color).collect();
        for id in pieces {
            let origin = match self.board.piece(id).position() {
                Some(pos) => pos,
                None => continue,
            };

            for destination in self.mask_of(id) {
                if !self.leaves_in_check(color, origin, destination)? {
                    moves.push((origin, destination));
                }
            }
        }

        Ok(moves)
    }

    /// Plays a move for the side to move, rejecting it if it would leave that side's king in check. On success the
    /// turn passes to the opponent, unless the move checkmates them, in which case the match ends and the side that
    /// moved is the winner.
    pub fn perform_turn(
        &mut self,
        origin: Position,
        destination: Position,
    ) -> Result<(), ChessError> {
        if self.terminated {
            return Err(ChessError::GameOver);
        }

        let mover = self.current_player;
        let id = self
            .board
            .piece_at(origin)?
            .ok_or(ChessError::EmptyOrigin(origin))?;
        let capture = self.execute_move(origin, destination)?;
        match self.is_in_check(mover) {
            Ok(false) => {}
            Ok(true) => {
                self.undo_move(origin, destination, capture)?;
                tracing::warn!(%origin, %destination, %mover, "move rejected, king would be in check");
                return Err(ChessError::SelfCheck {
                    origin,
                    destination,
                    color: mover,
                });
            }
            Err(err) => {
                self.undo_move(origin, destination, capture)?;
                return Err(err);
            }
        }

        tracing::debug!(
            turn = self.turn,
            %mover,
            %origin,
            %destination,
            captured = ?capture.map(|c| self.board.piece(c.piece).kind()),
            "committed move"
        );

        let moved = self.board.piece(id);
        let double_step = (destination.row() - origin.row()).abs() == 2;
        self.en_passant = if moved.kind() == PieceKind::Pawn && double_step {
            Some(id)
        } else {
            None
        };

        let opponent = mover.toggle();
        self.check = if self.is_in_check(opponent)? {
            tracing::info!(color = %opponent, "check");
            Some(opponent)
        } else {
            None
        };

        if self.check.is_some() && self.is_checkmate(opponent)? {
            tracing::info!(winner = %mover, turn = self.turn, "checkmate");
            self.terminated = true;
        } else {
            self.turn += 1;
            self.current_player = opponent;
        }

        Ok(())
    }

    /// Validates a move for the side to move and performs it.
    pub fn play(&mut self, origin: Position, destination: Position) -> Result<(), ChessError> {
        if self.terminated {
            return Err(ChessError::GameOver);
        }

        self.validate_origin(origin)?;
        self.validate_destination(origin, destination)?;
        self.perform_turn(origin, destination)
    }
}

//
// FEN-style setup and output.
//
// Only the piece placement, the side to move and an optional turn number are read. Pawns standing on their home
// row are treated as unmoved; every other pawn is treated as having moved once, so it cannot make a double step.
// Kings and rooks always start unmoved, which makes castling available whenever the squares allow it.
//

/// Possible errors that can arise when setting up a `Match` from a FEN string.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum FenParseError {
    #[error("unexpected char: {0}")]
    UnexpectedChar(char),
    #[error("unexpected EOF while reading")]
    UnexpectedEnd,
    #[error("invalid digit")]
    InvalidDigit,
    #[error("file does not sum to 8")]
    FileDoesNotSumToEight,
    #[error("unknown piece: {0}")]
    UnknownPiece(char),
    #[error("invalid side to move")]
    InvalidSideToMove,
    #[error("invalid turn number")]
    InvalidTurn,
    #[error("{0} has no king")]
    MissingKing(Color),
    #[error("{0} has more than one king")]
    TooManyKings(Color),
    #[error("{0} is in check but it is not their turn")]
    OpponentInCheck(Color),
    #[error(transparent)]
    Board(#[from] ChessError),
}

impl Match {
    /// Sets up a match from `<placement> <side> [<turn>]`, where placement is the first field of a FEN string.
    pub fn from_fen(fen: impl AsRef<str>) -> Result<Match, FenParseError> {
        let mut fields = fen.as_ref().split_whitespace();
        let placement = fields.next().ok_or(FenParseError::UnexpectedEnd)?;

        let mut m = Match::empty();
        let mut row = 0i8;
        let mut column = 0i8;
        for c in placement.chars() {
            match c {
                '/' => {
                    if column != COLUMNS {
                        return Err(FenParseError::FileDoesNotSumToEight);
                    }

                    row += 1;
                    column = 0;
                    if row >= ROWS {
                        return Err(FenParseError::UnexpectedChar(c));
                    }
                }
                '1'..='8' => {
                    column += c as i8 - b'0' as i8;
                    if column > COLUMNS {
                        return Err(FenParseError::FileDoesNotSumToEight);
                    }
                }
                '0' | '9' => return Err(FenParseError::InvalidDigit),
                c => {
                    let (color, kind) =
                        PieceKind::from_fen_char(c).ok_or(FenParseError::UnknownPiece(c))?;
                    if column >= COLUMNS {
                        return Err(FenParseError::FileDoesNotSumToEight);
                    }

                    let moved = kind == PieceKind::Pawn && row != color.pawn_row();
                    let piece = Piece::new(kind, color).with_move_count(moved as u32);
                    m.place_new_piece(piece, Position::new(row, column))?;
                    column += 1;
                }
            }
        }

        if row != ROWS - 1 {
            return Err(FenParseError::UnexpectedEnd);
        }

        if column != COLUMNS {
            return Err(FenParseError::FileDoesNotSumToEight);
        }

        m.current_player = match fields.next() {
            Some("w") => Color::White,
            Some("b") => Color::Black,
            Some(_) => return Err(FenParseError::InvalidSideToMove),
            None => return Err(FenParseError::UnexpectedEnd),
        };

        if let Some(field) = fields.next() {
            if field.chars().all(|c| c.is_ascii_digit()) {
                m.turn = field.parse().map_err(|_| FenParseError::InvalidTurn)?;
                if m.turn == 0 {
                    return Err(FenParseError::InvalidTurn);
                }
            }
        }

        for color in colors() {
            let kings = m
                .pieces_in_play(color)
                .filter(|&id| m.board.piece(id).kind() == PieceKind::King)
                .count();
            match kings {
                0 => return Err(FenParseError::MissingKing(color)),
                1 => {}
                _ => return Err(FenParseError::TooManyKings(color)),
            }
        }

        let waiting = m.current_player.toggle();
        if m.is_in_check(waiting)? {
            return Err(FenParseError::OpponentInCheck(waiting));
        }

        if m.is_in_check(m.current_player)? {
            m.check = Some(m.current_player);
        }

        Ok(m)
    }

    /// Writes the match as `<placement> <side> <turn>`, the format read by [`Match::from_fen`].
    pub fn as_fen(&self) -> String {
        let mut buf = String::new();
        for row in 0..ROWS {
            let mut empty_squares = 0;
            for column in 0..COLUMNS {
                if let Some(piece) = self.board.get(Position::new(row, column)) {
                    if empty_squares != 0 {
                        write!(&mut buf, "{}", empty_squares).unwrap();
                    }
                    write!(&mut buf, "{}", piece).unwrap();
                    empty_squares = 0;
                } else {
                    empty_squares += 1;
                }
            }

            if empty_squares != 0 {
                write!(&mut buf, "{}", empty_squares).unwrap();
            }

            if row != ROWS - 1 {
                buf.push('/');
            }
        }

        buf.push(' ');
        match self.current_player {
            Color::White => buf.push('w'),
            Color::Black => buf.push('b'),
        }
        write!(&mut buf, " {}", self.turn).unwrap();
        buf
    }
}

//
// Read-only views for front ends.
//

/// A piece as seen by a renderer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PieceView {
    pub kind: PieceKind,
    pub color: Color,
}

/// A serializable picture of a match, for front ends that render the game elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchSnapshot {
    /// Board cells, row by row starting from the eighth rank.
    pub board: Vec<Vec<Option<PieceView>>>,
    pub turn: u32,
    pub current_player: Color,
    pub in_check: bool,
    pub terminated: bool,
    pub winner: Option<Color>,
    pub captured_white: Vec<PieceKind>,
    pub captured_black: Vec<PieceKind>,
}

impl Match {
    pub fn snapshot(&self) -> MatchSnapshot {
        let board = (0..ROWS)
            .map(|row| {
                (0..COLUMNS)
                    .map(|column| {
                        self.board
                            .get(Position::new(row, column))
                            .map(|piece| PieceView {
                                kind: piece.kind(),
                                color: piece.color(),
                            })
                    })
                    .collect()
            })
            .collect();

        let kinds = |color: Color| -> Vec<PieceKind> {
            self.captured(color).iter().map(Piece::kind).collect()
        };
        MatchSnapshot {
            board,
            turn: self.turn,
            current_player: self.current_player,
            in_check: self.in_check(),
            terminated: self.terminated,
            winner: self.winner(),
            captured_white: kinds(Color::White),
            captured_black: kinds(Color::Black),
        }
    }

    /// Renders the board with the squares of `mask` highlighted: empty ones as `*`, occupied ones in brackets.
    pub fn render_with_mask(&self, mask: MoveMask) -> String {
        let mut buf = String::new();
        for row in 0..ROWS {
            write!(&mut buf, "{} ", ROWS - row).unwrap();
            for column in 0..COLUMNS {
                let pos = Position::new(row, column);
                match (self.board.get(pos), mask.contains(pos)) {
                    (Some(piece), true) => write!(&mut buf, "[{}]", piece).unwrap(),
                    (Some(piece), false) => write!(&mut buf, " {} ", piece).unwrap(),
                    (None, true) => buf.push_str(" * "),
                    (None, false) => buf.push_str(" . "),
                }
            }

            buf.push('\n');
        }

        buf.push_str("   a  b  c  d  e  f  g  h\n");
        buf
    }
}

impl Default for Match {
    fn default() -> Self {
        Match::new()
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)?;
        writeln!(f)?;
        writeln!(f, "Captured pieces:")?;
        for color in colors() {
            let names: Vec<_> = self.captured(color).iter().map(|p| p.to_string()).collect();
            writeln!(f, "{}: [{}]", color, names.join(", "))?;
        }

        writeln!(f, "Turn: {}", self.turn)?;
        if self.terminated {
            writeln!(f, "CHECKMATE!")?;
            writeln!(f, "Winner: {}", self.current_player)?;
        } else {
            writeln!(f, "Waiting for: {}", self.current_player)?;
            if self.in_check() {
                writeln!(f, "CHECK!")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Position {
        Position::from_algebraic(s).unwrap()
    }

    fn play(m: &mut Match, origin: &str, destination: &str) {
        m.play(sq(origin), sq(destination))
            .unwrap_or_else(|e| panic!("{}{} failed: {}", origin, destination, e));
    }

    fn kind_at(m: &Match, square: &str) -> Option<(Color, PieceKind)> {
        m.piece_at(sq(square))
            .unwrap()
            .map(|p| (p.color(), p.kind()))
    }

    mod setup {
        use super::*;

        #[test]
        fn starting_position() {
            let m = Match::new();
            assert_eq!(1, m.turn());
            assert_eq!(Color::White, m.current_player());
            assert!(!m.is_terminated());
            assert!(!m.in_check());
            assert_eq!(None, m.en_passant_target());

            assert_eq!(Some((Color::White, PieceKind::Pawn)), kind_at(&m, "a2"));
            assert_eq!(
                Some((Color::White, PieceKind::Pawn)),
                m.piece_at(Position::new(6, 0))
                    .unwrap()
                    .map(|p| (p.color(), p.kind()))
            );
            assert_eq!(Some((Color::Black, PieceKind::Pawn)), kind_at(&m, "a7"));
            assert_eq!(
                Some((Color::White, PieceKind::King)),
                m.piece_at(Position::new(7, 4))
                    .unwrap()
                    .map(|p| (p.color(), p.kind()))
            );
            assert_eq!(
                Some((Color::Black, PieceKind::King)),
                m.piece_at(Position::new(0, 4))
                    .unwrap()
                    .map(|p| (p.color(), p.kind()))
            );
            assert_eq!(Some((Color::White, PieceKind::Queen)), kind_at(&m, "d1"));
            assert_eq!(Some((Color::Black, PieceKind::Knight)), kind_at(&m, "g8"));
            for rank in &["3", "4", "5", "6"] {
                for file in &["a", "b", "c", "d", "e", "f", "g", "h"] {
                    assert_eq!(None, kind_at(&m, &format!("{}{}", file, rank)));
                }
            }

            assert_eq!(16, m.pieces_in_play(Color::White).count());
            assert_eq!(16, m.pieces_in_play(Color::Black).count());
            for id in m.pieces_in_play(Color::White) {
                assert_eq!(0, m.board().piece(id).move_count());
            }
        }

        #[test]
        fn place_new_piece_rejects_occupied() {
            let mut m = Match::new();
            let err = m
                .place_new_piece(Piece::new(PieceKind::Queen, Color::White), sq("e2"))
                .unwrap_err();
            assert_eq!(ChessError::OccupiedSquare(sq("e2")), err);
            assert_eq!(16, m.pieces_in_play(Color::White).count());
        }

        #[test]
        fn place_new_piece_rejects_off_board() {
            let mut m = Match::new();
            let off = Position::new(-1, 4);
            let err = m
                .place_new_piece(Piece::new(PieceKind::Queen, Color::White), off)
                .unwrap_err();
            assert_eq!(ChessError::OutOfBounds(off), err);
        }
    }

    mod fen {
        use super::*;

        #[test]
        fn start_position_roundtrip() {
            assert_eq!(START_FEN, Match::new().as_fen());
        }

        #[test]
        fn side_and_turn() {
            let m = Match::from_fen("4k3/8/8/8/8/8/8/4K3 b 7").unwrap();
            assert_eq!(Color::Black, m.current_player());
            assert_eq!(7, m.turn());
            assert_eq!("4k3/8/8/8/8/8/8/4K3 b 7", m.as_fen());
        }

        #[test]
        fn full_fen_fields_are_ignored() {
            let m = Match::from_fen("4k3/8/8/8/8/8/8/4K3 w KQkq - 0 1").unwrap();
            assert_eq!(1, m.turn());
        }

        #[test]
        fn pawn_move_counts() {
            let m = Match::from_fen("4k3/p7/8/8/4P3/8/3P4/4K3 w").unwrap();
            let count = |s| m.piece_at(sq(s)).unwrap().unwrap().move_count();
            assert_eq!(0, count("a7"));
            assert_eq!(0, count("d2"));
            assert_eq!(1, count("e4"));
        }

        #[test]
        fn sets_check_for_side_to_move() {
            let m = Match::from_fen("4k3/8/8/8/8/8/4r3/4K3 w").unwrap();
            assert!(m.in_check());
        }

        #[test]
        fn errors() {
            assert_eq!(Err(FenParseError::UnexpectedEnd), Match::from_fen(""));
            assert_eq!(
                Err(FenParseError::UnknownPiece('z')),
                Match::from_fen("z7/8/8/8/8/8/8/8 w")
            );
            assert_eq!(
                Err(FenParseError::InvalidDigit),
                Match::from_fen("9/8/8/8/8/8/8/8 w")
            );
            assert_eq!(
                Err(FenParseError::FileDoesNotSumToEight),
                Match::from_fen("pppp5/8/8/8/8/8/8/8 w")
            );
            assert_eq!(
                Err(FenParseError::UnexpectedEnd),
                Match::from_fen("8/8/8/8 w")
            );
            assert_eq!(
                Err(FenParseError::InvalidSideToMove),
                Match::from_fen("4k3/8/8/8/8/8/8/4K3 c")
            );
            assert_eq!(
                Err(FenParseError::UnexpectedEnd),
                Match::from_fen("4k3/8/8/8/8/8/8/4K3")
            );
            assert_eq!(
                Err(FenParseError::InvalidTurn),
                Match::from_fen("4k3/8/8/8/8/8/8/4K3 w 0")
            );
        }

        #[test]
        fn king_count() {
            assert_eq!(
                Err(FenParseError::MissingKing(Color::White)),
                Match::from_fen("4k3/8/8/8/8/8/8/8 w")
            );
            assert_eq!(
                Err(FenParseError::TooManyKings(Color::Black)),
                Match::from_fen("4k2k/8/8/8/8/8/8/4K3 w")
            );
        }

        #[test]
        fn opponent_in_check() {
            assert_eq!(
                Err(FenParseError::OpponentInCheck(Color::Black)),
                Match::from_fen("4k3/8/8/8/8/8/8/4RK2 w")
            );
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn empty_origin() {
            let m = Match::new();
            assert_eq!(
                Err(ChessError::EmptyOrigin(sq("e4"))),
                m.validate_origin(sq("e4"))
            );
        }

        #[test]
        fn wrong_color() {
            let m = Match::new();
            assert_eq!(
                Err(ChessError::WrongColor {
                    square: sq("e7"),
                    expected: Color::White,
                }),
                m.validate_origin(sq("e7"))
            );
        }

        #[test]
        fn no_legal_moves() {
            let m = Match::new();
            assert_eq!(
                Err(ChessError::NoLegalMoves(sq("a1"))),
                m.validate_origin(sq("a1"))
            );
            assert!(m.validate_origin(sq("b1")).is_ok());
        }

        #[test]
        fn far_off_board_origin_reports_cleanly() {
            let m = Match::new();
            let err = m.validate_origin(Position::new(i8::MIN, 0)).unwrap_err();
            assert_eq!(ChessError::OutOfBounds(Position::new(i8::MIN, 0)), err);
            assert_eq!("position (-128, 0) is off the board", err.to_string());
        }

        #[test]
        fn out_of_bounds() {
            let m = Match::new();
            let off = Position::new(3, 8);
            assert_eq!(Err(ChessError::OutOfBounds(off)), m.validate_origin(off));
            assert_eq!(
                Err(ChessError::OutOfBounds(off)),
                m.validate_destination(sq("e2"), off)
            );
        }

        #[test]
        fn illegal_destination() {
            let m = Match::new();
            assert!(m.validate_destination(sq("e2"), sq("e4")).is_ok());
            assert_eq!(
                Err(ChessError::IllegalDestination {
                    origin: sq("e2"),
                    destination: sq("e5"),
                }),
                m.validate_destination(sq("e2"), sq("e5"))
            );
        }

        #[test]
        fn failed_play_leaves_match_untouched() {
            let mut m = Match::new();
            let before = m.clone();
            assert!(m.play(sq("e2"), sq("e5")).is_err());
            assert!(m.play(sq("e7"), sq("e5")).is_err());
            assert!(m.play(sq("e4"), sq("e5")).is_err());
            assert_eq!(before, m);
        }
    }

    mod execute_undo {
        use super::*;

        #[test]
        fn quiet_move_roundtrip() {
            let mut m = Match::new();
            let before = m.clone();
            let capture = m.execute_move(sq("g1"), sq("f3")).unwrap();
            assert_eq!(None, capture);
            assert_eq!(Some((Color::White, PieceKind::Knight)), kind_at(&m, "f3"));
            assert_eq!(1, m.piece_at(sq("f3")).unwrap().unwrap().move_count());

            m.undo_move(sq("g1"), sq("f3"), capture).unwrap();
            assert_eq!(before, m);
        }

        #[test]
        fn capture_roundtrip() {
            let mut m = Match::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w").unwrap();
            let before = m.clone();
            let victim = m.board().id_at(sq("d5")).unwrap();

            let capture = m.execute_move(sq("e4"), sq("d5")).unwrap();
            assert_eq!(
                Some(Capture {
                    piece: victim,
                    square: sq("d5"),
                }),
                capture
            );
            assert_eq!(1, m.captured(Color::Black).len());
            assert_eq!(None, m.board().piece(victim).position());
            assert_eq!(1, m.pieces_in_play(Color::Black).count());

            m.undo_move(sq("e4"), sq("d5"), capture).unwrap();
            assert_eq!(before, m);
            assert!(m.captured(Color::Black).is_empty());
        }

        #[test]
        fn execute_from_empty_square() {
            let mut m = Match::new();
            let before = m.clone();
            assert_eq!(
                Err(ChessError::EmptyOrigin(sq("e4"))),
                m.execute_move(sq("e4"), sq("e5"))
            );
            assert_eq!(before, m);
        }
    }

    mod castling {
        use super::*;

        const FEN: &str = "r3k2r/8/8/8/8/8/8/R3K2R w";

        #[test]
        fn kingside() {
            let mut m = Match::from_fen(FEN).unwrap();
            assert!(m.moves_mask(sq("e1")).unwrap().contains(sq("g1")));
            play(&mut m, "e1", "g1");

            assert_eq!(Some((Color::White, PieceKind::King)), kind_at(&m, "g1"));
            assert_eq!(Some((Color::White, PieceKind::Rook)), kind_at(&m, "f1"));
            assert_eq!(None, kind_at(&m, "h1"));
            assert_eq!(None, kind_at(&m, "e1"));
            assert_eq!(1, m.piece_at(sq("f1")).unwrap().unwrap().move_count());
            assert_eq!(1, m.piece_at(sq("g1")).unwrap().unwrap().move_count());
        }

        #[test]
        fn queenside() {
            let mut m = Match::from_fen(FEN).unwrap();
            play(&mut m, "e1", "c1");
            assert_eq!(Some((Color::White, PieceKind::King)), kind_at(&m, "c1"));
            assert_eq!(Some((Color::White, PieceKind::Rook)), kind_at(&m, "d1"));
            assert_eq!(None, kind_at(&m, "a1"));

            play(&mut m, "e8", "c8");
            assert_eq!(Some((Color::Black, PieceKind::King)), kind_at(&m, "c8"));
            assert_eq!(Some((Color::Black, PieceKind::Rook)), kind_at(&m, "d8"));
        }

        #[test]
        fn two_column_king_step_needs_a_rook() {
            let m = Match::from_fen("4k3/8/8/8/8/8/8/4K3 w").unwrap();
            let mask = m.moves_mask(sq("e1")).unwrap();
            assert!(!mask.contains(sq("g1")));
            assert!(!mask.contains(sq("c1")));
            assert_eq!(5, mask.len());
        }

        #[test]
        fn undo_restores_king_and_rook() {
            let mut m = Match::from_fen(FEN).unwrap();
            let before = m.clone();
            for destination in &["g1", "c1"] {
                let capture = m.execute_move(sq("e1"), sq(destination)).unwrap();
                assert_eq!(None, capture);
                m.undo_move(sq("e1"), sq(destination), capture).unwrap();
                assert_eq!(before, m);
            }
        }

        #[test]
        fn moved_rook_cannot_castle() {
            let mut m = Match::from_fen(FEN).unwrap();
            play(&mut m, "h1", "h2");
            play(&mut m, "a8", "a7");
            play(&mut m, "h2", "h1");
            play(&mut m, "a7", "a8");
            assert!(!m.moves_mask(sq("e1")).unwrap().contains(sq("g1")));
            assert!(m.moves_mask(sq("e1")).unwrap().contains(sq("c1")));
            assert!(!m.moves_mask(sq("e8")).unwrap().contains(sq("c8")));
        }
    }

    mod en_passant {
        use super::*;

        const FEN: &str = "4k3/3p4/8/4P3/8/8/8/4K3 b";

        #[test]
        fn double_step_sets_target() {
            let mut m = Match::from_fen(FEN).unwrap();
            play(&mut m, "d7", "d5");
            let pawn = m.board().id_at(sq("d5")).unwrap();
            assert_eq!(Some(pawn), m.en_passant_target());
            assert!(m.moves_mask(sq("e5")).unwrap().contains(sq("d6")));
        }

        #[test]
        fn capture_removes_passed_pawn() {
            let mut m = Match::from_fen(FEN).unwrap();
            play(&mut m, "d7", "d5");
            let victim = m.board().id_at(sq("d5")).unwrap();
            play(&mut m, "e5", "d6");

            assert_eq!(Some((Color::White, PieceKind::Pawn)), kind_at(&m, "d6"));
            assert_eq!(None, kind_at(&m, "d5"));
            assert_eq!(None, kind_at(&m, "e5"));
            assert_eq!(None, m.board().piece(victim).position());
            let captured = m.captured(Color::Black);
            assert_eq!(1, captured.len());
            assert_eq!(PieceKind::Pawn, captured[0].kind());
            assert_eq!(None, m.en_passant_target());
        }

        #[test]
        fn undo_puts_pawn_back_beside() {
            let mut m = Match::from_fen(FEN).unwrap();
            play(&mut m, "d7", "d5");
            let before = m.clone();
            let victim = m.board().id_at(sq("d5")).unwrap();

            let capture = m.execute_move(sq("e5"), sq("d6")).unwrap();
            assert_eq!(
                Some(Capture {
                    piece: victim,
                    square: sq("d5"),
                }),
                capture
            );
            m.undo_move(sq("e5"), sq("d6"), capture).unwrap();
            assert_eq!(before, m);
        }

        #[test]
        fn expires_after_one_turn() {
            let mut m = Match::from_fen(FEN).unwrap();
            play(&mut m, "d7", "d5");
            play(&mut m, "e1", "e2");
            assert_eq!(None, m.en_passant_target());
            play(&mut m, "e8", "f7");
            assert_eq!(
                Err(ChessError::IllegalDestination {
                    origin: sq("e5"),
                    destination: sq("d6"),
                }),
                m.play(sq("e5"), sq("d6"))
            );
        }

        #[test]
        fn single_step_does_not_set_target() {
            let mut m = Match::from_fen(FEN).unwrap();
            play(&mut m, "d7", "d6");
            assert_eq!(None, m.en_passant_target());
        }
    }

    mod check {
        use super::*;

        #[test]
        fn pinned_piece_cannot_move() {
            let mut m = Match::from_fen("4k3/4r3/8/8/8/8/4B3/4K3 w").unwrap();
            let before = m.clone();
            assert!(m.moves_mask(sq("e2")).unwrap().contains(sq("d3")));
            assert_eq!(
                Err(ChessError::SelfCheck {
                    origin: sq("e2"),
                    destination: sq("d3"),
                    color: Color::White,
                }),
                m.play(sq("e2"), sq("d3"))
            );
            assert_eq!(before, m);
        }

        #[test]
        fn king_cannot_step_into_attack() {
            let mut m = Match::from_fen("4k3/8/8/8/8/8/5r2/4K3 w").unwrap();
            let before = m.clone();
            assert!(matches!(
                m.play(sq("e1"), sq("e2")),
                Err(ChessError::SelfCheck { .. })
            ));
            assert_eq!(before, m);
            play(&mut m, "e1", "f2");
            assert_eq!(1, m.captured(Color::Black).len());
        }

        #[test]
        fn self_check_capture_is_rolled_back() {
            // Taking the knight would expose the king to the rook.
            let mut m = Match::from_fen("4k3/4r3/8/8/8/3n4/4B3/4K3 w").unwrap();
            let before = m.clone();
            assert!(matches!(
                m.play(sq("e2"), sq("d3")),
                Err(ChessError::SelfCheck { .. })
            ));
            assert_eq!(before, m);
            assert!(m.captured(Color::Black).is_empty());
        }

        #[test]
        fn giving_check() {
            let mut m = Match::from_fen("4k3/8/8/8/8/8/8/R3K3 w").unwrap();
            play(&mut m, "a1", "a8");
            assert!(m.in_check());
            assert!(m.is_in_check(Color::Black).unwrap());
            assert!(!m.is_in_check(Color::White).unwrap());
            assert!(!m.is_terminated());
            assert_eq!(Color::Black, m.current_player());
            assert!(m.to_string().contains("CHECK!"));

            play(&mut m, "e8", "e7");
            assert!(!m.in_check());
        }

        #[test]
        fn must_answer_check() {
            let mut m = Match::from_fen("4k3/8/8/8/8/8/8/R3K3 w").unwrap();
            play(&mut m, "a1", "a8");
            let legal = m.legal_moves(Color::Black).unwrap();
            assert!(!legal.is_empty());
            for (origin, destination) in legal {
                assert_eq!(sq("e8"), origin);
                assert_eq!(1, destination.row());
            }
        }

        #[test]
        fn missing_king() {
            let mut m = Match::from_fen("4k3/8/8/8/8/8/8/4K3 w").unwrap();
            m.board.remove(sq("e8")).unwrap();
            let err = m.is_in_check(Color::Black).unwrap_err();
            assert_eq!(ChessError::NoKing(Color::Black), err);
            assert!(err.is_fatal());
        }
    }

    mod checkmate {
        use super::*;

        #[test]
        fn fools_mate() {
            let mut m = Match::new();
            play(&mut m, "f2", "f3");
            play(&mut m, "e7", "e5");
            play(&mut m, "g2", "g4");
            assert_eq!(4, m.turn());
            assert_eq!(Color::Black, m.current_player());

            play(&mut m, "d8", "h4");
            assert!(m.is_terminated());
            assert!(m.in_check());
            assert_eq!(Color::Black, m.current_player());
            assert_eq!(Some(Color::Black), m.winner());
            assert_eq!(4, m.turn());
            assert!(m.is_checkmate(Color::White).unwrap());

            let rendered = m.to_string();
            assert!(rendered.contains("CHECKMATE!"));
            assert!(rendered.contains("Winner: Black"));
        }

        #[test]
        fn terminated_match_rejects_moves() {
            let mut m = Match::new();
            play(&mut m, "f2", "f3");
            play(&mut m, "e7", "e5");
            play(&mut m, "g2", "g4");
            play(&mut m, "d8", "h4");
            let before = m.clone();
            assert_eq!(Err(ChessError::GameOver), m.play(sq("e2"), sq("e3")));
            assert_eq!(
                Err(ChessError::GameOver),
                m.perform_turn(sq("e2"), sq("e3"))
            );
            assert_eq!(before, m);
        }

        #[test]
        fn back_rank_mate() {
            let mut m = Match::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w").unwrap();
            play(&mut m, "a1", "a8");
            assert!(m.is_terminated());
            assert_eq!(Some(Color::White), m.winner());
        }

        #[test]
        fn check_with_escape_is_not_mate() {
            let mut m = Match::from_fen("6k1/5pp1/8/8/8/8/8/R5K1 w").unwrap();
            let before_trial = m.clone();
            assert!(!m.is_checkmate(Color::Black).unwrap());
            assert_eq!(before_trial, m);

            play(&mut m, "a1", "a8");
            assert!(m.in_check());
            assert!(!m.is_terminated());
            let before = m.clone();
            assert!(!m.is_checkmate(Color::Black).unwrap());
            assert_eq!(before, m);
        }

        #[test]
        fn capture_of_checking_piece_escapes() {
            let mut m = Match::from_fen("6k1/5ppp/1n6/8/8/8/8/R5K1 w").unwrap();
            play(&mut m, "a1", "a8");
            assert!(m.in_check());
            assert!(!m.is_terminated());

            play(&mut m, "b6", "a8");
            assert!(!m.in_check());
            assert_eq!(Some((Color::Black, PieceKind::Knight)), kind_at(&m, "a8"));
            assert_eq!(PieceKind::Rook, m.captured(Color::White)[0].kind());
        }
    }

    mod turns {
        use super::*;

        #[test]
        fn alternate_and_count() {
            let mut m = Match::new();
            let moves = [("e2", "e4"), ("e7", "e5"), ("g1", "f3"), ("b8", "c6")];
            for (i, (origin, destination)) in moves.iter().enumerate() {
                let expected = if i % 2 == 0 { Color::White } else { Color::Black };
                assert_eq!(expected, m.current_player());
                assert_eq!(i as u32 + 1, m.turn());
                play(&mut m, origin, destination);
            }

            assert_eq!(5, m.turn());
            assert_eq!(Color::White, m.current_player());
        }

        #[test]
        fn rejected_moves_do_not_advance() {
            let mut m = Match::new();
            assert!(m.play(sq("e2"), sq("e5")).is_err());
            assert_eq!(1, m.turn());
            assert_eq!(Color::White, m.current_player());
        }
    }

    mod views {
        use super::*;

        #[test]
        fn display_header() {
            let m = Match::new();
            let rendered = m.to_string();
            assert!(rendered.starts_with("8 r n b q k b n r \n"));
            assert!(rendered.contains("Turn: 1"));
            assert!(rendered.contains("Waiting for: White"));
            assert!(!rendered.contains("CHECK"));
        }

        #[test]
        fn highlighted_moves() {
            let m = Match::new();
            let mask = m.moves_mask(sq("g1")).unwrap();
            let rendered = m.render_with_mask(mask);
            let rank3 = rendered.lines().nth(5).unwrap();
            assert_eq!("3  .  .  .  .  .  *  .  * ", rank3);
        }

        #[test]
        fn snapshot_json() {
            let mut m = Match::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w").unwrap();
            play(&mut m, "e4", "d5");
            let value = serde_json::to_value(m.snapshot()).unwrap();
            assert_eq!(2, value["turn"]);
            assert_eq!("Black", value["current_player"]);
            assert_eq!(false, value["in_check"]);
            assert_eq!(false, value["terminated"]);
            assert_eq!(serde_json::json!(["Pawn"]), value["captured_black"]);
            assert_eq!("King", value["board"][0][4]["kind"]);
            assert_eq!(serde_json::Value::Null, value["board"][4][4]);
        }
    }

    mod playouts {
        use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};

        use super::*;

        fn kings(m: &Match, color: Color) -> usize {
            m.pieces_in_play(color)
                .filter(|&id| m.board().piece(id).kind() == PieceKind::King)
                .count()
        }

        #[test]
        fn random_games_keep_invariants() {
            for seed in 0..8 {
                let mut rng = SmallRng::seed_from_u64(seed);
                let mut m = Match::new();
                for _ in 0..160 {
                    if m.is_terminated() {
                        break;
                    }

                    let mover = m.current_player();
                    let moves = m.legal_moves(mover).unwrap();
                    let (origin, destination) = match moves.choose(&mut rng) {
                        Some(&mov) => mov,
                        None => break,
                    };

                    // Every trial move must be undone exactly.
                    let before = m.clone();
                    let capture = m.execute_move(origin, destination).unwrap();
                    m.undo_move(origin, destination, capture).unwrap();
                    assert_eq!(before, m, "seed {} move {}{}", seed, origin, destination);

                    let turn = m.turn();
                    m.perform_turn(origin, destination).unwrap();
                    assert_eq!(1, kings(&m, Color::White));
                    assert_eq!(1, kings(&m, Color::Black));
                    if m.is_terminated() {
                        assert_eq!(mover, m.current_player());
                        assert_eq!(turn, m.turn());
                    } else {
                        assert_eq!(mover.toggle(), m.current_player());
                        assert_eq!(turn + 1, m.turn());
                        assert!(!m.is_in_check(mover).unwrap());
                    }

                    if let Some(ep) = m.en_passant_target() {
                        let pawn = m.board().piece(ep);
                        assert_eq!(PieceKind::Pawn, pawn.kind());
                        assert_eq!(Some(destination), pawn.position());
                    }
                }
            }
        }
    }
}
