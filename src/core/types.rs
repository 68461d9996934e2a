// Copyright 2017-2022 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::{convert::TryFrom, fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

use crate::error::ChessError;

/// Number of rows on the board.
pub const ROWS: i8 = 8;

/// Number of columns on the board.
pub const COLUMNS: i8 = 8;

#[derive(Debug, Error)]
pub enum RankParseError {
    #[error("invalid char: {0}")]
    InvalidChar(char),
}

#[derive(Debug, Error)]
pub enum FileParseError {
    #[error("invalid char: {0}")]
    InvalidChar(char),
}

/// A coordinate on the board. Row 0 is the eighth rank (Black's back rank) and column 0 is the a-file, so
/// White's pieces start on rows 6 and 7.
///
/// Positions are plain values; they may lie off the board; `Board::is_valid` decides whether one does.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    row: i8,
    column: i8,
}

impl Position {
    pub const fn new(row: i8, column: i8) -> Position {
        Position { row, column }
    }

    pub const fn row(self) -> i8 {
        self.row
    }

    pub const fn column(self) -> i8 {
        self.column
    }

    /// Returns the position displaced by the given row and column deltas. The result may be off the board.
    pub const fn offset(self, rows: i8, columns: i8) -> Position {
        Position::new(self.row + rows, self.column + columns)
    }

    /// Returns the closest position in the given direction.
    pub const fn towards(self, dir: Direction) -> Position {
        let (rows, columns) = dir.as_vector();
        self.offset(rows, columns)
    }

    pub const fn is_on_board(self) -> bool {
        self.row >= 0 && self.row < ROWS && self.column >= 0 && self.column < COLUMNS
    }

    /// Linear index of this position in a row-major 8x8 grid. Only meaningful for on-board positions.
    pub(crate) const fn index(self) -> usize {
        (self.row * COLUMNS + self.column) as usize
    }

    pub(crate) const fn from_index(index: usize) -> Position {
        Position::new((index / COLUMNS as usize) as i8, (index % COLUMNS as usize) as i8)
    }

    pub fn file(self) -> Option<File> {
        if !(0..COLUMNS).contains(&self.column) {
            return None;
        }

        Some(File(self.column as u8))
    }

    pub fn rank(self) -> Option<Rank> {
        if !(0..ROWS).contains(&self.row) {
            return None;
        }

        Some(Rank((ROWS - 1 - self.row) as u8))
    }

    /// Parses an algebraic coordinate such as `e2` into a position.
    pub fn from_algebraic(s: &str) -> Result<Position, ChessError> {
        let invalid = || ChessError::InvalidSquare(s.to_owned());
        let mut chars = s.trim().chars();
        let file = chars
            .next()
            .and_then(|c| File::try_from(c.to_ascii_lowercase()).ok())
            .ok_or_else(invalid)?;
        let rank = chars
            .next()
            .and_then(|c| Rank::try_from(c).ok())
            .ok_or_else(invalid)?;
        if chars.next().is_some() {
            return Err(invalid());
        }

        Ok(Position::of(rank, file))
    }

    pub const fn of(rank: Rank, file: File) -> Position {
        Position::new(ROWS - 1 - rank.0 as i8, file.0 as i8)
    }
}

impl FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_algebraic(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.file(), self.rank()) {
            (Some(file), Some(rank)) => write!(f, "{}{}", file, rank),
            _ => write!(f, "({}, {})", self.row, self.column),
        }
    }
}

/// A rank of the chessboard, as written in algebraic notation. `Rank(0)` is the first rank.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rank(u8);

impl TryFrom<char> for Rank {
    type Error = RankParseError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '1'..='8' => Ok(Rank(value as u8 - b'1')),
            c => Err(RankParseError::InvalidChar(c)),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", (b'1' + self.0) as char)
    }
}

/// A file of the chessboard, as written in algebraic notation. `File(0)` is the a-file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct File(u8);

impl TryFrom<char> for File {
    type Error = FileParseError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'a'..='h' => Ok(File(value as u8 - b'a')),
            c => Err(FileParseError::InvalidChar(c)),
        }
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", (b'a' + self.0) as char)
    }
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn toggle(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a pawn advance for this color.
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// The row this color's pawns start on.
    pub const fn pawn_row(self) -> i8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Parses a FEN piece letter. Upper-case letters are White, lower-case are Black.
    pub fn from_fen_char(c: char) -> Option<(Color, PieceKind)> {
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };

        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };

        Some((color, kind))
    }

    pub fn fen_char(self, color: Color) -> char {
        let c = match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };

        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fen_char(Color::Black))
    }
}

/// Handle to a piece owned by a [`Board`](crate::Board). Handles stay valid for the life of the board,
/// whether or not the piece is currently placed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PieceId(pub(crate) usize);

impl PieceId {
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

/// A chess piece. The piece's position is maintained by the board it lives on and is `None` whenever the piece is
/// not placed (before setup, or after capture).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    color: Color,
    position: Option<Position>,
    move_count: u32,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Piece {
        Piece {
            kind,
            color,
            position: None,
            move_count: 0,
        }
    }

    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    pub const fn color(&self) -> Color {
        self.color
    }

    pub const fn position(&self) -> Option<Position> {
        self.position
    }

    pub const fn move_count(&self) -> u32 {
        self.move_count
    }

    pub(crate) fn set_position(&mut self, position: Option<Position>) {
        self.position = position;
    }

    pub(crate) fn with_move_count(mut self, move_count: u32) -> Piece {
        self.move_count = move_count;
        self
    }

    pub(crate) fn increment_move_count(&mut self) {
        self.move_count += 1;
    }

    pub(crate) fn decrement_move_count(&mut self) {
        debug_assert!(self.move_count > 0, "move count underflow");
        self.move_count -= 1;
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.fen_char(self.color))
    }
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// Row and column deltas of a single step. North points toward the eighth rank, i.e. decreasing rows.
    pub const fn as_vector(self) -> (i8, i8) {
        match self {
            Direction::North => (-1, 0),
            Direction::NorthEast => (-1, 1),
            Direction::East => (0, 1),
            Direction::SouthEast => (1, 1),
            Direction::South => (1, 0),
            Direction::SouthWest => (1, -1),
            Direction::West => (0, -1),
            Direction::NorthWest => (-1, -1),
        }
    }
}

pub const ORTHOGONAL: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

pub const DIAGONAL: [Direction; 4] = [
    Direction::NorthEast,
    Direction::SouthEast,
    Direction::SouthWest,
    Direction::NorthWest,
];

pub const ALL_DIRECTIONS: [Direction; 8] = [
    Direction::North,
    Direction::NorthEast,
    Direction::East,
    Direction::SouthEast,
    Direction::South,
    Direction::SouthWest,
    Direction::West,
    Direction::NorthWest,
];

pub fn colors() -> ::std::vec::IntoIter<Color> {
    vec![Color::White, Color::Black].into_iter()
}
