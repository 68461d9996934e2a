// Copyright 2021 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Move-mask generation for every kind of piece.
//!
//! Masks are pseudo-legal: they mark every square a piece could move to on the current board without asking whether
//! the move would leave its own king in check. That filter lives in `Match`.

use crate::core::*;
use crate::Board;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, 2),
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
];

/// Match-level facts that some pieces need in order to generate their moves. Kings need to know whether their side
/// is in check (castling is forbidden while in check) and pawns need to know which pawn, if any, may be captured en
/// passant.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveContext {
    /// The color currently flagged as being in check, if any.
    pub check: Option<Color>,
    /// The pawn that advanced two squares on the previous turn.
    pub en_passant: Option<PieceId>,
}

/// Returns the set of squares the given piece could move to. Unplaced pieces have no moves.
pub fn moves_mask(board: &Board, id: PieceId, ctx: MoveContext) -> MoveMask {
    let piece = board.piece(id);
    let from = match piece.position() {
        Some(pos) => pos,
        None => return MoveMask::empty(),
    };

    let mut mask = MoveMask::empty();
    match piece.kind() {
        PieceKind::Pawn => generate_pawn_moves(board, piece, from, ctx, &mut mask),
        PieceKind::Knight => generate_step_moves(board, piece, from, &KNIGHT_OFFSETS, &mut mask),
        PieceKind::Bishop => generate_slide_moves(board, piece, from, &DIAGONAL, &mut mask),
        PieceKind::Rook => generate_slide_moves(board, piece, from, &ORTHOGONAL, &mut mask),
        PieceKind::Queen => generate_slide_moves(board, piece, from, &ALL_DIRECTIONS, &mut mask),
        PieceKind::King => generate_king_moves(board, piece, from, ctx, &mut mask),
    }

    mask
}

/// Whether `piece` may end a move on `pos`: the square is on the board and not held by a friendly piece.
fn can_move_to(board: &Board, piece: &Piece, pos: Position) -> bool {
    board.is_valid(pos)
        && board
            .get(pos)
            .map_or(true, |other| other.color() != piece.color())
}

fn has_enemy(board: &Board, piece: &Piece, pos: Position) -> bool {
    board
        .get(pos)
        .map_or(false, |other| other.color() != piece.color())
}

fn is_free(board: &Board, pos: Position) -> bool {
    board.is_valid(pos) && board.get(pos).is_none()
}

fn generate_slide_moves(
    board: &Board,
    piece: &Piece,
    from: Position,
    directions: &[Direction],
    mask: &mut MoveMask,
) {
    for &dir in directions {
        let mut pos = from.towards(dir);
        while can_move_to(board, piece, pos) {
            mask.insert(pos);
            if has_enemy(board, piece, pos) {
                break;
            }

            pos = pos.towards(dir);
        }
    }
}

fn generate_step_moves(
    board: &Board,
    piece: &Piece,
    from: Position,
    offsets: &[(i8, i8)],
    mask: &mut MoveMask,
) {
    for &(rows, columns) in offsets {
        let pos = from.offset(rows, columns);
        if can_move_to(board, piece, pos) {
            mask.insert(pos);
        }
    }
}

fn generate_king_moves(
    board: &Board,
    king: &Piece,
    from: Position,
    ctx: MoveContext,
    mask: &mut MoveMask,
) {
    for dir in ALL_DIRECTIONS {
        let pos = from.towards(dir);
        if can_move_to(board, king, pos) {
            mask.insert(pos);
        }
    }

    // Castling only asks that the king and rook are unmoved, the squares between them are empty, and the king is not
    // in check right now. Squares the king passes over are not tested for attacks.
    if king.move_count() != 0 || ctx.check == Some(king.color()) {
        return;
    }

    if rook_can_castle(board, king, from.offset(0, 3))
        && (1..=2).all(|i| is_free(board, from.offset(0, i)))
    {
        mask.insert(from.offset(0, 2));
    }

    if rook_can_castle(board, king, from.offset(0, -4))
        && (1..=3).all(|i| is_free(board, from.offset(0, -i)))
    {
        mask.insert(from.offset(0, -2));
    }
}

fn rook_can_castle(board: &Board, king: &Piece, pos: Position) -> bool {
    board.get(pos).map_or(false, |rook| {
        rook.kind() == PieceKind::Rook && rook.color() == king.color() && rook.move_count() == 0
    })
}

fn generate_pawn_moves(
    board: &Board,
    pawn: &Piece,
    from: Position,
    ctx: MoveContext,
    mask: &mut MoveMask,
) {
    let up = pawn.color().forward();

    let single = from.offset(up, 0);
    if is_free(board, single) {
        mask.insert(single);
    }

    // The square being jumped over is deliberately not consulted.
    let double = from.offset(2 * up, 0);
    if pawn.move_count() == 0 && is_free(board, double) {
        mask.insert(double);
    }

    for side in [-1, 1] {
        let target = from.offset(up, side);
        if !board.is_valid(target) {
            continue;
        }

        if has_enemy(board, pawn, target) {
            mask.insert(target);
            continue;
        }

        // En passant: the pawn beside us on our row just made a double step.
        let beside = from.offset(0, side);
        if let (Some(victim), Some(ep)) = (board.id_at(beside), ctx.en_passant) {
            if victim == ep && has_enemy(board, pawn, beside) && board.get(target).is_none() {
                mask.insert(target);
            }
        }
    }
}
