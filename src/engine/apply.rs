//! Producing successor states.
//!
//! `relocate` is the raw primitive shared by the legality filter: it moves
//! the piece, resolves captures (en passant included) and flips the side to
//! move, but leaves the check flags unset. `apply_move` additionally
//! computes check and checkmate for the side that moves next.

use tracing::debug;

use crate::engine::board::BoardState;
use crate::engine::cache::PositionCache;
use crate::engine::check;
use crate::engine::types::{ChessError, Piece, PieceType, Position};

/// Move `piece` to `to` and compute the new side's check status.
pub fn apply_move(
    cache: &PositionCache,
    piece: &Piece,
    to: Position,
    state: &BoardState,
) -> Result<BoardState, ChessError> {
    let next = relocate(piece, to, state)?;
    let side = next.active_player();
    let in_check = check::is_in_check(cache, &next, side)?;
    let in_checkmate = in_check && check::is_in_checkmate(cache, &next, side)?;

    debug!(
        piece = %piece,
        to = %to,
        ply = next.ply(),
        in_check,
        in_checkmate,
        "move applied"
    );
    Ok(next.with_status(in_check, in_checkmate))
}

/// Move `piece` to `to` without computing check flags.
pub fn relocate(piece: &Piece, to: Position, state: &BoardState) -> Result<BoardState, ChessError> {
    let from = state.locate(piece)?;
    relocate_from(piece, from, to, state)
}

pub(crate) fn relocate_from(
    piece: &Piece,
    from: Position,
    to: Position,
    state: &BoardState,
) -> Result<BoardState, ChessError> {
    let mut board = state.board().clone();
    let mut captured = state.captured_pieces().to_vec();

    match board.piece_at(to) {
        Some(target) if target.color == piece.color => {
            return Err(ChessError::InvariantViolation(format!(
                "{piece} cannot land on {to} occupied by its own side ({target})"
            )));
        }
        Some(target) if target.kind == PieceType::King => {
            return Err(ChessError::InvariantViolation(format!(
                "{piece} would capture the king {target} on {to}"
            )));
        }
        Some(target) => captured.push(target),
        None if piece.kind == PieceType::Pawn && to.col != from.col => {
            // A diagonal pawn move onto an empty square is en passant: the
            // victim stands beside the mover, not on the landing square.
            let victim_sq = Position::new(from.row, to.col);
            match board.piece_at(victim_sq) {
                Some(victim) if victim.kind == PieceType::Pawn && victim.color != piece.color => {
                    captured.push(victim);
                    board.set(victim_sq, None);
                }
                other => {
                    return Err(ChessError::InvariantViolation(format!(
                        "en passant by {piece} to {to} expects an enemy pawn on {victim_sq}, found {}",
                        other.map_or_else(|| "nothing".to_string(), |p| p.id())
                    )));
                }
            }
        }
        None => {}
    }

    board.set(from, None);
    board.set(to, Some(*piece));
    Ok(state.successor(board, captured))
}
