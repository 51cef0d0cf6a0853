//! Check and checkmate detection.
//!
//! Check detection reads only raw moves of the attacking side; legal move
//! generation depends on check detection, so the reverse would recurse.

use tracing::debug;

use crate::engine::board::BoardState;
use crate::engine::cache::PositionCache;
use crate::engine::movegen;
use crate::engine::types::{ChessError, Color};

/// Is the king of `color` attacked in `state`?
pub fn is_in_check(
    cache: &PositionCache,
    state: &BoardState,
    color: Color,
) -> Result<bool, ChessError> {
    cache.check_status(state, color)
}

/// Is `color` in check with no legal move for any of its pieces?
pub fn is_in_checkmate(
    cache: &PositionCache,
    state: &BoardState,
    color: Color,
) -> Result<bool, ChessError> {
    if !is_in_check(cache, state, color)? {
        return Ok(false);
    }
    cache.checkmate_status(state, color)
}

pub(crate) fn compute_check(
    cache: &PositionCache,
    state: &BoardState,
    color: Color,
) -> Result<bool, ChessError> {
    let king = state.king_position(color)?;
    let table = cache.raw_table(state);
    for (from, attacker) in state.pieces_of(!color) {
        if table.moves_at(from).contains(&king) {
            debug!(king = %king, attacker = %attacker, "{color} is in check");
            return Ok(true);
        }
    }
    Ok(false)
}

/// Assumes `color` is in check; looks for any piece with a legal move.
pub(crate) fn compute_checkmate(
    cache: &PositionCache,
    state: &BoardState,
    color: Color,
) -> Result<bool, ChessError> {
    for (from, piece) in state.pieces_of(color) {
        if !movegen::legal_moves_from(cache, &piece, from, state)?.is_empty() {
            return Ok(false);
        }
    }
    debug!(ply = state.ply(), "{color} is checkmated");
    Ok(true)
}
