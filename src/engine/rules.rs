//! The engine facade handed to callers.
//!
//! `Engine` owns the `PositionCache` for one session and exposes the rules:
//! initial position, custom setups, move generation, move application,
//! check/checkmate queries and undo/reset over the state history.

use tracing::debug;

use crate::engine::apply;
use crate::engine::board::BoardState;
use crate::engine::cache::PositionCache;
use crate::engine::check;
use crate::engine::movegen;
use crate::engine::types::{ChessError, Color, GameStatus, Piece, Position};

#[derive(Debug, Default)]
pub struct Engine {
    cache: PositionCache,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }

    // -----------------------------------------------------------------
    // States
    // -----------------------------------------------------------------

    /// Standard starting position. Nobody is in check there.
    pub fn initial_state(&self) -> BoardState {
        BoardState::initial()
    }

    /// Discard any history and start over.
    pub fn reset(&self) -> BoardState {
        debug!("game reset");
        self.initial_state()
    }

    /// Build a custom position from piece placements.
    ///
    /// Fails with `InvariantViolation` when the placement is not a valid
    /// board or the side not to move is already in check.
    pub fn setup(
        &self,
        active_player: Color,
        pieces: impl IntoIterator<Item = (Piece, Position)>,
    ) -> Result<BoardState, ChessError> {
        let state = BoardState::from_pieces(active_player, pieces)?;
        if check::is_in_check(&self.cache, &state, !active_player)? {
            return Err(ChessError::InvariantViolation(format!(
                "{} is in check but {active_player} is to move",
                !active_player
            )));
        }
        let in_check = check::is_in_check(&self.cache, &state, active_player)?;
        let in_checkmate = in_check && check::is_in_checkmate(&self.cache, &state, active_player)?;
        Ok(state.with_status(in_check, in_checkmate))
    }

    // -----------------------------------------------------------------
    // Move generation
    // -----------------------------------------------------------------

    /// Destinations ignoring self-check.
    pub fn raw_moves(&self, piece: &Piece, state: &BoardState) -> Result<Vec<Position>, ChessError> {
        movegen::raw_moves(&self.cache, piece, state)
    }

    /// Destinations that do not leave the mover's king in check.
    pub fn legal_moves(
        &self,
        piece: &Piece,
        state: &BoardState,
    ) -> Result<Vec<Position>, ChessError> {
        movegen::legal_moves(&self.cache, piece, state)
    }

    /// Legal moves of every piece of `color`.
    pub fn legal_moves_for(
        &self,
        state: &BoardState,
        color: Color,
    ) -> Result<Vec<(Piece, Vec<Position>)>, ChessError> {
        movegen::legal_moves_for(&self.cache, state, color)
    }

    // -----------------------------------------------------------------
    // Making moves
    // -----------------------------------------------------------------

    /// Play `piece` to `to`. The piece must belong to the side to move and
    /// `to` must be one of its legal moves; `state` is never modified.
    pub fn apply_move(
        &self,
        piece: &Piece,
        to: Position,
        state: &BoardState,
    ) -> Result<BoardState, ChessError> {
        if piece.color != state.active_player() {
            return Err(ChessError::invalid_move(
                piece,
                to,
                format!("it is {}'s turn", state.active_player()),
            ));
        }
        if !self.legal_moves(piece, state)?.contains(&to) {
            return Err(ChessError::invalid_move(piece, to, "not a legal move"));
        }
        apply::apply_move(&self.cache, piece, to, state)
    }

    // -----------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------

    pub fn is_in_check(&self, state: &BoardState, color: Color) -> Result<bool, ChessError> {
        check::is_in_check(&self.cache, state, color)
    }

    pub fn is_in_checkmate(&self, state: &BoardState, color: Color) -> Result<bool, ChessError> {
        check::is_in_checkmate(&self.cache, state, color)
    }

    /// Status of the side to move, read from the state's flags.
    pub fn status(&self, state: &BoardState) -> GameStatus {
        if state.player_in_checkmate() {
            GameStatus::Checkmate
        } else if state.player_in_check() {
            GameStatus::Check
        } else {
            GameStatus::Active
        }
    }

    // -----------------------------------------------------------------
    // History
    // -----------------------------------------------------------------

    /// The state before the last ply, or `None` at the start of the game.
    pub fn undo(&self, state: &BoardState) -> Option<BoardState> {
        state.previous().cloned()
    }
}
