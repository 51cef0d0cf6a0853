//! Stateful game session wrapping the engine.
//!
//! `Game` holds the current `BoardState`, the piece the player has selected,
//! a record of the moves played and some session metadata. Undo walks the
//! state history, so a selection in progress is simply dropped. Only moves
//! played through this session can be undone.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::engine::board::BoardState;
use crate::engine::rules::Engine;
use crate::engine::types::{ChessError, Color, GameStatus, Piece, Position};

// =========================================================================
// MoveRecord
// =========================================================================

/// A move that was played in this session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveRecord {
    pub piece: Piece,
    pub from: Position,
    pub to: Position,
    pub captured: Option<Piece>,
    /// Status of the side to move after this move.
    pub status_after: GameStatus,
}

// =========================================================================
// Game
// =========================================================================

#[derive(Clone, Debug)]
pub struct Game {
    engine: Arc<Engine>,
    state: BoardState,
    selected: Option<Piece>,
    move_history: Vec<MoveRecord>,

    // Metadata
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// A new game from the standard starting position with its own engine.
    pub fn new() -> Self {
        Self::with_engine(Arc::new(Engine::new()))
    }

    /// A new game sharing an existing engine (and its cache).
    pub fn with_engine(engine: Arc<Engine>) -> Self {
        let state = engine.initial_state();
        Self::from_state(engine, state)
    }

    /// Continue from an existing state, e.g. one built with `Engine::setup`.
    ///
    /// History already carried by `state` stays available for en passant,
    /// but the session starts with no moves to undo.
    pub fn from_state(engine: Arc<Engine>, state: BoardState) -> Self {
        Self {
            engine,
            state,
            selected: None,
            move_history: Vec::new(),
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn status(&self) -> GameStatus {
        self.engine.status(&self.state)
    }

    pub fn side_to_move(&self) -> Color {
        self.state.active_player()
    }

    pub fn is_game_over(&self) -> bool {
        self.status().is_game_over()
    }

    pub fn selected(&self) -> Option<Piece> {
        self.selected
    }

    /// Moves played in this session, oldest first.
    pub fn move_history(&self) -> &[MoveRecord] {
        &self.move_history
    }

    pub fn captured_pieces(&self) -> &[Piece] {
        self.state.captured_pieces()
    }

    /// Legal moves of whatever stands on `pos`; empty for an empty square.
    pub fn legal_moves_at(&self, pos: Position) -> Result<Vec<Position>, ChessError> {
        match self.piece_on(pos)? {
            Some(piece) => self.engine.legal_moves(&piece, &self.state),
            None => Ok(Vec::new()),
        }
    }

    /// Occupant of a caller-supplied square, rejecting off-board squares.
    fn piece_on(&self, pos: Position) -> Result<Option<Piece>, ChessError> {
        if !pos.on_board() {
            return Err(ChessError::InvalidSquare(format!("({},{})", pos.row, pos.col)));
        }
        Ok(self.state.piece_at(pos))
    }

    // -----------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------

    /// Select the piece on `pos` and return its legal moves.
    pub fn select(&mut self, pos: Position) -> Result<Vec<Position>, ChessError> {
        let piece = self
            .piece_on(pos)?
            .ok_or_else(|| ChessError::PieceNotFound(pos.to_algebraic()))?;
        if piece.color != self.side_to_move() {
            return Err(ChessError::invalid_move(
                &piece,
                pos,
                format!("it is {}'s turn", self.side_to_move()),
            ));
        }
        let moves = self.engine.legal_moves(&piece, &self.state)?;
        self.selected = Some(piece);
        Ok(moves)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Move the selected piece to `to`.
    pub fn move_selected(&mut self, to: Position) -> Result<MoveRecord, ChessError> {
        let piece = self
            .selected
            .ok_or_else(|| ChessError::PieceNotFound("no piece selected".into()))?;
        self.make_move(&piece, to)
    }

    // -----------------------------------------------------------------
    // Make move
    // -----------------------------------------------------------------

    /// Play `piece` to `to`. Fails with `GameOver` after checkmate.
    pub fn make_move(&mut self, piece: &Piece, to: Position) -> Result<MoveRecord, ChessError> {
        if self.is_game_over() {
            return Err(ChessError::GameOver(format!(
                "{} is checkmated",
                self.side_to_move()
            )));
        }

        let from = self.state.locate(piece)?;
        let next = self.engine.apply_move(piece, to, &self.state)?;
        let captured = (next.captured_pieces().len() > self.state.captured_pieces().len())
            .then(|| next.captured_pieces().last().copied())
            .flatten();

        self.state = next;
        self.selected = None;
        let record = MoveRecord {
            piece: *piece,
            from,
            to,
            captured,
            status_after: self.status(),
        };
        debug!(game_id = %self.id, %from, %to, status = %record.status_after, "move played");
        self.move_history.push(record.clone());
        Ok(record)
    }

    /// Play whatever stands on `from` to `to`.
    pub fn play(&mut self, from: Position, to: Position) -> Result<MoveRecord, ChessError> {
        let piece = self
            .piece_on(from)?
            .ok_or_else(|| ChessError::PieceNotFound(from.to_algebraic()))?;
        self.make_move(&piece, to)
    }

    // -----------------------------------------------------------------
    // Undo / reset
    // -----------------------------------------------------------------

    /// Step back one ply played in this session.
    pub fn undo(&mut self) -> Result<(), ChessError> {
        if self.move_history.is_empty() {
            return Err(ChessError::NothingToUndo);
        }
        let previous = self
            .engine
            .undo(&self.state)
            .ok_or(ChessError::NothingToUndo)?;
        self.state = previous;
        self.selected = None;
        self.move_history.pop();
        debug!(game_id = %self.id, ply = self.state.ply(), "move undone");
        Ok(())
    }

    /// Back to the starting position; history and selection are discarded.
    pub fn reset(&mut self) {
        self.state = self.engine.reset();
        self.selected = None;
        self.move_history.clear();
    }

    // -----------------------------------------------------------------
    // Board array
    // -----------------------------------------------------------------

    /// 8×8 array of piece ids, row 0 (rank 8) first.
    pub fn board_array(&self) -> [[Option<String>; 8]; 8] {
        std::array::from_fn(|row| {
            std::array::from_fn(|col| {
                self.state
                    .piece_at(Position::new(row as u8, col as u8))
                    .map(|piece| piece.id())
            })
        })
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
