//! Immutable board states.
//!
//! `Board` is the 8×8 grid, stored as eight copy-on-write rows so that a move
//! only clones the rows it touches. `BoardState` adds the side to move, the
//! captured pieces, the check flags of the side to move and a persistent
//! chain of predecessor states used for undo and en-passant look-back.

use std::fmt;
use std::sync::Arc;

use crate::engine::types::{ChessError, Color, Piece, PieceType, Position};

/// One rank of the grid.
pub type Row = [Option<Piece>; 8];

/// Rendering of an empty square inside a fingerprint.
pub const EMPTY_SENTINEL: &str = "0";

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Piece placement. Each square holds at most one piece.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    rows: [Arc<Row>; 8],
}

impl Board {
    /// A board with no pieces.
    pub fn empty() -> Self {
        Board {
            rows: std::array::from_fn(|_| Arc::new([None; 8])),
        }
    }

    /// The standard 32-piece setup: black on rows 0/1, white on rows 6/7.
    pub fn standard() -> Self {
        let mut board = Board::empty();
        for (color, back, pawns) in [(Color::Black, 0u8, 1u8), (Color::White, 7, 6)] {
            for col in 0..8u8 {
                let back_sq = Position::new(back, col);
                let pawn_sq = Position::new(pawns, col);
                let kind = PieceType::BACK_RANK[col as usize];
                board.set(back_sq, Some(Piece::new(color, kind, back_sq)));
                board.set(pawn_sq, Some(Piece::new(color, PieceType::Pawn, pawn_sq)));
            }
        }
        board
    }

    /// What piece (if any) is on a given square?
    #[inline]
    pub fn piece_at(&self, pos: Position) -> Option<Piece> {
        self.rows[pos.row as usize][pos.col as usize]
    }

    /// Overwrite a square, cloning its row only if another board shares it.
    #[inline]
    pub(crate) fn set(&mut self, pos: Position, piece: Option<Piece>) {
        Arc::make_mut(&mut self.rows[pos.row as usize])[pos.col as usize] = piece;
    }

    /// All occupied squares in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells.iter().enumerate().filter_map(move |(col, cell)| {
                cell.map(|piece| (Position::new(row as u8, col as u8), piece))
            })
        })
    }

    /// Current square of `piece`, found by scanning for its id.
    pub fn locate(&self, piece: &Piece) -> Option<Position> {
        self.pieces()
            .find_map(|(pos, p)| (p == *piece).then_some(pos))
    }

    /// Whether two boards share the same allocation for `row`.
    pub fn shares_row(&self, other: &Board, row: usize) -> bool {
        Arc::ptr_eq(&self.rows[row], &other.rows[row])
    }

    /// Canonical row-major serialization of the piece ids.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut s = String::with_capacity(64 * 16);
        for (r, cells) in self.rows.iter().enumerate() {
            if r > 0 {
                s.push('/');
            }
            for (c, cell) in cells.iter().enumerate() {
                if c > 0 {
                    s.push(',');
                }
                match cell {
                    Some(piece) => s.push_str(&piece.id()),
                    None => s.push_str(EMPTY_SENTINEL),
                }
            }
        }
        Fingerprint(Arc::from(s))
    }

    /// Check the structural invariants: unique ids, at most 16 pieces per
    /// color and exactly one king per color.
    pub fn validate(&self) -> Result<(), ChessError> {
        let mut seen = std::collections::HashSet::new();
        let mut counts = [0usize; 2];
        let mut kings = [0usize; 2];
        for (pos, piece) in self.pieces() {
            if !seen.insert(piece) {
                return Err(ChessError::InvariantViolation(format!(
                    "{piece} occupies more than one square (again at {pos})"
                )));
            }
            counts[piece.color.index()] += 1;
            if piece.kind == PieceType::King {
                kings[piece.color.index()] += 1;
            }
        }
        for color in [Color::White, Color::Black] {
            if counts[color.index()] > 16 {
                return Err(ChessError::InvariantViolation(format!(
                    "{color} has {} pieces",
                    counts[color.index()]
                )));
            }
            if kings[color.index()] != 1 {
                return Err(ChessError::InvariantViolation(format!(
                    "{color} has {} kings",
                    kings[color.index()]
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// Cache key for a board layout. History and captures are not part of it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(Arc<str>);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// BoardState
// ---------------------------------------------------------------------------

/// A position plus the bookkeeping around it. Never mutated once built.
#[derive(Clone, Debug)]
pub struct BoardState {
    board: Board,
    active_player: Color,
    captured: Vec<Piece>,
    in_check: bool,
    in_checkmate: bool,
    previous: Option<Arc<BoardState>>,
    ply: usize,
    fingerprint: Fingerprint,
}

impl BoardState {
    /// The standard starting position with white to move.
    pub fn initial() -> Self {
        BoardState::from_board(Board::standard(), Color::White)
    }

    fn from_board(board: Board, active_player: Color) -> Self {
        let fingerprint = board.fingerprint();
        BoardState {
            board,
            active_player,
            captured: Vec::new(),
            in_check: false,
            in_checkmate: false,
            previous: None,
            ply: 0,
            fingerprint,
        }
    }

    /// Build a custom position. Flags are left unset; the engine fills them.
    pub(crate) fn from_pieces(
        active_player: Color,
        pieces: impl IntoIterator<Item = (Piece, Position)>,
    ) -> Result<Self, ChessError> {
        let mut board = Board::empty();
        for (piece, pos) in pieces {
            if !pos.on_board() || !piece.initial.on_board() {
                return Err(ChessError::InvariantViolation(format!(
                    "{piece} placed off the board at ({},{})",
                    pos.row, pos.col
                )));
            }
            if let Some(existing) = board.piece_at(pos) {
                return Err(ChessError::InvariantViolation(format!(
                    "{pos} holds both {existing} and {piece}"
                )));
            }
            board.set(pos, Some(piece));
        }
        board.validate()?;
        Ok(BoardState::from_board(board, active_player))
    }

    /// Successor of `self` with the given layout: the other side moves next
    /// and `self` becomes the newest history entry.
    pub(crate) fn successor(&self, board: Board, captured: Vec<Piece>) -> Self {
        let fingerprint = board.fingerprint();
        BoardState {
            board,
            active_player: !self.active_player,
            captured,
            in_check: false,
            in_checkmate: false,
            previous: Some(Arc::new(self.clone())),
            ply: self.ply + 1,
            fingerprint,
        }
    }

    pub(crate) fn with_status(mut self, in_check: bool, in_checkmate: bool) -> Self {
        self.in_check = in_check;
        self.in_checkmate = in_checkmate;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active_player(&self) -> Color {
        self.active_player
    }

    /// Captured pieces in capture order.
    pub fn captured_pieces(&self) -> &[Piece] {
        &self.captured
    }

    /// Whether the side to move is in check.
    pub fn player_in_check(&self) -> bool {
        self.in_check
    }

    /// Whether the side to move is checkmated.
    pub fn player_in_checkmate(&self) -> bool {
        self.in_checkmate
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Number of plies played to reach this state.
    pub fn ply(&self) -> usize {
        self.ply
    }

    /// The state this one was derived from.
    pub fn previous(&self) -> Option<&BoardState> {
        self.previous.as_deref()
    }

    /// Prior states, oldest first.
    pub fn history(&self) -> Vec<&BoardState> {
        let mut chain = Vec::with_capacity(self.ply);
        let mut cursor = self.previous();
        while let Some(state) = cursor {
            chain.push(state);
            cursor = state.previous();
        }
        chain.reverse();
        chain
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[inline]
    pub fn piece_at(&self, pos: Position) -> Option<Piece> {
        self.board.piece_at(pos)
    }

    /// Current square of `piece`.
    pub fn locate(&self, piece: &Piece) -> Result<Position, ChessError> {
        self.board
            .locate(piece)
            .ok_or_else(|| ChessError::PieceNotFound(piece.id()))
    }

    /// All pieces of one color with their squares.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.board.pieces().filter(move |(_, p)| p.color == color)
    }

    /// Square of the unique king of `color`.
    pub fn king_position(&self, color: Color) -> Result<Position, ChessError> {
        let mut kings = self
            .pieces_of(color)
            .filter(|(_, p)| p.kind == PieceType::King)
            .map(|(pos, _)| pos);
        match (kings.next(), kings.next()) {
            (Some(pos), None) => Ok(pos),
            (None, _) => Err(ChessError::InvariantViolation(format!(
                "no {color} king on the board"
            ))),
            (Some(_), Some(_)) => Err(ChessError::InvariantViolation(format!(
                "more than one {color} king on the board"
            ))),
        }
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top).
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for row in 0..8u8 {
            s.push((b'8' - row) as char);
            s.push(' ');
            for col in 0..8u8 {
                let ch = match self.piece_at(Position::new(row, col)) {
                    Some(piece) => piece.to_char(),
                    None => '.',
                };
                s.push(ch);
                if col < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

impl Drop for BoardState {
    // Unlink the history iteratively so long games do not recurse per ply.
    fn drop(&mut self) {
        let mut next = self.previous.take();
        while let Some(state) = next {
            match Arc::try_unwrap(state) {
                Ok(mut owned) => next = owned.previous.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
