//! Core value types: colors, pieces, squares, game status and errors.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "white" => Some(Color::White),
            "black" => Some(Color::Black),
            _ => None,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PieceType
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// All piece types in order.
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Back rank layout from column 0 to column 7.
    pub const BACK_RANK: [PieceType; 8] = [
        PieceType::Rook,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Queen,
        PieceType::King,
        PieceType::Bishop,
        PieceType::Knight,
        PieceType::Rook,
    ];

    /// Name used inside piece ids.
    pub fn name(self) -> &'static str {
        match self {
            PieceType::Pawn => "Pawn",
            PieceType::Knight => "Knight",
            PieceType::Bishop => "Bishop",
            PieceType::Rook => "Rook",
            PieceType::Queen => "Queen",
            PieceType::King => "King",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        PieceType::ALL.into_iter().find(|pt| pt.name() == s)
    }

    /// Single uppercase letter for white, lowercase for black.
    pub fn to_char(self, color: Color) -> char {
        let c = match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A square on the board addressed by `row` and `col`, both in `0..8`.
///
/// Row 0 holds the black back rank of the standard setup, so algebraic
/// `a8` is `(0, 0)` and `h1` is `(7, 7)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    #[inline]
    pub fn new(row: u8, col: u8) -> Self {
        debug_assert!(row < 8 && col < 8, "position out of range: {row},{col}");
        Position { row, col }
    }

    /// Build a position from signed coordinates, `None` when off the board.
    #[inline]
    pub fn checked(row: i8, col: i8) -> Option<Self> {
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Position {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// Whether both coordinates are in `0..8`. The fields are public, so
    /// positions built by hand are not guaranteed to be.
    #[inline]
    pub fn on_board(self) -> bool {
        self.row < 8 && self.col < 8
    }

    /// Step by a signed offset, `None` when the result leaves the board.
    #[inline]
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        Position::checked(self.row as i8 + d_row, self.col as i8 + d_col)
    }

    /// Row-major index in `0..64`.
    #[inline]
    pub fn index(self) -> usize {
        self.row as usize * 8 + self.col as usize
    }

    /// Parse algebraic notation like "e4".
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Position::new(7 - rank, file))
        } else {
            None
        }
    }

    /// Convert to algebraic notation like "e4".
    pub fn to_algebraic(self) -> String {
        let file = (b'a' + self.col) as char;
        let rank = (b'8' - self.row) as char;
        format!("{file}{rank}")
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

impl FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_algebraic(s).ok_or_else(|| ChessError::InvalidSquare(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// A piece identified by its color, type and the square it started on.
///
/// Pieces carry no live position; the current square is found by scanning
/// the board. The id `"<color>-<Type>-<row>-<col>"` is stable for the whole
/// game and is the only identity shared across states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceType,
    pub initial: Position,
}

impl Piece {
    pub fn new(color: Color, kind: PieceType, initial: Position) -> Self {
        Piece {
            color,
            kind,
            initial,
        }
    }

    pub fn id(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.color, self.kind, self.initial.row, self.initial.col
        )
    }

    /// Parse a piece id back into a `Piece`.
    pub fn from_id(id: &str) -> Result<Self, ChessError> {
        let malformed = || ChessError::MalformedId(id.to_string());
        let mut parts = id.split('-');
        let color = parts.next().and_then(Color::parse).ok_or_else(malformed)?;
        let kind = parts.next().and_then(PieceType::parse).ok_or_else(malformed)?;
        let row = parts.next().and_then(|r| r.parse::<u8>().ok());
        let col = parts.next().and_then(|c| c.parse::<u8>().ok());
        if parts.next().is_some() {
            return Err(malformed());
        }
        match (row, col) {
            (Some(row), Some(col)) if row < 8 && col < 8 => {
                Ok(Piece::new(color, kind, Position::new(row, col)))
            }
            _ => Err(malformed()),
        }
    }

    /// Row direction this pawn advances in, fixed by its starting row.
    #[inline]
    pub fn forward(&self) -> i8 {
        if self.initial.row <= 3 { 1 } else { -1 }
    }

    pub fn to_char(&self) -> char {
        self.kind.to_char(self.color)
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl FromStr for Piece {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Piece::from_id(s)
    }
}

impl Serialize for Piece {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id())
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// Status of the side to move. Stalemate is not modelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Active,
    Check,
    Checkmate,
}

impl GameStatus {
    pub fn as_str(&self) -> &str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Check => "check",
            GameStatus::Checkmate => "checkmate",
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, GameStatus::Checkmate)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChessError
// ---------------------------------------------------------------------------

/// Domain errors for the rules engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    #[error("piece not found on the board: {0}")]
    PieceNotFound(String),

    #[error("malformed piece id: {0}")]
    MalformedId(String),

    /// A corrupted state was handed to the engine. Never recovered from.
    #[error("board invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid move: {piece} -> {to}: {reason}")]
    InvalidMove {
        piece: String,
        to: String,
        reason: String,
    },

    #[error("invalid square notation: {0}")]
    InvalidSquare(String),

    #[error("game is already over: {0}")]
    GameOver(String),

    #[error("no moves to undo")]
    NothingToUndo,
}

impl ChessError {
    pub(crate) fn invalid_move(piece: &Piece, to: Position, reason: impl Into<String>) -> Self {
        ChessError::InvalidMove {
            piece: piece.id(),
            to: to.to_algebraic(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
