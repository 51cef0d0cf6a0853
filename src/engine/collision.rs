//! Classification of a target square relative to a moving piece.

use crate::engine::board::Board;
use crate::engine::types::{Piece, Position};

/// What a moving piece finds on a candidate square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collision {
    OffBoard,
    Empty,
    Friendly,
    Enemy,
}

impl Collision {
    /// A piece may land here (quiet move or capture).
    #[inline]
    pub fn is_landable(self) -> bool {
        matches!(self, Collision::Empty | Collision::Enemy)
    }

    /// A sliding ray continues past this square.
    #[inline]
    pub fn continues_ray(self) -> bool {
        self == Collision::Empty
    }
}

/// Classify a stepped-to square for `mover`; `None` means the step left
/// the board.
pub fn classify(mover: &Piece, board: &Board, target: Option<Position>) -> Collision {
    match target {
        None => Collision::OffBoard,
        Some(pos) => classify_square(mover, board, pos),
    }
}

/// Classify an on-board square for `mover`.
#[inline]
pub fn classify_square(mover: &Piece, board: &Board, pos: Position) -> Collision {
    match board.piece_at(pos) {
        None => Collision::Empty,
        Some(other) if other.color == mover.color => Collision::Friendly,
        Some(_) => Collision::Enemy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{Color, PieceType};

    fn rook() -> Piece {
        Piece::new(Color::White, PieceType::Rook, Position::new(7, 0))
    }

    #[test]
    fn off_board_steps() {
        let board = Board::standard();
        let corner = Position::new(7, 0);
        assert_eq!(classify(&rook(), &board, corner.offset(1, 0)), Collision::OffBoard);
        assert_eq!(classify(&rook(), &board, corner.offset(0, -1)), Collision::OffBoard);
        assert_eq!(
            classify(&rook(), &board, Position::new(3, 7).offset(0, 1)),
            Collision::OffBoard
        );
    }

    #[test]
    fn occupant_colors() {
        let board = Board::standard();
        let at = |row, col| Some(Position::new(row, col));
        assert_eq!(classify(&rook(), &board, at(4, 4)), Collision::Empty);
        assert_eq!(classify(&rook(), &board, at(6, 0)), Collision::Friendly);
        assert_eq!(classify(&rook(), &board, at(1, 0)), Collision::Enemy);
    }

    #[test]
    fn landable_and_ray() {
        assert!(Collision::Empty.is_landable());
        assert!(Collision::Enemy.is_landable());
        assert!(!Collision::Friendly.is_landable());
        assert!(!Collision::OffBoard.is_landable());
        assert!(Collision::Empty.continues_ray());
        assert!(!Collision::Enemy.continues_ray());
    }
}
