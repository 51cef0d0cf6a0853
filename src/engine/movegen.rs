//! Move generation.
//!
//! Two tiers:
//!   1. Raw moves: board geometry plus collisions, ignoring whether the
//!      mover's own king is left attacked. Check detection only ever uses
//!      this tier.
//!   2. Legal moves: raw moves filtered by playing each one on a copy of the
//!      state and rejecting those that leave the mover in check.
//!
//! Geometry per square is memoised in the `PositionCache`; en-passant
//! captures depend on the previous ply and are added on top per call.

use crate::engine::apply;
use crate::engine::board::{Board, BoardState};
use crate::engine::cache::PositionCache;
use crate::engine::check;
use crate::engine::collision::{Collision, classify, classify_square};
use crate::engine::types::{ChessError, Color, Piece, PieceType, Position};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

const STRAIGHTS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

// =========================================================================
// Public API
// =========================================================================

/// Raw destinations of `piece` in `state`, en passant included.
pub fn raw_moves(
    cache: &PositionCache,
    piece: &Piece,
    state: &BoardState,
) -> Result<Vec<Position>, ChessError> {
    let from = state.locate(piece)?;
    Ok(raw_moves_from(cache, piece, from, state))
}

/// Destinations of `piece` that do not leave its own king in check.
pub fn legal_moves(
    cache: &PositionCache,
    piece: &Piece,
    state: &BoardState,
) -> Result<Vec<Position>, ChessError> {
    let from = state.locate(piece)?;
    legal_moves_from(cache, piece, from, state)
}

/// Every piece of `color` paired with its legal destinations, in board order.
/// Pieces without a legal move are included with an empty list.
pub fn legal_moves_for(
    cache: &PositionCache,
    state: &BoardState,
    color: Color,
) -> Result<Vec<(Piece, Vec<Position>)>, ChessError> {
    state
        .pieces_of(color)
        .map(|(from, piece)| Ok((piece, legal_moves_from(cache, &piece, from, state)?)))
        .collect()
}

pub(crate) fn raw_moves_from(
    cache: &PositionCache,
    piece: &Piece,
    from: Position,
    state: &BoardState,
) -> Vec<Position> {
    let mut moves = cache.raw_table(state).moves_at(from).to_vec();
    if let Some(landing) = en_passant_landing(piece, from, state) {
        moves.push(landing);
    }
    moves
}

pub(crate) fn legal_moves_from(
    cache: &PositionCache,
    piece: &Piece,
    from: Position,
    state: &BoardState,
) -> Result<Vec<Position>, ChessError> {
    let candidates = raw_moves_from(cache, piece, from, state);
    let mut legal = Vec::with_capacity(candidates.len());
    for to in candidates {
        // Kings are attacked, never taken.
        if state.piece_at(to).is_some_and(|t| t.kind == PieceType::King) {
            continue;
        }
        let next = apply::relocate_from(piece, from, to, state)?;
        if !check::is_in_check(cache, &next, piece.color)? {
            legal.push(to);
        }
    }
    Ok(legal)
}

// =========================================================================
// Geometry (uncached)
// =========================================================================

/// Candidate squares for `piece` standing on `from`, ignoring en passant.
pub fn geometry(piece: &Piece, from: Position, board: &Board) -> Vec<Position> {
    let mut moves = Vec::with_capacity(28);
    match piece.kind {
        PieceType::Pawn => pawn_moves(piece, from, board, &mut moves),
        PieceType::Knight => leap(piece, from, board, &KNIGHT_OFFSETS, &mut moves),
        PieceType::Bishop => slide(piece, from, board, &DIAGONALS, 7, &mut moves),
        PieceType::Rook => slide(piece, from, board, &STRAIGHTS, 7, &mut moves),
        PieceType::Queen => {
            slide(piece, from, board, &DIAGONALS, 7, &mut moves);
            slide(piece, from, board, &STRAIGHTS, 7, &mut moves);
        }
        PieceType::King => {
            slide(piece, from, board, &STRAIGHTS, 1, &mut moves);
            slide(piece, from, board, &DIAGONALS, 1, &mut moves);
        }
    }
    moves
}

/// Walk each direction until the first occupied or off-board square. An
/// enemy square is included and ends the ray.
fn slide(
    piece: &Piece,
    from: Position,
    board: &Board,
    directions: &[(i8, i8)],
    max_steps: u8,
    moves: &mut Vec<Position>,
) {
    for &(d_row, d_col) in directions {
        let mut cursor = from;
        for _ in 0..max_steps {
            let Some(next) = cursor.offset(d_row, d_col) else {
                break;
            };
            let hit = classify_square(piece, board, next);
            if hit.is_landable() {
                moves.push(next);
            }
            if !hit.continues_ray() {
                break;
            }
            cursor = next;
        }
    }
}

fn leap(
    piece: &Piece,
    from: Position,
    board: &Board,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Position>,
) {
    for &(d_row, d_col) in offsets {
        if let Some(to) = from.offset(d_row, d_col)
            && classify_square(piece, board, to).is_landable()
        {
            moves.push(to);
        }
    }
}

// =========================================================================
// Pawn moves
// =========================================================================

fn pawn_moves(piece: &Piece, from: Position, board: &Board, moves: &mut Vec<Position>) {
    let forward = piece.forward();

    // --- Single push ---
    let single = from.offset(forward, 0);
    if classify(piece, board, single) == Collision::Empty {
        moves.extend(single);

        // --- Double push from the starting row ---
        let double = from.offset(2 * forward, 0);
        if from.row == piece.initial.row && classify(piece, board, double) == Collision::Empty {
            moves.extend(double);
        }
    }

    // --- Diagonal captures ---
    for d_col in [-1, 1] {
        let target = from.offset(forward, d_col);
        if classify(piece, board, target) == Collision::Enemy {
            moves.extend(target);
        }
    }
}

// =========================================================================
// En passant
// =========================================================================

/// Square of the pawn that advanced two squares on the ply that produced
/// `state`, if any. Only the side to move may capture it.
pub fn en_passant_source(state: &BoardState) -> Option<Position> {
    let previous = state.previous()?;
    state
        .pieces_of(!state.active_player())
        .find(|(pos, piece)| {
            piece.kind == PieceType::Pawn
                && pos.col == piece.initial.col
                && pos.row as i8 == piece.initial.row as i8 + 2 * piece.forward()
                && previous.piece_at(piece.initial) == Some(*piece)
        })
        .map(|(pos, _)| pos)
}

/// Landing square of an en-passant capture by `piece` from `from`.
fn en_passant_landing(piece: &Piece, from: Position, state: &BoardState) -> Option<Position> {
    if piece.kind != PieceType::Pawn || piece.color != state.active_player() {
        return None;
    }
    let victim = en_passant_source(state)?;
    if victim.row != from.row || victim.col.abs_diff(from.col) != 1 {
        return None;
    }
    let landing = from.offset(piece.forward(), victim.col as i8 - from.col as i8)?;
    (state.piece_at(landing).is_none()).then_some(landing)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Position {
        Position::from_algebraic(name).unwrap()
    }

    fn squares(names: &[&str]) -> Vec<Position> {
        let mut v: Vec<Position> = names.iter().map(|n| sq(n)).collect();
        v.sort();
        v
    }

    fn sorted(mut v: Vec<Position>) -> Vec<Position> {
        v.sort();
        v
    }

    fn at(color: Color, kind: PieceType, square: &str) -> (Piece, Position) {
        (Piece::new(color, kind, sq(square)), sq(square))
    }

    fn kings() -> Vec<(Piece, Position)> {
        vec![
            at(Color::White, PieceType::King, "h1"),
            at(Color::Black, PieceType::King, "h8"),
        ]
    }

    fn state_with(active: Color, extra: Vec<(Piece, Position)>) -> BoardState {
        let mut pieces = kings();
        pieces.extend(extra);
        BoardState::from_pieces(active, pieces).unwrap()
    }

    // -------------------------------------------------------------------
    // Knights
    // -------------------------------------------------------------------

    #[test]
    fn knight_from_start() {
        let state = BoardState::initial();
        let knight = state.piece_at(sq("g1")).unwrap();
        let moves = geometry(&knight, sq("g1"), state.board());
        assert_eq!(sorted(moves), squares(&["f3", "h3"]));
    }

    #[test]
    fn knight_in_center_has_eight() {
        let (knight, from) = at(Color::White, PieceType::Knight, "d4");
        let state = state_with(Color::White, vec![(knight, from)]);
        assert_eq!(geometry(&knight, from, state.board()).len(), 8);
    }

    // -------------------------------------------------------------------
    // Sliders
    // -------------------------------------------------------------------

    #[test]
    fn rook_blocked_at_start() {
        let state = BoardState::initial();
        let rook = state.piece_at(sq("a1")).unwrap();
        assert!(geometry(&rook, sq("a1"), state.board()).is_empty());
    }

    #[test]
    fn queen_on_open_board() {
        let (queen, from) = at(Color::White, PieceType::Queen, "d4");
        let state = state_with(Color::White, vec![(queen, from)]);
        assert_eq!(geometry(&queen, from, state.board()).len(), 27);
    }

    #[test]
    fn ray_stops_at_enemy_and_includes_it() {
        let (rook, from) = at(Color::White, PieceType::Rook, "a1");
        let blocker = at(Color::Black, PieceType::Knight, "a4");
        let friend = at(Color::White, PieceType::Bishop, "c1");
        let state = state_with(Color::White, vec![(rook, from), blocker, friend]);
        let moves = geometry(&rook, from, state.board());
        assert_eq!(sorted(moves), squares(&["a2", "a3", "a4", "b1"]));
    }

    #[test]
    fn bishop_diagonals() {
        let (bishop, from) = at(Color::Black, PieceType::Bishop, "c1");
        let state = state_with(Color::White, vec![(bishop, from)]);
        let moves = geometry(&bishop, from, state.board());
        assert_eq!(
            sorted(moves),
            squares(&["b2", "a3", "d2", "e3", "f4", "g5", "h6"])
        );
    }

    #[test]
    fn king_single_steps() {
        let state = state_with(Color::White, vec![]);
        let king = state.piece_at(sq("h1")).unwrap();
        let moves = geometry(&king, sq("h1"), state.board());
        assert_eq!(sorted(moves), squares(&["g1", "g2", "h2"]));
    }

    // -------------------------------------------------------------------
    // Pawns
    // -------------------------------------------------------------------

    #[test]
    fn pawn_single_and_double_push() {
        let state = BoardState::initial();
        let pawn = state.piece_at(sq("e2")).unwrap();
        let moves = geometry(&pawn, sq("e2"), state.board());
        assert_eq!(sorted(moves), squares(&["e3", "e4"]));
    }

    #[test]
    fn black_pawn_moves_toward_row_seven() {
        let state = BoardState::initial();
        let pawn = state.piece_at(sq("d7")).unwrap();
        let moves = geometry(&pawn, sq("d7"), state.board());
        assert_eq!(sorted(moves), squares(&["d6", "d5"]));
    }

    #[test]
    fn moved_pawn_has_no_double_push() {
        let pawn = Piece::new(Color::White, PieceType::Pawn, sq("e2"));
        let state = state_with(Color::White, vec![(pawn, sq("e3"))]);
        assert_eq!(geometry(&pawn, sq("e3"), state.board()), vec![sq("e4")]);
    }

    #[test]
    fn blocked_pawn_cannot_jump() {
        let (pawn, from) = at(Color::White, PieceType::Pawn, "e2");
        let blocker = at(Color::Black, PieceType::Knight, "e3");
        let state = state_with(Color::White, vec![(pawn, from), blocker]);
        assert!(geometry(&pawn, from, state.board()).is_empty());
    }

    #[test]
    fn double_push_needs_empty_target() {
        let (pawn, from) = at(Color::White, PieceType::Pawn, "e2");
        let blocker = at(Color::Black, PieceType::Knight, "e4");
        let state = state_with(Color::White, vec![(pawn, from), blocker]);
        assert_eq!(geometry(&pawn, from, state.board()), vec![sq("e3")]);
    }

    #[test]
    fn pawn_captures_diagonally_only_enemies() {
        let (pawn, from) = at(Color::White, PieceType::Pawn, "e2");
        let enemy = at(Color::Black, PieceType::Knight, "d3");
        let friend = at(Color::White, PieceType::Knight, "f3");
        let state = state_with(Color::White, vec![(pawn, from), enemy, friend]);
        let moves = geometry(&pawn, from, state.board());
        assert_eq!(sorted(moves), squares(&["d3", "e3", "e4"]));
    }

    #[test]
    fn pawn_never_captures_straight_ahead() {
        let (pawn, from) = at(Color::White, PieceType::Pawn, "e4");
        let enemy = at(Color::Black, PieceType::Pawn, "e5");
        let state = state_with(Color::White, vec![(pawn, from), enemy]);
        assert!(geometry(&pawn, from, state.board()).is_empty());
    }

    // -------------------------------------------------------------------
    // En passant
    // -------------------------------------------------------------------

    #[test]
    fn no_en_passant_source_without_history() {
        assert_eq!(en_passant_source(&BoardState::initial()), None);
    }

    #[test]
    fn double_push_becomes_en_passant_source() {
        let start = BoardState::initial();
        let pawn = start.piece_at(sq("e2")).unwrap();
        let next = apply::relocate(&pawn, sq("e4"), &start).unwrap();
        assert_eq!(en_passant_source(&next), Some(sq("e4")));

        let single = apply::relocate(&pawn, sq("e3"), &start).unwrap();
        assert_eq!(en_passant_source(&single), None);
    }

    // -------------------------------------------------------------------
    // Legal filtering
    // -------------------------------------------------------------------

    #[test]
    fn king_cannot_step_into_attack() {
        let rook = at(Color::Black, PieceType::Rook, "a2");
        let state = state_with(Color::White, vec![rook]);
        let cache = PositionCache::new();
        let king = state.piece_at(sq("h1")).unwrap();
        let legal = legal_moves(&cache, &king, &state).unwrap();
        assert_eq!(legal, vec![sq("g1")]);
    }

    #[test]
    fn legal_moves_for_start_position() {
        let cache = PositionCache::new();
        let state = BoardState::initial();
        let all = legal_moves_for(&cache, &state, Color::White).unwrap();
        assert_eq!(all.len(), 16);
        let total: usize = all.iter().map(|(_, moves)| moves.len()).sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn raw_moves_of_missing_piece() {
        let cache = PositionCache::new();
        let ghost = Piece::new(Color::White, PieceType::Queen, sq("e4"));
        assert_eq!(
            raw_moves(&cache, &ghost, &BoardState::initial()),
            Err(ChessError::PieceNotFound(ghost.id()))
        );
    }
}
