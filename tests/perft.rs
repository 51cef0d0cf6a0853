//! Perft (PERFormance Test): exhaustive move-generation correctness suite.
//!
//! Each test verifies that the number of leaf nodes at a given depth matches
//! known-correct values. Depths are kept shallow enough that castling and
//! promotion never occur, so the published counts apply unchanged.
//!
//! Reference: <https://www.chessprogramming.org/Perft_Results>

use chess_rules::engine::{BoardState, Color, Engine, Piece, PieceType, Position};

/// Recursive perft: count leaf nodes at `depth`.
fn perft(engine: &Engine, state: &BoardState, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = engine
        .legal_moves_for(state, state.active_player())
        .unwrap();
    if depth == 1 {
        return moves.iter().map(|(_, to)| to.len() as u64).sum();
    }
    let mut nodes = 0u64;
    for (piece, destinations) in moves {
        for to in destinations {
            let child = engine.apply_move(&piece, to, state).unwrap();
            nodes += perft(engine, &child, depth - 1);
        }
    }
    nodes
}

fn sq(name: &str) -> Position {
    Position::from_algebraic(name).unwrap()
}

/// A piece standing on `at` that started on `initial`.
fn placed(color: Color, kind: PieceType, initial: &str, at: &str) -> (Piece, Position) {
    (Piece::new(color, kind, sq(initial)), sq(at))
}

// =====================================================================
// Position 1: starting position
// =====================================================================

#[test]
fn perft_start_depth_1() {
    let engine = Engine::new();
    assert_eq!(perft(&engine, &engine.initial_state(), 1), 20);
}

#[test]
fn perft_start_depth_2() {
    let engine = Engine::new();
    assert_eq!(perft(&engine, &engine.initial_state(), 2), 400);
}

#[test]
fn perft_start_depth_3() {
    let engine = Engine::new();
    assert_eq!(perft(&engine, &engine.initial_state(), 3), 8_902);
}

// =====================================================================
// Position 3: pins along the fifth rank and en passant
// 8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1
// =====================================================================

fn position_3(engine: &Engine) -> BoardState {
    use Color::{Black, White};
    use PieceType::{King, Pawn, Rook};
    engine
        .setup(
            White,
            [
                placed(White, King, "a5", "a5"),
                placed(White, Pawn, "b2", "b5"),
                placed(White, Rook, "b4", "b4"),
                placed(White, Pawn, "e2", "e2"),
                placed(White, Pawn, "g2", "g2"),
                placed(Black, Pawn, "c7", "c7"),
                placed(Black, Pawn, "d7", "d6"),
                placed(Black, Rook, "h5", "h5"),
                placed(Black, Pawn, "f7", "f4"),
                placed(Black, King, "h4", "h4"),
            ],
        )
        .unwrap()
}

#[test]
fn perft_pos3_depth_1() {
    let engine = Engine::new();
    assert_eq!(perft(&engine, &position_3(&engine), 1), 14);
}

#[test]
fn perft_pos3_depth_2() {
    let engine = Engine::new();
    assert_eq!(perft(&engine, &position_3(&engine), 2), 191);
}

#[test]
fn perft_pos3_depth_3() {
    let engine = Engine::new();
    assert_eq!(perft(&engine, &position_3(&engine), 3), 2_812);
}
