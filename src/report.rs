use serde::Serialize;

use crate::engine::game::{Game, MoveRecord};
use crate::engine::types::{ChessError, Color, Piece, Position};

// ---------------------------------------------------------------------------
// Snapshot models
// ---------------------------------------------------------------------------

/// Serializable view of a game session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub id: String,
    pub created_at: String,
    pub active_player: Color,
    pub status: String,
    pub check: bool,
    pub checkmate: bool,
    pub board: Vec<Vec<Option<String>>>,
    pub captured_pieces: Vec<Piece>,
    pub ply: usize,
    pub move_history: Vec<MoveEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveEntry {
    pub piece: Piece,
    pub from: String,
    pub to: String,
    pub captured: Option<Piece>,
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub piece: Piece,
    pub square: String,
    pub legal_moves: Vec<String>,
}

impl From<&MoveRecord> for MoveEntry {
    fn from(record: &MoveRecord) -> Self {
        MoveEntry {
            piece: record.piece,
            from: record.from.to_algebraic(),
            to: record.to.to_algebraic(),
            captured: record.captured,
            status: record.status_after.to_string(),
        }
    }
}

impl GameSnapshot {
    pub fn from_game(game: &Game) -> Result<Self, ChessError> {
        let state = game.state();
        let selection = match game.selected() {
            Some(piece) => {
                let square = state.locate(&piece)?;
                let mut moves = game.legal_moves_at(square)?;
                moves.sort();
                Some(Selection {
                    piece,
                    square: square.to_algebraic(),
                    legal_moves: moves.into_iter().map(Position::to_algebraic).collect(),
                })
            }
            None => None,
        };

        Ok(GameSnapshot {
            id: game.id.clone(),
            created_at: game.created_at.to_rfc3339(),
            active_player: state.active_player(),
            status: game.status().to_string(),
            check: state.player_in_check(),
            checkmate: state.player_in_checkmate(),
            board: game.board_array().into_iter().map(Vec::from).collect(),
            captured_pieces: state.captured_pieces().to_vec(),
            ply: state.ply(),
            move_history: game.move_history().iter().map(MoveEntry::from).collect(),
            selection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Position {
        Position::from_algebraic(name).unwrap()
    }

    #[test]
    fn snapshot_of_new_game() {
        let game = Game::new();
        let json = serde_json::to_value(GameSnapshot::from_game(&game).unwrap()).unwrap();
        assert_eq!(json["activePlayer"], "white");
        assert_eq!(json["status"], "active");
        assert_eq!(json["check"], false);
        assert_eq!(json["ply"], 0);
        assert_eq!(json["board"][7][4], "white-King-7-4");
        assert!(json["board"][4][4].is_null());
        assert!(json.get("selection").is_none());
    }

    #[test]
    fn snapshot_with_selection_and_history() {
        let mut game = Game::new();
        game.play(sq("e2"), sq("e4")).unwrap();
        game.select(sq("g8")).unwrap();
        let json = serde_json::to_value(GameSnapshot::from_game(&game).unwrap()).unwrap();
        assert_eq!(json["activePlayer"], "black");
        assert_eq!(json["moveHistory"][0]["from"], "e2");
        assert_eq!(json["moveHistory"][0]["piece"], "white-Pawn-6-4");
        assert_eq!(json["selection"]["piece"], "black-Knight-0-6");
        assert_eq!(json["selection"]["legalMoves"], serde_json::json!(["f6", "h6"]));
    }
}
