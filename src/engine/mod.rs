pub mod apply;
pub mod board;
pub mod cache;
pub mod check;
pub mod collision;
pub mod game;
pub mod movegen;
pub mod rules;
pub mod types;

pub use board::{Board, BoardState, Fingerprint};
pub use cache::{CacheStats, PositionCache};
pub use game::{Game, MoveRecord};
pub use rules::Engine;
pub use types::*;
