//! Chess rules engine: legal move generation, check and checkmate detection,
//! and immutable board states with undo.

pub mod config;
pub mod engine;
pub mod report;
