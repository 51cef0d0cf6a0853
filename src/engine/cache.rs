//! Per-position memoisation of move geometry, check and checkmate.
//!
//! Entries are keyed by the board fingerprint. Every artifact inside an
//! entry sits behind a `OnceLock`, so it is computed at most once for the
//! lifetime of the cache even when several threads ask at the same time.
//! Locks on the maps are never held while an artifact is being computed.
//!
//! Checkmate additionally depends on whether an en-passant capture is
//! available, which the fingerprint cannot see, so it is keyed by
//! `(color, en-passant source)` inside the entry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use tracing::trace;

use crate::engine::board::{Board, BoardState, Fingerprint};
use crate::engine::check;
use crate::engine::movegen;
use crate::engine::types::{ChessError, Color, Position};

type Status = OnceLock<Result<bool, ChessError>>;

// ---------------------------------------------------------------------------
// RawMoveTable
// ---------------------------------------------------------------------------

/// Geometry-only destinations for every occupied square of one board.
#[derive(Debug)]
pub struct RawMoveTable {
    squares: Vec<Vec<Position>>,
}

impl RawMoveTable {
    pub fn compute(board: &Board) -> Self {
        let mut squares = vec![Vec::new(); 64];
        for (from, piece) in board.pieces() {
            squares[from.index()] = movegen::geometry(&piece, from, board);
        }
        RawMoveTable { squares }
    }

    /// Destinations of the piece on `from`; empty for an empty square.
    pub fn moves_at(&self, from: Position) -> &[Position] {
        &self.squares[from.index()]
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Analysis {
    raw: OnceLock<Arc<RawMoveTable>>,
    check: [Status; 2],
    checkmate: Mutex<HashMap<(Color, Option<Position>), Arc<Status>>>,
}

/// Counters describing how much work the cache has done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Distinct fingerprints seen.
    pub positions: u64,
    /// Lookups answered by an existing entry.
    pub hits: u64,
    pub raw_tables_computed: u64,
    pub checks_computed: u64,
    pub checkmates_computed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    positions: AtomicU64,
    hits: AtomicU64,
    raw_tables: AtomicU64,
    checks: AtomicU64,
    checkmates: AtomicU64,
}

// ---------------------------------------------------------------------------
// PositionCache
// ---------------------------------------------------------------------------

/// Memoised position analysis, owned by one engine/session.
#[derive(Debug, Default)]
pub struct PositionCache {
    entries: RwLock<HashMap<Fingerprint, Arc<Analysis>>>,
    counters: Counters,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct fingerprints cached.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let c = &self.counters;
        CacheStats {
            positions: c.positions.load(Ordering::Relaxed),
            hits: c.hits.load(Ordering::Relaxed),
            raw_tables_computed: c.raw_tables.load(Ordering::Relaxed),
            checks_computed: c.checks.load(Ordering::Relaxed),
            checkmates_computed: c.checkmates.load(Ordering::Relaxed),
        }
    }

    fn entry(&self, state: &BoardState) -> Arc<Analysis> {
        let key = state.fingerprint();
        if let Some(found) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(found);
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(key.clone()).or_insert_with(|| {
            self.counters.positions.fetch_add(1, Ordering::Relaxed);
            trace!(ply = state.ply(), "cache miss for new position");
            Arc::default()
        }))
    }

    /// Raw move geometry for every piece of `state`.
    pub fn raw_table(&self, state: &BoardState) -> Arc<RawMoveTable> {
        let entry = self.entry(state);
        Arc::clone(entry.raw.get_or_init(|| {
            self.counters.raw_tables.fetch_add(1, Ordering::Relaxed);
            Arc::new(RawMoveTable::compute(state.board()))
        }))
    }

    pub(crate) fn check_status(&self, state: &BoardState, color: Color) -> Result<bool, ChessError> {
        let entry = self.entry(state);
        entry.check[color.index()]
            .get_or_init(|| {
                self.counters.checks.fetch_add(1, Ordering::Relaxed);
                check::compute_check(self, state, color)
            })
            .clone()
    }

    pub(crate) fn checkmate_status(
        &self,
        state: &BoardState,
        color: Color,
    ) -> Result<bool, ChessError> {
        let en_passant = if color == state.active_player() {
            movegen::en_passant_source(state)
        } else {
            None
        };
        let entry = self.entry(state);
        let cell = Arc::clone(
            entry
                .checkmate
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry((color, en_passant))
                .or_default(),
        );
        cell.get_or_init(|| {
            self.counters.checkmates.fetch_add(1, Ordering::Relaxed);
            check::compute_checkmate(self, state, color)
        })
        .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_table_is_computed_once() {
        let cache = PositionCache::new();
        let state = BoardState::initial();
        let first = cache.raw_table(&state);
        let second = cache.raw_table(&state);
        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!(stats.positions, 1);
        assert_eq!(stats.raw_tables_computed, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn raw_table_empty_square() {
        let cache = PositionCache::new();
        let table = cache.raw_table(&BoardState::initial());
        assert!(table.moves_at(Position::new(4, 4)).is_empty());
        assert_eq!(table.moves_at(Position::new(7, 6)).len(), 2);
    }

    #[test]
    fn check_status_is_computed_once_per_color() {
        let cache = PositionCache::new();
        let state = BoardState::initial();
        for _ in 0..3 {
            assert_eq!(cache.check_status(&state, Color::White), Ok(false));
            assert_eq!(cache.check_status(&state, Color::Black), Ok(false));
        }
        assert_eq!(cache.stats().checks_computed, 2);
        assert_eq!(cache.stats().raw_tables_computed, 1);
    }

    #[test]
    fn states_with_same_layout_share_an_entry() {
        let cache = PositionCache::new();
        let a = BoardState::initial();
        let b = a.successor(a.board().clone(), vec![]);
        cache.raw_table(&a);
        cache.raw_table(&b);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().raw_tables_computed, 1);
    }

    #[test]
    fn empty_cache() {
        let cache = PositionCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
