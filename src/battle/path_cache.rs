//! Query caches owned by a battle map
//!
//! Both caches fill lazily and are never invalidated automatically. A caller
//! that changes terrain after the first query must clear them explicitly.

use std::sync::Arc;

use ahash::AHashMap;

use crate::battle::hex::HexCoordinate;
use crate::battle::pathfinding::{MovementMode, MovementPath, PathMode};
use crate::battle::position::HexPosition;

/// Everything that determines the outcome of an unobstructed path query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathKey {
    pub start: HexPosition,
    pub target: HexPosition,
    pub movement: MovementMode,
    pub max_mp: u32,
    pub mode: PathMode,
}

/// Memoized path queries, including queries that found no path
#[derive(Debug, Clone, Default)]
pub struct PathCache {
    entries: AHashMap<PathKey, Option<Arc<MovementPath>>>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outer None = never computed, inner None = computed and not found
    pub fn get(&self, key: &PathKey) -> Option<Option<Arc<MovementPath>>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: PathKey, path: Option<Arc<MovementPath>>) {
        self.entries.insert(key, path);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Memoized line-of-sight results keyed by the ordered (from, to) pair
#[derive(Debug, Clone, Default)]
pub struct LosCache {
    entries: AHashMap<(HexCoordinate, HexCoordinate), bool>,
}

impl LosCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, from: HexCoordinate, to: HexCoordinate) -> Option<bool> {
        self.entries.get(&(from, to)).copied()
    }

    pub fn insert(&mut self, from: HexCoordinate, to: HexCoordinate, visible: bool) {
        self.entries.insert((from, to), visible);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
