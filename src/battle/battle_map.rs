//! Battle map with hex grid, terrain, and the cached query surface
//!
//! The map owns its hexes and two lazily filled caches (paths and line of
//! sight). Terrain edits through `get_hex_mut` or `add_hex` never touch the
//! caches; callers that change terrain after querying must clear them.

use std::cell::RefCell;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::battle::constants::BARE_HEX_MOVEMENT_COST;
use crate::battle::hex::HexCoordinate;
use crate::battle::path_cache::{LosCache, PathCache, PathKey};
use crate::battle::pathfinding::{self, MovementMode, MovementPath, PathMode};
use crate::battle::position::HexPosition;
use crate::battle::terrain::TerrainId;
use crate::battle::visibility;
use crate::core::config::EngineConfig;
use crate::core::error::{MapError, Result};

/// A single hex on the battle map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hex {
    coordinates: HexCoordinate,
    level: i32,
    terrains: Vec<TerrainId>,
}

impl Hex {
    pub fn new(coordinates: HexCoordinate) -> Self {
        Self {
            coordinates,
            level: 0,
            terrains: Vec::new(),
        }
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn with_terrain(mut self, terrain: TerrainId) -> Self {
        self.add_terrain(terrain);
        self
    }

    pub fn coordinates(&self) -> HexCoordinate {
        self.coordinates
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn set_level(&mut self, level: i32) {
        self.level = level;
    }

    pub fn terrain_ids(&self) -> &[TerrainId] {
        &self.terrains
    }

    pub fn has_terrain(&self, terrain: TerrainId) -> bool {
        self.terrains.contains(&terrain)
    }

    /// Add a terrain; a terrain already present is not duplicated
    pub fn add_terrain(&mut self, terrain: TerrainId) {
        if !self.terrains.contains(&terrain) {
            self.terrains.push(terrain);
        }
    }

    pub fn remove_terrain(&mut self, terrain: TerrainId) {
        self.terrains.retain(|t| *t != terrain);
    }

    /// Entry cost: the most expensive terrain present
    pub fn movement_cost(&self) -> u32 {
        self.terrains
            .iter()
            .map(|t| t.movement_cost())
            .max()
            .unwrap_or(BARE_HEX_MOVEMENT_COST)
    }

    /// Total intervening factor of all terrain present
    pub fn intervening_factor(&self) -> u32 {
        self.terrains.iter().map(|t| t.intervening_factor()).sum()
    }

    /// Does any terrain here block line of sight by itself?
    pub fn blocks_los(&self) -> bool {
        self.terrains.iter().any(|t| t.blocks_los())
    }

    pub fn to_data(&self) -> HexData {
        HexData {
            coordinates: self.coordinates,
            level: self.level,
            terrain_ids: self.terrains.clone(),
        }
    }

    pub fn from_data(data: &HexData) -> Self {
        let mut hex = Hex::new(data.coordinates).with_level(data.level);
        for terrain in &data.terrain_ids {
            hex.add_terrain(*terrain);
        }
        hex
    }
}

/// Wire form of a hex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexData {
    pub coordinates: HexCoordinate,
    pub level: i32,
    pub terrain_ids: Vec<TerrainId>,
}

/// Wire form of a whole map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapData {
    pub width: u32,
    pub height: u32,
    pub hexes: Vec<HexData>,
}

impl MapData {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The full battle map
///
/// Queries take `&self` and fill the caches through interior mutability,
/// so a map is meant to be driven from one thread at a time.
#[derive(Debug, Clone)]
pub struct BattleMap {
    width: u32,
    height: u32,
    hexes: AHashMap<HexCoordinate, Hex>,
    config: EngineConfig,
    path_cache: RefCell<PathCache>,
    los_cache: RefCell<LosCache>,
}

impl BattleMap {
    /// Create an empty map; hexes are added with `add_hex`
    ///
    /// Both dimensions must be at least 1 and fit a signed coordinate.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let fits = |side: u32| side >= 1 && i32::try_from(side).is_ok();
        if !fits(width) || !fits(height) {
            return Err(MapError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            hexes: AHashMap::new(),
            config: EngineConfig::default(),
            path_cache: RefCell::new(PathCache::new()),
            los_cache: RefCell::new(LosCache::new()),
        })
    }

    /// Create a map filled with bare level 0 hexes
    pub fn open_field(width: u32, height: u32) -> Result<Self> {
        let mut map = Self::new(width, height)?;
        for q in 1..=width as i32 {
            for r in 1..=height as i32 {
                let coord = HexCoordinate::new(q, r);
                map.hexes.insert(coord, Hex::new(coord));
            }
        }
        Ok(map)
    }

    /// Rebuild a map from its wire form
    pub fn from_data(data: &MapData) -> Result<Self> {
        let mut map = Self::new(data.width, data.height)?;
        for hex in &data.hexes {
            map.add_hex(Hex::from_data(hex))?;
        }
        Ok(map)
    }

    /// Replace the engine config; cached results are dropped
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        self.clear_caches();
        Ok(self)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Store a hex, replacing any hex already at its coordinates
    pub fn add_hex(&mut self, hex: Hex) -> Result<()> {
        let coord = hex.coordinates();
        if !self.is_on_map(coord) {
            tracing::debug!(
                "Rejected hex {} outside {}x{} map",
                coord,
                self.width,
                self.height
            );
            return Err(MapError::OutOfBounds {
                coord,
                width: self.width,
                height: self.height,
            });
        }
        self.hexes.insert(coord, hex);
        Ok(())
    }

    /// Get a hex at the given coordinate
    pub fn get_hex(&self, coord: HexCoordinate) -> Option<&Hex> {
        self.hexes.get(&coord)
    }

    /// Get a mutable hex at the given coordinate
    ///
    /// Changes made through this reference are not seen by cached queries
    /// until `clear_caches` (or the per-cache clear) is called.
    pub fn get_hex_mut(&mut self, coord: HexCoordinate) -> Option<&mut Hex> {
        self.hexes.get_mut(&coord)
    }

    /// Check if coordinate is within map bounds (whether or not a hex is stored)
    pub fn is_on_map(&self, coord: HexCoordinate) -> bool {
        coord.q >= 1
            && coord.r >= 1
            && coord.q <= self.width as i32
            && coord.r <= self.height as i32
    }

    pub fn hexes(&self) -> impl Iterator<Item = &Hex> {
        self.hexes.values()
    }

    pub fn hexes_mut(&mut self) -> impl Iterator<Item = &mut Hex> {
        self.hexes.values_mut()
    }

    pub fn hex_count(&self) -> usize {
        self.hexes.len()
    }

    /// Flat list of every stored hex, in no particular order
    pub fn to_data(&self) -> Vec<HexData> {
        self.hexes.values().map(Hex::to_data).collect()
    }

    pub fn to_map_data(&self) -> MapData {
        MapData {
            width: self.width,
            height: self.height,
            hexes: self.to_data(),
        }
    }

    /// Find a path within `max_mp`
    ///
    /// Queries without prohibited hexes are memoized, including misses.
    /// Supplying prohibited hexes always computes a fresh result.
    pub fn find_path(
        &self,
        start: HexPosition,
        target: HexPosition,
        movement: MovementMode,
        max_mp: u32,
        prohibited: Option<&AHashSet<HexCoordinate>>,
        mode: PathMode,
    ) -> Option<Arc<MovementPath>> {
        let empty = AHashSet::new();
        let prohibited = prohibited.unwrap_or(&empty);
        let cacheable = self.config.cache_paths && prohibited.is_empty();

        let key = PathKey {
            start,
            target,
            movement,
            max_mp,
            mode,
        };
        if cacheable {
            if let Some(cached) = self.path_cache.borrow().get(&key) {
                tracing::trace!("Path cache hit {} -> {}", start, target);
                return cached;
            }
        }

        let path = pathfinding::find_path(self, start, target, movement, max_mp, prohibited, mode)
            .map(Arc::new);

        if cacheable {
            tracing::trace!("Path cache miss {} -> {}", start, target);
            self.path_cache.borrow_mut().insert(key, path.clone());
        }
        path
    }

    /// Every coordinate reachable on the ground within `max_mp`, with its cost
    pub fn reachable_hexes(
        &self,
        start: HexPosition,
        max_mp: u32,
        prohibited: Option<&AHashSet<HexCoordinate>>,
    ) -> Vec<(HexCoordinate, u32)> {
        let empty = AHashSet::new();
        pathfinding::reachable_hexes(self, start, max_mp, prohibited.unwrap_or(&empty))
    }

    /// Every coordinate a jump of up to `max_mp` can land on
    pub fn jump_reachable_hexes(
        &self,
        start: HexCoordinate,
        max_mp: u32,
        prohibited: Option<&AHashSet<HexCoordinate>>,
    ) -> Vec<HexCoordinate> {
        let empty = AHashSet::new();
        pathfinding::jump_reachable_hexes(self, start, max_mp, prohibited.unwrap_or(&empty))
    }

    /// Cost a caller-supplied route of adjacent coordinates
    pub fn path_through(&self, start: HexPosition, route: &[HexCoordinate]) -> Result<MovementPath> {
        pathfinding::path_through(self, start, route)
    }

    /// Check line of sight between two hexes
    pub fn has_line_of_sight(&self, from: HexCoordinate, to: HexCoordinate) -> bool {
        if !self.config.cache_line_of_sight {
            return visibility::has_line_of_sight(self, from, to);
        }

        if let Some(visible) = self.los_cache.borrow().get(from, to) {
            tracing::trace!("LOS cache hit {} -> {}", from, to);
            return visible;
        }

        let visible = visibility::has_line_of_sight(self, from, to);
        self.los_cache.borrow_mut().insert(from, to, visible);
        visible
    }

    /// Hexes the sight line passes through, endpoints included
    pub fn hexes_along_line_of_sight(&self, from: HexCoordinate, to: HexCoordinate) -> Vec<&Hex> {
        visibility::hexes_along_line_of_sight(self, from, to)
    }

    /// Drop all memoized line-of-sight results
    pub fn clear_los_cache(&mut self) {
        tracing::debug!("Clearing LOS cache ({} entries)", self.los_cache.borrow().len());
        self.los_cache.get_mut().clear();
    }

    /// Drop all memoized path results
    pub fn clear_path_cache(&mut self) {
        tracing::debug!("Clearing path cache ({} entries)", self.path_cache.borrow().len());
        self.path_cache.get_mut().clear();
    }

    pub fn clear_caches(&mut self) {
        self.clear_los_cache();
        self.clear_path_cache();
    }

    pub fn cached_path_count(&self) -> usize {
        self.path_cache.borrow().len()
    }

    pub fn cached_los_count(&self) -> usize {
        self.los_cache.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hex::HexDirection;

    #[test]
    fn test_hex_creation() {
        let hex = Hex::new(HexCoordinate::new(1, 1));
        assert_eq!(hex.level(), 0);
        assert!(hex.terrain_ids().is_empty());
        assert_eq!(hex.movement_cost(), 1);
        assert_eq!(hex.intervening_factor(), 0);
    }

    #[test]
    fn test_hex_terrain_set_semantics() {
        let mut hex = Hex::new(HexCoordinate::new(1, 1));
        hex.add_terrain(TerrainId::LightWoods);
        hex.add_terrain(TerrainId::LightWoods);
        assert_eq!(hex.terrain_ids(), &[TerrainId::LightWoods]);

        hex.remove_terrain(TerrainId::LightWoods);
        assert!(!hex.has_terrain(TerrainId::LightWoods));
    }

    #[test]
    fn test_hex_combined_terrain() {
        let hex = Hex::new(HexCoordinate::new(1, 1))
            .with_terrain(TerrainId::Rough)
            .with_terrain(TerrainId::HeavyWoods);
        assert_eq!(hex.movement_cost(), 3); // Most expensive
        assert_eq!(hex.intervening_factor(), 2); // Sum
        assert!(!hex.blocks_los());
    }

    #[test]
    fn test_open_field_creation() {
        let map = BattleMap::open_field(10, 8).unwrap();
        assert_eq!(map.width(), 10);
        assert_eq!(map.height(), 8);
        assert_eq!(map.hex_count(), 80);
        assert!(map.get_hex(HexCoordinate::new(10, 8)).is_some());
        assert!(map.get_hex(HexCoordinate::new(0, 1)).is_none());
    }

    #[test]
    fn test_add_hex_out_of_bounds() {
        let mut map = BattleMap::new(10, 10).unwrap();
        let result = map.add_hex(Hex::new(HexCoordinate::new(11, 3)));
        match result {
            Err(MapError::OutOfBounds {
                coord,
                width,
                height,
            }) => {
                assert_eq!(coord, HexCoordinate::new(11, 3));
                assert_eq!((width, height), (10, 10));
            }
            other => panic!("expected bounds violation, got {other:?}"),
        }
        assert!(map.add_hex(Hex::new(HexCoordinate::new(0, 3))).is_err());
        assert_eq!(map.hex_count(), 0);
    }

    #[test]
    fn test_is_on_map_independent_of_storage() {
        let map = BattleMap::new(5, 5).unwrap();
        let coord = HexCoordinate::new(3, 3);
        assert!(map.is_on_map(coord));
        assert!(map.get_hex(coord).is_none());
        assert!(!map.is_on_map(HexCoordinate::new(6, 1)));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            BattleMap::new(0, 5),
            Err(MapError::InvalidDimensions {
                width: 0,
                height: 5
            })
        ));
        assert!(BattleMap::open_field(5, 0).is_err());
        assert!(BattleMap::new(u32::MAX, 1).is_err());

        let json = r#"{"width":0,"height":0,"hexes":[]}"#;
        let data = MapData::from_json(json).unwrap();
        assert!(matches!(
            BattleMap::from_data(&data),
            Err(MapError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_data_round_trip() {
        let mut map = BattleMap::open_field(4, 4).unwrap();
        map.get_hex_mut(HexCoordinate::new(2, 2))
            .unwrap()
            .add_terrain(TerrainId::HeavyWoods);
        map.get_hex_mut(HexCoordinate::new(3, 1)).unwrap().set_level(2);

        let json = map.to_map_data().to_json().unwrap();
        let restored = BattleMap::from_data(&MapData::from_json(&json).unwrap()).unwrap();

        assert_eq!(restored.hex_count(), map.hex_count());
        for hex in map.hexes() {
            assert_eq!(restored.get_hex(hex.coordinates()), Some(hex));
        }
    }

    #[test]
    fn test_from_data_rejects_out_of_bounds() {
        let data = MapData {
            width: 2,
            height: 2,
            hexes: vec![Hex::new(HexCoordinate::new(3, 1)).to_data()],
        };
        assert!(matches!(
            BattleMap::from_data(&data),
            Err(MapError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_path_cache_returns_same_instance() {
        let map = BattleMap::open_field(10, 10).unwrap();
        let start = HexPosition::new(HexCoordinate::new(5, 5), HexDirection::Top);
        let target = HexPosition::new(HexCoordinate::new(5, 2), HexDirection::Top);

        let first = map
            .find_path(start, target, MovementMode::Forward, 5, None, PathMode::Shortest)
            .unwrap();
        let second = map
            .find_path(start, target, MovementMode::Forward, 5, None, PathMode::Shortest)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(map.cached_path_count(), 1);
    }

    #[test]
    fn test_path_cache_disabled_by_config() {
        let config = EngineConfig {
            cache_paths: false,
            ..Default::default()
        };
        let map = BattleMap::open_field(10, 10).unwrap().with_config(config).unwrap();
        let start = HexPosition::new(HexCoordinate::new(5, 5), HexDirection::Top);
        let target = HexPosition::new(HexCoordinate::new(5, 2), HexDirection::Top);

        let first = map.find_path(start, target, MovementMode::Forward, 5, None, PathMode::Shortest);
        let second = map.find_path(start, target, MovementMode::Forward, 5, None, PathMode::Shortest);
        assert!(!Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
        assert_eq!(map.cached_path_count(), 0);
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = EngineConfig {
            los_blocking_threshold: 0,
            ..Default::default()
        };
        assert!(BattleMap::open_field(3, 3).unwrap().with_config(config).is_err());
    }
}
