//! Battle map geometry - where a unit can go and what it can see
//!
//! Two query engines sit on top of a hex map:
//! - pathfinding over (coordinate, facing) with turn and terrain costs
//! - line of sight with accumulated terrain obstruction
//!
//! Both are pure reads of the map. Results are memoized on the map and
//! must be invalidated explicitly after terrain changes.

pub mod battle_map;
pub mod constants;
pub mod hex;
pub mod path_cache;
pub mod pathfinding;
pub mod position;
pub mod terrain;
pub mod visibility;

// Re-exports for convenient access
pub use battle_map::{BattleMap, Hex, HexData, MapData};
pub use constants::*;
pub use hex::{FiringArc, HexCoordinate, HexDirection, LineSegment};
pub use path_cache::{LosCache, PathCache, PathKey};
pub use pathfinding::{MovementMode, MovementPath, PathMode, PathSegment};
pub use position::HexPosition;
pub use terrain::TerrainId;
