//! Battle terrain types and their effects
//!
//! Each terrain contributes an entry cost for movement and an intervening
//! factor for line of sight. Some terrain blocks sight outright.

use serde::{Deserialize, Serialize};

/// Terrain that can exist on a hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerrainId {
    Clear,      // No penalty
    Rough,      // Slow going, no cover
    LightWoods, // Slows movement, thins sight
    HeavyWoods, // Slows movement heavily, thickens sight
    Building,   // Solid structure, blocks sight
}

impl TerrainId {
    /// Movement points to enter a hex with this terrain
    pub fn movement_cost(&self) -> u32 {
        match self {
            TerrainId::Clear => 1,
            TerrainId::Rough => 2,
            TerrainId::LightWoods => 2,
            TerrainId::HeavyWoods => 3,
            TerrainId::Building => 2,
        }
    }

    /// Contribution to accumulated line-of-sight obstruction
    pub fn intervening_factor(&self) -> u32 {
        match self {
            TerrainId::Clear => 0,
            TerrainId::Rough => 0,
            TerrainId::LightWoods => 1,
            TerrainId::HeavyWoods => 2,
            TerrainId::Building => 0,
        }
    }

    /// Does this terrain block line of sight by itself?
    pub fn blocks_los(&self) -> bool {
        matches!(self, TerrainId::Building)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_terrain_no_penalty() {
        assert_eq!(TerrainId::Clear.movement_cost(), 1);
        assert_eq!(TerrainId::Clear.intervening_factor(), 0);
    }

    #[test]
    fn test_woods_factors() {
        assert_eq!(TerrainId::LightWoods.intervening_factor(), 1);
        assert_eq!(TerrainId::HeavyWoods.intervening_factor(), 2);
        assert!(TerrainId::HeavyWoods.movement_cost() > TerrainId::LightWoods.movement_cost());
    }

    #[test]
    fn test_building_blocks_los() {
        assert!(TerrainId::Building.blocks_los());
        assert!(!TerrainId::HeavyWoods.blocks_los());
    }
}
