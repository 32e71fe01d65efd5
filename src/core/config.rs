//! Engine configuration with documented defaults
//!
//! Collects the few knobs the movement and visibility engines expose.
//! Values can be loaded from TOML; any key left out keeps its default.

use serde::{Deserialize, Serialize};

use crate::battle::constants::{DEFAULT_LONGEST_PATH_NODE_BUDGET, LOS_BLOCKING_THRESHOLD};
use crate::core::error::{MapError, Result};

/// Configuration for a single battle map's query engines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Accumulated intervening factor at which line of sight is blocked
    ///
    /// The sum is taken over the hexes strictly between the two endpoints.
    /// At the default of 3, two light woods do not block but a light and a
    /// heavy woods hex do.
    pub los_blocking_threshold: u32,

    /// Memoize `find_path` results that were computed without prohibited hexes
    pub cache_paths: bool,

    /// Memoize `has_line_of_sight` results per ordered coordinate pair
    pub cache_line_of_sight: bool,

    /// Maximum number of search expansions for a longest-path query
    ///
    /// The longest-path search settles one state per position and points
    /// spent, so its size grows with the map and the movement budget. When the budget runs out the best route
    /// found so far is returned; that route is never shorter than the
    /// cheapest one.
    pub longest_path_node_budget: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            los_blocking_threshold: LOS_BLOCKING_THRESHOLD,
            cache_paths: true,
            cache_line_of_sight: true,
            longest_path_node_budget: DEFAULT_LONGEST_PATH_NODE_BUDGET,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.los_blocking_threshold == 0 {
            return Err(MapError::InvalidConfig(
                "los_blocking_threshold must be at least 1".into(),
            ));
        }

        if self.longest_path_node_budget == 0 {
            return Err(MapError::InvalidConfig(
                "longest_path_node_budget must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
