//! Movement and visibility rule constants - all tunable values in one place
//!
//! Costs are in movement points (MP) and are ADDITIVE.

// Movement
pub const TURN_COST_PER_STEP: u32 = 1; // One 60 degree facing change
pub const JUMP_COST_PER_HEX: u32 = 1; // Terrain is ignored while jumping
pub const BARE_HEX_MOVEMENT_COST: u32 = 1; // Hex with no terrain

// Visibility
pub const LOS_BLOCKING_THRESHOLD: u32 = 3; // Accumulated intervening factor

// Search limits
pub const DEFAULT_LONGEST_PATH_NODE_BUDGET: usize = 250_000;

// Firing arcs (degrees from facing)
pub const FRONT_ARC_HALF_WIDTH_DEG: f64 = 60.0;
pub const REAR_ARC_START_DEG: f64 = 120.0;
