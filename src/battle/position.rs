//! Hex position: a coordinate plus the facing of whatever stands on it

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::battle::hex::{HexCoordinate, HexDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexPosition {
    pub coordinates: HexCoordinate,
    pub facing: HexDirection,
}

impl fmt::Display for HexPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} facing {:?}", self.coordinates, self.facing)
    }
}

impl HexPosition {
    pub fn new(coordinates: HexCoordinate, facing: HexDirection) -> Self {
        Self {
            coordinates,
            facing,
        }
    }

    /// Same hex, facing the other way
    ///
    /// Backward movement is searched as forward movement between the
    /// opposite positions, then flipped back.
    pub fn opposite_direction_position(&self) -> Self {
        Self::new(self.coordinates, self.facing.opposite())
    }

    /// Same hex, rotated by signed 60 degree steps
    pub fn rotate(&self, steps: i32) -> Self {
        Self::new(self.coordinates, self.facing.rotate(steps))
    }

    /// The position one hex ahead, keeping the facing
    pub fn forward(&self) -> Self {
        Self::new(self.coordinates.neighbor(self.facing), self.facing)
    }

    /// Turning cost in 60 degree steps to reach another facing in place
    pub fn turn_steps_to(&self, facing: HexDirection) -> u32 {
        self.facing.turn_steps_to(facing)
    }
}
