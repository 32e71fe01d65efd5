//! Hex coordinate system for battle maps
//!
//! Coordinates are 1-based column/row pairs (q, r) on a flat-topped grid.
//! All geometry goes through cube coordinates, which makes distance, line
//! tracing and direction math uniform regardless of column parity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::battle::constants::{FRONT_ARC_HALF_WIDTH_DEG, REAR_ARC_START_DEG};

/// Offsets applied in opposite signs when tracing a line, so that a point
/// lying exactly between two hexes rounds to each of them once.
const LINE_NUDGE: (f64, f64, f64) = (1e-6, 2e-6, -3e-6);

/// Tolerance for arc boundaries after trigonometry
const ARC_EPSILON_DEG: f64 = 1e-6;

/// Column/row hex coordinate for battle maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoordinate {
    pub q: i32,
    pub r: i32,
}

impl fmt::Display for HexCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.q, self.r)
    }
}

impl HexCoordinate {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Cube coordinates (x, y, z) with x + y + z == 0
    fn cube(&self) -> (i32, i32, i32) {
        let x = self.q;
        let z = self.r - (self.q - (self.q & 1)) / 2;
        (x, -x - z, z)
    }

    fn from_cube(x: i32, z: i32) -> Self {
        Self::new(x, z + (x - (x & 1)) / 2)
    }

    /// Round a fractional cube point to the hex containing it
    fn cube_round(x: f64, y: f64, z: f64) -> Self {
        let mut rx = x.round();
        let ry = y.round();
        let mut rz = z.round();

        let x_diff = (rx - x).abs();
        let y_diff = (ry - y).abs();
        let z_diff = (rz - z).abs();

        if x_diff > y_diff && x_diff > z_diff {
            rx = -ry - rz;
        } else if y_diff <= z_diff {
            rz = -rx - ry;
        }

        Self::from_cube(rx as i32, rz as i32)
    }

    /// Hex distance (number of steps between centers)
    pub fn distance_to(&self, other: &Self) -> u32 {
        let (ax, ay, az) = self.cube();
        let (bx, by, bz) = other.cube();
        let sum = (ax - bx).abs() + (ay - by).abs() + (az - bz).abs();
        (sum / 2) as u32
    }

    /// The adjacent coordinate in the given direction
    pub fn neighbor(&self, direction: HexDirection) -> Self {
        let (x, _, z) = self.cube();
        let (dx, _, dz) = direction.cube_offset();
        Self::from_cube(x + dx, z + dz)
    }

    /// All 6 adjacent coordinates, indexed like `HexDirection::ALL`
    pub fn adjacent_coordinates(&self) -> [HexCoordinate; 6] {
        HexDirection::ALL.map(|direction| self.neighbor(direction))
    }

    /// Direction towards an adjacent coordinate, or None if not adjacent
    pub fn direction_to(&self, other: &Self) -> Option<HexDirection> {
        HexDirection::ALL
            .into_iter()
            .find(|direction| self.neighbor(*direction) == *other)
    }

    /// Trace the hex line from self to target (inclusive)
    ///
    /// Element 0 is always self. A segment whose sample point falls exactly
    /// on the edge between two hexes is divided and carries both options.
    pub fn line_to(&self, target: &Self) -> Vec<LineSegment> {
        let n = self.distance_to(target);
        if n == 0 {
            return vec![LineSegment::single(*self)];
        }

        let (ax, ay, az) = self.cube();
        let (bx, by, bz) = target.cube();
        let (nx, ny, nz) = LINE_NUDGE;

        (0..=n)
            .map(|i| {
                // Integer numerator keeps exact halves exact
                let lerp = |from: i32, to: i32| {
                    from as f64 + ((to - from) as i64 * i as i64) as f64 / n as f64
                };
                let (x, y, z) = (lerp(ax, bx), lerp(ay, by), lerp(az, bz));

                let main = Self::cube_round(x + nx, y + ny, z + nz);
                let second = Self::cube_round(x - nx, y - ny, z - nz);
                if main == second {
                    LineSegment::single(main)
                } else {
                    LineSegment::divided(main, second)
                }
            })
            .collect()
    }

    /// All coordinates within range (inclusive, includes self)
    ///
    /// The result grows with the square of `range`. Coordinates that do not
    /// fit an `i32` are left out.
    pub fn coordinates_in_range(&self, range: u32) -> Vec<HexCoordinate> {
        let range = i64::from(range);
        let (x, _, z) = self.cube();
        let (x, z) = (i64::from(x), i64::from(z));
        let mut results = Vec::new();
        for dx in -range..=range {
            for dz in (-range).max(-dx - range)..=range.min(-dx + range) {
                if let Some(coord) = Self::from_wide_cube(x + dx, z + dz) {
                    results.push(coord);
                }
            }
        }
        results
    }

    fn from_wide_cube(x: i64, z: i64) -> Option<Self> {
        let q = i32::try_from(x).ok()?;
        let r = i32::try_from(z + (x - (x & 1)) / 2).ok()?;
        Some(Self::new(q, r))
    }

    /// Pixel-space center, y grows towards the bottom of the map
    fn center(&self) -> (f64, f64) {
        let (x, _, z) = self.cube();
        (1.5 * x as f64, 3f64.sqrt() * (z as f64 + x as f64 / 2.0))
    }

    /// Bearing to target in degrees, clockwise from Top, in (-180, 180]
    fn bearing_to(&self, target: &Self) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = target.center();
        (bx - ax).atan2(-(by - ay)).to_degrees()
    }

    /// Is target inside the given arc for a unit here facing `facing`?
    ///
    /// A coordinate never lies in an arc relative to itself.
    pub fn is_in_firing_arc(&self, target: &Self, facing: HexDirection, arc: FiringArc) -> bool {
        if self == target {
            return false;
        }
        let relative = normalize_degrees(self.bearing_to(target) - facing.angle_degrees());
        FiringArc::for_relative_bearing(relative) == arc
    }

    /// Coordinates within range that fall inside the given arc
    pub fn hexes_in_firing_arc(
        &self,
        facing: HexDirection,
        arc: FiringArc,
        range: u32,
    ) -> Vec<HexCoordinate> {
        self.coordinates_in_range(range)
            .into_iter()
            .filter(|coord| self.is_in_firing_arc(coord, facing, arc))
            .collect()
    }
}

/// Normalize an angle into (-180, 180]
fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// One step of a traced hex line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineSegment {
    pub main: HexCoordinate,
    /// Set when the line runs exactly between `main` and this hex
    pub second: Option<HexCoordinate>,
}

impl LineSegment {
    pub fn single(main: HexCoordinate) -> Self {
        Self { main, second: None }
    }

    pub fn divided(main: HexCoordinate, second: HexCoordinate) -> Self {
        Self {
            main,
            second: Some(second),
        }
    }

    pub fn is_divided(&self) -> bool {
        self.second.is_some()
    }
}

/// Facing direction, cyclic in clockwise order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HexDirection {
    #[default]
    Top,
    TopRight,
    BottomRight,
    Bottom,
    BottomLeft,
    TopLeft,
}

impl HexDirection {
    pub const ALL: [HexDirection; 6] = [
        HexDirection::Top,
        HexDirection::TopRight,
        HexDirection::BottomRight,
        HexDirection::Bottom,
        HexDirection::BottomLeft,
        HexDirection::TopLeft,
    ];

    pub fn index(&self) -> i32 {
        match self {
            HexDirection::Top => 0,
            HexDirection::TopRight => 1,
            HexDirection::BottomRight => 2,
            HexDirection::Bottom => 3,
            HexDirection::BottomLeft => 4,
            HexDirection::TopLeft => 5,
        }
    }

    /// Direction for any index, wrapping modulo 6
    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(6) as usize]
    }

    /// Rotate by signed 60 degree steps (positive = clockwise)
    pub fn rotate(&self, steps: i32) -> Self {
        Self::from_index(self.index() + steps)
    }

    pub fn opposite(&self) -> Self {
        self.rotate(3)
    }

    /// Minimal number of 60 degree steps to turn from self to other (0..=3)
    pub fn turn_steps_to(&self, other: HexDirection) -> u32 {
        let clockwise = (other.index() - self.index()).rem_euclid(6);
        clockwise.min(6 - clockwise) as u32
    }

    /// Signed step count of the shortest turn; a half turn goes clockwise
    pub fn shortest_turn_to(&self, other: HexDirection) -> i32 {
        let clockwise = (other.index() - self.index()).rem_euclid(6);
        if clockwise <= 3 {
            clockwise
        } else {
            clockwise - 6
        }
    }

    /// Compass angle of this facing, clockwise from Top
    pub fn angle_degrees(&self) -> f64 {
        self.index() as f64 * 60.0
    }

    fn cube_offset(&self) -> (i32, i32, i32) {
        match self {
            HexDirection::Top => (0, 1, -1),
            HexDirection::TopRight => (1, 0, -1),
            HexDirection::BottomRight => (1, -1, 0),
            HexDirection::Bottom => (0, -1, 1),
            HexDirection::BottomLeft => (-1, 0, 1),
            HexDirection::TopLeft => (-1, 1, 0),
        }
    }
}

/// Firing arc relative to a unit's facing
///
/// The four arcs partition the plane: Front and Rear are 120 degrees wide,
/// each side 60. A hex exactly on a boundary belongs to the more forward arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiringArc {
    Front,
    Left,
    Right,
    Rear,
}

impl FiringArc {
    fn for_relative_bearing(relative: f64) -> Self {
        let magnitude = relative.abs();
        if magnitude <= FRONT_ARC_HALF_WIDTH_DEG + ARC_EPSILON_DEG {
            FiringArc::Front
        } else if magnitude <= REAR_ARC_START_DEG + ARC_EPSILON_DEG {
            if relative > 0.0 {
                FiringArc::Right
            } else {
                FiringArc::Left
            }
        } else {
            FiringArc::Rear
        }
    }
}
