//! Facing-aware pathfinding for battle maps
//!
//! The search space is (coordinate, facing). A unit may turn in place one
//! 60 degree step at a time, or move one hex straight ahead paying the
//! entry cost of the destination hex. Jumping ignores both terrain and
//! turning and reduces to a distance check.
//!
//! Backward movement is not a graph primitive. It is searched as forward
//! movement from the opposite start facing to the opposite target facing,
//! and the resulting path is flipped back.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BinaryHeap};

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::battle::battle_map::BattleMap;
use crate::battle::constants::{JUMP_COST_PER_HEX, TURN_COST_PER_STEP};
use crate::battle::hex::{HexCoordinate, HexDirection};
use crate::battle::position::HexPosition;
use crate::core::error::{MapError, Result};

/// How the unit moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MovementMode {
    #[default]
    Forward,
    /// Ground movement with the unit's back leading
    Backward,
    /// Terrain and turning are free, every hex costs one point
    Jump,
}

/// What the path search optimizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PathMode {
    /// Minimal total cost
    #[default]
    Shortest,
    /// Most hexes entered without exceeding the budget
    Longest,
}

/// One step of a path: either a turn in place or a move to an adjacent hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    pub from: HexPosition,
    pub to: HexPosition,
    pub cost: u32,
}

impl PathSegment {
    pub fn new(from: HexPosition, to: HexPosition, cost: u32) -> Self {
        Self { from, to, cost }
    }

    /// One 60 degree turn in place, clockwise for positive `step`
    pub fn turn(from: HexPosition, step: i32) -> Self {
        Self::new(from, from.rotate(step.signum()), TURN_COST_PER_STEP)
    }

    pub fn is_move(&self) -> bool {
        self.from.coordinates != self.to.coordinates
    }

    pub fn is_turn(&self) -> bool {
        !self.is_move()
    }

    /// The same segment with both facings reversed
    pub fn flipped(&self) -> Self {
        Self {
            from: self.from.opposite_direction_position(),
            to: self.to.opposite_direction_position(),
            cost: self.cost,
        }
    }
}

/// A contiguous chain of segments starting at a known position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementPath {
    start: HexPosition,
    segments: Vec<PathSegment>,
}

impl MovementPath {
    pub fn new(start: HexPosition, segments: Vec<PathSegment>) -> Self {
        let path = Self { start, segments };
        debug_assert!(path.is_contiguous(), "path segments must chain");
        path
    }

    /// A path that goes nowhere
    pub fn stationary(start: HexPosition) -> Self {
        Self {
            start,
            segments: Vec::new(),
        }
    }

    pub fn start(&self) -> HexPosition {
        self.start
    }

    pub fn destination(&self) -> HexPosition {
        self.segments.last().map(|s| s.to).unwrap_or(self.start)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_cost(&self) -> u32 {
        self.segments.iter().map(|s| s.cost).sum()
    }

    pub fn hexes_traveled(&self) -> u32 {
        self.segments.iter().filter(|s| s.is_move()).count() as u32
    }

    pub fn turns_taken(&self) -> u32 {
        self.segments.iter().filter(|s| s.is_turn()).count() as u32
    }

    /// Every coordinate visited, starting with the start hex
    pub fn coordinates(&self) -> Vec<HexCoordinate> {
        std::iter::once(self.start.coordinates)
            .chain(
                self.segments
                    .iter()
                    .filter(|s| s.is_move())
                    .map(|s| s.to.coordinates),
            )
            .collect()
    }

    /// Each segment starts where the previous one ended
    pub fn is_contiguous(&self) -> bool {
        let mut current = self.start;
        for segment in &self.segments {
            if segment.from != current {
                return false;
            }
            current = segment.to;
        }
        true
    }

    /// The path with every facing reversed
    pub fn flipped(&self) -> Self {
        Self {
            start: self.start.opposite_direction_position(),
            segments: self.segments.iter().map(PathSegment::flipped).collect(),
        }
    }
}

/// Node in the open set
#[derive(Debug, Clone, Copy)]
struct PathNode {
    position: HexPosition,
    g_cost: u32,
    f_cost: u32, // g_cost + heuristic
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap, deeper nodes first on ties
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| self.g_cost.cmp(&other.g_cost))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Turn segments taking `from` to `facing` the short way round
fn turn_segments(from: HexPosition, facing: HexDirection) -> Vec<PathSegment> {
    let steps = from.facing.shortest_turn_to(facing);
    let step = steps.signum();
    let mut current = from;
    (0..steps.abs())
        .map(|_| {
            let segment = PathSegment::turn(current, step);
            current = segment.to;
            segment
        })
        .collect()
}

/// Can a ground unit enter this coordinate?
fn is_enterable(map: &BattleMap, coord: HexCoordinate, prohibited: &AHashSet<HexCoordinate>) -> bool {
    map.get_hex(coord).is_some() && !prohibited.contains(&coord)
}

/// Outgoing ground edges: turn either way, or step forward
fn ground_edges(
    map: &BattleMap,
    position: HexPosition,
    prohibited: &AHashSet<HexCoordinate>,
) -> Vec<PathSegment> {
    let mut edges = vec![PathSegment::turn(position, 1), PathSegment::turn(position, -1)];

    let ahead = position.forward();
    if !prohibited.contains(&ahead.coordinates) {
        if let Some(hex) = map.get_hex(ahead.coordinates) {
            edges.push(PathSegment::new(position, ahead, hex.movement_cost()));
        }
    }
    edges
}

/// Find a path within `max_mp`
///
/// Returns None if no path exists. Prohibited coordinates are never entered.
pub fn find_path(
    map: &BattleMap,
    start: HexPosition,
    target: HexPosition,
    movement: MovementMode,
    max_mp: u32,
    prohibited: &AHashSet<HexCoordinate>,
    mode: PathMode,
) -> Option<MovementPath> {
    match movement {
        MovementMode::Forward => find_ground_path(map, start, target, max_mp, prohibited, mode),
        MovementMode::Backward => find_ground_path(
            map,
            start.opposite_direction_position(),
            target.opposite_direction_position(),
            max_mp,
            prohibited,
            mode,
        )
        .map(|path| path.flipped()),
        // A jump's length is fixed by the distance, so the mode has no effect
        MovementMode::Jump => find_jump_path(map, start, target, max_mp, prohibited),
    }
}

fn find_ground_path(
    map: &BattleMap,
    start: HexPosition,
    target: HexPosition,
    max_mp: u32,
    prohibited: &AHashSet<HexCoordinate>,
    mode: PathMode,
) -> Option<MovementPath> {
    if start.coordinates == target.coordinates {
        let cost = start.turn_steps_to(target.facing) * TURN_COST_PER_STEP;
        if cost > max_mp {
            return None;
        }
        return Some(MovementPath::new(start, turn_segments(start, target.facing)));
    }

    if !is_enterable(map, target.coordinates, prohibited) {
        return None;
    }

    let shortest = shortest_path(map, start, target, max_mp, prohibited)?;
    match mode {
        PathMode::Shortest => Some(shortest),
        PathMode::Longest => Some(longest_path(map, target, max_mp, prohibited, shortest)),
    }
}

/// A* over (coordinate, facing) states
fn shortest_path(
    map: &BattleMap,
    start: HexPosition,
    target: HexPosition,
    max_mp: u32,
    prohibited: &AHashSet<HexCoordinate>,
) -> Option<MovementPath> {
    // Every hex costs at least one point, so distance never overestimates
    let heuristic = |position: HexPosition| position.coordinates.distance_to(&target.coordinates);

    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<HexPosition, PathSegment> = AHashMap::new();
    let mut g_scores: AHashMap<HexPosition, u32> = AHashMap::new();

    g_scores.insert(start, 0);
    open_set.push(PathNode {
        position: start,
        g_cost: 0,
        f_cost: heuristic(start),
    });

    while let Some(current) = open_set.pop() {
        if current.position == target {
            return Some(reconstruct_path(&came_from, start, target));
        }

        let best_g = *g_scores.get(&current.position).unwrap_or(&u32::MAX);
        if current.g_cost > best_g {
            continue; // Stale entry
        }

        for edge in ground_edges(map, current.position, prohibited) {
            let tentative_g = current.g_cost.saturating_add(edge.cost);
            if tentative_g > max_mp {
                continue;
            }

            let neighbor_g = *g_scores.get(&edge.to).unwrap_or(&u32::MAX);
            if tentative_g < neighbor_g {
                came_from.insert(edge.to, edge);
                g_scores.insert(edge.to, tentative_g);
                open_set.push(PathNode {
                    position: edge.to,
                    g_cost: tentative_g,
                    f_cost: tentative_g.saturating_add(heuristic(edge.to)),
                });
            }
        }
    }

    None
}

/// Reconstruct path from came_from map
///
/// Every position the search settled has a predecessor chain back to the
/// start; a gap is a search bug and panics.
fn reconstruct_path(
    came_from: &AHashMap<HexPosition, PathSegment>,
    start: HexPosition,
    target: HexPosition,
) -> MovementPath {
    let mut segments = Vec::new();
    let mut current = target;
    while current != start {
        let segment = came_from
            .get(&current)
            .unwrap_or_else(|| panic!("no predecessor recorded for {current} on the way to {start}"));
        segments.push(*segment);
        current = segment.from;
    }
    segments.reverse();
    MovementPath::new(start, segments)
}

/// Best way found to stand at a position having spent a given amount
#[derive(Debug, Clone, Copy)]
struct LongestState {
    hexes: u32,
    via: Option<PathSegment>,
}

/// Maximize hexes entered, never doing worse than the cheapest path
///
/// States are (position, points spent) and are settled in order of points
/// spent, so routes may double back through hexes already entered. The
/// search stops after the configured node budget and keeps the best route
/// found so far.
fn longest_path(
    map: &BattleMap,
    target: HexPosition,
    max_mp: u32,
    prohibited: &AHashSet<HexCoordinate>,
    shortest: MovementPath,
) -> MovementPath {
    let start = shortest.start();
    let node_budget = map.config().longest_path_node_budget;

    let mut states: AHashMap<(HexPosition, u32), LongestState> = AHashMap::new();
    let mut frontier: BTreeMap<u32, Vec<HexPosition>> = BTreeMap::new();
    states.insert((start, 0), LongestState { hexes: 0, via: None });
    frontier.insert(0, vec![start]);

    let mut expanded = 0usize;
    let mut exhausted = false;
    // (hexes, spent) of the best arrival at the target
    let mut best: Option<(u32, u32)> = None;

    'layers: while let Some((spent, positions)) = frontier.pop_first() {
        for position in positions {
            if expanded >= node_budget {
                exhausted = true;
                break 'layers;
            }
            expanded += 1;

            let Some(hexes) = states.get(&(position, spent)).map(|state| state.hexes) else {
                continue;
            };
            if position == target && best.map_or(true, |(best_hexes, _)| hexes > best_hexes) {
                best = Some((hexes, spent));
            }

            for edge in ground_edges(map, position, prohibited) {
                let Some(total) = spent.checked_add(edge.cost).filter(|total| *total <= max_mp)
                else {
                    continue;
                };
                // Each further hex costs at least one point
                if edge.to.coordinates.distance_to(&target.coordinates) > max_mp - total {
                    continue;
                }

                let candidate = LongestState {
                    hexes: hexes + u32::from(edge.is_move()),
                    via: Some(edge),
                };
                match states.entry((edge.to, total)) {
                    Entry::Occupied(mut slot) => {
                        if candidate.hexes > slot.get().hexes {
                            slot.insert(candidate);
                        }
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(candidate);
                        frontier.entry(total).or_default().push(edge.to);
                    }
                }
            }
        }
    }

    if exhausted {
        tracing::warn!(
            "Longest path search from {} to {} hit its node budget ({}), using best of {} hexes",
            start,
            target,
            node_budget,
            best.map_or(shortest.hexes_traveled(), |(hexes, _)| hexes.max(shortest.hexes_traveled()))
        );
    }

    match best {
        Some((hexes, spent)) if hexes > shortest.hexes_traveled() => {
            rebuild_longest(&states, start, target, spent)
        }
        _ => shortest,
    }
}

/// Walk the recorded predecessors back from the target state
fn rebuild_longest(
    states: &AHashMap<(HexPosition, u32), LongestState>,
    start: HexPosition,
    target: HexPosition,
    spent: u32,
) -> MovementPath {
    let mut segments = Vec::new();
    let mut key = (target, spent);
    while key != (start, 0) {
        let segment = states
            .get(&key)
            .and_then(|state| state.via)
            .unwrap_or_else(|| panic!("no predecessor recorded for {} at {} spent", key.0, key.1));
        segments.push(segment);
        key = (segment.from, key.1 - segment.cost);
    }
    segments.reverse();
    MovementPath::new(start, segments)
}

/// Jump straight along the hex line; any facing on landing
fn find_jump_path(
    map: &BattleMap,
    start: HexPosition,
    target: HexPosition,
    max_mp: u32,
    prohibited: &AHashSet<HexCoordinate>,
) -> Option<MovementPath> {
    if start == target {
        return Some(MovementPath::stationary(start));
    }
    // A jump has to leave the hex
    if start.coordinates == target.coordinates {
        return None;
    }
    if !is_enterable(map, target.coordinates, prohibited) {
        return None;
    }
    if start.coordinates.distance_to(&target.coordinates) * JUMP_COST_PER_HEX > max_mp {
        return None;
    }

    let line = start.coordinates.line_to(&target.coordinates);
    let mut segments = Vec::with_capacity(line.len());
    let mut current = start;
    for segment in line.iter().skip(1) {
        let facing = current.coordinates.direction_to(&segment.main)?;
        let to = HexPosition::new(segment.main, facing);
        segments.push(PathSegment::new(current, to, JUMP_COST_PER_HEX));
        current = to;
    }
    if let Some(last) = segments.last_mut() {
        last.to.facing = target.facing;
    }

    Some(MovementPath::new(start, segments))
}

/// Every coordinate reachable on the ground within `max_mp`, with its minimal cost
///
/// The start coordinate is not included. Results are ordered by cost, then
/// coordinate.
pub fn reachable_hexes(
    map: &BattleMap,
    start: HexPosition,
    max_mp: u32,
    prohibited: &AHashSet<HexCoordinate>,
) -> Vec<(HexCoordinate, u32)> {
    let mut open_set = BinaryHeap::new();
    let mut g_scores: AHashMap<HexPosition, u32> = AHashMap::new();
    let mut best_by_coord: AHashMap<HexCoordinate, u32> = AHashMap::new();

    g_scores.insert(start, 0);
    open_set.push(PathNode {
        position: start,
        g_cost: 0,
        f_cost: 0,
    });

    while let Some(current) = open_set.pop() {
        let best_g = *g_scores.get(&current.position).unwrap_or(&u32::MAX);
        if current.g_cost > best_g {
            continue;
        }

        let entry = best_by_coord
            .entry(current.position.coordinates)
            .or_insert(current.g_cost);
        *entry = (*entry).min(current.g_cost);

        for edge in ground_edges(map, current.position, prohibited) {
            let tentative_g = current.g_cost.saturating_add(edge.cost);
            if tentative_g > max_mp {
                continue;
            }
            if tentative_g < *g_scores.get(&edge.to).unwrap_or(&u32::MAX) {
                g_scores.insert(edge.to, tentative_g);
                open_set.push(PathNode {
                    position: edge.to,
                    g_cost: tentative_g,
                    f_cost: tentative_g,
                });
            }
        }
    }

    let mut reachable: Vec<(HexCoordinate, u32)> = best_by_coord
        .into_iter()
        .filter(|(coord, _)| *coord != start.coordinates)
        .collect();
    reachable.sort_by_key(|(coord, cost)| (*cost, *coord));
    reachable
}

/// Every coordinate a jump of up to `max_mp` can land on
///
/// Walks the stored hexes, so the work is bounded by the map and not the budget.
pub fn jump_reachable_hexes(
    map: &BattleMap,
    start: HexCoordinate,
    max_mp: u32,
    prohibited: &AHashSet<HexCoordinate>,
) -> Vec<HexCoordinate> {
    let range = max_mp / JUMP_COST_PER_HEX;
    let mut hexes: Vec<HexCoordinate> = map
        .hexes()
        .map(|hex| hex.coordinates())
        .filter(|coord| {
            *coord != start && !prohibited.contains(coord) && start.distance_to(coord) <= range
        })
        .collect();
    hexes.sort();
    hexes
}

/// Cost a caller-supplied route of adjacent coordinates
///
/// Turns are inserted wherever the route changes direction. The route must
/// stay on stored hexes and every step must be to an adjacent hex.
pub fn path_through(
    map: &BattleMap,
    start: HexPosition,
    route: &[HexCoordinate],
) -> Result<MovementPath> {
    if map.get_hex(start.coordinates).is_none() {
        return Err(MapError::WrongHex(start.coordinates));
    }

    let mut segments = Vec::new();
    let mut current = start;
    for &coord in route {
        if coord == current.coordinates {
            continue;
        }
        let hex = map.get_hex(coord).ok_or(MapError::WrongHex(coord))?;
        let facing = current
            .coordinates
            .direction_to(&coord)
            .ok_or(MapError::NotAdjacent {
                from: current.coordinates,
                to: coord,
            })?;

        segments.extend(turn_segments(current, facing));
        let turned = HexPosition::new(current.coordinates, facing);
        let to = HexPosition::new(coord, facing);
        segments.push(PathSegment::new(turned, to, hex.movement_cost()));
        current = to;
    }

    Ok(MovementPath::new(start, segments))
}
