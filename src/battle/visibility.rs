//! Line of sight between hexes
//!
//! Sight runs along the traced hex line. The hexes strictly between the two
//! endpoints accumulate their intervening factor; once the sum reaches the
//! configured threshold the line is blocked. Terrain that blocks by itself,
//! or an intervening hex standing higher than both endpoints, blocks at once.
//!
//! A divided line (one passing exactly between two hexes) is resolved in the
//! defender's favour: the option nearer the target, then the option that
//! obstructs more, then the second option.

use std::cmp::Ordering;

use crate::battle::battle_map::{BattleMap, Hex};
use crate::battle::hex::HexCoordinate;

/// Check line of sight between two hexes, ignoring any cache
pub fn has_line_of_sight(map: &BattleMap, from: HexCoordinate, to: HexCoordinate) -> bool {
    if from == to {
        return true;
    }

    let ceiling = endpoint_ceiling(map, from, to);
    let threshold = map.config().los_blocking_threshold;
    let line = resolve_line(map, from, to);

    let mut factor = 0;
    // Attacker's and target's own hexes never count
    for coord in &line[1..line.len() - 1] {
        let Some(hex) = map.get_hex(*coord) else {
            continue;
        };
        if hex.blocks_los() || hex.level() > ceiling {
            return false;
        }
        factor += hex.intervening_factor();
        if factor >= threshold {
            return false;
        }
    }

    true
}

/// Hexes the sight line passes through after divided segments are resolved
///
/// Endpoints are included. Coordinates without a stored hex are skipped.
pub fn hexes_along_line_of_sight(
    map: &BattleMap,
    from: HexCoordinate,
    to: HexCoordinate,
) -> Vec<&Hex> {
    resolve_line(map, from, to)
        .into_iter()
        .filter_map(|coord| map.get_hex(coord))
        .collect()
}

/// The traced line with each divided segment reduced to one coordinate
pub fn resolve_line(map: &BattleMap, from: HexCoordinate, to: HexCoordinate) -> Vec<HexCoordinate> {
    let ceiling = endpoint_ceiling(map, from, to);
    from.line_to(&to)
        .into_iter()
        .map(|segment| match segment.second {
            None => segment.main,
            Some(second) => pick_divided(map, to, ceiling, segment.main, second),
        })
        .collect()
}

fn pick_divided(
    map: &BattleMap,
    defender: HexCoordinate,
    ceiling: i32,
    main: HexCoordinate,
    second: HexCoordinate,
) -> HexCoordinate {
    match main.distance_to(&defender).cmp(&second.distance_to(&defender)) {
        Ordering::Less => return main,
        Ordering::Greater => return second,
        Ordering::Equal => {}
    }

    if obstruction(map, main, ceiling) > obstruction(map, second, ceiling) {
        main
    } else {
        second
    }
}

/// (blocks outright, intervening factor) for ranking divided options
fn obstruction(map: &BattleMap, coord: HexCoordinate, ceiling: i32) -> (bool, u32) {
    match map.get_hex(coord) {
        Some(hex) => (
            hex.blocks_los() || hex.level() > ceiling,
            hex.intervening_factor(),
        ),
        None => (false, 0),
    }
}

/// Highest level of the two endpoints; missing hexes count as level 0
fn endpoint_ceiling(map: &BattleMap, from: HexCoordinate, to: HexCoordinate) -> i32 {
    let level = |coord| map.get_hex(coord).map(|h| h.level()).unwrap_or(0);
    level(from).max(level(to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::terrain::TerrainId;

    fn add_terrain(map: &mut BattleMap, q: i32, r: i32, terrain: TerrainId) {
        map.get_hex_mut(HexCoordinate::new(q, r))
            .unwrap()
            .add_terrain(terrain);
    }

    #[test]
    fn test_line_of_sight_open() {
        let map = BattleMap::open_field(10, 10).unwrap();
        let from = HexCoordinate::new(1, 1);
        let to = HexCoordinate::new(8, 6);
        assert!(has_line_of_sight(&map, from, to));
    }

    #[test]
    fn test_line_of_sight_to_self() {
        let mut map = BattleMap::open_field(3, 3).unwrap();
        add_terrain(&mut map, 2, 2, TerrainId::Building);
        let here = HexCoordinate::new(2, 2);
        assert!(has_line_of_sight(&map, here, here));
    }

    #[test]
    fn test_two_light_woods_do_not_block() {
        let mut map = BattleMap::open_field(10, 10).unwrap();
        add_terrain(&mut map, 1, 2, TerrainId::LightWoods);
        add_terrain(&mut map, 1, 3, TerrainId::LightWoods);
        assert!(has_line_of_sight(
            &map,
            HexCoordinate::new(1, 1),
            HexCoordinate::new(1, 5)
        ));
    }

    #[test]
    fn test_light_and_heavy_woods_block() {
        let mut map = BattleMap::open_field(10, 10).unwrap();
        add_terrain(&mut map, 1, 2, TerrainId::HeavyWoods);
        add_terrain(&mut map, 1, 4, TerrainId::LightWoods);
        assert!(!has_line_of_sight(
            &map,
            HexCoordinate::new(1, 1),
            HexCoordinate::new(1, 5)
        ));
    }

    #[test]
    fn test_endpoint_terrain_ignored() {
        let mut map = BattleMap::open_field(10, 10).unwrap();
        add_terrain(&mut map, 1, 1, TerrainId::HeavyWoods);
        add_terrain(&mut map, 1, 1, TerrainId::LightWoods);
        add_terrain(&mut map, 1, 5, TerrainId::Building);
        assert!(has_line_of_sight(
            &map,
            HexCoordinate::new(1, 1),
            HexCoordinate::new(1, 5)
        ));
    }

    #[test]
    fn test_building_blocks_outright() {
        let mut map = BattleMap::open_field(10, 10).unwrap();
        add_terrain(&mut map, 1, 3, TerrainId::Building);
        assert!(!has_line_of_sight(
            &map,
            HexCoordinate::new(1, 1),
            HexCoordinate::new(1, 5)
        ));
    }

    #[test]
    fn test_tall_hex_blocks() {
        let mut map = BattleMap::open_field(10, 10).unwrap();
        map.get_hex_mut(HexCoordinate::new(1, 3)).unwrap().set_level(1);
        let from = HexCoordinate::new(1, 1);
        let to = HexCoordinate::new(1, 5);
        assert!(!has_line_of_sight(&map, from, to));

        // Looking down from higher ground clears it
        map.get_hex_mut(from).unwrap().set_level(1);
        assert!(has_line_of_sight(&map, from, to));
    }

    #[test]
    fn test_divided_line_takes_obstructing_side() {
        let mut map = BattleMap::open_field(10, 10).unwrap();
        // (2,3) -> (6,3) passes between (3,2)/(3,3) and (5,2)/(5,3)
        add_terrain(&mut map, 3, 2, TerrainId::LightWoods);
        add_terrain(&mut map, 4, 3, TerrainId::HeavyWoods);

        let a = HexCoordinate::new(2, 3);
        let b = HexCoordinate::new(6, 3);
        assert!(!has_line_of_sight(&map, a, b));
        assert!(!has_line_of_sight(&map, b, a));

        let resolved = resolve_line(&map, a, b);
        assert_eq!(resolved[1], HexCoordinate::new(3, 2));
    }

    #[test]
    fn test_divided_line_clear_on_both_sides() {
        let mut map = BattleMap::open_field(10, 10).unwrap();
        add_terrain(&mut map, 4, 3, TerrainId::HeavyWoods);
        assert!(has_line_of_sight(
            &map,
            HexCoordinate::new(2, 3),
            HexCoordinate::new(6, 3)
        ));
    }

    #[test]
    fn test_hexes_along_line_resolved() {
        let mut map = BattleMap::open_field(10, 10).unwrap();
        add_terrain(&mut map, 3, 3, TerrainId::HeavyWoods);

        let hexes = hexes_along_line_of_sight(
            &map,
            HexCoordinate::new(2, 3),
            HexCoordinate::new(4, 3),
        );
        let coords: Vec<HexCoordinate> = hexes.iter().map(|h| h.coordinates()).collect();
        assert_eq!(
            coords,
            vec![
                HexCoordinate::new(2, 3),
                HexCoordinate::new(3, 3),
                HexCoordinate::new(4, 3)
            ]
        );
    }

    #[test]
    fn test_threshold_from_config() {
        let config = crate::core::config::EngineConfig {
            los_blocking_threshold: 5,
            ..Default::default()
        };
        let mut map = BattleMap::open_field(10, 10).unwrap().with_config(config).unwrap();
        add_terrain(&mut map, 1, 2, TerrainId::HeavyWoods);
        add_terrain(&mut map, 1, 3, TerrainId::HeavyWoods);
        assert!(has_line_of_sight(
            &map,
            HexCoordinate::new(1, 1),
            HexCoordinate::new(1, 5)
        ));
    }
}
