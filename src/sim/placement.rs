/// Level placement: grid → grounds, platforms, character, enemies, coins, goal.
///
/// ## Walk
///
/// Cells are visited row-major. Each non-space cell becomes one world cell
/// of `tile_size × scale` units:
///   - ground      → solid segment with a neighbour-aware tile variant
///   - platform    → non-solid segment owned by its platform group
///   - player      → the character (sprite grows up from the cell)
///   - goal        → the win zone
///   - enemy       → an Npc with a patrol bound from the run below it
///   - collectible → a coin, half a tile wide
///
/// ## Post-pass
///
/// Every body is registered against every ground, and every enemy against
/// the character. A grid without a goal or a player is rejected.

use rand::Rng;

use crate::domain::ai::Npc;
use crate::domain::character::Character;
use crate::domain::entity::Collectible;
use crate::domain::geometry::Rect;
use crate::domain::goal::Goal;
use crate::domain::ground::{Ground, PlatformGroup};
use crate::domain::level::{LevelFormat, LevelGrid, Symbol};
use crate::domain::tile::select_variant;
use crate::error::BuildError;

/// Cells scanned either side of an enemy when computing its patrol bound.
const PATROL_SCAN: i64 = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct PlacementParams {
    pub scale: f64,
    /// Platform drift per tick, unscaled.
    pub platform_speed: f64,
    /// Platform travel either side of spawn, in tiles.
    pub platform_range: f64,
    /// Rows below the grid before a fall is lost.
    pub fall_margin: f64,
}

impl Default for PlacementParams {
    fn default() -> Self {
        PlacementParams { scale: 1.0, platform_speed: 2.0, platform_range: 2.0, fall_margin: 2.0 }
    }
}

/// Everything a level scene is built from.
#[derive(Clone, Debug)]
pub struct Placed {
    pub grounds: Vec<Ground>,
    pub groups: Vec<PlatformGroup>,
    pub character: Character,
    pub npcs: Vec<Npc>,
    pub collectibles: Vec<Collectible>,
    pub goal: Goal,
    /// World extent of the grid.
    pub bounds: Rect,
}

pub fn place<R: Rng + ?Sized>(
    grid: &LevelGrid,
    format: &LevelFormat,
    params: &PlacementParams,
    rng: &mut R,
) -> Result<Placed, BuildError> {
    let tile = format.tile_size * params.scale;
    let platform_ids = platform_groups(grid);
    let group_count = platform_ids.iter().flatten().max().map_or(0, |m| m + 1);
    let mut group_members: Vec<Vec<usize>> = vec![Vec::new(); group_count];

    let mut grounds = Vec::new();
    let mut character = None;
    let mut npcs = Vec::new();
    let mut collectibles = Vec::new();
    let mut goal_zone = None;

    for (x, y, sym) in grid.iter() {
        let cell = Rect::cell(x, y, tile);
        match sym {
            Symbol::Space => {}
            Symbol::Ground => {
                grounds.push(Ground::solid(cell, select_variant(grid, x, y, rng)));
            }
            Symbol::Platform => {
                if let Some(gid) = platform_ids[y * grid.width() + x] {
                    group_members[gid].push(grounds.len());
                    grounds.push(Ground::platform(cell, gid));
                }
            }
            Symbol::Player => character = Some(Character::spawn(cell)),
            Symbol::Goal => {
                if goal_zone.is_none() {
                    goal_zone = Some(cell);
                } else {
                    log::warn!("extra goal at ({x}, {y}) ignored");
                }
            }
            Symbol::Enemy(species) => {
                let Some(kind) = format.enemies.get(species) else { continue };
                let (min, max) = patrol_bounds(grid, x, y, tile);
                npcs.push(Npc::new(cell, species, kind, min, max, params.scale));
            }
            Symbol::Collectible => {
                collectibles.push(Collectible::new(cell.padding(tile / 4.0, tile / 4.0)));
            }
        }
    }

    let zone = goal_zone.ok_or(BuildError::MissingGoal)?;
    let mut character = character.ok_or(BuildError::MissingPlayer)?;

    for i in 0..grounds.len() {
        character.body.register_ground(i);
        for npc in &mut npcs {
            npc.body.register_ground(i);
        }
    }
    character.enemies = (0..npcs.len()).collect();

    let range = params.platform_range * tile;
    let groups = group_members
        .into_iter()
        .enumerate()
        .map(|(gid, members)| {
            let (left, right) = drift_room(grid, &platform_ids, gid);
            PlatformGroup::new(
                members,
                params.platform_speed * params.scale,
                (-range.min(left as f64 * tile), range.min(right as f64 * tile)),
                gid % 2 == 1,
            )
        })
        .collect();

    let bounds = Rect::new(0.0, 0.0, grid.width() as f64 * tile, grid.height() as f64 * tile);
    let fall_limit = (grid.height() as f64 + params.fall_margin) * tile;

    log::debug!(
        "placed {} grounds, {} enemies, {} coins",
        grounds.len(),
        npcs.len(),
        collectibles.len()
    );

    Ok(Placed {
        grounds,
        groups,
        character,
        npcs,
        collectibles,
        goal: Goal::new(zone, fall_limit),
        bounds,
    })
}

impl Placed {
    /// Move the freshly placed character so its sprite starts at `saved`'s
    /// top-left corner (continuing a saved game).
    pub fn resume_at(&mut self, saved: &Rect) {
        let area = self.character.body.area;
        self.character.body.area = area.offset(saved.left - area.left, saved.top - area.top);
    }
}

/// Horizontal extent an enemy at `(x, y)` may patrol, in world units.
///
/// Scans outward along the row below for supporting ground, stopping at a
/// gap or at a wall on the enemy's own row.
pub fn patrol_bounds(grid: &LevelGrid, x: usize, y: usize, tile: f64) -> (f64, f64) {
    let (xi, yi) = (x as i64, y as i64);
    let mut min = x as f64 * tile;
    let mut max = (x + 1) as f64 * tile;

    for i in 1..=PATROL_SCAN {
        if grid.get(xi - i, yi).is_ground() || !grid.get(xi - i, yi + 1).is_ground() {
            break;
        }
        min -= tile;
    }
    for i in 1..=PATROL_SCAN {
        if grid.get(xi + i, yi).is_ground() || !grid.get(xi + i, yi + 1).is_ground() {
            break;
        }
        max += tile;
    }
    (min, max)
}

/// Free cells to the left and right of platform group `gid`: the smallest
/// run, over all member cells, before solid ground or the grid edge.
fn drift_room(grid: &LevelGrid, ids: &[Option<usize>], gid: usize) -> (usize, usize) {
    let w = grid.width();
    let free = |x: usize, y: usize, dir: i64| {
        (1..)
            .map(|i| x as i64 + dir * i)
            .take_while(|&nx| nx >= 0 && nx < w as i64 && !grid.get(nx, y as i64).is_ground())
            .count()
    };
    let mut room = (usize::MAX, usize::MAX);
    for (i, _) in ids.iter().enumerate().filter(|(_, id)| **id == Some(gid)) {
        let (x, y) = (i % w, i / w);
        room.0 = room.0.min(free(x, y, -1));
        room.1 = room.1.min(free(x, y, 1));
    }
    room
}

/// Group id per cell for 4-connected platform clusters, numbered in
/// row-major order of first appearance.
fn platform_groups(grid: &LevelGrid) -> Vec<Option<usize>> {
    let (w, h) = (grid.width(), grid.height());
    let mut ids = vec![None; w * h];
    let mut next = 0;

    for (x, y, sym) in grid.iter() {
        if sym != Symbol::Platform || ids[y * w + x].is_some() {
            continue;
        }
        let mut stack = vec![(x, y)];
        ids[y * w + x] = Some(next);
        while let Some((cx, cy)) = stack.pop() {
            let neighbours = [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)];
            for (dx, dy) in neighbours {
                let (nx, ny) = (cx as i64 + dx, cy as i64 + dy);
                if grid.get(nx, ny) != Symbol::Platform {
                    continue;
                }
                let idx = ny as usize * w + nx as usize;
                if ids[idx].is_none() {
                    ids[idx] = Some(next);
                    stack.push((nx as usize, ny as usize));
                }
            }
        }
        next += 1;
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::BoundingBoxer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(text: &str, format: &LevelFormat) -> Result<Placed, BuildError> {
        let grid = LevelGrid::parse(text, format)?;
        place(&grid, format, &PlacementParams::default(), &mut StdRng::seed_from_u64(3))
    }

    #[test]
    fn small_level_places_everything() {
        let placed = build("XXXXXX\nX    X\nXP  GX\nXXXXXX\n", &LevelFormat::classic()).unwrap();
        assert_eq!(placed.grounds.len(), 6 + 2 + 2 + 6);
        assert!(placed.npcs.is_empty());
        assert_eq!(placed.goal.zone, Rect::new(200.0, 100.0, 250.0, 150.0));
        assert_eq!(placed.bounds, Rect::new(0.0, 0.0, 300.0, 200.0));
        assert_eq!(placed.goal.fall_limit, 300.0);
        assert_eq!(placed.character.body.grounds.len(), placed.grounds.len());
        assert!(placed.character.bounding_box().bottom <= 150.0);
    }

    #[test]
    fn missing_goal_is_rejected() {
        let err = build("XXXX\nXP X\nXXXX", &LevelFormat::classic()).unwrap_err();
        assert!(matches!(err, BuildError::MissingGoal));
    }

    #[test]
    fn missing_player_is_rejected() {
        let mut format = LevelFormat::classic();
        format.require_player = false;
        let err = build("XXXX\nX GX\nXXXX", &format).unwrap_err();
        assert!(matches!(err, BuildError::MissingPlayer));
    }

    #[test]
    fn parse_errors_surface_as_build_errors() {
        let err = build("XPG", &LevelFormat::classic()).unwrap_err();
        assert!(matches!(err, BuildError::Level(_)));
    }

    #[test]
    fn enemies_registered_both_ways() {
        let placed = build("P  R  RG\nXXXXXXXX", &LevelFormat::classic()).unwrap();
        assert_eq!(placed.npcs.len(), 2);
        assert_eq!(placed.character.enemies, vec![0, 1]);
        for npc in &placed.npcs {
            assert_eq!(npc.body.grounds.len(), 8);
            assert_eq!(npc.speed, 2.0);
            assert_eq!(npc.stun_ticks, 15);
        }
    }

    #[test]
    fn patrol_bound_stops_at_wall_and_gap() {
        let grid = LevelGrid::parse(
            "P X  R   G\nXXXXXXX XX",
            &LevelFormat::classic(),
        )
        .unwrap();
        let (min, max) = patrol_bounds(&grid, 5, 0, 50.0);
        // Wall at x=2 on the enemy row; gap below x=7.
        assert_eq!(min, 150.0);
        assert_eq!(max, 350.0);
    }

    #[test]
    fn platform_clusters_form_groups() {
        let placed = build(
            "P  --  G\nX      X\n  ---   \nXXXXXXXX",
            &LevelFormat::extended(),
        )
        .unwrap();
        assert_eq!(placed.groups.len(), 2);
        assert_eq!(placed.groups[0].members.len(), 2);
        assert_eq!(placed.groups[1].members.len(), 3);
        for (gid, group) in placed.groups.iter().enumerate() {
            for &m in &group.members {
                assert!(!placed.grounds[m].solid);
                assert_eq!(placed.grounds[m].group, Some(gid));
            }
        }
    }

    #[test]
    fn platforms_beside_walls_never_drift_into_them() {
        let mut placed = build("X--   -X\n P    G \nXXXXXXXX", &LevelFormat::extended()).unwrap();
        assert_eq!(placed.groups.len(), 2);
        assert_eq!((placed.groups[0].min, placed.groups[0].max), (0.0, 100.0));
        assert_eq!((placed.groups[1].min, placed.groups[1].max), (-100.0, 0.0));

        for _ in 0..300 {
            for group in &mut placed.groups {
                group.drift(&mut placed.grounds);
            }
            for platform in placed.grounds.iter().filter(|g| !g.solid) {
                for wall in placed.grounds.iter().filter(|g| g.solid) {
                    assert!(!platform.area.overlaps(&wall.area), "{:?} entered {:?}", platform.area, wall.area);
                }
            }
        }
    }

    #[test]
    fn vertically_adjacent_platforms_share_a_group() {
        let placed = build("P - G\n  -  \nXXXXX", &LevelFormat::extended()).unwrap();
        assert_eq!(placed.groups.len(), 1);
        assert_eq!(placed.groups[0].members.len(), 2);
    }

    #[test]
    fn coins_are_placed_inside_cells() {
        let placed = build("PC G\nXXXX", &LevelFormat::extended()).unwrap();
        assert_eq!(placed.collectibles.len(), 1);
        assert_eq!(placed.collectibles[0].area, Rect::new(62.5, 12.5, 87.5, 37.5));
    }

    #[test]
    fn resume_moves_character_to_saved_corner() {
        let mut placed = build("P  G\nXXXX", &LevelFormat::classic()).unwrap();
        let saved = Rect::new(120.0, -40.0, 220.0, 60.0);
        placed.resume_at(&saved);
        assert_eq!(placed.character.body.area.left, 120.0);
        assert_eq!(placed.character.body.area.top, -40.0);
    }

    #[test]
    fn scale_applies_to_cells_and_species() {
        let format = LevelFormat::classic();
        let grid = LevelGrid::parse("PRG\nXXX", &format).unwrap();
        let params = PlacementParams { scale: 2.0, ..PlacementParams::default() };
        let placed = place(&grid, &format, &params, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(placed.grounds[0].area, Rect::new(0.0, 100.0, 100.0, 200.0));
        assert_eq!(placed.npcs[0].speed, 4.0);
        assert_eq!(placed.npcs[0].push_power, 20.0);
    }
}
