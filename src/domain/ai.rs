/// Enemy AI: patrol and chase.
///
/// ## States
///
///   Patrol  walk the current way while the ground ahead is walkable,
///           turn around otherwise
///   Chase   (targeting species only) head toward the character, stand
///           still when that way is blocked
///
/// ## Ground-ahead test
///
/// The hitbox is projected one step in the travel direction. The step is
/// refused if the projection:
///   - leaves the patrol bound `[min, max]`
///   - touches any registered ground's left or right side band (a wall)
///   - does not overlap any ground's top band, inset by the same delta
///     (a gap or ledge)
///
/// Enemies share the character's motion resolver, so gravity and ground
/// snapping apply to them as well.

use super::body::{MovableBody, PhysicsTuning};
use super::character::Character;
use super::entity::Facing;
use super::geometry::{BoundingBoxer, Insets, Rect};
use super::ground::Ground;
use super::level::EnemySpecies;

pub const ENEMY_INSETS: Insets = Insets { left: 0.14, top: 0.24, right: 0.14, bottom: 0.0 };

/// Side band width as a fraction of the hitbox width.
const SIDE_BAND_DIVISOR: f64 = 2.5;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AiState {
    Patrol,
    Chase,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Npc {
    pub body: MovableBody,
    pub species: usize,
    pub speed: f64,
    pub stun_ticks: u32,
    pub push_power: f64,
    pub min: f64,
    pub max: f64,
    pub facing: Facing,
    pub targeting: bool,
    pub state: AiState,
}

impl Npc {
    /// `cell` and the patrol bound are in scaled world units.
    pub fn new(cell: Rect, species: usize, kind: &EnemySpecies, min: f64, max: f64, scale: f64) -> Self {
        Npc {
            body: MovableBody::new(cell, ENEMY_INSETS),
            species,
            speed: kind.speed * scale,
            stun_ticks: kind.stun_ticks,
            push_power: kind.push_power * scale,
            min,
            max,
            facing: Facing::Right,
            targeting: kind.targeting,
            state: if kind.targeting { AiState::Chase } else { AiState::Patrol },
        }
    }

    pub fn update(&mut self, target: &Rect, grounds: &[Ground], t: &PhysicsTuning) {
        self.body.apply_vertical(false, false, grounds, t);

        let vx = match self.state {
            AiState::Chase => {
                let own = self.body.hitbox();
                let dir = if target.center_x() - own.center_x() <= t.s(1.0) {
                    Facing::Left
                } else {
                    Facing::Right
                };
                self.facing = dir;
                if self.can_walk(dir, grounds, t) {
                    dir.sign() * self.speed
                } else {
                    0.0
                }
            }
            AiState::Patrol => {
                if !self.can_walk(self.facing, grounds, t) {
                    self.facing = match self.facing {
                        Facing::Left => Facing::Right,
                        Facing::Right => Facing::Left,
                    };
                }
                if self.can_walk(self.facing, grounds, t) {
                    self.facing.sign() * self.speed
                } else {
                    0.0
                }
            }
        };

        self.body.mirrored = self.facing.mirrored();
        self.body.steer(vx);
        self.body.integrate();
        self.body.snap(grounds, t);
    }

    /// Can the enemy take one step toward `dir`?
    pub fn can_walk(&self, dir: Facing, grounds: &[Ground], t: &PhysicsTuning) -> bool {
        let hb = self.body.hitbox();
        let projected = hb.offset(dir.sign() * self.speed, 0.0);
        if projected.left < self.min || projected.right > self.max {
            return false;
        }

        let delta = hb.width() / SIDE_BAND_DIVISOR;
        let registered = || self.body.grounds.iter().filter_map(|&i| grounds.get(i));

        let blocked = registered().any(|g| {
            g.solid
                && (g.area.left_region(delta).overlaps(&projected)
                    || g.area.right_region(delta).overlaps(&projected))
        });
        if blocked {
            return false;
        }

        registered().any(|g| {
            g.area
                .top_region(t.s(t.snap_threshold))
                .with_padding(delta, 0.0)
                .overlaps(&projected)
        })
    }

    pub fn touches(&self, character: &Character) -> bool {
        self.body.hitbox().overlaps(&character.bounding_box())
    }

    pub fn push(&self, character: &mut Character) {
        character.receive_push(self.stun_ticks, self.push_power);
    }
}

impl BoundingBoxer for Npc {
    fn bounding_box(&self) -> Rect {
        self.body.hitbox()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::level::LevelFormat;
    use crate::domain::tile::TileVariant;

    const TILE: f64 = 50.0;

    fn raccoon() -> EnemySpecies {
        LevelFormat::classic().enemies[0].clone()
    }

    fn dog() -> EnemySpecies {
        LevelFormat::extended().enemies[1].clone()
    }

    /// Ground cells on row 2, from `from` to `to` inclusive, plus optional walls on row 1.
    fn run(from: usize, to: usize, walls: &[usize]) -> Vec<Ground> {
        let mut g: Vec<Ground> = (from..=to)
            .map(|x| Ground::solid(Rect::cell(x, 2, TILE), TileVariant::default()))
            .collect();
        for &w in walls {
            g.push(Ground::solid(Rect::cell(w, 1, TILE), TileVariant::default()));
        }
        g
    }

    fn npc_on(x: usize, kind: &EnemySpecies, grounds: &[Ground], min: f64, max: f64) -> Npc {
        let mut n = Npc::new(Rect::cell(x, 1, TILE), 0, kind, min, max, 1.0);
        for i in 0..grounds.len() {
            n.body.register_ground(i);
        }
        n
    }

    #[test]
    fn patrol_stays_on_its_run() {
        let grounds = run(2, 6, &[]);
        let t = PhysicsTuning::default();
        let mut n = npc_on(4, &raccoon(), &grounds, f64::MIN, f64::MAX);
        let mut turned = 0;
        let mut last = n.facing;
        for _ in 0..400 {
            n.update(&Rect::new(-1e6, -1e6, -1e6, -1e6), &grounds, &t);
            let hb = n.bounding_box();
            assert!(hb.right > 100.0 && hb.left < 350.0, "walked off: {hb:?}");
            assert_eq!(hb.bottom, 100.0);
            if n.facing != last {
                turned += 1;
                last = n.facing;
            }
        }
        assert!(turned >= 2);
    }

    #[test]
    fn patrol_turns_at_bound() {
        let grounds = run(0, 9, &[]);
        let t = PhysicsTuning::default();
        let mut n = npc_on(4, &raccoon(), &grounds, 150.0, 300.0);
        for _ in 0..300 {
            n.update(&Rect::new(-1e6, -1e6, -1e6, -1e6), &grounds, &t);
            let hb = n.bounding_box();
            assert!(hb.left >= 150.0 && hb.right <= 300.0);
        }
    }

    #[test]
    fn wall_blocks_walking() {
        let grounds = run(0, 9, &[5]);
        let t = PhysicsTuning::default();
        let mut n = npc_on(4, &raccoon(), &grounds, f64::MIN, f64::MAX);
        n.facing = Facing::Right;
        // One step short of the wall's side band.
        let hb = n.bounding_box();
        n.body.area = n.body.area.offset(235.0 - hb.right, 0.0);
        assert!(!n.can_walk(Facing::Right, &grounds, &t));
        assert!(n.can_walk(Facing::Left, &grounds, &t));
    }

    #[test]
    fn chaser_heads_toward_target() {
        let grounds = run(0, 9, &[]);
        let t = PhysicsTuning::default();
        let mut n = npc_on(4, &dog(), &grounds, f64::MIN, f64::MAX);
        assert_eq!(n.state, AiState::Chase);
        let right_of = Rect::cell(8, 1, TILE);
        n.update(&right_of, &grounds, &t);
        assert_eq!(n.facing, Facing::Right);
        assert!(n.body.velocity.x > 0.0);
        let left_of = Rect::cell(0, 1, TILE);
        n.update(&left_of, &grounds, &t);
        assert_eq!(n.facing, Facing::Left);
        assert!(n.body.velocity.x < 0.0);
    }

    #[test]
    fn chaser_stops_at_ledge() {
        let grounds = run(3, 5, &[]);
        let t = PhysicsTuning::default();
        let mut n = npc_on(5, &dog(), &grounds, f64::MIN, f64::MAX);
        let far_right = Rect::cell(20, 1, TILE);
        for _ in 0..100 {
            n.update(&far_right, &grounds, &t);
        }
        assert_eq!(n.body.velocity.x, 0.0);
        assert_eq!(n.facing, Facing::Right);
        assert_eq!(n.bounding_box().bottom, 100.0);
    }

    #[test]
    fn dead_band_favours_left() {
        let grounds = run(0, 9, &[]);
        let t = PhysicsTuning::default();
        let mut n = npc_on(4, &dog(), &grounds, f64::MIN, f64::MAX);
        let own = n.bounding_box();
        let same = Rect::new(own.left + 0.5, own.top, own.right + 0.5, own.bottom);
        n.update(&same, &grounds, &t);
        assert_eq!(n.facing, Facing::Left);
    }

    #[test]
    fn push_applies_species_values() {
        let n = Npc::new(Rect::cell(0, 0, TILE), 0, &raccoon(), 0.0, 50.0, 2.0);
        let mut c = Character::spawn(Rect::cell(0, 0, TILE));
        c.body.velocity.x = 4.0;
        n.push(&mut c);
        assert_eq!(c.stun, 15);
        assert_eq!(c.body.velocity.x, -8.0);
        assert_eq!(c.body.velocity.y, -20.0);
    }

    #[test]
    fn airborne_enemy_falls_without_walking() {
        let grounds = run(0, 9, &[]);
        let t = PhysicsTuning::default();
        let mut n = Npc::new(Rect::cell(4, 0, TILE).offset(0.0, -100.0), 0, &raccoon(), f64::MIN, f64::MAX, 1.0);
        for i in 0..grounds.len() {
            n.body.register_ground(i);
        }
        n.update(&Rect::default(), &grounds, &t);
        assert_eq!(n.body.velocity.x, 0.0);
        for _ in 0..60 {
            n.update(&Rect::default(), &grounds, &t);
        }
        assert_eq!(n.bounding_box().bottom, 100.0);
    }
}
