/// The player-controlled character.

use super::body::{MovableBody, PhysicsTuning};
use super::entity::{Facing, InputSnapshot};
use super::geometry::{BoundingBoxer, Insets, Rect};
use super::ground::Ground;

/// Hitbox carved from the 2×2-tile sprite.
pub const CHARACTER_INSETS: Insets = Insets { left: 0.25, top: 0.05, right: 0.35, bottom: 0.02 };

#[derive(Clone, Debug, PartialEq)]
pub struct Character {
    pub body: MovableBody,
    /// Ticks left before input is honoured again.
    pub stun: u32,
    pub facing: Facing,
    /// Enemies registered against this character (indices into the scene).
    pub enemies: Vec<usize>,
}

/// What happened to the character during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CharacterStep {
    pub jumped: bool,
    pub landed: bool,
}

impl Character {
    /// Spawn in the grid cell `cell` (already scaled). The sprite is two
    /// tiles wide and two tall, bottom-aligned and centred on the cell.
    pub fn spawn(cell: Rect) -> Self {
        let tile = cell.width();
        let sprite = Rect::new(
            cell.left - tile / 2.0,
            cell.top - tile,
            cell.right + tile / 2.0,
            cell.bottom,
        );
        Character {
            body: MovableBody::new(sprite, CHARACTER_INSETS),
            stun: 0,
            facing: Facing::Right,
            enemies: Vec::new(),
        }
    }

    pub fn is_stunned(&self) -> bool {
        self.stun > 0
    }

    pub fn update(&mut self, input: &InputSnapshot, grounds: &[Ground], t: &PhysicsTuning) -> CharacterStep {
        let was_snapped = self.body.snapped;
        let mut step = CharacterStep::default();

        if self.stun > 0 {
            self.stun -= 1;
            self.body.apply_vertical(false, false, grounds, t);
        } else {
            match input.horizontal() {
                Some(dir) => {
                    self.facing = dir;
                    self.body.steer(dir.sign() * t.s(t.run_speed));
                }
                None => self.body.steer(0.0),
            }
            step.jumped = self.body.apply_vertical(input.jump_pressed, input.jump_held, grounds, t);
        }

        self.body.mirrored = self.facing.mirrored();
        self.body.integrate();
        self.body.snap(grounds, t);
        step.landed = !was_snapped && self.body.standing_on.is_some();
        step
    }

    /// Applied by an enemy on contact.
    pub fn receive_push(&mut self, stun_ticks: u32, push: f64) {
        self.stun = stun_ticks;
        self.body.velocity.x = -self.body.velocity.x * 2.0;
        self.body.velocity.y = -push;
        self.body.jumping = false;
    }
}

impl BoundingBoxer for Character {
    fn bounding_box(&self) -> Rect {
        self.body.hitbox()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::TileVariant;

    fn floor() -> Vec<Ground> {
        (0..10)
            .map(|x| Ground::solid(Rect::cell(x, 4, 50.0), TileVariant::default()))
            .collect()
    }

    fn standing(grounds: &[Ground]) -> Character {
        let mut c = Character::spawn(Rect::cell(3, 3, 50.0));
        for i in 0..grounds.len() {
            c.body.register_ground(i);
        }
        c
    }

    fn settle(c: &mut Character, grounds: &[Ground], t: &PhysicsTuning) {
        for _ in 0..10 {
            c.update(&InputSnapshot::default(), grounds, t);
        }
    }

    #[test]
    fn spawn_hitbox_sits_in_cell() {
        let c = Character::spawn(Rect::cell(3, 3, 50.0));
        let hb = c.bounding_box();
        assert_eq!(hb.bottom, 198.0);
        assert!(hb.left >= 150.0 && hb.right <= 200.0);
    }

    #[test]
    fn walks_right_on_floor() {
        let grounds = floor();
        let t = PhysicsTuning::default();
        let mut c = standing(&grounds);
        settle(&mut c, &grounds, &t);
        let x0 = c.bounding_box().left;
        let input = InputSnapshot { right: true, ..Default::default() };
        for _ in 0..5 {
            c.update(&input, &grounds, &t);
        }
        assert_eq!(c.bounding_box().bottom, 200.0);
        assert_eq!(c.facing, Facing::Right);
        // Facing right mirrors the insets, so compare with the mirrored origin.
        let moved = c.bounding_box().left - x0;
        assert!(moved > 30.0, "moved {moved}");
    }

    #[test]
    fn jump_leaves_and_returns_to_floor() {
        let grounds = floor();
        let t = PhysicsTuning::default();
        let mut c = standing(&grounds);
        settle(&mut c, &grounds, &t);
        let press = InputSnapshot { jump_pressed: true, jump_held: true, ..Default::default() };
        let hold = InputSnapshot { jump_held: true, ..Default::default() };
        assert!(c.update(&press, &grounds, &t).jumped);
        let mut peak = c.bounding_box().bottom;
        for _ in 0..6 {
            c.update(&hold, &grounds, &t);
            peak = peak.min(c.bounding_box().bottom);
        }
        assert!(peak < 170.0);
        let mut landed = false;
        for _ in 0..60 {
            landed |= c.update(&InputSnapshot::default(), &grounds, &t).landed;
        }
        assert!(landed);
        assert_eq!(c.bounding_box().bottom, 200.0);
    }

    #[test]
    fn stun_skips_input_and_counts_down() {
        let grounds = floor();
        let t = PhysicsTuning::default();
        let mut c = standing(&grounds);
        settle(&mut c, &grounds, &t);
        c.receive_push(3, 10.0);
        assert_eq!(c.body.velocity.y, -10.0);
        let input = InputSnapshot { left: true, jump_pressed: true, ..Default::default() };
        c.update(&input, &grounds, &t);
        assert_eq!(c.stun, 2);
        assert_eq!(c.facing, Facing::Right);
        assert!(!c.body.jumping);
        c.update(&input, &grounds, &t);
        c.update(&input, &grounds, &t);
        assert!(!c.is_stunned());
    }

    #[test]
    fn push_reverses_and_doubles_horizontal_velocity() {
        let mut c = Character::spawn(Rect::cell(0, 0, 50.0));
        c.body.velocity.x = 8.0;
        c.receive_push(15, 10.0);
        assert_eq!(c.body.velocity.x, -16.0);
        assert_eq!(c.body.velocity.y, -10.0);
        assert_eq!(c.stun, 15);
    }
}
