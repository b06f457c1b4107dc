/// Movable body: the shared motion and collision resolver.
///
/// ## Per-tick order (driven by the owner)
///
///   1. `steer`          → horizontal intent sets `vx`
///   2. `apply_vertical` → jump window, grounded reset, or gravity
///   3. `integrate`      → `area += velocity`
///   4. `snap`           → resolve overlaps against registered grounds
///
/// The gameplay hitbox is an inset of the sprite rect and is recomputed
/// after every correction, so later grounds in the list see the body where
/// it actually is.
///
/// ## Snap rules (first matching ground wins)
///
///   - bottom within `snap_threshold` of the ground top → rest on it
///     (platforms only while falling or resting)
///   - solid, hitting its lower half → ceiling bump, pushed below it
///   - solid, hitting its left half  → flush against the left face
///   - solid, otherwise              → flush against the right face

use super::geometry::{Insets, Rect, Vec2};
use super::ground::Ground;

/// Physics constants in unscaled world units.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsTuning {
    pub scale: f64,
    pub run_speed: f64,
    pub jump_accel: f64,
    pub gravity: f64,
    pub terminal_velocity: f64,
    pub jump_ticks: u32,
    pub snap_threshold: f64,
    pub ceiling_kick: f64,
    pub ceiling_margin: f64,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        PhysicsTuning {
            scale: 1.0,
            run_speed: 8.0,
            jump_accel: 2.0,
            gravity: 1.0,
            terminal_velocity: 20.0,
            jump_ticks: 5,
            snap_threshold: 20.0,
            ceiling_kick: 3.0,
            ceiling_margin: 10.0,
        }
    }
}

impl PhysicsTuning {
    /// Multiply a tuning value by the world scale.
    pub fn s(&self, v: f64) -> f64 {
        v * self.scale
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MovableBody {
    /// Sprite rect; the hitbox is derived from it.
    pub area: Rect,
    pub velocity: Vec2,
    pub jumping: bool,
    pub jump_duration: u32,
    pub snapped: bool,
    /// Ground the body came to rest on during the last snap.
    pub standing_on: Option<usize>,
    pub insets: Insets,
    pub mirrored: bool,
    /// Grounds this body collides with (indices into the scene's list).
    pub grounds: Vec<usize>,
}

impl MovableBody {
    pub fn new(area: Rect, insets: Insets) -> Self {
        MovableBody {
            area,
            velocity: Vec2::ZERO,
            jumping: false,
            jump_duration: 0,
            snapped: false,
            standing_on: None,
            insets,
            mirrored: false,
            grounds: Vec::new(),
        }
    }

    pub fn register_ground(&mut self, idx: usize) {
        if !self.grounds.contains(&idx) {
            self.grounds.push(idx);
        }
    }

    pub fn hitbox(&self) -> Rect {
        self.area.inset(&self.insets, self.mirrored)
    }

    /// Resting on a registered ground: moving down or still, overlapping it,
    /// with the hitbox bottom close to its top.
    pub fn is_grounded(&self, grounds: &[Ground], t: &PhysicsTuning) -> bool {
        if self.velocity.y < 0.0 {
            return false;
        }
        let hb = self.hitbox();
        self.registered(grounds).any(|(_, g)| {
            hb.overlaps(&g.area) && (g.area.top - hb.bottom).abs() < t.s(t.snap_threshold)
        })
    }

    pub fn steer(&mut self, vx: f64) {
        self.velocity.x = vx;
    }

    /// Vertical velocity update. Returns true when a jump started this tick.
    pub fn apply_vertical(
        &mut self,
        ascend_pressed: bool,
        ascend_held: bool,
        grounds: &[Ground],
        t: &PhysicsTuning,
    ) -> bool {
        if self.jumping {
            self.jump_duration += 1;
            if ascend_held {
                self.velocity.y -= t.s(t.jump_accel);
            }
            if self.jump_duration > t.jump_ticks {
                self.jumping = false;
            }
            false
        } else if self.is_grounded(grounds, t) {
            self.velocity.y = 0.0;
            if ascend_pressed {
                self.jumping = true;
                self.jump_duration = 0;
                return true;
            }
            false
        } else {
            if self.velocity.y < t.s(t.terminal_velocity) {
                self.velocity.y += t.s(t.gravity);
            }
            false
        }
    }

    pub fn integrate(&mut self) {
        self.area = self.area.offset(self.velocity.x, self.velocity.y);
    }

    pub fn snap(&mut self, grounds: &[Ground], t: &PhysicsTuning) {
        self.snapped = false;
        self.standing_on = None;

        for &idx in &self.grounds.clone() {
            if self.snapped {
                break;
            }
            let Some(ground) = grounds.get(idx) else { continue };
            let gb = ground.area;
            let hb = self.hitbox();
            if !hb.overlaps(&gb) {
                continue;
            }

            let near_top = (gb.top - hb.bottom).abs() < t.s(t.snap_threshold);
            if near_top && (ground.solid || self.velocity.y >= 0.0) {
                self.area = self.area.offset(0.0, gb.top - hb.bottom);
                self.snapped = true;
                self.standing_on = Some(idx);
                continue;
            }
            if !ground.solid {
                continue;
            }

            // A ceiling only stops a rising body that is deeper in sideways
            // than vertically; anything else is a wall contact.
            let margin = t.s(t.ceiling_margin);
            let lower_half = Rect::new(gb.left + margin, gb.center_y(), gb.right - margin, gb.bottom);
            let (depth_x, depth_y) = penetration(&hb, &gb);
            if self.velocity.y < 0.0 && depth_y < depth_x && hb.overlaps(&lower_half) {
                self.area = self.area.offset(0.0, gb.bottom - hb.top);
                self.velocity.y += t.s(t.ceiling_kick);
                self.jumping = false;
                continue;
            }

            let left_half = Rect::new(gb.left, gb.top, gb.center_x(), gb.bottom);
            if hb.overlaps(&left_half) {
                self.area = self.area.offset(gb.left - hb.right, 0.0);
            } else {
                self.area = self.area.offset(gb.right - hb.left, 0.0);
            }
            self.snapped = true;
        }
    }

    fn registered<'a>(&'a self, grounds: &'a [Ground]) -> impl Iterator<Item = (usize, &'a Ground)> + 'a {
        self.grounds.iter().filter_map(move |&i| grounds.get(i).map(|g| (i, g)))
    }
}

/// How far `a` reaches into `b` along each axis.
fn penetration(a: &Rect, b: &Rect) -> (f64, f64) {
    let x = a.right.min(b.right) - a.left.max(b.left);
    let y = a.bottom.min(b.bottom) - a.top.max(b.top);
    (x, y)
}
