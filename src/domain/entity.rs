/// Shared entity vocabulary: facing, pickups and the per-tick input snapshot.

use super::geometry::{BoundingBoxer, Rect};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f64 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Sprites are drawn facing left; facing right mirrors them.
    pub fn mirrored(self) -> bool {
        self == Facing::Right
    }
}

/// A coin: taken once on overlap with the character.
#[derive(Clone, Debug, PartialEq)]
pub struct Collectible {
    pub area: Rect,
    pub taken: bool,
}

impl Collectible {
    pub fn new(area: Rect) -> Self {
        Collectible { area, taken: false }
    }

    /// Take the coin if `hitbox` touches it. Returns true on the taking tick.
    pub fn try_take(&mut self, hitbox: &Rect) -> bool {
        if self.taken || !hitbox.overlaps(&self.area) {
            return false;
        }
        self.taken = true;
        true
    }
}

impl BoundingBoxer for Collectible {
    fn bounding_box(&self) -> Rect {
        self.area
    }
}

/// Stage shortcut requested from the keyboard (debug keys).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Shortcut {
    Digit(u8),
}

/// Input sampled once per tick and passed down by value.
///
/// Movement is continuous (held), jump start and menu actions are
/// edge-triggered (fresh press this tick).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    pub left: bool,
    pub right: bool,
    pub jump_held: bool,
    pub jump_pressed: bool,
    pub up_pressed: bool,
    pub down_pressed: bool,
    pub left_pressed: bool,
    pub right_pressed: bool,
    pub confirm: bool,
    pub back: bool,
    /// Pointer position in menu canvas pixels.
    pub pointer: Option<(f64, f64)>,
    pub primary_pressed: bool,
    pub primary_held: bool,
    pub shortcut: Option<Shortcut>,
}

impl InputSnapshot {
    /// Horizontal intent; right wins when both are held.
    pub fn horizontal(&self) -> Option<Facing> {
        if self.right {
            Some(Facing::Right)
        } else if self.left {
            Some(Facing::Left)
        } else {
            None
        }
    }
}
