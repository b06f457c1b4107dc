/// Axis-aligned rectangles in world units.
///
/// World space grows right (+x) and down (+y). All collision checks in the
/// game go through `Rect::overlaps`, which keeps one asymmetric edge rule:
///   - right edge exclusive: `left < other.right && right > other.left`
///   - bottom edge inclusive: `top < other.bottom && bottom >= other.top`
///
/// The inclusive bottom lets a box resting exactly on a ground top still
/// count as touching it, which the grounded test relies on.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
}

/// Which edge band of a rect another rect touches.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Region {
    None,
    Left,
    Top,
    Right,
    Bottom,
}

#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Anything that exposes a gameplay bounding box.
pub trait BoundingBoxer {
    fn bounding_box(&self) -> Rect;
}

impl BoundingBoxer for Rect {
    fn bounding_box(&self) -> Rect {
        *self
    }
}

impl Rect {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Rect { left, top, right, bottom }
    }

    /// Cell-sized rect at grid position `(x, y)`.
    pub fn cell(x: usize, y: usize, size: f64) -> Self {
        let l = x as f64 * size;
        let t = y as f64 * size;
        Rect::new(l, t, l + size, t + size)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width() / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.top + self.height() / 2.0
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    pub fn scale(&self, s: f64) -> Rect {
        Rect::new(self.left * s, self.top * s, self.right * s, self.bottom * s)
    }

    /// Shrink inward by `x` on both sides and `y` on top and bottom.
    pub fn padding(&self, x: f64, y: f64) -> Rect {
        Rect::new(self.left + x, self.top + y, self.right - x, self.bottom - y)
    }

    /// Shrink horizontally by `x`, grow vertically by `y`.
    pub fn with_padding(&self, x: f64, y: f64) -> Rect {
        Rect::new(self.left + x, self.top - y, self.right - x, self.bottom + y)
    }

    /// Inset each edge by a fraction of the rect's size.
    ///
    /// When `mirrored` is set the left and right fractions swap, so an
    /// asymmetric hitbox follows the sprite when it faces the other way.
    pub fn inset(&self, insets: &Insets, mirrored: bool) -> Rect {
        let w = self.width();
        let h = self.height();
        let (l, r) = if mirrored {
            (insets.right, insets.left)
        } else {
            (insets.left, insets.right)
        };
        Rect::new(
            self.left + w * l,
            self.top + h * insets.top,
            self.right - w * r,
            self.bottom - h * insets.bottom,
        )
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom >= other.top
    }

    // ── Edge bands ──

    pub fn left_region(&self, d: f64) -> Rect {
        Rect::new(self.left - d, self.top + d, self.left + d, self.bottom - d)
    }

    pub fn top_region(&self, d: f64) -> Rect {
        Rect::new(self.left, self.top - d, self.right, self.top + d)
    }

    pub fn right_region(&self, d: f64) -> Rect {
        Rect::new(self.right - d, self.top + d, self.right + d, self.bottom - d)
    }

    pub fn bottom_region(&self, d: f64) -> Rect {
        Rect::new(self.left, self.bottom - d, self.right, self.bottom + d)
    }

    /// First band (left, top, right, bottom order) that touches `other`.
    pub fn overlaps_region(&self, other: &Rect, d: f64) -> Region {
        if self.left_region(d).overlaps(other) {
            Region::Left
        } else if self.top_region(d).overlaps(other) {
            Region::Top
        } else if self.right_region(d).overlaps(other) {
            Region::Right
        } else if self.bottom_region(d).overlaps(other) {
            Region::Bottom
        } else {
            Region::None
        }
    }
}

/// Fractional insets used to carve a hitbox out of a sprite rect.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Insets {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Insets {
    pub const NONE: Insets = Insets { left: 0.0, top: 0.0, right: 0.0, bottom: 0.0 };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_bottom_edge_is_inclusive() {
        let ground = Rect::new(0.0, 100.0, 50.0, 150.0);
        let resting = Rect::new(10.0, 50.0, 40.0, 100.0);
        assert!(resting.overlaps(&ground));
        // The reverse direction compares ground.bottom with resting.top instead.
        assert!(!ground.overlaps(&resting));
    }

    #[test]
    fn overlap_right_edge_is_exclusive() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(50.0, 0.0, 100.0, 50.0);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn overlap_disjoint_vertically() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(0.0, 51.0, 50.0, 100.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn offset_and_scale() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(r.offset(1.0, -1.0), Rect::new(2.0, 1.0, 4.0, 3.0));
        assert_eq!(r.scale(2.0), Rect::new(2.0, 4.0, 6.0, 8.0));
        assert_eq!(r.width(), 2.0);
        assert_eq!(r.height(), 2.0);
    }

    #[test]
    fn with_padding_shrinks_horizontally_and_grows_vertically() {
        let r = Rect::new(0.0, 0.0, 100.0, 10.0);
        assert_eq!(r.with_padding(20.0, 5.0), Rect::new(20.0, -5.0, 80.0, 15.0));
    }

    #[test]
    fn inset_mirrors_left_and_right() {
        let sprite = Rect::new(0.0, 0.0, 100.0, 100.0);
        let insets = Insets { left: 0.25, top: 0.05, right: 0.35, bottom: 0.02 };
        let normal = sprite.inset(&insets, false);
        assert_eq!(normal, Rect::new(25.0, 5.0, 65.0, 98.0));
        let mirrored = sprite.inset(&insets, true);
        assert_eq!(mirrored, Rect::new(35.0, 5.0, 75.0, 98.0));
    }

    #[test]
    fn overlaps_region_reports_side() {
        let ground = Rect::new(100.0, 100.0, 200.0, 200.0);
        let from_left = Rect::new(80.0, 140.0, 102.0, 160.0);
        let from_top = Rect::new(140.0, 80.0, 160.0, 100.0);
        let from_right = Rect::new(198.0, 140.0, 220.0, 160.0);
        let below = Rect::new(140.0, 199.0, 160.0, 220.0);
        let away = Rect::new(400.0, 400.0, 410.0, 410.0);
        assert_eq!(ground.overlaps_region(&from_left, 5.0), Region::Left);
        assert_eq!(ground.overlaps_region(&from_top, 5.0), Region::Top);
        assert_eq!(ground.overlaps_region(&from_right, 5.0), Region::Right);
        assert_eq!(ground.overlaps_region(&below, 5.0), Region::Bottom);
        assert_eq!(ground.overlaps_region(&away, 5.0), Region::None);
    }

    #[test]
    fn rect_serializes_with_field_names() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"Left\":1.0"));
        let back: Rect = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
