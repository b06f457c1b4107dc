/// Camera: a viewport into the world, in world units.
///
/// Detached cameras stay put. The stage manager detaches the camera on
/// every stage change; the level scene re-attaches it to the character.
///
/// Follow uses a dead zone: the view only scrolls once the target leaves
/// the inner 60% of the viewport. Levels smaller than the viewport are
/// centred.

use crate::domain::geometry::Rect;

/// Terminal columns per tile. A tile is one row tall.
pub const COLUMNS_PER_TILE: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// World position of the top-left corner of the view.
    pub x: f64,
    pub y: f64,
    pub view_w: f64,
    pub view_h: f64,
    attached: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Camera::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        Camera { x: 0.0, y: 0.0, view_w: 0.0, view_h: 0.0, attached: false }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Reset to the origin and stop following.
    pub fn detach(&mut self) {
        self.attached = false;
        self.x = 0.0;
        self.y = 0.0;
    }

    pub fn set_view(&mut self, w: f64, h: f64) {
        self.view_w = w;
        self.view_h = h;
    }

    /// Size the view to `cols × rows` terminal cells for tiles of `tile` units.
    pub fn set_view_cells(&mut self, cols: usize, rows: usize, tile: f64) {
        self.set_view(cols as f64 * tile / COLUMNS_PER_TILE as f64, rows as f64 * tile);
    }

    pub fn follow(&mut self, target: &Rect, world: &Rect) {
        if !self.attached || self.view_w <= 0.0 || self.view_h <= 0.0 {
            return;
        }
        self.x = follow_axis(self.x, self.view_w, target.center_x(), world.left, world.right);
        self.y = follow_axis(self.y, self.view_h, target.center_y(), world.top, world.bottom);
    }

    /// Jump straight to the target (no dead zone).
    pub fn center_on(&mut self, target: &Rect, world: &Rect) {
        if !self.attached || self.view_w <= 0.0 || self.view_h <= 0.0 {
            return;
        }
        self.x = clamp_axis(target.center_x() - self.view_w / 2.0, self.view_w, world.left, world.right);
        self.y = clamp_axis(target.center_y() - self.view_h / 2.0, self.view_h, world.top, world.bottom);
    }
}

fn follow_axis(pos: f64, view: f64, target: f64, lo: f64, hi: f64) -> f64 {
    let margin = view / 5.0;
    let next = if target < pos + margin {
        target - margin
    } else if target > pos + view - margin {
        target - view + margin
    } else {
        pos
    };
    clamp_axis(next, view, lo, hi)
}

fn clamp_axis(pos: f64, view: f64, lo: f64, hi: f64) -> f64 {
    let span = hi - lo;
    if span <= view {
        lo - (view - span) / 2.0
    } else {
        pos.clamp(lo, hi - view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> Rect {
        Rect::new(0.0, 0.0, 2000.0, 1000.0)
    }

    #[test]
    fn detached_camera_ignores_target() {
        let mut cam = Camera::new();
        cam.set_view(400.0, 300.0);
        cam.follow(&Rect::new(1500.0, 500.0, 1540.0, 590.0), &world());
        assert_eq!((cam.x, cam.y), (0.0, 0.0));
    }

    #[test]
    fn follows_outside_dead_zone_only() {
        let mut cam = Camera::new();
        cam.set_view(400.0, 300.0);
        cam.attach();
        cam.follow(&Rect::new(190.0, 140.0, 210.0, 160.0), &world());
        assert_eq!((cam.x, cam.y), (0.0, 0.0));
        cam.follow(&Rect::new(990.0, 140.0, 1010.0, 160.0), &world());
        assert_eq!(cam.x, 1000.0 - 400.0 + 80.0);
    }

    #[test]
    fn clamps_to_world_edges() {
        let mut cam = Camera::new();
        cam.set_view(400.0, 300.0);
        cam.attach();
        cam.center_on(&Rect::new(1990.0, 990.0, 2000.0, 1000.0), &world());
        assert_eq!(cam.x, 1600.0);
        assert_eq!(cam.y, 700.0);
    }

    #[test]
    fn small_world_is_centred() {
        let mut cam = Camera::new();
        cam.set_view(400.0, 300.0);
        cam.attach();
        cam.center_on(&Rect::new(0.0, 0.0, 10.0, 10.0), &Rect::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(cam.x, -100.0);
        assert_eq!(cam.y, -100.0);
    }

    #[test]
    fn detach_resets_position() {
        let mut cam = Camera::new();
        cam.set_view(400.0, 300.0);
        cam.attach();
        cam.center_on(&Rect::new(1000.0, 500.0, 1010.0, 510.0), &world());
        cam.detach();
        assert!(!cam.is_attached());
        assert_eq!((cam.x, cam.y), (0.0, 0.0));
    }
}
