/// Ground segments and kinematic platform groups.
///
/// Solid ground blocks from every side. Non-solid ground (platforms) can
/// only be landed on from above; bodies pass through it sideways and from
/// below.

use super::geometry::{BoundingBoxer, Rect};
use super::tile::TileVariant;

#[derive(Clone, Debug, PartialEq)]
pub struct Ground {
    pub area: Rect,
    pub solid: bool,
    pub variant: TileVariant,
    /// Index of the platform group that drives this segment, if any.
    pub group: Option<usize>,
}

impl Ground {
    pub fn solid(area: Rect, variant: TileVariant) -> Self {
        Ground { area, solid: true, variant, group: None }
    }

    pub fn platform(area: Rect, group: usize) -> Self {
        Ground { area, solid: false, variant: TileVariant::Platform, group: Some(group) }
    }
}

impl BoundingBoxer for Ground {
    fn bounding_box(&self) -> Rect {
        self.area
    }
}

/// One drift controller shared by a cluster of platform segments.
///
/// Members move by the same amount every tick and reverse once the
/// group's offset from its spawn position would leave `[min, max]`.
/// `min <= 0 <= max`; the bound is the open space beside the cluster,
/// so a group never drifts into solid ground.
#[derive(Clone, Debug, PartialEq)]
pub struct PlatformGroup {
    pub members: Vec<usize>,
    pub speed: f64,
    pub min: f64,
    pub max: f64,
    offset: f64,
    dir: f64,
}

impl PlatformGroup {
    pub fn new(members: Vec<usize>, speed: f64, (min, max): (f64, f64), start_left: bool) -> Self {
        PlatformGroup {
            members,
            speed,
            min: min.min(0.0),
            max: max.max(0.0),
            offset: 0.0,
            dir: if start_left { -1.0 } else { 1.0 },
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn contains(&self, ground: usize) -> bool {
        self.members.contains(&ground)
    }

    /// Advance one tick. Returns the horizontal displacement applied.
    pub fn drift(&mut self, grounds: &mut [Ground]) -> f64 {
        let mut next = self.offset + self.speed * self.dir;
        if next < self.min || next > self.max {
            self.dir = -self.dir;
            next = (self.offset + self.speed * self.dir).clamp(self.min, self.max);
        }
        let step = next - self.offset;
        self.offset = next;
        for &m in &self.members {
            if let Some(g) = grounds.get_mut(m) {
                g.area = g.area.offset(step, 0.0);
            }
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platforms(n: usize) -> Vec<Ground> {
        (0..n).map(|i| Ground::platform(Rect::cell(i, 0, 50.0), 0)).collect()
    }

    #[test]
    fn members_move_together() {
        let mut grounds = platforms(3);
        let mut group = PlatformGroup::new(vec![0, 1, 2], 2.0, (-100.0, 100.0), false);
        let step = group.drift(&mut grounds);
        assert_eq!(step, 2.0);
        assert_eq!(grounds[0].area.left, 2.0);
        assert_eq!(grounds[1].area.left, 52.0);
        assert_eq!(grounds[2].area.left, 102.0);
    }

    #[test]
    fn reverses_at_range() {
        let mut grounds = platforms(1);
        let mut group = PlatformGroup::new(vec![0], 10.0, (-30.0, 30.0), false);
        for _ in 0..3 {
            assert_eq!(group.drift(&mut grounds), 10.0);
        }
        assert_eq!(group.offset(), 30.0);
        assert_eq!(group.drift(&mut grounds), -10.0);
        assert_eq!(group.offset(), 20.0);
    }

    #[test]
    fn offset_stays_within_range() {
        let mut grounds = platforms(1);
        let mut group = PlatformGroup::new(vec![0], 3.0, (-10.0, 10.0), true);
        for _ in 0..200 {
            group.drift(&mut grounds);
            assert!(group.offset().abs() <= 10.0);
        }
        assert!((grounds[0].area.left - group.offset()).abs() < 1e-9);
    }

    #[test]
    fn lopsided_bound_turns_at_each_side() {
        let mut grounds = platforms(1);
        let mut group = PlatformGroup::new(vec![0], 4.0, (0.0, 10.0), true);
        assert_eq!(group.drift(&mut grounds), 4.0);
        for _ in 0..100 {
            group.drift(&mut grounds);
            assert!((0.0..=10.0).contains(&group.offset()));
        }
    }

    #[test]
    fn boxed_in_group_stays_put() {
        let mut grounds = platforms(1);
        let mut group = PlatformGroup::new(vec![0], 2.0, (0.0, 0.0), false);
        for _ in 0..5 {
            assert_eq!(group.drift(&mut grounds), 0.0);
        }
        assert_eq!(grounds[0].area.left, 0.0);
    }
}
