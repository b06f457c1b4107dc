/// Win/lose detection.
///
/// Evaluated after the character has been resolved for the tick. Each
/// outcome latches, so callers see `Won` or `Lost` exactly once.

use super::geometry::{BoundingBoxer, Rect};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Won,
    Lost,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Goal {
    pub zone: Rect,
    /// Character bottom beyond this world y counts as a fall.
    pub fall_limit: f64,
    won: bool,
    lost: bool,
}

impl Goal {
    pub fn new(zone: Rect, fall_limit: f64) -> Self {
        Goal { zone, fall_limit, won: false, lost: false }
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    pub fn is_decided(&self) -> bool {
        self.won || self.lost
    }

    pub fn evaluate(&mut self, character: &impl BoundingBoxer) -> Option<Outcome> {
        if self.is_decided() {
            return None;
        }
        let hb = character.bounding_box();
        if hb.bottom > self.fall_limit {
            self.lost = true;
            return Some(Outcome::Lost);
        }
        if hb.overlaps(&self.zone) {
            self.won = true;
            return Some(Outcome::Won);
        }
        None
    }
}

impl BoundingBoxer for Goal {
    fn bounding_box(&self) -> Rect {
        self.zone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal() -> Goal {
        Goal::new(Rect::new(200.0, 100.0, 250.0, 150.0), 1000.0)
    }

    #[test]
    fn win_latches_once() {
        let mut g = goal();
        let touching = Rect::new(190.0, 110.0, 210.0, 150.0);
        assert_eq!(g.evaluate(&touching), Some(Outcome::Won));
        assert_eq!(g.evaluate(&touching), None);
        assert!(g.is_won());
        assert!(!g.is_lost());
    }

    #[test]
    fn falling_past_limit_loses() {
        let mut g = goal();
        let below = Rect::new(0.0, 980.0, 20.0, 1001.0);
        assert_eq!(g.evaluate(&below), Some(Outcome::Lost));
        assert_eq!(g.evaluate(&below), None);
        assert!(g.is_lost());
    }

    #[test]
    fn nothing_while_away() {
        let mut g = goal();
        let away = Rect::new(0.0, 0.0, 20.0, 40.0);
        assert_eq!(g.evaluate(&away), None);
        assert!(!g.is_decided());
    }

    #[test]
    fn loss_wins_over_simultaneous_touch() {
        let mut g = Goal::new(Rect::new(0.0, 0.0, 50.0, 50.0), 30.0);
        let both = Rect::new(10.0, 0.0, 20.0, 40.0);
        assert_eq!(g.evaluate(&both), Some(Outcome::Lost));
    }
}
