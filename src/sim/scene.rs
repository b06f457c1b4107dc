/// Scenes owned by the stage manager, and the level tick.
///
/// ## Level tick order
///
///   1. Platform groups drift; bodies standing on a moved segment ride along
///   2. Character: input → velocity → integrate → snap
///   3. Enemies: AI → integrate → snap, then push on contact
///   4. Collectibles
///   5. Goal (win / lose latch)
///   6. Camera follows the character
///
/// Draw is a read-only projection: `render_list` returns one item per
/// visible entity, in back-to-front order.

use crate::domain::ai::Npc;
use crate::domain::body::PhysicsTuning;
use crate::domain::character::Character;
use crate::domain::entity::{Collectible, InputSnapshot};
use crate::domain::geometry::{BoundingBoxer, Rect};
use crate::domain::goal::{Goal, Outcome};
use crate::domain::ground::{Ground, PlatformGroup};
use super::assets::TextureId;
use super::camera::Camera;
use super::event::GameEvent;
use super::menu::MenuScene;
use super::placement::Placed;

/// Whatever the active stage shows.
#[derive(Debug)]
pub enum Scene {
    Menu(MenuScene),
    Level(Box<LevelScene>),
}

impl Scene {
    pub fn as_level(&self) -> Option<&LevelScene> {
        match self {
            Scene::Level(l) => Some(l),
            Scene::Menu(_) => None,
        }
    }

    pub fn as_menu(&self) -> Option<&MenuScene> {
        match self {
            Scene::Menu(m) => Some(m),
            Scene::Level(_) => None,
        }
    }
}

/// One drawable entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderItem {
    pub texture: TextureId,
    pub area: Rect,
    pub mirrored: bool,
}

#[derive(Clone, Debug)]
pub struct LevelScene {
    pub level: usize,
    pub name: String,
    /// Scaled world units per grid cell.
    pub tile: f64,
    pub grounds: Vec<Ground>,
    pub groups: Vec<PlatformGroup>,
    pub character: Character,
    pub npcs: Vec<Npc>,
    pub collectibles: Vec<Collectible>,
    pub goal: Goal,
    pub bounds: Rect,
    pub coins: u32,
    pub ticks: u64,
    tuning: PhysicsTuning,
}

impl LevelScene {
    pub fn new(level: usize, name: impl Into<String>, tile: f64, placed: Placed, tuning: PhysicsTuning) -> Self {
        LevelScene {
            level,
            name: name.into(),
            tile,
            grounds: placed.grounds,
            groups: placed.groups,
            character: placed.character,
            npcs: placed.npcs,
            collectibles: placed.collectibles,
            goal: placed.goal,
            bounds: placed.bounds,
            coins: 0,
            ticks: 0,
            tuning,
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if self.goal.is_won() {
            Some(Outcome::Won)
        } else if self.goal.is_lost() {
            Some(Outcome::Lost)
        } else {
            None
        }
    }

    pub fn tick(&mut self, input: &InputSnapshot, camera: &mut Camera) -> Vec<GameEvent> {
        let mut events = Vec::new();
        self.ticks += 1;

        self.drift_platforms();

        let step = self.character.update(input, &self.grounds, &self.tuning);
        if step.jumped {
            events.push(GameEvent::Jumped);
        }
        if step.landed {
            events.push(GameEvent::Landed);
        }

        for (i, npc) in self.npcs.iter_mut().enumerate() {
            npc.update(&self.character.bounding_box(), &self.grounds, &self.tuning);
            if npc.touches(&self.character) {
                npc.push(&mut self.character);
                events.push(GameEvent::Pushed { enemy: i });
            }
        }

        let hitbox = self.character.bounding_box();
        for coin in &mut self.collectibles {
            if coin.try_take(&hitbox) {
                self.coins += 1;
                events.push(GameEvent::Collected { total: self.coins });
            }
        }

        match self.goal.evaluate(&self.character) {
            Some(Outcome::Won) => {
                log::info!("level {} ({}) won after {} ticks", self.level, self.name, self.ticks);
                events.push(GameEvent::Won { level: self.level });
            }
            Some(Outcome::Lost) => {
                log::info!("level {} ({}) lost", self.level, self.name);
                events.push(GameEvent::Lost { level: self.level });
            }
            None => {}
        }

        camera.follow(&self.character.bounding_box(), &self.bounds);
        events
    }

    /// Move every platform group one step and carry whoever stands on it.
    fn drift_platforms(&mut self) {
        for group in &mut self.groups {
            let dx = group.drift(&mut self.grounds);
            if dx == 0.0 {
                continue;
            }
            let riding = |standing: Option<usize>| standing.is_some_and(|g| group.contains(g));
            if riding(self.character.body.standing_on) {
                self.character.body.area = self.character.body.area.offset(dx, 0.0);
            }
            for npc in &mut self.npcs {
                if riding(npc.body.standing_on) {
                    npc.body.area = npc.body.area.offset(dx, 0.0);
                }
            }
        }
    }

    /// Snap the camera onto the character (level start or resume).
    pub fn focus(&self, camera: &mut Camera) {
        camera.attach();
        camera.center_on(&self.character.bounding_box(), &self.bounds);
    }

    pub fn render_list(&self) -> Vec<RenderItem> {
        let mut items = Vec::with_capacity(self.grounds.len() + self.npcs.len() + self.collectibles.len() + 2);

        items.extend(self.grounds.iter().map(|g| RenderItem {
            texture: TextureId::for_variant(g.variant),
            area: g.area,
            mirrored: false,
        }));
        items.push(RenderItem { texture: TextureId::Goal, area: self.goal.zone, mirrored: false });
        items.extend(self.collectibles.iter().filter(|c| !c.taken).map(|c| RenderItem {
            texture: TextureId::Coin,
            area: c.area,
            mirrored: false,
        }));
        items.extend(self.npcs.iter().map(|n| RenderItem {
            texture: TextureId::for_enemy(n.species),
            area: n.body.area,
            mirrored: n.body.mirrored,
        }));
        items.push(RenderItem {
            texture: if self.character.is_stunned() {
                TextureId::CharacterStunned
            } else {
                TextureId::Character
            },
            area: self.character.body.area,
            mirrored: self.character.body.mirrored,
        });
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::level::{LevelFormat, LevelGrid};
    use crate::sim::placement::{place, PlacementParams};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene(text: &str, format: LevelFormat) -> LevelScene {
        let grid = LevelGrid::parse(text, &format).unwrap();
        let placed = place(&grid, &format, &PlacementParams::default(), &mut StdRng::seed_from_u64(9)).unwrap();
        LevelScene::new(0, "test", format.tile_size, placed, PhysicsTuning::default())
    }

    fn run(s: &mut LevelScene, input: InputSnapshot, ticks: usize) -> Vec<GameEvent> {
        let mut camera = Camera::new();
        (0..ticks).flat_map(|_| s.tick(&input, &mut camera)).collect()
    }

    #[test]
    fn end_to_end_small_level_wins_once() {
        let mut s = scene("XXXXXX\nX    X\nXP  GX\nXXXXXX\n", LevelFormat::classic());

        let items = s.render_list();
        assert_eq!(items.iter().filter(|i| i.texture == TextureId::Character).count(), 1);
        assert_eq!(items.iter().filter(|i| i.texture == TextureId::Goal).count(), 1);

        let idle = run(&mut s, InputSnapshot::default(), 5);
        assert!(idle.contains(&GameEvent::Landed));
        assert_eq!(s.outcome(), None);

        let right = InputSnapshot { right: true, ..Default::default() };
        let events = run(&mut s, right, 40);
        let wins = events.iter().filter(|e| matches!(e, GameEvent::Won { .. })).count();
        assert_eq!(wins, 1);
        assert_eq!(s.outcome(), Some(Outcome::Won));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Lost { .. })));
    }

    #[test]
    fn falling_off_the_map_loses() {
        let mut s = scene("GP   \nXX   \n     ", LevelFormat::classic());
        let right = InputSnapshot { right: true, ..Default::default() };
        let events = run(&mut s, right, 80);
        assert!(events.contains(&GameEvent::Lost { level: 0 }));
        assert_eq!(s.outcome(), Some(Outcome::Lost));
    }

    /// Put enemy `i` squarely on the character.
    fn overlap_enemy(s: &mut LevelScene, i: usize) {
        let target = s.character.bounding_box();
        let own = s.npcs[i].body.hitbox();
        let (dx, dy) = (target.center_x() - own.center_x(), target.center_y() - own.center_y());
        s.npcs[i].body.area = s.npcs[i].body.area.offset(dx, dy);
    }

    #[test]
    fn enemy_contact_pushes_even_while_stunned() {
        let mut s = scene("R P  G\nXXXXXX", LevelFormat::classic());
        run(&mut s, InputSnapshot::default(), 8);
        let mut camera = Camera::new();

        for _ in 0..2 {
            s.character.stun = 10;
            overlap_enemy(&mut s, 0);
            let events = s.tick(&InputSnapshot::default(), &mut camera);
            assert!(events.contains(&GameEvent::Pushed { enemy: 0 }));
            assert_eq!(s.character.stun, s.npcs[0].stun_ticks);
        }
    }

    #[test]
    fn enemy_contact_pushes_every_overlapping_tick() {
        let mut s = scene("R P  G\nXXXXXX", LevelFormat::classic());
        run(&mut s, InputSnapshot::default(), 8);
        let mut camera = Camera::new();
        let mut pushes = 0;
        for _ in 0..5 {
            overlap_enemy(&mut s, 0);
            let events = s.tick(&InputSnapshot::default(), &mut camera);
            pushes += events.iter().filter(|e| matches!(e, GameEvent::Pushed { .. })).count();
        }
        assert_eq!(pushes, 5);
    }

    #[test]
    fn coins_counted_once() {
        let mut s = scene("P C   G\nXXXXXXX", LevelFormat::extended());
        let right = InputSnapshot { right: true, ..Default::default() };
        let events = run(&mut s, right, 20);
        assert_eq!(events.iter().filter(|e| matches!(e, GameEvent::Collected { .. })).count(), 1);
        assert_eq!(s.coins, 1);
        assert!(s.render_list().iter().all(|i| i.texture != TextureId::Coin));
    }

    #[test]
    fn platforms_drift_and_carry_riders() {
        // Character starts right above a platform cluster.
        let mut s = scene("      G\n P     \n---    \n       ", LevelFormat::extended());
        run(&mut s, InputSnapshot::default(), 6);
        assert!(s.character.body.standing_on.is_some());
        let x0 = s.character.body.area.left;
        let p0 = s.grounds[s.groups[0].members[0]].area.left;
        run(&mut s, InputSnapshot::default(), 10);
        let moved_platform = s.grounds[s.groups[0].members[0]].area.left - p0;
        let moved_character = s.character.body.area.left - x0;
        assert!(moved_platform != 0.0);
        assert_eq!(moved_character, moved_platform);
    }

    #[test]
    fn camera_follows_when_attached() {
        let mut s = scene(
            "                                        \n P                                    G \nXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX",
            LevelFormat::classic(),
        );
        let mut camera = Camera::new();
        camera.set_view(400.0, 150.0);
        s.focus(&mut camera);
        let start = camera.x;
        let right = InputSnapshot { right: true, ..Default::default() };
        for _ in 0..60 {
            s.tick(&right, &mut camera);
        }
        assert!(camera.x > start);
    }
}
