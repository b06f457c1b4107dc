/// Game: the stage manager wired to levels, menus, saves and settings.
///
/// ## Per tick
///
///   1. Debounce clock advances
///   2. Debug digit shortcut (if enabled) requests a stage
///   3. Active scene runs:
///        level → Escape opens level settings, otherwise the level ticks
///                and its win/lose outcome becomes a pending transition
///        menu  → widget action is applied (new game, save, volume, ...)
///   4. A pending outcome transition is retried until the debounce lets it
///      through; a debounced input request is dropped
///
/// Winning advances to the next level (or back to the main menu after the
/// last one); losing opens the game-over menu.

use rand::rngs::StdRng;

use crate::config::GameConfig;
use crate::domain::body::PhysicsTuning;
use crate::domain::entity::{InputSnapshot, Shortcut};
use crate::domain::geometry::Rect;
use crate::domain::level::LevelGrid;
use crate::error::BuildError;
use super::camera::Camera;
use super::event::{EventQueue, GameEvent};
use super::levels::LevelLibrary;
use super::menu::{MenuAction, MenuScene};
use super::placement::{place, PlacementParams};
use super::save::{SaveData, SaveStore};
use super::scene::{LevelScene, Scene};
use super::stage::{StageBuilder, StageId, StageManager, Transition};

// ══════════════════════════════════════════════════════════════
// Stage builder
// ══════════════════════════════════════════════════════════════

/// Everything needed to build a stage, plus the settings menus edit.
pub struct GameStages {
    library: LevelLibrary,
    store: SaveStore,
    tuning: PhysicsTuning,
    params: PlacementParams,
    rng: StdRng,
    /// Level the next `Playing` build loads.
    level: usize,
    /// Saved character area applied to the next `Playing` build.
    resume_area: Option<Rect>,
    fullscreen: bool,
    volume: f64,
    /// World view size in terminal cells.
    viewport: (usize, usize),
}

impl GameStages {
    pub fn new(config: &GameConfig, library: LevelLibrary, store: SaveStore, rng: StdRng) -> Self {
        let scale = config.window.effective_scale();
        GameStages {
            library,
            store,
            tuning: config.tuning(),
            params: PlacementParams {
                scale,
                platform_speed: config.physics.platform_speed,
                platform_range: config.physics.platform_range,
                fall_margin: config.physics.fall_margin,
            },
            rng,
            level: 0,
            resume_area: None,
            fullscreen: config.window.fullscreen,
            volume: config.volume,
            viewport: config.window.cells(),
        }
    }

    fn build_level(&mut self, camera: &mut Camera) -> Result<Scene, BuildError> {
        let def = self.library.get(self.level).ok_or(BuildError::NoSuchLevel(self.level))?;
        let grid = LevelGrid::parse(&def.text, &def.format)?;
        let mut placed = place(&grid, &def.format, &self.params, &mut self.rng)?;
        if let Some(area) = self.resume_area.take() {
            placed.resume_at(&area);
        }

        let tile = def.format.tile_size * self.params.scale;
        let scene = LevelScene::new(self.level, def.name.clone(), tile, placed, self.tuning.clone());
        log::info!(
            "level {} ({}) built: {}x{}, {} enemies",
            self.level,
            scene.name,
            grid.width(),
            grid.height(),
            scene.npcs.len()
        );

        self.fit_camera(camera, tile);
        scene.focus(camera);
        Ok(Scene::Level(Box::new(scene)))
    }

    fn fit_camera(&self, camera: &mut Camera, tile: f64) {
        let (cols, rows) = self.viewport;
        camera.set_view_cells(cols, rows, tile);
    }

    /// Next stage after winning the current level.
    fn advance(&mut self) -> StageId {
        self.resume_area = None;
        if self.level + 1 < self.library.len() {
            self.level += 1;
            StageId::Playing
        } else {
            log::info!("last level won");
            self.level = 0;
            StageId::MainMenu
        }
    }
}

impl StageBuilder for GameStages {
    type Scene = Scene;

    fn build(&mut self, id: StageId, camera: &mut Camera) -> Result<Scene, BuildError> {
        let menu = match id {
            StageId::Playing => return self.build_level(camera),
            StageId::MainMenu | StageId::Quit => MenuScene::main(self.store.has_save()),
            StageId::Settings => MenuScene::settings(self.fullscreen, self.volume),
            StageId::LevelSettings => MenuScene::level_settings(self.fullscreen, self.volume),
            StageId::GameOver => MenuScene::game_over(),
        };
        Ok(Scene::Menu(menu))
    }

    fn resume(&mut self, _id: StageId, scene: &mut Scene, camera: &mut Camera) {
        match scene {
            Scene::Level(level) => {
                self.fit_camera(camera, level.tile);
                level.focus(camera);
            }
            Scene::Menu(menu) => menu.sync(self.fullscreen, self.volume),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Game
// ══════════════════════════════════════════════════════════════

pub struct Game {
    stages: StageManager<GameStages, EventQueue>,
    /// Outcome-driven transition waiting for the debounce.
    pending: Option<StageId>,
    debug_keys: bool,
    quit: bool,
}

impl Game {
    pub fn new(config: &GameConfig, library: LevelLibrary, store: SaveStore, rng: StdRng) -> Result<Self, BuildError> {
        let builder = GameStages::new(config, library, store, rng);
        let stages = StageManager::new(
            builder,
            EventQueue::default(),
            Camera::new(),
            config.stage.initial,
            config.stage.debounce_ticks,
        )?;
        Ok(Game { stages, pending: None, debug_keys: config.stage.debug_keys, quit: false })
    }

    pub fn tick(&mut self, input: &InputSnapshot) -> Vec<GameEvent> {
        self.stages.tick();
        let mut events = Vec::new();
        let mut request = None;

        if self.debug_keys {
            if let Some(Shortcut::Digit(d)) = input.shortcut {
                request = StageId::from_digit(d);
            }
        }

        let current = self.stages.current();
        let mut action = None;
        let (builder, scene, camera) = self.stages.parts_mut();
        match scene {
            Scene::Level(_) if input.back => {
                request = request.or(Some(StageId::LevelSettings));
            }
            Scene::Level(level) => {
                builder.fit_camera(camera, level.tile);
                for event in level.tick(input, camera) {
                    match event {
                        GameEvent::Won { .. } => self.pending = Some(builder.advance()),
                        GameEvent::Lost { .. } => self.pending = Some(StageId::GameOver),
                        _ => {}
                    }
                    events.push(event);
                }
            }
            Scene::Menu(menu) => action = menu.update(input),
        }

        if let Some(action) = action {
            if !matches!(action, MenuAction::SetVolume(_)) {
                events.push(GameEvent::ButtonClicked);
            }
            request = request.or(self.apply(action, current, &mut events));
        }

        if let Some(target) = self.pending {
            self.request(target, true, &mut events);
        } else if let Some(target) = request {
            self.request(target, false, &mut events);
        }

        events.extend(self.stages.notifier_mut().drain());
        events
    }

    fn request(&mut self, target: StageId, pending: bool, events: &mut Vec<GameEvent>) {
        match self.stages.change_stage(target) {
            Ok(Transition::Debounced) => {
                if !pending {
                    log::debug!("dropped debounced request for {target}");
                }
            }
            Ok(Transition::Quit) => {
                self.pending = None;
                self.quit = true;
            }
            Ok(_) => self.pending = None,
            Err(e) => {
                log::error!("cannot enter {target}: {e}");
                self.pending = None;
                self.report(format!("Cannot start: {e}"), events);
            }
        }
    }

    fn apply(&mut self, action: MenuAction, current: StageId, events: &mut Vec<GameEvent>) -> Option<StageId> {
        let builder = self.stages.builder_mut();
        match action {
            MenuAction::NewGame => {
                builder.level = 0;
                builder.resume_area = None;
                Some(StageId::Playing)
            }
            MenuAction::Continue => match builder.store.load() {
                Ok(data) => {
                    builder.level = data.level;
                    builder.resume_area = Some(data.area);
                    Some(StageId::Playing)
                }
                Err(e) => {
                    log::warn!("continue failed: {e}");
                    self.report(format!("No saved game: {e}"), events);
                    None
                }
            },
            MenuAction::OpenSettings => Some(StageId::Settings),
            MenuAction::Exit => Some(StageId::Quit),
            MenuAction::BackToStart => Some(StageId::MainMenu),
            MenuAction::Resume => Some(StageId::Playing),
            MenuAction::Save => {
                self.save(events);
                None
            }
            MenuAction::ToggleFullscreen => {
                builder.fullscreen = !builder.fullscreen;
                log::info!("fullscreen {}", if builder.fullscreen { "on" } else { "off" });
                None
            }
            MenuAction::SetVolume(v) => {
                builder.volume = v.clamp(0.0, 1.0);
                None
            }
            MenuAction::Back => match current {
                StageId::Settings | StageId::GameOver => Some(StageId::MainMenu),
                StageId::LevelSettings => Some(StageId::Playing),
                _ => None,
            },
        }
    }

    /// Save the live level: the suspended one under level settings, or the
    /// active one.
    fn save(&mut self, events: &mut Vec<GameEvent>) {
        let level = self
            .stages
            .suspended(StageId::Playing)
            .or(Some(self.stages.scene()))
            .and_then(Scene::as_level);
        let Some(level) = level else {
            self.report("Nothing to save".to_string(), events);
            return;
        };
        let data = SaveData { area: level.character.body.area, level: level.level };
        match self.stages.builder().store.save(&data) {
            Ok(()) => {
                events.push(GameEvent::Saved);
                self.report("Saved".to_string(), events);
            }
            Err(e) => {
                log::error!("save failed: {e}");
                self.report(format!("Save failed: {e}"), events);
            }
        }
    }

    /// Show `msg` on the active menu and pass it on as an event.
    fn report(&mut self, msg: String, events: &mut Vec<GameEvent>) {
        if let Scene::Menu(menu) = self.stages.scene_mut() {
            menu.status = Some(msg.clone());
        }
        events.push(GameEvent::Message(msg));
    }

    // ── Accessors ──

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn current(&self) -> StageId {
        self.stages.current()
    }

    pub fn scene(&self) -> &Scene {
        self.stages.scene()
    }

    pub fn camera(&self) -> &Camera {
        self.stages.camera()
    }

    pub fn fullscreen(&self) -> bool {
        self.stages.builder().fullscreen
    }

    pub fn volume(&self) -> f64 {
        self.stages.builder().volume
    }

    pub fn level_count(&self) -> usize {
        self.stages.builder().library.len()
    }

    /// Terminal cells available for the world view.
    pub fn set_viewport(&mut self, cols: usize, rows: usize) {
        self.stages.builder_mut().viewport = (cols, rows);
    }
}
