/// Stage manager: named stages, a navigation stack and debounced transitions.
///
/// ## Stages and depth
///
///   MainMenu                      depth 0
///   Settings / Playing / GameOver depth 1
///   LevelSettings                 depth 2
///   Quit                          terminal, never built
///
/// ## change_stage(target)
///
///   1. refused until `debounce_ticks` ticks have passed since the last
///      accepted transition
///   2. `Quit`            → `Transition::Quit`
///   3. target == current → rebuild current
///   4. target suspended  → pop down to it, restore it untouched
///   5. target deeper     → suspend current, build target
///   6. otherwise         → drop current, build target
///
/// The target is built before anything is dropped or pushed, so a failed
/// build leaves the manager exactly as it was.

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use super::camera::Camera;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    MainMenu,
    Settings,
    Playing,
    LevelSettings,
    GameOver,
    Quit,
}

impl StageId {
    pub fn depth(self) -> u8 {
        match self {
            StageId::MainMenu | StageId::Quit => 0,
            StageId::Settings | StageId::Playing | StageId::GameOver => 1,
            StageId::LevelSettings => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StageId::MainMenu => "main_menu",
            StageId::Settings => "settings",
            StageId::Playing => "playing",
            StageId::LevelSettings => "level_settings",
            StageId::GameOver => "game_over",
            StageId::Quit => "quit",
        }
    }

    /// Parse a stage name from config or the command line.
    /// Dashes, spaces and case are ignored.
    pub fn from_name(name: &str) -> Option<StageId> {
        let norm: String = name
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match norm.as_str() {
            "mainmenu" | "menu" | "start" => Some(StageId::MainMenu),
            "settings" => Some(StageId::Settings),
            "playing" | "play" | "level" => Some(StageId::Playing),
            "levelsettings" => Some(StageId::LevelSettings),
            "gameover" => Some(StageId::GameOver),
            "quit" | "exit" => Some(StageId::Quit),
            _ => None,
        }
    }

    /// Debug digit keys: `1`–`5` open stages, `0` quits.
    pub fn from_digit(d: u8) -> Option<StageId> {
        match d {
            0 => Some(StageId::Quit),
            1 => Some(StageId::MainMenu),
            2 => Some(StageId::Settings),
            3 => Some(StageId::Playing),
            4 => Some(StageId::LevelSettings),
            5 => Some(StageId::GameOver),
            _ => None,
        }
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds scenes for stages. Implemented by the game; tests use counters.
pub trait StageBuilder {
    type Scene;

    /// Build a fresh scene. May re-attach the camera.
    fn build(&mut self, id: StageId, camera: &mut Camera) -> Result<Self::Scene, BuildError>;

    /// A suspended scene became active again.
    fn resume(&mut self, id: StageId, scene: &mut Self::Scene, camera: &mut Camera);
}

/// Told about every accepted transition.
pub trait TransitionNotifier {
    fn notify(&mut self, from: StageId, to: StageId);
}

/// What `change_stage` did.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Transition {
    /// Too soon after the previous transition; nothing changed.
    Debounced,
    Quit,
    Rebuilt,
    Restored,
    Pushed,
    Replaced,
}

pub struct StageManager<B: StageBuilder, N: TransitionNotifier> {
    builder: B,
    notifier: N,
    camera: Camera,
    current: StageId,
    scene: B::Scene,
    stack: Vec<(StageId, B::Scene)>,
    debounce_ticks: u32,
    since_change: u32,
}

impl<B: StageBuilder, N: TransitionNotifier> StageManager<B, N> {
    /// Build the initial stage. The first transition is never debounced.
    pub fn new(
        mut builder: B,
        notifier: N,
        mut camera: Camera,
        initial: StageId,
        debounce_ticks: u32,
    ) -> Result<Self, BuildError> {
        let scene = builder.build(initial, &mut camera)?;
        log::info!("initial stage: {initial}");
        Ok(StageManager {
            builder,
            notifier,
            camera,
            current: initial,
            scene,
            stack: Vec::new(),
            debounce_ticks,
            since_change: debounce_ticks,
        })
    }

    /// Advance the debounce clock by one tick.
    pub fn tick(&mut self) {
        self.since_change = self.since_change.saturating_add(1);
    }

    pub fn is_debounced(&self) -> bool {
        self.since_change < self.debounce_ticks
    }

    pub fn change_stage(&mut self, target: StageId) -> Result<Transition, BuildError> {
        if self.is_debounced() {
            log::debug!("transition {} -> {target} debounced", self.current);
            return Ok(Transition::Debounced);
        }

        let from = self.current;
        if target == StageId::Quit {
            self.accept(from, target);
            return Ok(Transition::Quit);
        }

        let suspended = self.stack.iter().rposition(|(id, _)| *id == target);
        if let (Some(pos), true) = (suspended, target != from) {
            self.stack.truncate(pos + 1);
            let (id, mut scene) = self.stack.remove(pos);
            self.camera.detach();
            self.builder.resume(id, &mut scene, &mut self.camera);
            self.scene = scene;
            self.current = id;
            self.accept(from, target);
            return Ok(Transition::Restored);
        }

        let mut camera = self.camera.clone();
        camera.detach();
        let scene = self.builder.build(target, &mut camera)?;
        self.camera = camera;

        let transition = if target == from {
            self.scene = scene;
            Transition::Rebuilt
        } else if target.depth() > from.depth() {
            let previous = std::mem::replace(&mut self.scene, scene);
            self.stack.push((from, previous));
            Transition::Pushed
        } else {
            self.scene = scene;
            Transition::Replaced
        };
        self.current = target;
        self.accept(from, target);
        Ok(transition)
    }

    fn accept(&mut self, from: StageId, to: StageId) {
        self.since_change = 0;
        log::info!("stage {from} -> {to}");
        self.notifier.notify(from, to);
    }

    // ── Accessors ──

    pub fn current(&self) -> StageId {
        self.current
    }

    pub fn scene(&self) -> &B::Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut B::Scene {
        &mut self.scene
    }

    /// Builder, active scene and camera, borrowed together for a tick.
    pub fn parts_mut(&mut self) -> (&mut B, &mut B::Scene, &mut Camera) {
        (&mut self.builder, &mut self.scene, &mut self.camera)
    }

    /// The most recently suspended scene for `id`, if any.
    pub fn suspended(&self, id: StageId) -> Option<&B::Scene> {
        self.stack.iter().rev().find(|(s, _)| *s == id).map(|(_, scene)| scene)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut B {
        &mut self.builder
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// Suspended stages, bottom first.
    pub fn stack(&self) -> impl Iterator<Item = StageId> + '_ {
        self.stack.iter().map(|(id, _)| *id)
    }
}
