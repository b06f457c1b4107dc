/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the current
/// directory, or `~/.local/share/aloneworld`. Missing files or keys fall
/// back to defaults; command-line flags are applied on top by `main`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::body::PhysicsTuning;
use crate::sim::stage::StageId;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub physics: PhysicsConfig,
    pub stage: StageConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub save_dir: PathBuf,
    pub tick_rate_ms: u64,
    pub volume: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WindowConfig {
    /// Window size in pixels; one terminal column is 10 px, one row 20 px.
    pub width: u32,
    pub height: u32,
    /// World scale; `None` picks the automatic scale.
    pub scale: Option<f64>,
    pub fullscreen: bool,
}

impl WindowConfig {
    pub const COLUMN_PX: u32 = 10;
    pub const ROW_PX: u32 = 20;

    pub fn effective_scale(&self) -> f64 {
        match self.scale {
            Some(s) if s > 0.0 => s,
            _ => 1.0,
        }
    }

    /// Viewport in terminal cells when not fullscreen.
    pub fn cells(&self) -> (usize, usize) {
        (
            (self.width / Self::COLUMN_PX).max(1) as usize,
            (self.height / Self::ROW_PX).max(1) as usize,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub run_speed: f64,
    pub jump_accel: f64,
    pub gravity: f64,
    pub terminal_velocity: f64,
    pub jump_ticks: u32,
    pub snap_threshold: f64,
    pub ceiling_kick: f64,
    pub ceiling_margin: f64,
    /// Platform drift per tick, unscaled.
    pub platform_speed: f64,
    /// Platform travel either side of its spawn, in tiles.
    pub platform_range: f64,
    /// Rows below the level bottom before a fall counts as lost.
    pub fall_margin: f64,
}

impl PhysicsConfig {
    pub fn tuning(&self, scale: f64) -> PhysicsTuning {
        PhysicsTuning {
            scale,
            run_speed: self.run_speed,
            jump_accel: self.jump_accel,
            gravity: self.gravity,
            terminal_velocity: self.terminal_velocity,
            jump_ticks: self.jump_ticks,
            snap_threshold: self.snap_threshold,
            ceiling_kick: self.ceiling_kick,
            ceiling_margin: self.ceiling_margin,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StageConfig {
    pub debounce_ticks: u32,
    pub initial: StageId,
    /// Digit keys jump straight to stages.
    pub debug_keys: bool,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub confirm: Vec<String>,
    pub back: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    window: TomlWindow,
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    stage: TomlStage,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlWindow {
    #[serde(default = "default_width")]
    width: u32,
    #[serde(default = "default_height")]
    height: u32,
    #[serde(default)]
    scale: f64,
    #[serde(default)]
    fullscreen: bool,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_run_speed")]
    run_speed: f64,
    #[serde(default = "default_jump_accel")]
    jump_accel: f64,
    #[serde(default = "default_gravity")]
    gravity: f64,
    #[serde(default = "default_terminal_velocity")]
    terminal_velocity: f64,
    #[serde(default = "default_jump_ticks")]
    jump_ticks: u32,
    #[serde(default = "default_snap_threshold")]
    snap_threshold: f64,
    #[serde(default = "default_ceiling_kick")]
    ceiling_kick: f64,
    #[serde(default = "default_ceiling_margin")]
    ceiling_margin: f64,
    #[serde(default = "default_platform_speed")]
    platform_speed: f64,
    #[serde(default = "default_platform_range")]
    platform_range: f64,
    #[serde(default = "default_fall_margin")]
    fall_margin: f64,
}

#[derive(Deserialize, Debug)]
struct TomlStage {
    #[serde(default = "default_debounce")]
    debounce_ticks: u32,
    #[serde(default = "default_initial_stage")]
    initial: String,
    #[serde(default)]
    debug_keys: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_pad_back")]
    back: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default)]
    save_dir: Option<String>,
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_volume")]
    volume: f64,
}

// ── Defaults ──

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

fn default_run_speed() -> f64 { 8.0 }
fn default_jump_accel() -> f64 { 2.0 }
fn default_gravity() -> f64 { 1.0 }
fn default_terminal_velocity() -> f64 { 20.0 }
fn default_jump_ticks() -> u32 { 5 }
fn default_snap_threshold() -> f64 { 20.0 }
fn default_ceiling_kick() -> f64 { 3.0 }
fn default_ceiling_margin() -> f64 { 10.0 }
fn default_platform_speed() -> f64 { 2.0 }
fn default_platform_range() -> f64 { 2.0 }
fn default_fall_margin() -> f64 { 2.0 }

fn default_debounce() -> u32 { 15 }
fn default_initial_stage() -> String { "main_menu".into() }

fn default_pad_jump() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_pad_back() -> Vec<String> { vec!["B".into(), "Select".into()] }

fn default_levels_dir() -> String { "levels".into() }
fn default_tick_rate() -> u64 { 16 }  // ~60 ticks per second
fn default_volume() -> f64 { 0.7 }

impl Default for TomlWindow {
    fn default() -> Self {
        TomlWindow {
            width: default_width(),
            height: default_height(),
            scale: 0.0,
            fullscreen: false,
        }
    }
}

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            run_speed: default_run_speed(),
            jump_accel: default_jump_accel(),
            gravity: default_gravity(),
            terminal_velocity: default_terminal_velocity(),
            jump_ticks: default_jump_ticks(),
            snap_threshold: default_snap_threshold(),
            ceiling_kick: default_ceiling_kick(),
            ceiling_margin: default_ceiling_margin(),
            platform_speed: default_platform_speed(),
            platform_range: default_platform_range(),
            fall_margin: default_fall_margin(),
        }
    }
}

impl Default for TomlStage {
    fn default() -> Self {
        TomlStage {
            debounce_ticks: default_debounce(),
            initial: default_initial_stage(),
            debug_keys: false,
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            confirm: default_pad_confirm(),
            back: default_pad_back(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            save_dir: None,
            tick_rate_ms: default_tick_rate(),
            volume: default_volume(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[PathBuf::from(".")])
    }
}

impl GameConfig {
    /// Load config from `config.toml` in the candidate directories, or from
    /// `explicit` when given.
    pub fn load(explicit: Option<&Path>) -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = match explicit {
            Some(path) => read_toml(path).unwrap_or_default(),
            None => load_toml(&search_dirs),
        };
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly (no file search).
    #[cfg(test)]
    pub fn parse_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg, &[PathBuf::from(".")]))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir_str = &cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let save_dir = cfg.general.save_dir
            .map(PathBuf::from)
            .unwrap_or_else(default_save_dir);

        let initial = StageId::from_name(&cfg.stage.initial)
            .filter(|s| *s != StageId::Quit)
            .unwrap_or_else(|| {
                log::warn!("unknown initial stage {:?}, using main menu", cfg.stage.initial);
                StageId::MainMenu
            });

        GameConfig {
            window: WindowConfig {
                width: cfg.window.width,
                height: cfg.window.height,
                scale: if cfg.window.scale > 0.0 { Some(cfg.window.scale) } else { None },
                fullscreen: cfg.window.fullscreen,
            },
            physics: PhysicsConfig {
                run_speed: cfg.physics.run_speed,
                jump_accel: cfg.physics.jump_accel,
                gravity: cfg.physics.gravity,
                terminal_velocity: cfg.physics.terminal_velocity,
                jump_ticks: cfg.physics.jump_ticks,
                snap_threshold: cfg.physics.snap_threshold,
                ceiling_kick: cfg.physics.ceiling_kick,
                ceiling_margin: cfg.physics.ceiling_margin,
                platform_speed: cfg.physics.platform_speed,
                platform_range: cfg.physics.platform_range,
                fall_margin: cfg.physics.fall_margin,
            },
            stage: StageConfig {
                debounce_ticks: cfg.stage.debounce_ticks,
                initial,
                debug_keys: cfg.stage.debug_keys,
            },
            gamepad: GamepadConfig {
                jump: cfg.gamepad.jump,
                confirm: cfg.gamepad.confirm,
                back: cfg.gamepad.back,
            },
            levels_dir,
            save_dir,
            tick_rate_ms: cfg.general.tick_rate_ms.max(1),
            volume: cfg.general.volume.clamp(0.0, 1.0),
        }
    }

    pub fn tuning(&self) -> PhysicsTuning {
        self.physics.tuning(self.window.effective_scale())
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/aloneworld");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Writable directory for save files and the log.
fn default_save_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/aloneworld");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn read_toml(path: &Path) -> Option<TomlConfig> {
    match std::fs::read_to_string(path) {
        Ok(text) => match toml::from_str::<TomlConfig>(&text) {
            Ok(cfg) => {
                log::info!("loaded config from {}", path.display());
                Some(cfg)
            }
            Err(e) => {
                log::warn!("config parse error in {}: {e}; using defaults", path.display());
                Some(TomlConfig::default())
            }
        },
        Err(e) => {
            log::warn!("could not read {}: {e}", path.display());
            None
        }
    }
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    search_dirs
        .iter()
        .map(|dir| dir.join("config.toml"))
        .filter(|path| path.exists())
        .find_map(|path| read_toml(&path))
        .unwrap_or_default()
}
