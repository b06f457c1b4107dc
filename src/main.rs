/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::KeyCode;
use rand::rngs::StdRng;
use rand::SeedableRng;

use config::GameConfig;
use domain::entity::{InputSnapshot, Shortcut};
use sim::game::Game;
use sim::levels::LevelLibrary;
use sim::save::SaveStore;
use sim::stage::StageId;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "aloneworld.log";

const LEFT_KEYS: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT_KEYS: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const UP_KEYS: [KeyCode; 3] = [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const DOWN_KEYS: [KeyCode; 3] = [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const JUMP_KEYS: [KeyCode; 4] = [KeyCode::Up, KeyCode::Char(' '), KeyCode::Char('w'), KeyCode::Char('W')];

/// Alone in the World: a side-scrolling platformer for the terminal.
#[derive(Parser, Debug)]
#[command(name = "aloneworld", version, about, long_about = None)]
struct Args {
    /// Window width in pixels (10 px per terminal column)
    #[arg(long)]
    width: Option<u32>,

    /// Window height in pixels (20 px per terminal row)
    #[arg(long)]
    height: Option<u32>,

    /// World scale (defaults to automatic)
    #[arg(long)]
    scale: Option<f64>,

    /// Use the whole terminal for the world view
    #[arg(long)]
    fullscreen: bool,

    /// Stage to start on: main_menu, settings, playing, level_settings, game_over
    #[arg(long, value_parser = parse_stage)]
    stage: Option<StageId>,

    /// Directory with `.txt` level files
    #[arg(long)]
    levels: Option<PathBuf>,

    /// Explicit config.toml path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable digit keys 0-5 for jumping between stages
    #[arg(long)]
    debug_keys: bool,
}

impl Args {
    /// Command-line flags win over config.toml.
    fn apply(&self, config: &mut GameConfig) {
        if let Some(w) = self.width {
            config.window.width = w;
        }
        if let Some(h) = self.height {
            config.window.height = h;
        }
        if self.scale.is_some() {
            config.window.scale = self.scale;
        }
        if self.fullscreen {
            config.window.fullscreen = true;
        }
        if let Some(stage) = self.stage {
            config.stage.initial = stage;
        }
        if let Some(dir) = &self.levels {
            config.levels_dir = dir.clone();
        }
        if self.debug_keys {
            config.stage.debug_keys = true;
        }
    }
}

fn parse_stage(s: &str) -> Result<StageId, String> {
    match StageId::from_name(s) {
        Some(StageId::Quit) => Err("cannot start on the quit stage".to_string()),
        Some(id) => Ok(id),
        None => Err(format!("unknown stage {s:?}")),
    }
}

fn main() {
    let args = Args::parse();
    let mut config = GameConfig::load(args.config.as_deref());
    args.apply(&mut config);

    init_logging(&config.save_dir);
    log::info!("aloneworld starting, config: {:?}", config.window);

    let library = LevelLibrary::load(&config.levels_dir);
    let store = SaveStore::new(config.save_dir.clone());
    let mut game = match Game::new(&config, library, store, StdRng::from_entropy()) {
        Ok(g) => g,
        Err(e) => {
            log::error!("cannot build initial stage: {e}");
            eprintln!("Cannot start: {e}");
            return;
        }
    };

    let mut renderer = Renderer::new();

    let honor_release = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return;
        }
    };

    let mut sound = SoundEngine::new(config.volume);

    let result = game_loop(&mut game, &mut renderer, sound.as_mut(), &config, honor_release);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    log::info!("aloneworld exiting");
    println!();
    println!("Thanks for playing Alone in the World!");
}

/// The terminal is in raw alternate-screen mode while playing, so log
/// lines go to a file in the save directory instead of stderr.
fn init_logging(save_dir: &Path) {
    let path = save_dir.join(LOG_FILE);
    let file = std::fs::create_dir_all(save_dir).and_then(|_| File::create(&path));
    match file {
        Ok(file) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        Err(e) => eprintln!("Logging disabled, cannot open {}: {e}", path.display()),
    }
}

fn game_loop(
    game: &mut Game,
    renderer: &mut Renderer,
    mut sound: Option<&mut SoundEngine>,
    config: &GameConfig,
    honor_release: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.tick_rate_ms);

    // Edge-triggered input seen between ticks, so a short tap isn't lost.
    let mut pending = InputSnapshot::default();
    let mut volume = game.volume();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            log::info!("interrupted");
            break;
        }

        latch(&mut pending, sample_input(&kb, &gp, renderer));

        if last_tick.elapsed() >= tick_rate {
            let input = std::mem::take(&mut pending);
            let events = game.tick(&input);

            if let Some(sfx) = sound.as_deref_mut() {
                if game.volume() != volume {
                    volume = game.volume();
                    sfx.set_volume(volume);
                }
                sfx.play_events(&events);
            }

            if game.should_quit() {
                break;
            }
            last_tick = Instant::now();
        }

        let (cols, rows) = renderer.viewport(config.window.cells(), game.fullscreen());
        game.set_viewport(cols, rows);
        renderer.render(game)?;

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Keyboard, mouse and gamepad state for this frame.
fn sample_input(kb: &InputState, gp: &GamepadState, renderer: &Renderer) -> InputSnapshot {
    let mut input = InputSnapshot {
        left: kb.any_held(&LEFT_KEYS),
        right: kb.any_held(&RIGHT_KEYS),
        jump_held: kb.any_held(&JUMP_KEYS),
        jump_pressed: kb.any_pressed(&JUMP_KEYS),
        up_pressed: kb.any_pressed(&UP_KEYS),
        down_pressed: kb.any_pressed(&DOWN_KEYS),
        left_pressed: kb.any_pressed(&LEFT_KEYS),
        right_pressed: kb.any_pressed(&RIGHT_KEYS),
        confirm: kb.was_pressed(KeyCode::Enter),
        back: kb.was_pressed(KeyCode::Esc),
        pointer: kb.pointer().and_then(|(col, row)| renderer.canvas_point(col, row)),
        primary_pressed: kb.primary_pressed(),
        primary_held: kb.primary_held(),
        shortcut: kb.pressed_digit().map(Shortcut::Digit),
    };
    gp.merge_into(&mut input);
    input
}

/// Fold one frame into the input waiting for the next tick: held state
/// and the pointer follow the latest frame, presses stick until consumed.
fn latch(pending: &mut InputSnapshot, frame: InputSnapshot) {
    pending.left = frame.left;
    pending.right = frame.right;
    pending.jump_held = frame.jump_held;
    pending.primary_held = frame.primary_held;
    pending.pointer = frame.pointer.or(pending.pointer);

    pending.jump_pressed |= frame.jump_pressed;
    pending.up_pressed |= frame.up_pressed;
    pending.down_pressed |= frame.down_pressed;
    pending.left_pressed |= frame.left_pressed;
    pending.right_pressed |= frame.right_pressed;
    pending.confirm |= frame.confirm;
    pending.back |= frame.back;
    pending.primary_pressed |= frame.primary_pressed;
    pending.shortcut = pending.shortcut.or(frame.shortcut);
}
