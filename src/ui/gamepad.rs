/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Movement and menu focus
///   A / X                 →  Jump
///   A / Start             →  Confirm
///   B / Select            →  Back / pause

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::InputSnapshot;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    jump: Vec<Btn>,
    confirm: Vec<Btn>,
    back: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump:    vec![Btn::A, Btn::X],
            confirm: vec![Btn::A, Btn::Start],
            back:    vec![Btn::B, Btn::Select],
        }
    }
}

/// Directional state from the D-pad and the left stick combined.
#[derive(Clone, Copy, Debug, Default)]
struct Directions {
    up: BtnState,
    down: BtnState,
    left: BtnState,
    right: BtnState,
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; 8],

    dpad: Directions,
    stick: Directions,
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            connected,
            ..GamepadState::offline()
        }
    }

    /// A tracker with no backend; only fed by tests.
    fn offline() -> Self {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); 8],
            dpad: Directions::default(),
            stick: Directions::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected: false,
        }
    }

    /// Load button mapping from config. Empty or unknown lists keep the defaults.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let jump = parse_list(&cfg.jump);
        if !jump.is_empty() { map.jump = jump; }
        let confirm = parse_list(&cfg.confirm);
        if !confirm.is_empty() { map.confirm = confirm; }
        let back = parse_list(&cfg.back);
        if !back.is_empty() { map.back = back; }
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        self.derive_stick();
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        match gilrs_btn {
            Button::DPadUp    => self.dpad.up.set(held),
            Button::DPadDown  => self.dpad.down.set(held),
            Button::DPadLeft  => self.dpad.left.set(held),
            Button::DPadRight => self.dpad.right.set(held),
            other => {
                if let Some(btn) = Btn::from_gilrs(other) {
                    self.buttons[btn_index(btn)].set(held);
                }
            }
        }
    }

    /// Digital stick directions from the analog axes.
    fn derive_stick(&mut self) {
        self.stick.left.set(self.stick_x < -STICK_DEADZONE);
        self.stick.right.set(self.stick_x > STICK_DEADZONE);
        self.stick.up.set(self.stick_y > STICK_DEADZONE);
        self.stick.down.set(self.stick_y < -STICK_DEADZONE);
    }

    // ── Action queries (config-driven) ──

    fn any_held(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].held)
    }

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    /// OR this pad's state into a snapshot already filled from the keyboard.
    pub fn merge_into(&self, input: &mut InputSnapshot) {
        let (d, s) = (&self.dpad, &self.stick);
        input.left |= d.left.held || s.left.held;
        input.right |= d.right.held || s.right.held;
        input.left_pressed |= d.left.just_pressed || s.left.just_pressed;
        input.right_pressed |= d.right.just_pressed || s.right.just_pressed;
        input.up_pressed |= d.up.just_pressed || s.up.just_pressed;
        input.down_pressed |= d.down.just_pressed || s.down.just_pressed;
        input.jump_held |= self.any_held(&self.action_map.jump);
        input.jump_pressed |= self.any_just_pressed(&self.action_map.jump);
        input.confirm |= self.any_just_pressed(&self.action_map.confirm);
        input.back |= self.any_just_pressed(&self.action_map.back);
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }
        for dir in [&mut self.dpad, &mut self.stick] {
            dir.up.just_pressed = false;
            dir.down.just_pressed = false;
            dir.left.just_pressed = false;
            dir.right.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [BtnState::default(); 8];
        self.dpad = Directions::default();
        self.stick = Directions::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("rb"), Some(Btn::R1));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_only_known_lists() {
        let mut pad = GamepadState::offline();
        pad.load_button_config(&GamepadConfig {
            jump: names(&["Y"]),
            confirm: names(&["nonsense"]),
            back: vec![],
        });
        assert_eq!(pad.action_map.jump, vec![Btn::Y]);
        assert_eq!(pad.action_map.confirm, ActionMap::default().confirm);
        assert_eq!(pad.action_map.back, ActionMap::default().back);
    }

    #[test]
    fn pressed_button_merges_as_edge_and_hold() {
        let mut pad = GamepadState::offline();
        pad.buttons[btn_index(Btn::A)].set(true);
        let mut input = InputSnapshot::default();
        pad.merge_into(&mut input);
        assert!(input.jump_pressed && input.jump_held && input.confirm);
        assert!(!input.back);

        pad.clear_just_pressed();
        let mut input = InputSnapshot::default();
        pad.merge_into(&mut input);
        assert!(input.jump_held);
        assert!(!input.jump_pressed && !input.confirm);
    }

    #[test]
    fn stick_past_deadzone_steers() {
        let mut pad = GamepadState::offline();
        pad.stick_x = -0.8;
        pad.stick_y = 0.1;
        pad.derive_stick();
        let mut input = InputSnapshot::default();
        pad.merge_into(&mut input);
        assert!(input.left && input.left_pressed);
        assert!(!input.right && !input.up_pressed);
    }

    #[test]
    fn merge_keeps_keyboard_state() {
        let pad = GamepadState::offline();
        let mut input = InputSnapshot { right: true, back: true, ..Default::default() };
        pad.merge_into(&mut input);
        assert!(input.right && input.back);
    }
}
