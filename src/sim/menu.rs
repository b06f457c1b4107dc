/// Menu scenes: buttons, toggles and sliders laid out on an 800×600 canvas.
///
/// ## Input
///
///   Pointer  primary press inside a widget activates it (strict interior
///            test); pressing a slider starts a drag that follows the
///            pointer until the button is released
///   Keys     Up/Down move focus, Enter activates, Left/Right nudge a
///            focused slider, Escape reports `MenuAction::Back`
///
/// The main menu carries a blinking prompt driven by a frame counter.

use crate::domain::entity::InputSnapshot;
use crate::domain::geometry::Rect;

pub const CANVAS_W: f64 = 800.0;
pub const CANVAS_H: f64 = 600.0;

/// Blink period in ticks, and how many of them the prompt is shown.
const BLINK_PERIOD: u32 = 70;
const BLINK_ON: u32 = 40;

const SLIDER_STEP: f64 = 0.1;
const KNOB_HALF_WIDTH: f64 = 10.0;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum MenuAction {
    NewGame,
    Continue,
    OpenSettings,
    Exit,
    BackToStart,
    Resume,
    Save,
    ToggleFullscreen,
    SetVolume(f64),
    Back,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuKind {
    Main,
    Settings,
    LevelSettings,
    GameOver,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum WidgetKind {
    Button,
    Toggle { on: bool },
    /// Value in `0.0..=1.0`.
    Slider { value: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Widget {
    pub label: &'static str,
    pub area: Rect,
    pub kind: WidgetKind,
    action: MenuAction,
}

impl Widget {
    fn button(label: &'static str, area: Rect, action: MenuAction) -> Self {
        Widget { label, area, kind: WidgetKind::Button, action }
    }

    fn toggle(label: &'static str, area: Rect, on: bool) -> Self {
        Widget { label, area, kind: WidgetKind::Toggle { on }, action: MenuAction::ToggleFullscreen }
    }

    fn slider(label: &'static str, area: Rect, value: f64) -> Self {
        Widget {
            label,
            area,
            kind: WidgetKind::Slider { value: value.clamp(0.0, 1.0) },
            action: MenuAction::SetVolume(value),
        }
    }

    /// Strict interior test, edges excluded.
    pub fn hit(&self, x: f64, y: f64) -> bool {
        x > self.area.left && x < self.area.right && y > self.area.top && y < self.area.bottom
    }

    /// The draggable knob of a slider.
    pub fn knob(&self) -> Option<Rect> {
        match self.kind {
            WidgetKind::Slider { value } => {
                let cx = self.area.left + value * self.area.width();
                Some(Rect::new(cx - KNOB_HALF_WIDTH, self.area.top, cx + KNOB_HALF_WIDTH, self.area.bottom))
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MenuScene {
    pub kind: MenuKind,
    pub title: &'static str,
    pub widgets: Vec<Widget>,
    pub focus: usize,
    /// Feedback line (save errors, "Saved").
    pub status: Option<String>,
    blink: u32,
    dragging: Option<usize>,
}

// ══════════════════════════════════════════════════════════════
// Layouts
// ══════════════════════════════════════════════════════════════

/// Horizontal button row centred on the canvas.
fn row(top: f64, count: usize) -> impl Iterator<Item = Rect> {
    let (w, h, gap) = (150.0, 50.0, 20.0);
    let total = count as f64 * w + (count.saturating_sub(1)) as f64 * gap;
    let left = (CANVAS_W - total) / 2.0;
    (0..count).map(move |i| {
        let l = left + i as f64 * (w + gap);
        Rect::new(l, top, l + w, top + h)
    })
}

/// Vertical widget column centred on the canvas.
fn column(top: f64, count: usize) -> impl Iterator<Item = Rect> {
    let (w, h, pitch) = (200.0, 50.0, 70.0);
    let left = (CANVAS_W - w) / 2.0;
    (0..count).map(move |i| {
        let t = top + i as f64 * pitch;
        Rect::new(left, t, left + w, t + h)
    })
}

impl MenuScene {
    fn new(kind: MenuKind, title: &'static str, widgets: Vec<Widget>) -> Self {
        MenuScene { kind, title, widgets, focus: 0, status: None, blink: 0, dragging: None }
    }

    /// Focus starts on Continue when there is a save to continue from.
    pub fn main(has_save: bool) -> Self {
        let mut cells = row(250.0, 4);
        let mut next = || cells.next().unwrap_or_default();
        let widgets = vec![
            Widget::button("New Game", next(), MenuAction::NewGame),
            Widget::button("Continue", next(), MenuAction::Continue),
            Widget::button("Settings", next(), MenuAction::OpenSettings),
            Widget::button("Exit", next(), MenuAction::Exit),
        ];
        let mut menu = MenuScene::new(MenuKind::Main, "Alone in the World", widgets);
        if has_save {
            menu.focus = 1;
        }
        menu
    }

    pub fn settings(fullscreen: bool, volume: f64) -> Self {
        let mut cells = column(180.0, 4);
        let mut next = || cells.next().unwrap_or_default();
        let widgets = vec![
            Widget::button("Back", next(), MenuAction::Back),
            Widget::toggle("Fullscreen", next(), fullscreen),
            Widget::slider("Volume", next(), volume),
            Widget::button("Exit", next(), MenuAction::Exit),
        ];
        MenuScene::new(MenuKind::Settings, "Settings", widgets)
    }

    pub fn level_settings(fullscreen: bool, volume: f64) -> Self {
        let mut cells = column(110.0, 6);
        let mut next = || cells.next().unwrap_or_default();
        let widgets = vec![
            Widget::button("Resume", next(), MenuAction::Resume),
            Widget::button("Back to start", next(), MenuAction::BackToStart),
            Widget::button("Save", next(), MenuAction::Save),
            Widget::toggle("Fullscreen", next(), fullscreen),
            Widget::slider("Volume", next(), volume),
            Widget::button("Exit", next(), MenuAction::Exit),
        ];
        MenuScene::new(MenuKind::LevelSettings, "Paused", widgets)
    }

    pub fn game_over() -> Self {
        let mut cells = row(300.0, 2);
        let mut next = || cells.next().unwrap_or_default();
        let widgets = vec![
            Widget::button("Back to start", next(), MenuAction::BackToStart),
            Widget::button("Continue", next(), MenuAction::Continue),
        ];
        MenuScene::new(MenuKind::GameOver, "Game over!", widgets)
    }

    // ── State ──

    pub fn prompt_visible(&self) -> bool {
        self.kind == MenuKind::Main && self.blink % BLINK_PERIOD < BLINK_ON
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Bring toggles and sliders in line with settings changed elsewhere.
    pub fn sync(&mut self, fullscreen: bool, volume: f64) {
        for w in &mut self.widgets {
            match &mut w.kind {
                WidgetKind::Toggle { on } => *on = fullscreen,
                WidgetKind::Slider { value } => *value = volume.clamp(0.0, 1.0),
                WidgetKind::Button => {}
            }
        }
    }

    // ── Update ──

    pub fn update(&mut self, input: &InputSnapshot) -> Option<MenuAction> {
        self.blink = self.blink.wrapping_add(1);

        if let Some(action) = self.update_pointer(input) {
            return Some(action);
        }

        let n = self.widgets.len();
        if n == 0 {
            return input.back.then_some(MenuAction::Back);
        }
        if input.up_pressed {
            self.focus = (self.focus + n - 1) % n;
        }
        if input.down_pressed {
            self.focus = (self.focus + 1) % n;
        }
        if input.left_pressed || input.right_pressed {
            let delta = if input.right_pressed { SLIDER_STEP } else { -SLIDER_STEP };
            if let Some(v) = self.nudge(self.focus, delta) {
                return Some(MenuAction::SetVolume(v));
            }
        }
        if input.confirm {
            return self.activate(self.focus);
        }
        if input.back && self.kind != MenuKind::Main {
            return Some(MenuAction::Back);
        }
        None
    }

    fn update_pointer(&mut self, input: &InputSnapshot) -> Option<MenuAction> {
        if !input.primary_held {
            self.dragging = None;
        }
        let (x, y) = input.pointer?;

        if let Some(i) = self.dragging {
            return self.drag_to(i, x);
        }

        if !input.primary_pressed {
            return None;
        }
        let i = self.widgets.iter().position(|w| w.hit(x, y))?;
        self.focus = i;
        if matches!(self.widgets[i].kind, WidgetKind::Slider { .. }) {
            self.dragging = Some(i);
            return self.drag_to(i, x);
        }
        self.activate(i)
    }

    fn activate(&mut self, i: usize) -> Option<MenuAction> {
        let w = self.widgets.get_mut(i)?;
        match &mut w.kind {
            WidgetKind::Button => Some(w.action),
            WidgetKind::Toggle { on } => {
                *on = !*on;
                Some(w.action)
            }
            WidgetKind::Slider { .. } => None,
        }
    }

    fn drag_to(&mut self, i: usize, x: f64) -> Option<MenuAction> {
        let w = self.widgets.get_mut(i)?;
        let WidgetKind::Slider { value } = &mut w.kind else { return None };
        let next = ((x - w.area.left) / w.area.width()).clamp(0.0, 1.0);
        if (next - *value).abs() < f64::EPSILON {
            return None;
        }
        *value = next;
        Some(MenuAction::SetVolume(next))
    }

    fn nudge(&mut self, i: usize, delta: f64) -> Option<f64> {
        let w = self.widgets.get_mut(i)?;
        let WidgetKind::Slider { value } = &mut w.kind else { return None };
        *value = (*value + delta).clamp(0.0, 1.0);
        Some(*value)
    }
}
