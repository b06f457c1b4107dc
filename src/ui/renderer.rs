/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// ## Projection
///
/// Levels: one tile is `COLUMNS_PER_TILE` columns by one row; every
/// render item is stamped over the cells its area covers, textures are
/// resolved through an `AssetTable<TextureId, Glyph>`.
///
/// Menus: the 800×600 canvas maps onto an 80×30 cell block (10 px per
/// column, 20 px per row) centred in the terminal. `canvas_point` maps a
/// pointer cell back into canvas pixels.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::WindowConfig;
use crate::domain::geometry::Rect;
use crate::sim::assets::{AssetTable, TextureId};
use crate::sim::camera::{Camera, COLUMNS_PER_TILE};
use crate::sim::game::Game;
use crate::sim::menu::{MenuScene, Widget, WidgetKind, CANVAS_H, CANVAS_W};
use crate::sim::scene::{LevelScene, Scene};
use crate::sim::stage::StageId;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// inter-row gap colour matches on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    /// Row text for tests and debugging.
    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Glyphs: how a texture looks in the terminal ──

/// Two columns of text for one tile, drawn facing left.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Glyph {
    pub text: [char; COLUMNS_PER_TILE],
    pub fg: Color,
    pub bg: Option<Color>,
}

impl Glyph {
    const fn new(text: [char; COLUMNS_PER_TILE], fg: Color, bg: Option<Color>) -> Self {
        Glyph { text, fg, bg }
    }

    /// The same glyph facing right.
    pub fn mirrored(&self) -> Glyph {
        let [a, b] = self.text;
        Glyph { text: [mirror_char(b), mirror_char(a)], ..*self }
    }
}

fn mirror_char(c: char) -> char {
    match c {
        '<' => '>',
        '>' => '<',
        '(' => ')',
        ')' => '(',
        '/' => '\\',
        '\\' => '/',
        '◀' => '▶',
        '▶' => '◀',
        other => other,
    }
}

const SKY: Color = Color::Rgb { r: 24, g: 28, b: 52 };
const EARTH: Color = Color::Rgb { r: 92, g: 64, b: 40 };
const EARTH_DEEP: Color = Color::Rgb { r: 60, g: 42, b: 28 };
const GRASS: Color = Color::Rgb { r: 70, g: 150, b: 60 };

fn glyph_for(id: TextureId) -> Glyph {
    match id {
        TextureId::Character => Glyph::new(['<', '@'], Color::Rgb { r: 250, g: 220, b: 120 }, None),
        TextureId::CharacterStunned => Glyph::new(['x', '@'], Color::Rgb { r: 250, g: 120, b: 120 }, None),
        TextureId::Raccoon => Glyph::new(['<', 'r'], Color::Rgb { r: 170, g: 170, b: 190 }, None),
        TextureId::Dog => Glyph::new(['<', 'd'], Color::Rgb { r: 220, g: 150, b: 90 }, None),
        TextureId::Goal => Glyph::new(['[', ']'], Color::Rgb { r: 255, g: 215, b: 0 }, Some(Color::Rgb { r: 60, g: 50, b: 10 })),
        TextureId::Coin => Glyph::new(['(', ')'], Color::Rgb { r: 255, g: 200, b: 40 }, None),
        TextureId::GroundSurface => Glyph::new(['▀', '▀'], GRASS, Some(EARTH)),
        TextureId::GroundFill => Glyph::new([' ', ' '], Color::White, Some(EARTH)),
        TextureId::GroundDeep => Glyph::new(['░', '░'], EARTH, Some(EARTH_DEEP)),
        TextureId::Platform => Glyph::new(['▄', '▄'], Color::Rgb { r: 150, g: 150, b: 160 }, None),
        TextureId::Background => Glyph::new([' ', ' '], Color::White, Some(SKY)),
    }
}

// ── Renderer ──

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;
/// Rows reserved outside the map: HUD plus the help bar.
const RESERVED_ROWS: usize = 2;

const CANVAS_COLS: usize = (CANVAS_W as u32 / WindowConfig::COLUMN_PX) as usize;
const CANVAS_ROWS: usize = (CANVAS_H as u32 / WindowConfig::ROW_PX) as usize;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const BUTTON_BG: Color = Color::Rgb { r: 50, g: 60, b: 100 };
const FOCUS_BG: Color = Color::Rgb { r: 90, g: 110, b: 190 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    glyphs: AssetTable<TextureId, Glyph>,
    last_stage: Option<StageId>,
    enhanced: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            glyphs: AssetTable::load_all(&TextureId::ALL, glyph_for),
            last_stage: None,
            enhanced: false,
        }
    }

    /// Enter raw alternate-screen mode. Returns whether the terminal will
    /// report key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        self.enhanced = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if self.enhanced {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(self.enhanced)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    /// Terminal cells available for the world view: the configured size,
    /// or the whole terminal when fullscreen, clipped to what fits.
    pub fn viewport(&self, configured: (usize, usize), fullscreen: bool) -> (usize, usize) {
        let max_cols = self.term_w;
        let max_rows = self.term_h.saturating_sub(RESERVED_ROWS).max(1);
        if fullscreen {
            (max_cols, max_rows)
        } else {
            (configured.0.min(max_cols), configured.1.min(max_rows))
        }
    }

    /// Top-left cell of the menu canvas.
    fn canvas_origin(&self) -> (usize, usize) {
        (
            self.term_w.saturating_sub(CANVAS_COLS) / 2,
            self.term_h.saturating_sub(CANVAS_ROWS) / 2,
        )
    }

    /// Pointer cell → menu canvas pixels (cell centre), `None` off-canvas.
    pub fn canvas_point(&self, col: u16, row: u16) -> Option<(f64, f64)> {
        let (ox, oy) = self.canvas_origin();
        let cx = (col as usize).checked_sub(ox)?;
        let cy = (row as usize).checked_sub(oy)?;
        if cx >= CANVAS_COLS || cy >= CANVAS_ROWS {
            return None;
        }
        let px = WindowConfig::COLUMN_PX as f64;
        let py = WindowConfig::ROW_PX as f64;
        Some((cx as f64 * px + px / 2.0, cy as f64 * py + py / 2.0))
    }

    pub fn render(&mut self, game: &Game) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Stage change → clear for clean transition
        if self.last_stage != Some(game.current()) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_stage = Some(game.current());
        }

        self.compose(game);

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    fn compose(&mut self, game: &Game) {
        self.front.clear();
        match game.scene() {
            Scene::Level(level) => self.compose_level(level, game.camera(), game.level_count()),
            Scene::Menu(menu) => self.compose_menu(menu),
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the
        // terminal's own default and leave line artifacts.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ══════════════════════════════════════════════════════════════
    // Level
    // ══════════════════════════════════════════════════════════════

    fn compose_level(&mut self, level: &LevelScene, cam: &Camera, level_count: usize) {
        // ── HUD row ──
        self.front.fill_row(HUD_ROW, HUD_BG);
        let hud = format!(
            " {}  Level {}/{}  Coins: {}",
            level.name,
            level.level + 1,
            level_count,
            level.coins
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map (camera viewport) ──
        let cols = ((cam.view_w / level.tile) as usize * COLUMNS_PER_TILE).min(self.term_w);
        let rows = ((cam.view_h / level.tile) as usize).min(self.term_h.saturating_sub(RESERVED_ROWS));
        let ox = self.term_w.saturating_sub(cols) / 2;
        let map = MapView { ox, oy: MAP_ROW, cols, rows };

        let sky = *self.glyphs.get(TextureId::Background);
        for row in 0..rows {
            for col in (0..cols).step_by(COLUMNS_PER_TILE) {
                self.stamp(&map, col, row, &sky);
            }
        }

        for item in level.render_list() {
            let glyph = self.glyphs.get(item.texture);
            let glyph = if item.mirrored { glyph.mirrored() } else { *glyph };
            for (col, row) in map.cover(&item.area, cam, level.tile) {
                self.stamp(&map, col, row, &glyph);
            }
        }

        // ── Help bar ──
        let help_row = MAP_ROW + rows;
        if help_row < self.front.height {
            let help = " ←/→ A/D:Run  ↑/W/Space:Jump  Esc:Pause  │  Pad: D-pad  A:Jump  B:Pause";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Cell::BASE_BG);
        }
    }

    /// Draw one tile glyph at map cell (col, row); col is the left column.
    fn stamp(&mut self, map: &MapView, col: usize, row: usize, glyph: &Glyph) {
        for (i, &ch) in glyph.text.iter().enumerate() {
            let c = col + i;
            if c >= map.cols || row >= map.rows {
                continue;
            }
            let (x, y) = (map.ox + c, map.oy + row);
            let bg = glyph.bg.unwrap_or_else(|| self.front.get(x, y).bg);
            self.front.set(x, y, Cell::new(ch, glyph.fg, bg));
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Menus
    // ══════════════════════════════════════════════════════════════

    fn compose_menu(&mut self, menu: &MenuScene) {
        let (ox, oy) = self.canvas_origin();

        let title_row = oy + 3;
        self.put_centered(ox, title_row, menu.title, Color::Rgb { r: 255, g: 215, b: 0 }, Cell::BASE_BG);

        for (i, widget) in menu.widgets.iter().enumerate() {
            self.compose_widget(ox, oy, widget, i == menu.focus);
        }

        if menu.prompt_visible() {
            let prompt = "Press Enter or click a button";
            self.put_centered(ox, oy + 20, prompt, Color::Grey, Cell::BASE_BG);
        }

        if let Some(status) = &menu.status {
            self.put_centered(ox, oy + CANVAS_ROWS - 3, status, Color::Black, Color::Rgb { r: 200, g: 180, b: 50 });
        }

        let help = "Mouse / ↑↓ Enter  ←→ slider  Esc back";
        self.put_centered(ox, oy + CANVAS_ROWS - 1, help, Color::DarkGrey, Cell::BASE_BG);
    }

    fn compose_widget(&mut self, ox: usize, oy: usize, widget: &Widget, focused: bool) {
        let (left, top, right, bottom) = canvas_cells(&widget.area);
        let bg = if focused { FOCUS_BG } else { BUTTON_BG };
        for row in top..bottom {
            for col in left..right {
                self.front.set(ox + col, oy + row, Cell::new(' ', Color::White, bg));
            }
        }

        let mid = oy + (top + bottom) / 2;
        let width = right - left;
        match widget.kind {
            WidgetKind::Button => {
                self.put_in_box(ox + left, mid, width, widget.label, bg);
            }
            WidgetKind::Toggle { on } => {
                let text = format!("{}: {}", widget.label, if on { "on" } else { "off" });
                self.put_in_box(ox + left, mid, width, &text, bg);
            }
            WidgetKind::Slider { value } => {
                let text = format!("{} {:>3}%", widget.label, (value * 100.0).round() as u32);
                self.put_in_box(ox + left, oy + top, width, &text, bg);
                let track_row = oy + bottom.saturating_sub(1).max(top);
                for col in left..right {
                    self.front.set(ox + col, track_row, Cell::new('─', Color::Grey, bg));
                }
                if let Some(knob) = widget.knob() {
                    let (kl, _, kr, _) = canvas_cells(&knob);
                    for col in kl.max(left)..kr.min(right) {
                        self.front.set(ox + col, track_row, Cell::new('█', Color::White, bg));
                    }
                }
            }
        }
    }

    fn put_in_box(&mut self, left: usize, row: usize, width: usize, text: &str, bg: Color) {
        let len = text.chars().count();
        let x = left + width.saturating_sub(len) / 2;
        self.front.put_str(x, row, text, Color::White, bg);
    }

    fn put_centered(&mut self, ox: usize, row: usize, text: &str, fg: Color, bg: Color) {
        let len = text.chars().count();
        let x = ox + CANVAS_COLS.saturating_sub(len) / 2;
        self.front.put_str(x, row, text, fg, bg);
    }
}

/// Canvas pixel rect → (left, top, right, bottom) cell range, end exclusive.
fn canvas_cells(area: &Rect) -> (usize, usize, usize, usize) {
    let px = WindowConfig::COLUMN_PX as f64;
    let py = WindowConfig::ROW_PX as f64;
    (
        (area.left / px).floor().max(0.0) as usize,
        (area.top / py).floor().max(0.0) as usize,
        (area.right / px).ceil().max(0.0) as usize,
        (area.bottom / py).ceil().max(0.0) as usize,
    )
}

/// Where the world view sits in the terminal.
struct MapView {
    ox: usize,
    oy: usize,
    cols: usize,
    rows: usize,
}

impl MapView {
    /// Tile-aligned map cells (left column, row) covered by `area`.
    /// Partially covered tiles count; tiles outside the view are dropped.
    fn cover(&self, area: &Rect, cam: &Camera, tile: f64) -> Vec<(usize, usize)> {
        let first_x = ((area.left - cam.x) / tile).floor();
        let last_x = ((area.right - cam.x) / tile).ceil();
        let first_y = ((area.top - cam.y) / tile).floor();
        let last_y = ((area.bottom - cam.y) / tile).ceil();

        let mut cells = Vec::new();
        let mut ty = first_y;
        while ty < last_y {
            let mut tx = first_x;
            while tx < last_x {
                if tx >= 0.0 && ty >= 0.0 {
                    let col = tx as usize * COLUMNS_PER_TILE;
                    let row = ty as usize;
                    if col < self.cols && row < self.rows {
                        cells.push((col, row));
                    }
                }
                tx += 1.0;
            }
            ty += 1.0;
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::level::LevelFormat;
    use crate::sim::levels::{LevelDef, LevelLibrary};
    use crate::sim::save::SaveStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn renderer(w: usize, h: usize) -> Renderer {
        let mut r = Renderer::new();
        r.resize(w, h);
        r
    }

    fn game(initial: StageId) -> Game {
        let dir = std::env::temp_dir().join("aloneworld-renderer-tests");
        let mut config = GameConfig::default();
        config.stage.initial = initial;
        let lib = LevelLibrary::from_defs(vec![LevelDef {
            name: "Tiny".into(),
            format: LevelFormat::classic(),
            text: "XXXXXX\nX    X\nXP  GX\nXXXXXX".into(),
        }]);
        Game::new(&config, lib, SaveStore::new(dir), StdRng::seed_from_u64(3)).unwrap()
    }

    #[test]
    fn mirrored_glyph_faces_right() {
        let g = glyph_for(TextureId::Character).mirrored();
        assert_eq!(g.text, ['@', '>']);
        assert_eq!(glyph_for(TextureId::Coin).mirrored().text, ['(', ')']);
    }

    #[test]
    fn every_texture_has_a_glyph() {
        let r = Renderer::new();
        for id in TextureId::ALL {
            assert!(r.glyphs.contains(id), "{id:?}");
        }
    }

    #[test]
    fn canvas_point_maps_cells_to_pixel_centres() {
        let r = renderer(100, 40);
        // canvas origin is (10, 5)
        assert_eq!(r.canvas_point(10, 5), Some((5.0, 10.0)));
        assert_eq!(r.canvas_point(49, 17), Some((395.0, 250.0)));
        assert_eq!(r.canvas_point(9, 5), None);
        assert_eq!(r.canvas_point(90, 5), None);
    }

    #[test]
    fn viewport_clips_to_terminal() {
        let r = renderer(60, 20);
        assert_eq!(r.viewport((80, 30), false), (60, 18));
        assert_eq!(r.viewport((40, 10), false), (40, 10));
        assert_eq!(r.viewport((40, 10), true), (60, 18));
    }

    #[test]
    fn cover_spans_partial_tiles() {
        let map = MapView { ox: 0, oy: 0, cols: 20, rows: 10 };
        let cam = Camera::new();
        let cells = map.cover(&Rect::new(10.0, 0.0, 50.0, 20.0), &cam, 20.0);
        assert_eq!(cells, vec![(0, 0), (2, 0), (4, 0)]);
    }

    #[test]
    fn cover_drops_cells_outside_the_view() {
        let map = MapView { ox: 0, oy: 0, cols: 4, rows: 2 };
        let mut cam = Camera::new();
        cam.x = 20.0;
        let cells = map.cover(&Rect::new(0.0, 20.0, 100.0, 60.0), &cam, 20.0);
        assert_eq!(cells, vec![(0, 1), (2, 1)]);
    }

    #[test]
    fn main_menu_shows_title_and_buttons() {
        let mut r = renderer(80, 30);
        let g = game(StageId::MainMenu);
        r.compose(&g);
        assert!(r.front.row_text(3).contains("Alone in the World"));
        // buttons sit at y=250..300 → rows 12..15
        assert!(r.front.row_text(13).contains("New Game"));
        assert!(r.front.row_text(13).contains("Exit"));
    }

    #[test]
    fn level_draws_hud_and_character() {
        let mut r = renderer(80, 30);
        let g = game(StageId::Playing);
        r.compose(&g);
        assert!(r.front.row_text(HUD_ROW).contains("Tiny"));
        assert!(r.front.row_text(HUD_ROW).contains("Coins: 0"));
        let map: String = (MAP_ROW..30).map(|y| r.front.row_text(y)).collect();
        assert!(map.contains('@'));
        assert!(map.contains("[]"));
    }
}
