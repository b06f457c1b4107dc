/// Level raster: text → validated grid of symbols.
///
/// The alphabet lives in a `LevelFormat` value so levels with extra
/// entity kinds (platforms, chasing enemies, coins) can be parsed by the
/// same code as the classic four-symbol levels.
///
/// ## Classic legend:
///   ' ' = Space     'X' = Ground     'P' = Player
///   'G' = Goal      'R' = Raccoon (patrolling enemy)
///
/// ## Extended legend (classic plus):
///   '-' = Platform (drifting, pass-through from below)
///   'D' = Dog (chases the player)
///   'C' = Coin

use crate::error::LevelError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Symbol {
    Space,
    Ground,
    Player,
    Goal,
    Platform,
    /// Index into `LevelFormat::enemies`.
    Enemy(usize),
    Collectible,
}

impl Symbol {
    pub fn is_ground(self) -> bool {
        matches!(self, Symbol::Ground)
    }
}

/// Tuning for one enemy species, attached to its level symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySpecies {
    pub symbol: char,
    pub name: &'static str,
    /// Unscaled horizontal speed per tick.
    pub speed: f64,
    /// Ticks the player stays stunned after a push.
    pub stun_ticks: u32,
    /// Unscaled upward kick applied by a push.
    pub push_power: f64,
    /// Chases the player instead of patrolling.
    pub targeting: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LevelFormat {
    pub name: &'static str,
    pub space: char,
    pub ground: char,
    pub player: char,
    pub goal: char,
    pub platform: Option<char>,
    pub collectible: Option<char>,
    pub enemies: Vec<EnemySpecies>,
    /// World units per grid cell, before world scaling.
    pub tile_size: f64,
    pub require_player: bool,
}

impl LevelFormat {
    pub fn classic() -> Self {
        LevelFormat {
            name: "classic",
            space: ' ',
            ground: 'X',
            player: 'P',
            goal: 'G',
            platform: None,
            collectible: None,
            enemies: vec![EnemySpecies {
                symbol: 'R',
                name: "raccoon",
                speed: 2.0,
                stun_ticks: 15,
                push_power: 10.0,
                targeting: false,
            }],
            tile_size: 50.0,
            require_player: true,
        }
    }

    pub fn extended() -> Self {
        let mut f = LevelFormat::classic();
        f.name = "extended";
        f.platform = Some('-');
        f.collectible = Some('C');
        f.enemies.push(EnemySpecies {
            symbol: 'D',
            name: "dog",
            speed: 3.0,
            stun_ticks: 20,
            push_power: 12.0,
            targeting: true,
        });
        f
    }

    /// Look up a format by name (used by level file headers).
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(LevelFormat::classic()),
            "extended" => Some(LevelFormat::extended()),
            _ => None,
        }
    }

    pub fn symbol_for(&self, c: char) -> Option<Symbol> {
        if c == self.space {
            Some(Symbol::Space)
        } else if c == self.ground {
            Some(Symbol::Ground)
        } else if c == self.player {
            Some(Symbol::Player)
        } else if c == self.goal {
            Some(Symbol::Goal)
        } else if Some(c) == self.platform {
            Some(Symbol::Platform)
        } else if Some(c) == self.collectible {
            Some(Symbol::Collectible)
        } else {
            self.enemies.iter().position(|e| e.symbol == c).map(Symbol::Enemy)
        }
    }
}

/// Immutable, rectangular grid of symbols.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelGrid {
    width: usize,
    height: usize,
    cells: Vec<Symbol>,
}

impl LevelGrid {
    /// Parse level text.
    ///
    /// One trailing newline terminates the last row rather than adding an
    /// empty one. Windows line endings are accepted.
    pub fn parse(text: &str, format: &LevelFormat) -> Result<LevelGrid, LevelError> {
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines: Vec<&str> = body
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();

        if lines.len() < 2 {
            return Err(LevelError::TooFewLines(lines.len()));
        }

        let width = lines[0].chars().count();
        if width < 1 {
            return Err(LevelError::EmptyWidth);
        }

        let mut cells = Vec::with_capacity(width * lines.len());
        let mut player_at: Option<(usize, usize)> = None;

        for (line_no, line) in lines.iter().enumerate() {
            let w = line.chars().count();
            if w != width {
                return Err(LevelError::WidthMismatch { line: line_no, width: w, expected: width });
            }
            for (col, ch) in line.chars().enumerate() {
                let sym = format
                    .symbol_for(ch)
                    .ok_or(LevelError::UnknownSymbol { line: line_no, col, ch })?;
                if sym == Symbol::Player {
                    if player_at.is_some() {
                        return Err(LevelError::DuplicatePlayer { line: line_no, col });
                    }
                    player_at = Some((col, line_no));
                }
                cells.push(sym);
            }
        }

        if format.require_player && player_at.is_none() {
            return Err(LevelError::MissingPlayer);
        }

        Ok(LevelGrid { width, height: lines.len(), cells })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Symbol at `(x, y)`; anything outside the grid reads as space.
    pub fn get(&self, x: i64, y: i64) -> Symbol {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return Symbol::Space;
        }
        self.cells[y as usize * self.width + x as usize]
    }

    /// Row-major iteration over `(x, y, symbol)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Symbol)> + '_ {
        let w = self.width;
        self.cells.iter().enumerate().map(move |(i, &s)| (i % w, i / w, s))
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic(text: &str) -> Result<LevelGrid, LevelError> {
        LevelGrid::parse(text, &LevelFormat::classic())
    }

    fn char_for(format: &LevelFormat, s: Symbol) -> char {
        match s {
            Symbol::Space => format.space,
            Symbol::Ground => format.ground,
            Symbol::Player => format.player,
            Symbol::Goal => format.goal,
            Symbol::Platform => format.platform.unwrap_or(format.space),
            Symbol::Collectible => format.collectible.unwrap_or(format.space),
            Symbol::Enemy(i) => format.enemies.get(i).map_or(format.space, |e| e.symbol),
        }
    }

    /// Render back to text, one row per line, each terminated by `\n`.
    fn to_text(grid: &LevelGrid, format: &LevelFormat) -> String {
        let mut out = String::new();
        for row in grid.cells.chunks(grid.width()) {
            out.extend(row.iter().map(|&s| char_for(format, s)));
            out.push('\n');
        }
        out
    }

    #[test]
    fn parse_round_trips_through_text() {
        let text = "XXXXXX\nX  R X\nXP  GX\nXXXXXX\n";
        let grid = classic(text).unwrap();
        assert_eq!(grid.width(), 6);
        assert_eq!(grid.height(), 4);
        assert_eq!(to_text(&grid, &LevelFormat::classic()), text);
    }

    #[test]
    fn trailing_newline_is_not_a_row() {
        let a = classic("XP\nGX").unwrap();
        let b = classic("XP\nGX\n").unwrap();
        assert_eq!(a, b);
        assert_eq!(b.height(), 2);
    }

    #[test]
    fn crlf_is_accepted() {
        let grid = classic("XP\r\nGX\r\n").unwrap();
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.get(1, 0), Symbol::Player);
    }

    #[test]
    fn get_outside_grid_is_space() {
        let grid = classic("XX\nPG").unwrap();
        assert_eq!(grid.get(-1, 0), Symbol::Space);
        assert_eq!(grid.get(0, -1), Symbol::Space);
        assert_eq!(grid.get(2, 0), Symbol::Space);
        assert_eq!(grid.get(0, 2), Symbol::Space);
        assert_eq!(grid.get(0, 0), Symbol::Ground);
    }

    #[test]
    fn too_few_lines() {
        assert_eq!(classic("XPG"), Err(LevelError::TooFewLines(1)));
        assert_eq!(classic("XPG\n"), Err(LevelError::TooFewLines(1)));
    }

    #[test]
    fn empty_first_line() {
        assert_eq!(classic("\nXP"), Err(LevelError::EmptyWidth));
    }

    #[test]
    fn width_mismatch_cites_line() {
        assert_eq!(
            classic("XXX\nXP\nXXX"),
            Err(LevelError::WidthMismatch { line: 1, width: 2, expected: 3 })
        );
    }

    #[test]
    fn duplicate_player_cites_second_position() {
        assert_eq!(
            classic("XPX\nXXP"),
            Err(LevelError::DuplicatePlayer { line: 1, col: 2 })
        );
    }

    #[test]
    fn missing_player_rejected() {
        assert_eq!(classic("XGX\nXXX"), Err(LevelError::MissingPlayer));
    }

    #[test]
    fn unknown_symbol_rejected() {
        assert_eq!(
            classic("XP\nX?"),
            Err(LevelError::UnknownSymbol { line: 1, col: 1, ch: '?' })
        );
    }

    #[test]
    fn extended_symbols_need_extended_format() {
        let text = "P-CD\nXXXG";
        assert!(matches!(classic(text), Err(LevelError::UnknownSymbol { .. })));
        let grid = LevelGrid::parse(text, &LevelFormat::extended()).unwrap();
        assert_eq!(grid.get(1, 0), Symbol::Platform);
        assert_eq!(grid.get(2, 0), Symbol::Collectible);
        assert_eq!(grid.get(3, 0), Symbol::Enemy(1));
    }

    #[test]
    fn iter_walks_row_major() {
        let grid = classic("XXX\nXPG").unwrap();
        let cells: Vec<_> = grid.iter().filter(|&(_, _, s)| s != Symbol::Ground).collect();
        assert_eq!(cells, vec![(1, 1, Symbol::Player), (2, 1, Symbol::Goal)]);
    }
}
