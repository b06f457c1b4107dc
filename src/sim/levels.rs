/// Level library: embedded levels or `.txt` files from the levels directory.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by file name)
///   2. Built-in embedded levels
///
/// ## File format (`.txt`):
///   Leading header lines start with `#`:
///     `# Level Name`
///     `# format: extended`   (optional, defaults to `classic`)
///   Every following line is a map row. See `domain::level` for legends.
///
/// Files are only split into header and rows here; the grid itself is
/// validated when the level is built, so a broken file surfaces as a
/// `BuildError` on the stage that tries to play it.

use std::path::Path;

use crate::domain::level::LevelFormat;

/// One playable level, not yet parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelDef {
    pub name: String,
    pub format: LevelFormat,
    /// Map rows joined with `\n`.
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct LevelLibrary {
    levels: Vec<LevelDef>,
}

impl LevelLibrary {
    pub fn embedded() -> Self {
        LevelLibrary { levels: embedded_levels() }
    }

    pub fn from_defs(levels: Vec<LevelDef>) -> Self {
        LevelLibrary { levels }
    }

    /// Levels from `dir` when it holds any `.txt` level, else the embedded set.
    pub fn load(dir: &Path) -> Self {
        let from_dir = load_from_directory(dir);
        if from_dir.is_empty() {
            log::info!("no level files in {}, using embedded levels", dir.display());
            return LevelLibrary::embedded();
        }
        let library = LevelLibrary { levels: from_dir };
        log::info!(
            "loaded {} levels from {}: {}",
            library.len(),
            dir.display(),
            library.names().collect::<Vec<_>>().join(", ")
        );
        library
    }

    pub fn get(&self, idx: usize) -> Option<&LevelDef> {
        self.levels.get(idx)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|l| l.name.as_str())
    }
}

// ══════════════════════════════════════════════════════════════
// Single-level file parsing
// ══════════════════════════════════════════════════════════════

/// Split a level file into its header and map rows.
pub fn parse_level_file(content: &str, fallback_name: &str) -> Option<LevelDef> {
    let mut name = String::new();
    let mut format = LevelFormat::classic();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next_if(|l| l.starts_with('#')) {
        let header = line[1..].trim();
        if let Some(value) = header.strip_prefix("format:") {
            match LevelFormat::by_name(value) {
                Some(f) => format = f,
                None => log::warn!("{fallback_name}: unknown level format {:?}", value.trim()),
            }
        } else if name.is_empty() {
            name = header.to_string();
        }
    }

    let mut rows: Vec<&str> = lines.collect();
    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return None;
    }

    if name.is_empty() {
        name = fallback_name.to_string();
    }

    Some(LevelDef { name, format, text: rows.join("\n") })
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    let mut paths: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "txt"))
        .collect();
    paths.sort();

    let mut results = vec![];
    for path in paths {
        let stem = path.file_stem().unwrap_or_default().to_string_lossy().to_string();
        match std::fs::read_to_string(&path) {
            Ok(content) => match parse_level_file(&content, &stem) {
                Some(def) => results.push(def),
                None => log::warn!("{} has no map rows, skipped", path.display()),
            },
            Err(e) => log::warn!("cannot read {}: {e}", path.display()),
        }
    }
    results
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Out of the Den", LevelFormat::classic(), &[
            "                                        ",
            "                                        ",
            "                                   G    ",
            "                                XXXXXXXX",
            "                            XXX         ",
            "                         XXX            ",
            "  P         R       XXX     R           ",
            "XXXXXXXXXXXXXXXXXXX     XXXXXXXXXXXXXXXX",
            "XXXXXXXXXXXXXXXXXXX     XXXXXXXXXXXXXXXX",
        ]),
        make_embedded("Rooftops", LevelFormat::classic(), &[
            "                                             ",
            "                                        G    ",
            "                                     XXXXXXX ",
            "                                 XX          ",
            "                        R    XX              ",
            "   P              XXXXXXXXX                  ",
            "XXXXXXXX   XXXX                              ",
            "XXXXXXXX   XXXX       R                      ",
            "XXXXXXXX   XXXXXXXXXXXXXXXXXXXXX  XXXXXXXXXXX",
        ]),
        make_embedded("Drifting Yard", LevelFormat::extended(), &[
            "                                        ",
            "                                        ",
            "                                    G   ",
            "                C        C        XXXXXX",
            "                             ---        ",
            "   P       ---      ---                 ",
            "XXXXXXX                                 ",
            "XXXXXXX  C                D             ",
            "XXXXXXXXXXXXX       XXXXXXXXXXXXXXXXXXXX",
        ]),
    ]
}

fn make_embedded(name: &str, format: LevelFormat, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        format,
        text: map.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::level::LevelGrid;
    use crate::sim::placement::{place, PlacementParams};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn embedded_levels_build() {
        let lib = LevelLibrary::embedded();
        assert_eq!(lib.len(), 3);
        for idx in 0..lib.len() {
            let def = lib.get(idx).unwrap();
            let grid = LevelGrid::parse(&def.text, &def.format)
                .unwrap_or_else(|e| panic!("{}: {e}", def.name));
            let mut rng = StdRng::seed_from_u64(idx as u64);
            place(&grid, &def.format, &PlacementParams::default(), &mut rng)
                .unwrap_or_else(|e| panic!("{}: {e}", def.name));
        }
    }

    #[test]
    fn header_lines_are_stripped() {
        let def = parse_level_file("# Tiny\n# format: extended\nP-G\nXXX\n\n", "fallback").unwrap();
        assert_eq!(def.name, "Tiny");
        assert_eq!(def.format.name, "extended");
        assert_eq!(def.text, "P-G\nXXX");
    }

    #[test]
    fn unnamed_file_uses_fallback() {
        let def = parse_level_file("PG\nXX", "03-cave").unwrap();
        assert_eq!(def.name, "03-cave");
        assert_eq!(def.format.name, "classic");
    }

    #[test]
    fn header_only_file_is_skipped() {
        assert!(parse_level_file("# Empty\n\n", "x").is_none());
    }

    #[test]
    fn directory_levels_replace_embedded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "# Second\nPG\nXX\n").unwrap();
        std::fs::write(dir.path().join("a.txt"), "# First\nGP\nXX\n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "not a level").unwrap();
        let lib = LevelLibrary::load(dir.path());
        assert_eq!(lib.names().collect::<Vec<_>>(), vec!["First", "Second"]);
    }

    #[test]
    fn missing_directory_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let lib = LevelLibrary::load(&dir.path().join("nope"));
        assert_eq!(lib.len(), 3);
    }
}
