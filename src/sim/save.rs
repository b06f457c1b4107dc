/// Save and load game progress.
///
/// ## Files (in the save directory):
///   `player_area.json`   the character's sprite rect, `{"Left": .., "Top": .., ..}`
///   `player_level.json`  the level index, a bare JSON number
///
/// Both are written pretty-printed. A load reads both or fails; nothing is
/// defaulted, so the menu can show what went wrong.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::geometry::Rect;
use crate::error::SaveError;

const AREA_FILE: &str = "player_area.json";
const LEVEL_FILE: &str = "player_level.json";

/// Saved progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SaveData {
    pub area: Rect,
    pub level: usize,
}

#[derive(Clone, Debug)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SaveStore { dir: dir.into() }
    }

    pub fn save(&self, data: &SaveData) -> Result<(), SaveError> {
        fs::create_dir_all(&self.dir).map_err(|source| SaveError::Io {
            path: self.dir.clone(),
            source,
        })?;
        write_json(&self.dir.join(AREA_FILE), &data.area)?;
        write_json(&self.dir.join(LEVEL_FILE), &data.level)?;
        log::info!("saved level {} to {}", data.level, self.dir.display());
        Ok(())
    }

    pub fn load(&self) -> Result<SaveData, SaveError> {
        let area = read_json(&self.dir.join(AREA_FILE))?;
        let level = read_json(&self.dir.join(LEVEL_FILE))?;
        log::info!("loaded save: level {level}");
        Ok(SaveData { area, level })
    }

    pub fn has_save(&self) -> bool {
        self.dir.join(AREA_FILE).is_file() && self.dir.join(LEVEL_FILE).is_file()
    }
}

// ══════════════════════════════════════════════════════════════
// JSON helpers
// ══════════════════════════════════════════════════════════════

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SaveError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| SaveError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| SaveError::Io { path: path.to_path_buf(), source })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SaveError> {
    let text = fs::read_to_string(path)
        .map_err(|source| SaveError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_str(&text).map_err(|source| SaveError::Json { path: path.to_path_buf(), source })
}
