/// Typed errors for content the game loads at runtime.
///
/// Level text, level placement and save files are user-editable, so
/// failures there are reported rather than panicked on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level must have at least 2 lines, got {0}")]
    TooFewLines(usize),

    #[error("level must have at least a single column")]
    EmptyWidth,

    #[error("line {line} has a width of {width}, expected {expected}")]
    WidthMismatch { line: usize, width: usize, expected: usize },

    #[error("unknown symbol {ch:?} at line {line}, column {col}")]
    UnknownSymbol { line: usize, col: usize, ch: char },

    #[error("second player declaration at line {line}, column {col}")]
    DuplicatePlayer { line: usize, col: usize },

    #[error("level has no player")]
    MissingPlayer,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid level: {0}")]
    Level(#[from] LevelError),

    #[error("level has no goal")]
    MissingGoal,

    #[error("level has no player")]
    MissingPlayer,

    #[error("no level with index {0}")]
    NoSuchLevel(usize),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed save file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
