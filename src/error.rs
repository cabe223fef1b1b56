//! Error types for loading, replaying, navigating and rendering games.

use shakmaty::san::SanError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The PGN input could not be read or turned into a game.
#[derive(Debug, Error)]
pub enum GameLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing error: {0}")]
    Reader(#[source] io::Error),
    #[error("no game found in PGN")]
    NoGame,
    #[error("game index {index} out of range, input has {count} game(s)")]
    NoSuchGame { index: usize, count: usize },
    #[error("failed to parse FEN {fen:?}: {reason}")]
    Fen { fen: String, reason: String },
}

/// A move in the mainline was rejected by the rules engine.
#[derive(Debug, Error)]
#[error("illegal move at ply {ply}: {san}")]
pub struct MalformedGameError {
    /// 1-based ply of the rejected move.
    pub ply: usize,
    pub san: String,
    #[source]
    pub source: SanError,
}

/// A navigation request targeted an index outside `[0, last]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("move {index} is out of range (0-{last})")]
pub struct OutOfRangeError {
    pub index: usize,
    pub last: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Value(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
    #[error("unsupported output format {0:?}, expected .png or .gif")]
    UnsupportedFormat(String),
}

/// Umbrella error for callers driving the whole pipeline.
#[derive(Debug, Error)]
pub enum HeatmapError {
    #[error(transparent)]
    Load(#[from] GameLoadError),
    #[error(transparent)]
    Malformed(#[from] MalformedGameError),
    #[error(transparent)]
    OutOfRange(#[from] OutOfRangeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
