//! Viewer configuration, read from TOML and overridden from the command line.

use crate::attacks::RayColor;
use crate::error::ConfigError;
use crate::snapshot::PieceValues;
use crate::timeline::IllegalMovePolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatmapConfig {
    pub piece_values: PieceValues,
    /// Milliseconds between autoplay steps and between animation frames.
    pub interval_ms: u64,
    /// Position shown first, 0 being the initial position.
    pub start_move: usize,
    pub repeat: bool,
    pub show_rays: bool,
    /// Piece glyphs instead of values in the cells.
    pub show_pieces: bool,
    pub ray_color: RayColor,
    /// Animation frames rendered per position when writing a GIF.
    pub frames_per_move: u32,
    /// Pixel size of one board square in image output.
    pub cell_size: u32,
    pub illegal_moves: IllegalMovePolicy,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        HeatmapConfig {
            piece_values: PieceValues::default(),
            interval_ms: 500,
            start_move: 0,
            repeat: false,
            show_rays: true,
            show_pieces: true,
            ray_color: RayColor::Red,
            frames_per_move: 5,
            cell_size: 64,
            illegal_moves: IllegalMovePolicy::Reject,
        }
    }
}

impl HeatmapConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: HeatmapConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::Value("interval_ms must be at least 1".to_string()));
        }
        if self.frames_per_move == 0 {
            return Err(ConfigError::Value("frames_per_move must be at least 1".to_string()));
        }
        if !(16..=256).contains(&self.cell_size) {
            return Err(ConfigError::Value(format!(
                "cell_size must be between 16 and 256, got {}",
                self.cell_size
            )));
        }
        if self.piece_values.max() == 0 {
            return Err(ConfigError::Value("at least one piece value must be positive".to_string()));
        }
        Ok(())
    }
}
