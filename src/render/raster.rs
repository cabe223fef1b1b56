//! PNG and animated GIF output.

use super::{font, text_color, CellLabel, HeatmapFrame, Renderer, FILE_LABELS, RANK_LABELS};
use crate::config::HeatmapConfig;
use crate::error::{HeatmapError, RenderError};
use crate::session::HeatmapSession;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgba, RgbaImage};
use shakmaty::Color;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const BACKGROUND: [u8; 3] = [0xf0, 0xf0, 0xf0];
const INK: [u8; 3] = [0x20, 0x20, 0x20];
const GRID: [u8; 3] = [0x80, 0x80, 0x80];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Gif,
}

impl OutputFormat {
    /// Format from the file extension. Video containers are not supported.
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(OutputFormat::Png),
            "gif" => Ok(OutputFormat::Gif),
            _ => Err(RenderError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Pixel geometry of a rendered frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub cell_size: u32,
    pub board_left: u32,
    pub board_top: u32,
    pub width: u32,
    pub height: u32,
}

impl Layout {
    pub fn new(cell_size: u32) -> Self {
        let margin = cell_size / 2;
        let board_left = margin;
        let board_top = cell_size;
        // colorbar plus its labels take one and a half cells on the right
        let width = board_left + 8 * cell_size + cell_size * 3 / 2;
        let height = board_top + 8 * cell_size + margin;
        Layout {
            cell_size,
            board_left,
            board_top,
            width,
            height,
        }
    }

    /// Top-left pixel of board cell `(row, col)`.
    pub fn cell_origin(&self, row: usize, col: usize) -> (u32, u32) {
        (
            self.board_left + col as u32 * self.cell_size,
            self.board_top + row as u32 * self.cell_size,
        )
    }
}

/// Draw a frame into a fresh image.
pub fn rasterize(frame: &HeatmapFrame, cell_size: u32) -> RgbaImage {
    let layout = Layout::new(cell_size);
    let mut img = RgbaImage::from_pixel(layout.width, layout.height, rgba(BACKGROUND));
    let text_scale = (cell_size / 16).max(1);

    let title_scale = (cell_size / 32).max(1);
    let title = frame.title.to_uppercase();
    let title_x = layout
        .width
        .saturating_sub(font::text_width(&title) * title_scale)
        / 2;
    let title_y = (layout.board_top.saturating_sub(font::GLYPH_HEIGHT * title_scale)) / 2;
    draw_text(&mut img, &title, title_x, title_y, title_scale, INK);

    for row in 0..8 {
        for col in 0..8 {
            let (x, y) = layout.cell_origin(row, col);
            let fill = frame.cell_color(row, col);
            fill_rect(&mut img, x, y, cell_size, cell_size, fill);
            outline_rect(&mut img, x, y, cell_size, cell_size, GRID);

            let label = match frame.labels[row][col] {
                CellLabel::Empty => continue,
                CellLabel::Piece(piece) => {
                    let letter = piece.role.char();
                    match piece.color {
                        Color::White => letter.to_ascii_uppercase().to_string(),
                        Color::Black => letter.to_string(),
                    }
                }
                CellLabel::Value(value) => value.to_string(),
            };
            let w = font::text_width(&label) * text_scale;
            let h = font::GLYPH_HEIGHT * text_scale;
            let lx = x + cell_size.saturating_sub(w) / 2;
            let ly = y + cell_size.saturating_sub(h) / 2;
            draw_text(&mut img, &label, lx, ly, text_scale, text_color(fill));
        }
    }

    let axis_scale = (cell_size / 32).max(1);
    let glyph_w = font::GLYPH_WIDTH * axis_scale;
    let glyph_h = font::GLYPH_HEIGHT * axis_scale;
    for (i, (&file, &rank)) in FILE_LABELS.iter().zip(RANK_LABELS.iter()).enumerate() {
        let (cx, cy) = layout.cell_origin(i, i);
        let fx = cx + cell_size.saturating_sub(glyph_w) / 2;
        let fy = layout.board_top + 8 * cell_size + (layout.board_left.saturating_sub(glyph_h)) / 2;
        draw_text(&mut img, &file.to_string(), fx, fy, axis_scale, INK);

        let rx = (layout.board_left.saturating_sub(glyph_w)) / 2;
        let ry = cy + cell_size.saturating_sub(glyph_h) / 2;
        draw_text(&mut img, &rank.to_string(), rx, ry, axis_scale, INK);
    }

    draw_colorbar(&mut img, &layout, frame.scale_max, axis_scale);
    img
}

fn draw_colorbar(img: &mut RgbaImage, layout: &Layout, scale_max: u8, text_scale: u32) {
    let bar_left = layout.board_left + 8 * layout.cell_size + layout.cell_size / 4;
    let bar_width = (layout.cell_size / 3).max(4);
    let bar_height = 8 * layout.cell_size;
    for dy in 0..bar_height {
        // top of the bar is the maximum value
        let t = 1.0 - dy as f32 / (bar_height - 1).max(1) as f32;
        let color = super::colormap::sample(t);
        fill_rect(img, bar_left, layout.board_top + dy, bar_width, 1, color);
    }
    outline_rect(img, bar_left, layout.board_top, bar_width, bar_height, GRID);

    let label_x = bar_left + bar_width + text_scale * 2;
    draw_text(img, &scale_max.to_string(), label_x, layout.board_top, text_scale, INK);
    let bottom = layout.board_top + bar_height - font::GLYPH_HEIGHT * text_scale;
    draw_text(img, "0", label_x, bottom, text_scale, INK);
}

fn rgba(c: [u8; 3]) -> Rgba<u8> {
    Rgba([c[0], c[1], c[2], 255])
}

fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, rgba(color));
        }
    }
}

fn outline_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
    if w == 0 || h == 0 {
        return;
    }
    fill_rect(img, x, y, w, 1, color);
    fill_rect(img, x, y + h - 1, w, 1, color);
    fill_rect(img, x, y, 1, h, color);
    fill_rect(img, x + w - 1, y, 1, h, color);
}

fn draw_text(img: &mut RgbaImage, text: &str, x: u32, y: u32, scale: u32, color: [u8; 3]) {
    for (dx, dy) in font::layout(text) {
        fill_rect(img, x + dx * scale, y + dy * scale, scale, scale, color);
    }
}

/// Writes each drawn frame to the same PNG file, so the file holds the last one.
pub struct PngRenderer {
    path: PathBuf,
    cell_size: u32,
}

impl PngRenderer {
    pub fn new(path: impl Into<PathBuf>, cell_size: u32) -> Self {
        PngRenderer {
            path: path.into(),
            cell_size,
        }
    }
}

impl Renderer for PngRenderer {
    type Error = RenderError;

    fn draw(&mut self, frame: &HeatmapFrame) -> Result<(), RenderError> {
        rasterize(frame, self.cell_size).save(&self.path)?;
        log::info!("wrote {}", self.path.display());
        Ok(())
    }
}

/// Appends each drawn frame to a looping GIF.
pub struct GifRenderer<W: Write> {
    encoder: GifEncoder<W>,
    cell_size: u32,
    delay: Delay,
    frames: usize,
}

impl GifRenderer<BufWriter<File>> {
    pub fn create(path: &Path, cell_size: u32, frame_delay: Duration) -> Result<Self, RenderError> {
        let file = File::create(path)?;
        GifRenderer::new(BufWriter::new(file), cell_size, frame_delay)
    }
}

impl<W: Write> GifRenderer<W> {
    pub fn new(writer: W, cell_size: u32, frame_delay: Duration) -> Result<Self, RenderError> {
        let mut encoder = GifEncoder::new(writer);
        encoder.set_repeat(Repeat::Infinite)?;
        let millis = u32::try_from(frame_delay.as_millis()).unwrap_or(u32::MAX);
        Ok(GifRenderer {
            encoder,
            cell_size,
            delay: Delay::from_numer_denom_ms(millis, 1),
            frames: 0,
        })
    }

    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl<W: Write> Renderer for GifRenderer<W> {
    type Error = RenderError;

    fn draw(&mut self, frame: &HeatmapFrame) -> Result<(), RenderError> {
        let buffer = rasterize(frame, self.cell_size);
        self.encoder
            .encode_frame(Frame::from_parts(buffer, 0, 0, self.delay))?;
        self.frames += 1;
        Ok(())
    }
}

/// Write the session's current position to a PNG, or every position from the
/// current one to the end to a GIF, `frames_per_move` wave frames each.
/// Returns the number of frames written.
pub fn save_session(
    session: &HeatmapSession,
    config: &HeatmapConfig,
    path: &Path,
) -> Result<usize, HeatmapError> {
    match OutputFormat::from_path(path)? {
        OutputFormat::Png => {
            let mut png = PngRenderer::new(path, config.cell_size);
            png.draw(&session.frame_at(session.cursor(), None)?)?;
            Ok(1)
        }
        OutputFormat::Gif => {
            let frames = config.frames_per_move.max(1);
            // one position per autoplay interval
            let delay = Duration::from_millis(config.interval_ms / u64::from(frames));
            let mut gif = GifRenderer::create(path, config.cell_size, delay)?;
            for index in session.cursor()..=session.timeline().last_index() {
                for k in 0..frames {
                    let phase = k as f32 / frames as f32;
                    gif.draw(&session.frame_at(index, Some(phase))?)?;
                }
            }
            log::info!("wrote {} frames to {}", gif.frames(), path.display());
            Ok(gif.frames())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::colormap::heat_color;
    use crate::snapshot::{PieceValues, Snapshot};
    use shakmaty::Chess;

    fn start_frame() -> HeatmapFrame {
        let snapshot = Snapshot::extract(&Chess::default(), &PieceValues::default());
        let mut labels = [[CellLabel::Empty; 8]; 8];
        for (r, row) in snapshot.rows().iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                if v > 0 {
                    labels[r][c] = CellLabel::Value(v);
                }
            }
        }
        HeatmapFrame {
            title: "Initial Position (1/3)".to_string(),
            snapshot,
            labels,
            highlights: Vec::new(),
            highlight_color: [255, 0, 0],
            scale_max: 10,
        }
    }

    #[test]
    fn test_output_format() {
        assert_eq!(OutputFormat::from_path(Path::new("a.png")).unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("a.GIF")).unwrap(), OutputFormat::Gif);
        assert!(matches!(
            OutputFormat::from_path(Path::new("a.mp4")),
            Err(RenderError::UnsupportedFormat(_))
        ));
        assert!(OutputFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_rasterize_dimensions_and_cells() {
        let frame = start_frame();
        let img = rasterize(&frame, 32);
        let layout = Layout::new(32);
        assert_eq!(img.dimensions(), (layout.width, layout.height));

        // corner pixel inside a cell, away from the grid line and the label
        let (x, y) = layout.cell_origin(4, 4);
        let empty = img.get_pixel(x + 2, y + 2);
        assert_eq!(empty.0, rgba(heat_color(0, 10)).0);

        let (x, y) = layout.cell_origin(0, 3);
        let queen = img.get_pixel(x + 2, y + 2);
        assert_eq!(queen.0, rgba(heat_color(10, 10)).0);
    }

    #[test]
    fn test_gif_counts_frames() {
        let mut out = Vec::new();
        {
            let mut gif = GifRenderer::new(&mut out, 16, Duration::from_millis(100)).unwrap();
            gif.draw(&start_frame()).unwrap();
            gif.draw(&start_frame()).unwrap();
            assert_eq!(gif.frames(), 2);
        }
        assert!(out.starts_with(b"GIF89a"));
    }

    #[test]
    fn test_save_session_gif() {
        let game = crate::parse_game_str("1. e4 d5 2. exd5 *").unwrap();
        let timeline = crate::TimelineBuilder::default().build(&game).unwrap();
        let config = HeatmapConfig {
            cell_size: 16,
            frames_per_move: 2,
            start_move: 1,
            ..HeatmapConfig::default()
        };
        let session = HeatmapSession::new(timeline, &config).unwrap();

        let path = std::env::temp_dir().join(format!("pgn_heatmap_{}.gif", std::process::id()));
        // positions 1, 2 and 3 at two frames each
        assert_eq!(save_session(&session, &config, &path).unwrap(), 6);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            save_session(&session, &config, Path::new("out.mp4")),
            Err(HeatmapError::Render(RenderError::UnsupportedFormat(_)))
        ));
    }
}
