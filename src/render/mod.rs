//! Render adapters.
//!
//! The session hands a [`HeatmapFrame`] to a [`Renderer`]; renderers never
//! touch the timeline or the cursor.

pub mod colormap;
pub mod font;
pub mod raster;
pub mod terminal;

use crate::attacks::Highlight;
use crate::snapshot::Snapshot;
use shakmaty::{Color, Piece, Role};

pub const FILE_LABELS: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];
pub const RANK_LABELS: [char; 8] = ['8', '7', '6', '5', '4', '3', '2', '1'];

/// What is written inside a board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellLabel {
    Empty,
    Piece(Piece),
    Value(u8),
}

/// Everything needed to draw one heatmap.
#[derive(Clone, Debug)]
pub struct HeatmapFrame {
    pub title: String,
    pub snapshot: Snapshot,
    pub labels: [[CellLabel; 8]; 8],
    pub highlights: Vec<Highlight>,
    pub highlight_color: [u8; 3],
    /// Value mapped to the top of the color scale.
    pub scale_max: u8,
}

impl HeatmapFrame {
    /// Cell color with the highlights for that cell composited on top.
    pub fn cell_color(&self, row: usize, col: usize) -> [u8; 3] {
        let mut color = colormap::heat_color(self.snapshot.get(row, col), self.scale_max);
        for highlight in self.highlights.iter().filter(|h| h.cell == (row, col)) {
            color = blend(color, self.highlight_color, highlight.alpha);
        }
        color
    }
}

/// Draws frames somewhere.
pub trait Renderer {
    type Error;

    fn draw(&mut self, frame: &HeatmapFrame) -> Result<(), Self::Error>;
}

/// `top` over `base` with opacity `alpha`.
pub fn blend(base: [u8; 3], top: [u8; 3], alpha: f32) -> [u8; 3] {
    let alpha = alpha.clamp(0.0, 1.0);
    let mut out = [0u8; 3];
    for i in 0..3 {
        let mixed = f32::from(base[i]) * (1.0 - alpha) + f32::from(top[i]) * alpha;
        out[i] = mixed.round() as u8;
    }
    out
}

/// Black or white, whichever reads better on `background`.
pub fn text_color(background: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = background.map(f32::from);
    let luminance = 0.299 * r + 0.587 * g + 0.114 * b;
    if luminance > 140.0 {
        [0, 0, 0]
    } else {
        [255, 255, 255]
    }
}

pub fn piece_symbol(piece: Piece) -> char {
    match (piece.color, piece.role) {
        (Color::White, Role::Pawn) => '♙',
        (Color::White, Role::Knight) => '♘',
        (Color::White, Role::Bishop) => '♗',
        (Color::White, Role::Rook) => '♖',
        (Color::White, Role::Queen) => '♕',
        (Color::White, Role::King) => '♔',
        (Color::Black, Role::Pawn) => '♟',
        (Color::Black, Role::Knight) => '♞',
        (Color::Black, Role::Bishop) => '♝',
        (Color::Black, Role::Rook) => '♜',
        (Color::Black, Role::Queen) => '♛',
        (Color::Black, Role::King) => '♚',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend() {
        assert_eq!(blend([0, 0, 0], [255, 255, 255], 0.0), [0, 0, 0]);
        assert_eq!(blend([0, 0, 0], [255, 255, 255], 1.0), [255, 255, 255]);
        assert_eq!(blend([100, 0, 200], [200, 100, 0], 0.5), [150, 50, 100]);
    }

    #[test]
    fn test_text_color() {
        assert_eq!(text_color([0x2b, 0x2b, 0x2b]), [255, 255, 255]);
        assert_eq!(text_color([0xff, 0xa5, 0x00]), [0, 0, 0]);
    }

    #[test]
    fn test_cell_color_with_highlight() {
        let frame = HeatmapFrame {
            title: String::new(),
            snapshot: Snapshot::default(),
            labels: [[CellLabel::Empty; 8]; 8],
            highlights: vec![Highlight {
                cell: (2, 3),
                alpha: 1.0,
            }],
            highlight_color: [255, 0, 0],
            scale_max: 10,
        };
        assert_eq!(frame.cell_color(2, 3), [255, 0, 0]);
        assert_eq!(frame.cell_color(0, 0), colormap::heat_color(0, 10));
    }

    #[test]
    fn test_piece_symbol() {
        let white_queen = Piece {
            color: Color::White,
            role: Role::Queen,
        };
        let black_knight = Piece {
            color: Color::Black,
            role: Role::Knight,
        };
        assert_eq!(piece_symbol(white_queen), '♕');
        assert_eq!(piece_symbol(black_knight), '♞');
    }
}
