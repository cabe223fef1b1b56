//! Board snapshot extraction.
//!
//! A snapshot is the 8x8 grid of piece values for one position, laid out the way
//! the board is drawn: row 0 is rank 8, column 0 is file a.
//! Piece color is ignored, only the role decides the value.

use serde::{Deserialize, Serialize};
use shakmaty::{Board, Chess, Piece, Position, Role, Square};

/// Point value assigned to each piece role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PieceValues {
    pub pawn: u8,
    pub knight: u8,
    pub bishop: u8,
    pub rook: u8,
    pub queen: u8,
    pub king: u8,
}

impl Default for PieceValues {
    fn default() -> Self {
        PieceValues {
            pawn: 1,
            knight: 3,
            bishop: 3,
            rook: 5,
            queen: 10,
            king: 4,
        }
    }
}

impl PieceValues {
    pub fn value(&self, role: Role) -> u8 {
        match role {
            Role::Pawn => self.pawn,
            Role::Knight => self.knight,
            Role::Bishop => self.bishop,
            Role::Rook => self.rook,
            Role::Queen => self.queen,
            Role::King => self.king,
        }
    }

    /// Largest configured value, used as the top of the color scale.
    pub fn max(&self) -> u8 {
        [
            self.pawn,
            self.knight,
            self.bishop,
            self.rook,
            self.queen,
            self.king,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Anything that can list its occupied squares.
pub trait Occupancy {
    fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_;
}

impl Occupancy for Board {
    fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::ALL
            .into_iter()
            .filter_map(move |sq| self.piece_at(sq).map(|piece| (sq, piece)))
    }
}

impl Occupancy for Chess {
    fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        // Board has an inherent `occupied` returning a bitboard
        Occupancy::occupied(self.board())
    }
}

/// Grid row/column of a square in display orientation.
pub fn square_to_cell(sq: Square) -> (usize, usize) {
    (7 - sq.rank() as usize, sq.file() as usize)
}

/// Immutable 8x8 grid of piece values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Snapshot {
    cells: [[u8; 8]; 8],
}

impl Snapshot {
    pub fn extract<B: Occupancy + ?Sized>(board: &B, values: &PieceValues) -> Self {
        let mut cells = [[0u8; 8]; 8];
        for (sq, piece) in board.occupied() {
            let (row, col) = square_to_cell(sq);
            cells[row][col] = values.value(piece.role);
        }
        Snapshot { cells }
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row][col]
    }

    pub fn rows(&self) -> &[[u8; 8]; 8] {
        &self.cells
    }

    /// Total material on the board, both colors combined.
    pub fn total(&self) -> u32 {
        self.cells.iter().flatten().map(|&v| u32::from(v)).sum()
    }
}
