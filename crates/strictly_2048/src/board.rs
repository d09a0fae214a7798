//! The 4x4 board value type.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of the board.
pub const SIZE: usize = 4;

/// Tile value that wins the game.
pub const WIN_TILE: u32 = 2048;

/// Largest tile a 4x4 board can reach (2^17). Tiles at the cap do not merge.
pub const MAX_TILE: u32 = 1 << 17;

/// Raw row-major cell layout.
pub type Cells = [[u32; SIZE]; SIZE];

/// A rejected board layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("Invalid tile value {} at row {}, column {}", value, row, col)]
pub struct BoardError {
    /// Offending value.
    pub value: u32,
    /// Row of the offending cell.
    pub row: usize,
    /// Column of the offending cell.
    pub col: usize,
}

/// 4x4 2048 board.
///
/// Every cell is either `0` (empty) or a power of two from 2 to [`MAX_TILE`].
/// The only ways to build a board are [`Board::new`], the validating
/// [`Board::from_rows`] and the rules in [`crate::rules`], so the invariant
/// holds for every value of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Cells", into = "Cells")]
pub struct Board {
    cells: Cells,
}

/// Returns whether `value` may occupy a cell.
pub(crate) fn is_valid_tile(value: u32) -> bool {
    value == 0 || (value >= 2 && value <= MAX_TILE && value.is_power_of_two())
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            cells: [[0; SIZE]; SIZE],
        }
    }

    /// Creates a board from rows, rejecting cells that are not `0` or a
    /// power of two up to [`MAX_TILE`].
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] naming the first invalid cell in row-major order.
    pub fn from_rows(cells: Cells) -> Result<Self, BoardError> {
        for (row, line) in cells.iter().enumerate() {
            for (col, &value) in line.iter().enumerate() {
                if !is_valid_tile(value) {
                    return Err(BoardError { value, row, col });
                }
            }
        }
        Ok(Self { cells })
    }

    /// Builds a board from cells already known to satisfy the tile invariant.
    pub(crate) fn from_cells_unchecked(cells: Cells) -> Self {
        debug_assert!(cells.iter().flatten().all(|&v| is_valid_tile(v)));
        Self { cells }
    }

    /// Returns the value at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if either coordinate is out of range.
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.cells[row][col]
    }

    /// Returns all rows.
    pub fn rows(&self) -> &Cells {
        &self.cells
    }

    /// Coordinates of every empty cell, row-major.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        let mut empty = Vec::with_capacity(SIZE * SIZE);
        for (row, line) in self.cells.iter().enumerate() {
            for (col, &value) in line.iter().enumerate() {
                if value == 0 {
                    empty.push((row, col));
                }
            }
        }
        empty
    }

    /// Checks if every cell is occupied.
    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|&v| v != 0)
    }

    /// Sum of all tile values.
    pub fn tile_sum(&self) -> u64 {
        self.cells.iter().flatten().map(|&v| u64::from(v)).sum()
    }

    /// Highest tile on the board (`0` for an empty board).
    pub fn max_tile(&self) -> u32 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }

    pub(crate) fn with_tile(mut self, row: usize, col: usize, value: u32) -> Self {
        debug_assert!(is_valid_tile(value));
        self.cells[row][col] = value;
        self
    }
}

impl TryFrom<Cells> for Board {
    type Error = BoardError;

    fn try_from(cells: Cells) -> Result<Self, Self::Error> {
        Self::from_rows(cells)
    }
}

impl From<Board> for Cells {
    fn from(board: Board) -> Self {
        board.cells
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.cells.iter().enumerate() {
            let row = line
                .iter()
                .map(|&v| {
                    if v == 0 {
                        format!("{:>5}", ".")
                    } else {
                        format!("{:>5}", v)
                    }
                })
                .collect::<Vec<_>>()
                .join("|");
            write!(f, "{}", row)?;
            if i + 1 < SIZE {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
