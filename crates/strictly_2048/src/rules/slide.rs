//! Sliding and merging.
//!
//! Every direction is reduced to a leftward slide: the board is oriented
//! so the requested direction points left, each row is compressed and
//! merged, and the same orientation is applied again to map back. All
//! four orientations are involutions, so each one is its own inverse.

use crate::board::Cells;
use crate::{Board, Direction, MAX_TILE, SIZE};
use tracing::instrument;

/// Mirrors each row (column `c` becomes column `SIZE - 1 - c`).
fn mirror(cells: &Cells) -> Cells {
    let mut out = *cells;
    for row in out.iter_mut() {
        row.reverse();
    }
    out
}

fn transpose(cells: &Cells) -> Cells {
    let mut out = [[0; SIZE]; SIZE];
    for (r, line) in cells.iter().enumerate() {
        for (c, &value) in line.iter().enumerate() {
            out[c][r] = value;
        }
    }
    out
}

/// Orients `cells` so that `direction` points left.
///
/// Left is the identity, right mirrors rows, up transposes and down
/// mirrors, transposes and mirrors again. Applying the same orientation
/// twice restores the input.
pub fn orient(cells: &Cells, direction: Direction) -> Cells {
    match direction {
        Direction::Left => *cells,
        Direction::Right => mirror(cells),
        Direction::Up => transpose(cells),
        Direction::Down => mirror(&transpose(&mirror(cells))),
    }
}

/// Compresses and merges one row towards index 0.
///
/// Zeros are dropped, then each tile merges with its right neighbour once
/// if they are equal; the merged tile is skipped so it cannot merge again
/// in the same move. Tiles at [`MAX_TILE`] never merge. The result is
/// padded with zeros.
pub fn slide_row_left(row: [u32; SIZE]) -> [u32; SIZE] {
    let tiles: Vec<u32> = row.into_iter().filter(|&v| v != 0).collect();

    let mut out = [0; SIZE];
    let mut len = 0;
    let mut i = 0;
    while i < tiles.len() {
        if i + 1 < tiles.len() && tiles[i] == tiles[i + 1] && tiles[i] < MAX_TILE {
            out[len] = tiles[i] * 2;
            i += 2;
        } else {
            out[len] = tiles[i];
            i += 1;
        }
        len += 1;
    }
    out
}

/// Returns the board after sliding every tile in `direction`. No tile is spawned.
#[instrument(level = "trace")]
pub fn apply_move(board: &Board, direction: Direction) -> Board {
    let mut oriented = orient(board.rows(), direction);
    for row in oriented.iter_mut() {
        *row = slide_row_left(*row);
    }
    // Merging doubles a power of two below the cap and zero stays zero,
    // so the tile invariant carries over.
    Board::from_cells_unchecked(orient(&oriented, direction))
}

/// A move is accepted only if it changed the board.
pub fn has_changed(before: &Board, after: &Board) -> bool {
    before != after
}
