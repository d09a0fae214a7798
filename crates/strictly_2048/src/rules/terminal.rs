//! Loss detection.

use super::slide::{apply_move, has_changed};
use crate::{Board, Direction, MAX_TILE, SIZE};
use tracing::instrument;

/// Checks if the board is stuck: no empty cell and no equal neighbours.
///
/// Neighbours are horizontal or vertical; diagonals never merge, and
/// neither do two tiles at [`MAX_TILE`].
#[instrument(level = "trace")]
pub fn is_terminal(board: &Board) -> bool {
    if !board.is_full() {
        return false;
    }
    for row in 0..SIZE {
        for col in 0..SIZE {
            let value = board.get(row, col);
            if value == MAX_TILE {
                continue;
            }
            if col + 1 < SIZE && board.get(row, col + 1) == value {
                return false;
            }
            if row + 1 < SIZE && board.get(row + 1, col) == value {
                return false;
            }
        }
    }
    true
}

/// Checks if at least one direction would change the board.
pub fn has_moves(board: &Board) -> bool {
    Direction::ALL
        .iter()
        .any(|&dir| has_changed(board, &apply_move(board, dir)))
}
