//! Win detection.

use crate::{Board, WIN_TILE};
use tracing::instrument;

/// Checks if any cell holds the winning tile.
#[instrument(level = "trace")]
pub fn is_win(board: &Board) -> bool {
    board.rows().iter().flatten().any(|&v| v == WIN_TILE)
}
