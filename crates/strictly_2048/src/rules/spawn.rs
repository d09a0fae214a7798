//! Random tile placement.

use crate::{Board, Spawn, TileSource};
use tracing::{instrument, trace};

/// Places a new tile on a uniformly chosen empty cell.
///
/// Returns the board unchanged and `None` when there is no empty cell.
/// This is the only randomized step of the game.
#[instrument(level = "trace", skip(source))]
pub fn spawn_tile<S: TileSource + ?Sized>(board: &Board, source: &mut S) -> (Board, Option<Spawn>) {
    let empty = board.empty_cells();
    if empty.is_empty() {
        return (*board, None);
    }

    let index = source.pick_cell(empty.len()).min(empty.len() - 1);
    let (row, col) = empty[index];
    let value = match source.pick_value() {
        4 => 4,
        _ => 2,
    };
    trace!(row, col, value, "Tile spawned");

    (board.with_tile(row, col, value), Some(Spawn { row, col, value }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedTiles;

    #[test]
    fn test_spawn_on_full_board_is_noop() {
        let board = Board::from_rows([
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 2],
        ])
        .unwrap();
        let mut tiles = ScriptedTiles::new([(0, 4)]);
        let (after, spawn) = spawn_tile(&board, &mut tiles);
        assert_eq!(after, board);
        assert_eq!(spawn, None);
        assert_eq!(tiles.remaining(), 1, "no randomness consumed");
    }

    #[test]
    fn test_spawn_picks_nth_empty_cell_row_major() {
        let board = Board::from_rows([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let mut tiles = ScriptedTiles::new([(2, 4)]);
        let (after, spawn) = spawn_tile(&board, &mut tiles);
        assert_eq!(spawn, Some(Spawn { row: 0, col: 3, value: 4 }));
        assert_eq!(after.get(0, 3), 4);
        assert_eq!(after.tile_sum(), board.tile_sum() + 4);
    }
}
