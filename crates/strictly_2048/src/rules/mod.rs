//! Game rules for 2048.
//!
//! Pure functions over [`Board`](crate::Board) values. The run state
//! machine in [`Run`](crate::Run) composes them; nothing here keeps state.

pub mod slide;
pub mod spawn;
pub mod terminal;
pub mod win;

pub use slide::{apply_move, has_changed, orient, slide_row_left};
pub use spawn::spawn_tile;
pub use terminal::{has_moves, is_terminal};
pub use win::is_win;
