//! Pure 2048 board logic with an explicit run state machine.
//!
//! This crate has no I/O: randomness is supplied through [`TileSource`]
//! and time through [`Clock`], so every transition can be replayed
//! deterministically in tests.
//!
//! # Architecture
//!
//! - **Board**: 4x4 grid of tiles, always `0` or a power of two
//! - **Rules**: slide/merge, spawn, win and terminal detection
//! - **Run**: one played session (move counting, frozen elapsed time)
//!
//! # Example
//!
//! ```
//! use strictly_2048::{Board, Direction, ScriptedTiles, rules};
//!
//! let board = Board::from_rows([
//!     [2, 2, 0, 0],
//!     [0, 0, 0, 0],
//!     [0, 0, 0, 0],
//!     [0, 0, 0, 4],
//! ])
//! .unwrap();
//!
//! let moved = rules::apply_move(&board, Direction::Left);
//! assert_eq!(moved.get(0, 0), 4);
//! assert!(rules::has_changed(&board, &moved));
//!
//! let mut tiles = ScriptedTiles::new([(0, 2)]);
//! let (_spawned_board, spawn) = rules::spawn_tile(&moved, &mut tiles);
//! assert!(spawn.is_some());
//! ```
//!
//! A played run draws tiles from the thread-local generator:
//!
//! ```
//! use strictly_2048::{Direction, RandomTiles, Run, RunPhase, SessionToken};
//!
//! let token = SessionToken::generate(&mut rand::thread_rng());
//! let mut run = Run::start(token, RandomTiles::thread());
//! assert_eq!(run.board().empty_cells().len(), 14);
//!
//! for direction in Direction::ALL {
//!     run.make_move(direction);
//! }
//! assert_ne!(run.phase(), RunPhase::Idle);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod clock;
mod direction;
pub mod rules;
mod run;
mod spawn;
mod token;

pub use board::{Board, BoardError, MAX_TILE, SIZE, WIN_TILE};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use direction::Direction;
pub use run::{CompletedRun, MoveOutcome, MoveRejection, Run, RunPhase};
pub use spawn::{RandomTiles, ScriptedTiles, Spawn, TileSource};
pub use token::{SessionToken, TOKEN_LEN, TokenError};
