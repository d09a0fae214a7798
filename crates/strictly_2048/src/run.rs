//! Run coordinator: one played session from first move to submission.
//!
//! A run owns its board, a spawn source and a clock. The phase is derived
//! from set-once flags rather than encoded in the type, because a won run
//! keeps accepting moves until it is submitted or gets stuck.
//!
//! ```text
//! Idle --first accepted move--> InProgress --2048 appears--> Won
//!                                    |                        |
//!                                    +--no legal moves--> Lost <+
//! ```

use crate::rules;
use crate::{Board, Clock, Direction, MonotonicClock, SessionToken, Spawn, TileSource};
use derive_more::Display;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Observable phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum RunPhase {
    /// No move accepted yet; the clock has not started.
    Idle,
    /// Playing, not yet won.
    InProgress,
    /// The winning tile has appeared. Play may continue.
    Won,
    /// No legal move remains. Takes precedence over `Won`.
    Lost,
}

/// Why a move was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum MoveRejection {
    /// The run is stuck.
    #[display("run is lost")]
    Lost,
    /// The winning board was already submitted.
    #[display("run was already submitted")]
    AlreadySubmitted,
    /// Sliding in that direction changes nothing.
    #[display("move does not change the board")]
    Unchanged,
}

/// Result of [`Run::make_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The board changed, the move was counted and a tile spawned.
    Accepted {
        /// The spawned tile; `None` only if the slide left no empty cell.
        spawned: Option<Spawn>,
        /// This move produced the first winning tile of the run.
        reached_win: bool,
        /// This move left the board stuck.
        lost: bool,
    },
    /// Nothing happened.
    Rejected(MoveRejection),
}

impl MoveOutcome {
    /// Whether the move was applied.
    pub fn is_accepted(&self) -> bool {
        matches!(self, MoveOutcome::Accepted { .. })
    }
}

/// Snapshot of a won run, ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRun {
    /// Token minted at run start.
    pub session_token: SessionToken,
    /// Time from first accepted move to first win.
    pub completion_time_ms: u64,
    /// Accepted moves so far, including moves made after winning.
    pub move_count: u32,
    /// Board at the time of the snapshot.
    pub final_board: Board,
}

/// One played session.
///
/// Elapsed time freezes at the first win while play may continue, so the
/// board in [`Run::completion`] can be larger than the board at the moment
/// the time was taken. Submitting the run stops further moves.
#[derive(Debug)]
pub struct Run<S, C = MonotonicClock> {
    token: SessionToken,
    board: Board,
    tiles: S,
    clock: C,
    move_count: u32,
    started_at: Option<Instant>,
    frozen_elapsed: Option<Duration>,
    has_won: bool,
    has_lost: bool,
    submitted: bool,
}

// ─────────────────────────────────────────────────────────────
//  Construction
// ─────────────────────────────────────────────────────────────

impl<S: TileSource> Run<S, MonotonicClock> {
    /// Starts a run on the system monotonic clock.
    pub fn start(token: SessionToken, tiles: S) -> Self {
        Self::start_with_clock(token, tiles, MonotonicClock)
    }
}

impl<S: TileSource, C: Clock> Run<S, C> {
    /// Starts a run: an empty board with two spawned tiles.
    #[instrument(skip(tiles, clock), fields(session_token = %token))]
    pub fn start_with_clock(token: SessionToken, mut tiles: S, clock: C) -> Self {
        let (board, _) = rules::spawn_tile(&Board::new(), &mut tiles);
        let (board, _) = rules::spawn_tile(&board, &mut tiles);
        debug!(%board, "Run started");
        Self::from_board(token, board, tiles, clock)
    }

    /// Resumes play from a known board, in the `Idle` phase.
    pub fn from_board(token: SessionToken, board: Board, tiles: S, clock: C) -> Self {
        Self {
            token,
            board,
            tiles,
            clock,
            move_count: 0,
            started_at: None,
            frozen_elapsed: None,
            has_won: false,
            has_lost: false,
            submitted: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Transitions
// ─────────────────────────────────────────────────────────────

impl<S: TileSource, C: Clock> Run<S, C> {
    /// Slides the board, then spawns a tile and re-evaluates win and loss.
    ///
    /// Rejected moves have no side effects: no tile, no move counted, and
    /// the clock does not start.
    #[instrument(skip(self), fields(session_token = %self.token, moves = self.move_count))]
    pub fn make_move(&mut self, direction: Direction) -> MoveOutcome {
        if self.has_lost {
            return MoveOutcome::Rejected(MoveRejection::Lost);
        }
        if self.has_won && self.submitted {
            return MoveOutcome::Rejected(MoveRejection::AlreadySubmitted);
        }

        let moved = rules::apply_move(&self.board, direction);
        if !rules::has_changed(&self.board, &moved) {
            debug!("Move rejected: board unchanged");
            return MoveOutcome::Rejected(MoveRejection::Unchanged);
        }

        let started_at = match self.started_at {
            Some(at) => at,
            None => {
                let now = self.clock.now();
                self.started_at = Some(now);
                now
            }
        };
        self.move_count += 1;

        let (board, spawned) = rules::spawn_tile(&moved, &mut self.tiles);
        self.board = board;

        let mut reached_win = false;
        if !self.has_won && rules::is_win(&self.board) {
            let elapsed = self.clock.now().saturating_duration_since(started_at);
            self.has_won = true;
            self.frozen_elapsed = Some(elapsed);
            reached_win = true;
            info!(
                moves = self.move_count,
                elapsed_ms = duration_ms(elapsed),
                "Winning tile reached"
            );
        }

        if !reached_win && rules::is_terminal(&self.board) {
            self.has_lost = true;
            info!(moves = self.move_count, max_tile = self.board.max_tile(), "Run lost");
        }

        MoveOutcome::Accepted {
            spawned,
            reached_win,
            lost: self.has_lost,
        }
    }

    /// Milliseconds played: `None` before the first move, frozen after the first win.
    pub fn elapsed_ms(&self) -> Option<u64> {
        if let Some(frozen) = self.frozen_elapsed {
            return Some(duration_ms(frozen));
        }
        self.started_at
            .map(|start| duration_ms(self.clock.now().saturating_duration_since(start)))
    }

    /// The submittable snapshot of a won run that has not been submitted yet.
    pub fn completion(&self) -> Option<CompletedRun> {
        if !self.has_won || self.submitted {
            return None;
        }
        Some(CompletedRun {
            session_token: self.token.clone(),
            completion_time_ms: duration_ms(self.frozen_elapsed?),
            move_count: self.move_count,
            final_board: self.board,
        })
    }

    /// Records a successful submission. Returns `false` if the run was not
    /// won or was already submitted.
    #[instrument(skip(self), fields(session_token = %self.token))]
    pub fn mark_submitted(&mut self) -> bool {
        if !self.has_won || self.submitted {
            return false;
        }
        self.submitted = true;
        info!("Run submitted; further moves are rejected");
        true
    }
}

// ─────────────────────────────────────────────────────────────
//  Accessors
// ─────────────────────────────────────────────────────────────

impl<S, C> Run<S, C> {
    /// Token minted at run start.
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Accepted moves so far.
    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    /// Whether the winning tile has appeared at least once.
    pub fn has_won(&self) -> bool {
        self.has_won
    }

    /// Whether the run is stuck.
    pub fn has_lost(&self) -> bool {
        self.has_lost
    }

    /// Whether the run was submitted.
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        if self.has_lost {
            RunPhase::Lost
        } else if self.has_won {
            RunPhase::Won
        } else if self.started_at.is_some() {
            RunPhase::InProgress
        } else {
            RunPhase::Idle
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
