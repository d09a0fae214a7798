//! Strictly Scores - a time-ranked 2048 leaderboard
//!
//! Players race to the 2048 tile; the fastest verified runs are ranked.
//! The board rules and run bookkeeping live in [`strictly_2048`]; this
//! crate checks, stores and ranks finished runs.
//!
//! # Architecture
//!
//! - **Validation**: plausibility checks on a claimed run
//! - **Submission**: validate, fingerprint, insert once per session token, rank
//! - **Ranking**: leaderboard and personal history queries
//! - **Database**: diesel/SQLite persistence with embedded migrations
//! - **Server**: axum HTTP endpoints
//!
//! # Example
//!
//! ```no_run
//! use strictly_scores::{Identity, ScoreCandidate, ScoreRepository, SubmissionPipeline};
//!
//! # fn example() -> anyhow::Result<()> {
//! let repository = ScoreRepository::new("scores.db".to_string())?;
//! repository.initialize()?;
//!
//! let pipeline = SubmissionPipeline::new(repository);
//! let candidate = ScoreCandidate::new(
//!     "0123456789abcdef0123456789abcdef".to_string(),
//!     93_250,
//!     512,
//!     vec![vec![2048, 4, 2, 0], vec![0; 4], vec![0; 4], vec![0; 4]],
//! );
//! let result = pipeline.submit(&candidate, &Identity::Account(1))?;
//! println!("rank {:?} of {:?}", result.rank, result.total_entries);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod db;
mod error;
mod identity;
mod ranking;
mod server;
mod submission;
mod validation;

// Crate-level exports - Configuration
pub use config::{ConfigError, ENV_DATABASE, ENV_HOST, ENV_PORT, ServiceConfig};

// Crate-level exports - Database
pub use db::{Account, DbError, InsertOutcome, NewAccount, NewScoreRecord, RankCounts, ScoreRecord, ScoreRepository};

// Crate-level exports - Errors
pub use error::{ErrorKind, SubmissionError};

// Crate-level exports - Identity
pub use identity::{DEFAULT_ACCOUNT_HEADER, Identity, IdentityResolver, TrustedHeaderIdentity};

// Crate-level exports - Ranking
pub use ranking::{
    DEFAULT_HISTORY_LIMIT, DEFAULT_LEADERBOARD_LIMIT, HistoryEntry, LeaderboardEntry, MAX_HISTORY_LIMIT,
    MAX_LEADERBOARD_LIMIT, RankingService, clamp_limit, format_time_ms,
};

// Crate-level exports - Server
pub use server::{ApiError, AppState, LimitQuery, router};

// Crate-level exports - Submission
pub use submission::{RankResult, SubmissionPipeline};

// Crate-level exports - Validation
pub use validation::{MIN_COMPLETION_TIME_MS, MIN_MOVE_COUNT, ScoreCandidate, ValidScore, ValidationError, validate};
