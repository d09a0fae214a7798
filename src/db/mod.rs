//! Database persistence layer for accounts and finished runs.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::DbError;
pub use models::{Account, NewAccount, NewScoreRecord, ScoreRecord};
pub use repository::{InsertOutcome, RankCounts, ScoreRepository};
