//! Database models.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use strictly_2048::Board;
use tracing::instrument;

use crate::db::{DbError, schema};

/// Account known to the leaderboard.
///
/// Accounts are owned by the external identity provider; this table only
/// maps the provider's account id to the nickname shown on the board.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::accounts)]
pub struct Account {
    id: i32,
    nickname: String,
    created_at: NaiveDateTime,
}

/// Insertable account.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::accounts)]
pub struct NewAccount {
    nickname: String,
}

/// A stored, accepted submission. Never updated or deleted.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::scores)]
pub struct ScoreRecord {
    id: i32,
    account_id: Option<i32>,
    identity_fingerprint: String,
    session_token: String,
    completion_time_ms: i64,
    move_count: i64,
    final_board: String,
    created_at: NaiveDateTime,
}

impl ScoreRecord {
    /// Decodes the stored final board.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored JSON is not a valid board.
    #[instrument(skip(self), fields(score_id = self.id))]
    pub fn board(&self) -> Result<Board, DbError> {
        Ok(serde_json::from_str(&self.final_board)?)
    }

    /// Whether the record is linked to an account (and therefore ranked).
    pub fn is_ranked(&self) -> bool {
        self.account_id.is_some()
    }
}

/// Insertable score record.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::scores)]
pub struct NewScoreRecord {
    account_id: Option<i32>,
    identity_fingerprint: String,
    session_token: String,
    completion_time_ms: i64,
    move_count: i64,
    final_board: String,
    created_at: NaiveDateTime,
}
