//! Read side of the leaderboard.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::db::{DbError, ScoreRecord, ScoreRepository};
use crate::identity::Identity;

/// Leaderboard size when the caller names none.
pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 50;
/// Largest leaderboard a caller may request.
pub const MAX_LEADERBOARD_LIMIT: i64 = 100;
/// History size when the caller names none.
pub const DEFAULT_HISTORY_LIMIT: i64 = 10;
/// Longest history a caller may request.
pub const MAX_HISTORY_LIMIT: i64 = 50;

/// Applies the default and clamps into `1..=max`.
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max)
}

/// Formats milliseconds as `M:SS.mmm`. Minutes are not capped.
///
/// ```
/// assert_eq!(strictly_scores::format_time_ms(65_250), "1:05.250");
/// ```
pub fn format_time_ms(ms: i64) -> String {
    let ms = ms.max(0);
    let minutes = ms / 60_000;
    let seconds = (ms / 1_000) % 60;
    let millis = ms % 1_000;
    format!("{}:{:02}.{:03}", minutes, seconds, millis)
}

/// One row of the public leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: i64,
    /// Display name of the account.
    pub nickname: String,
    /// Formatted completion time.
    pub time: String,
    /// Completion time in milliseconds.
    pub time_ms: i64,
    /// Moves made.
    pub moves: i64,
    /// When the score was recorded (UTC).
    pub created_at: NaiveDateTime,
}

/// One row of a personal history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Formatted completion time.
    pub time: String,
    /// Completion time in milliseconds.
    pub time_ms: i64,
    /// Moves made.
    pub moves: i64,
    /// When the score was recorded (UTC).
    pub created_at: NaiveDateTime,
}

impl From<&ScoreRecord> for HistoryEntry {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            time: format_time_ms(*record.completion_time_ms()),
            time_ms: *record.completion_time_ms(),
            moves: *record.move_count(),
            created_at: *record.created_at(),
        }
    }
}

/// Leaderboard and history queries.
#[derive(Debug, Clone)]
pub struct RankingService {
    repository: ScoreRepository,
}

impl RankingService {
    /// Creates a service backed by the given repository.
    pub fn new(repository: ScoreRepository) -> Self {
        Self { repository }
    }

    /// Best account-linked scores, fastest first and fewer moves on ties.
    ///
    /// `limit` defaults to 50 and is clamped to `1..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn leaderboard(&self, limit: Option<i64>) -> Result<Vec<LeaderboardEntry>, DbError> {
        let limit = clamp_limit(limit, DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT);
        let records = self.repository.top_ranked(limit)?;

        let mut ids: Vec<i32> = records.iter().filter_map(|r| *r.account_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        let nicknames: HashMap<i32, String> = self
            .repository
            .get_accounts(&ids)?
            .into_iter()
            .map(|a| (*a.id(), a.nickname().clone()))
            .collect();

        let entries: Vec<LeaderboardEntry> = records
            .iter()
            .enumerate()
            .map(|(i, record)| LeaderboardEntry {
                rank: i as i64 + 1,
                nickname: record
                    .account_id()
                    .and_then(|id| nicknames.get(&id).cloned())
                    .unwrap_or_default(),
                time: format_time_ms(*record.completion_time_ms()),
                time_ms: *record.completion_time_ms(),
                moves: *record.move_count(),
                created_at: *record.created_at(),
            })
            .collect();

        debug!(limit, count = entries.len(), "Leaderboard built");
        Ok(entries)
    }

    /// Most recent scores of the caller, newest first. Guests have none.
    ///
    /// `limit` defaults to 10 and is clamped to `1..=50`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self), fields(account_id = ?identity.account_id()))]
    pub fn history(&self, identity: &Identity, limit: Option<i64>) -> Result<Vec<HistoryEntry>, DbError> {
        let Some(account_id) = identity.account_id() else {
            debug!("Guest has no history");
            return Ok(Vec::new());
        };
        let limit = clamp_limit(limit, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT);
        let records = self.repository.recent_for_account(account_id, limit)?;
        Ok(records.iter().map(HistoryEntry::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 50, 100), 50);
        assert_eq!(clamp_limit(Some(0), 50, 100), 1);
        assert_eq!(clamp_limit(Some(-9), 10, 50), 1);
        assert_eq!(clamp_limit(Some(1_000), 50, 100), 100);
        assert_eq!(clamp_limit(Some(25), 10, 50), 25);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time_ms(0), "0:00.000");
        assert_eq!(format_time_ms(5_000), "0:05.000");
        assert_eq!(format_time_ms(65_250), "1:05.250");
        assert_eq!(format_time_ms(73 * 60_000), "73:00.000");
        assert_eq!(format_time_ms(599_999), "9:59.999");
    }
}
