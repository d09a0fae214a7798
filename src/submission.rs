//! Submission pipeline: validate, fingerprint, insert once, rank.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::db::{InsertOutcome, NewScoreRecord, ScoreRepository};
use crate::identity::Identity;
use crate::validation::{ScoreCandidate, validate};
use crate::SubmissionError;

/// Where a new record landed. All fields are `None` for guests, whose
/// records are stored but never ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResult {
    /// 1-based position among account-linked records.
    pub rank: Option<i64>,
    /// Number of account-linked records, this one included.
    pub total_entries: Option<i64>,
    /// No other record of the same account is strictly better.
    pub is_personal_best: Option<bool>,
}

impl RankResult {
    /// The result for a guest submission.
    pub fn unranked() -> Self {
        Self {
            rank: None,
            total_entries: None,
            is_personal_best: None,
        }
    }
}

/// Accepts finished runs.
///
/// Wraps [`ScoreRepository`]. Every call is blocking; async callers should
/// run it on a blocking thread.
#[derive(Debug, Clone)]
pub struct SubmissionPipeline {
    repository: ScoreRepository,
}

impl SubmissionPipeline {
    /// Creates a pipeline backed by the given repository.
    #[instrument(skip(repository))]
    pub fn new(repository: ScoreRepository) -> Self {
        info!("Creating SubmissionPipeline");
        Self { repository }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &ScoreRepository {
        &self.repository
    }

    /// Validates and stores a run, then ranks it.
    ///
    /// Nothing is written unless validation passes. The session token is
    /// claimed by a single constrained insert, so of several concurrent
    /// submissions with one token exactly one succeeds.
    ///
    /// # Errors
    ///
    /// - [`SubmissionError::Invalid`] if a plausibility check fails
    /// - [`SubmissionError::UnknownAccount`] if the identity names an
    ///   account that is not registered
    /// - [`SubmissionError::Duplicate`] if the token was already submitted
    /// - [`SubmissionError::Persistence`] if storage fails; retrying is safe
    #[instrument(skip(self, candidate, identity), fields(
        session_token = %candidate.session_token,
        account_id = ?identity.account_id(),
    ))]
    pub fn submit(
        &self,
        candidate: &ScoreCandidate,
        identity: &Identity,
    ) -> Result<RankResult, SubmissionError> {
        let score = validate(candidate)?;

        if let Some(account_id) = identity.account_id() {
            if self.repository.get_account(account_id)?.is_none() {
                warn!(account_id, "Submission from unregistered account rejected");
                return Err(SubmissionError::UnknownAccount { account_id });
            }
        }

        let final_board = serde_json::to_string(score.final_board()).map_err(crate::DbError::from)?;
        let record = NewScoreRecord::new(
            identity.account_id(),
            identity.fingerprint(),
            score.session_token().as_str().to_string(),
            *score.completion_time_ms(),
            *score.move_count(),
            final_board,
            Utc::now().naive_utc(),
        );

        let inserted = match self.repository.insert_score(&record)? {
            InsertOutcome::Inserted(inserted) => inserted,
            InsertOutcome::DuplicateToken => {
                warn!("Duplicate submission rejected");
                return Err(SubmissionError::Duplicate {
                    session_token: record.session_token().clone(),
                });
            }
            InsertOutcome::UnknownAccount => {
                return Err(SubmissionError::UnknownAccount {
                    account_id: identity.account_id().unwrap_or_default(),
                });
            }
        };

        if !inserted.is_ranked() {
            debug!(score_id = inserted.id(), "Guest score stored unranked");
            return Ok(RankResult::unranked());
        }

        let counts = self.repository.rank_counts(&inserted)?;
        let result = RankResult {
            rank: Some(counts.better + 1),
            total_entries: Some(counts.total),
            is_personal_best: Some(counts.better_own == 0),
        };
        info!(
            score_id = inserted.id(),
            rank = counts.better + 1,
            total = counts.total,
            personal_best = counts.better_own == 0,
            "Score accepted"
        );
        Ok(result)
    }
}
