//! Error kinds surfaced to callers of the leaderboard.

use derive_more::{Display, Error, From};
use serde::Serialize;

use crate::db::DbError;
use crate::validation::ValidationError;

/// Every failure a submission can report, by its wire name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::IntoStaticStr,
)]
pub enum ErrorKind {
    /// Session token is not a well-formed token.
    InvalidSessionToken,
    /// Completion time is below the plausibility floor.
    TimeTooShort,
    /// Move count is below the plausibility floor.
    MoveCountTooLow,
    /// Final board is not a 4x4 grid of valid tiles.
    InvalidBoardState,
    /// Final board holds no winning tile.
    NoWinTile,
    /// The session token was already submitted.
    DuplicateSubmission,
    /// Storage failed; safe to retry because submissions are keyed by token.
    PersistenceFailure,
    /// Request came from an origin that may not submit.
    UnauthorizedOrigin,
    /// Body is not JSON, or a field has the wrong type.
    MalformedRequest,
    /// The caller claims an account the leaderboard does not know.
    UnknownAccount,
}

impl ErrorKind {
    /// Client errors are reported with their specific message; server
    /// errors get a generic one.
    pub fn is_client_error(self) -> bool {
        !matches!(self, ErrorKind::PersistenceFailure)
    }
}

/// Why a submission was not recorded.
#[derive(Debug, Clone, Display, Error, From)]
pub enum SubmissionError {
    /// Failed plausibility checks; nothing was written.
    #[display("{_0}")]
    Invalid(ValidationError),
    /// The token is already stored; nothing was written.
    #[display("Session {session_token} was already submitted")]
    #[from(skip)]
    Duplicate {
        /// The repeated token.
        session_token: String,
    },
    /// The account id is not registered; nothing was written.
    #[display("Account {account_id} is not registered")]
    #[from(skip)]
    UnknownAccount {
        /// The unregistered id.
        account_id: i32,
    },
    /// Storage failed.
    #[display("{_0}")]
    Persistence(DbError),
}

impl SubmissionError {
    /// Wire-level kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmissionError::Invalid(e) => e.kind(),
            SubmissionError::Duplicate { .. } => ErrorKind::DuplicateSubmission,
            SubmissionError::UnknownAccount { .. } => ErrorKind::UnknownAccount,
            SubmissionError::Persistence(_) => ErrorKind::PersistenceFailure,
        }
    }
}
