//! Plausibility checks for submitted runs.
//!
//! These are thresholds on what the client claims, not a proof: a caller
//! can still forge every field within the accepted ranges.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strictly_2048::{Board, CompletedRun, SIZE, SessionToken, WIN_TILE, rules};
use tracing::{debug, instrument, warn};

use crate::ErrorKind;

/// Fastest plausible time to reach the winning tile.
pub const MIN_COMPLETION_TIME_MS: i64 = 5_000;

/// Fewest plausible moves to reach the winning tile.
pub const MIN_MOVE_COUNT: i64 = 50;

/// A finished run as claimed by the client.
///
/// Fields are deliberately loose (signed, unshaped) so that malformed
/// values reach [`validate`] and get a specific rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCandidate {
    /// Token minted when the run started.
    pub session_token: String,
    /// Claimed milliseconds from first move to first win.
    pub completion_time_ms: i64,
    /// Claimed number of accepted moves.
    pub move_count: i64,
    /// Claimed final board, rows of cells.
    pub final_board: Vec<Vec<i64>>,
}

impl From<CompletedRun> for ScoreCandidate {
    fn from(run: CompletedRun) -> Self {
        Self {
            session_token: run.session_token.into(),
            completion_time_ms: i64::try_from(run.completion_time_ms).unwrap_or(i64::MAX),
            move_count: i64::from(run.move_count),
            final_board: run
                .final_board
                .rows()
                .iter()
                .map(|row| row.iter().map(|&v| i64::from(v)).collect())
                .collect(),
        }
    }
}

impl ScoreCandidate {
    /// Reads a candidate from an untyped JSON body.
    ///
    /// Type errors are reported in the same order [`validate`] checks
    /// fields, with the same kinds: a token that is not a string is an
    /// invalid token, and a board that is not a grid of integers is an
    /// invalid board. Non-integer time or move count is a malformed
    /// request. Unknown fields (such as `action`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let Some(fields) = body.as_object() else {
            return Err(malformed("body", "expected a JSON object"));
        };

        let session_token = fields
            .get("sessionToken")
            .and_then(Value::as_str)
            .ok_or(ValidationError::InvalidSessionToken)?
            .to_string();
        let completion_time_ms = integer_field(fields.get("completionTimeMs"), "completionTimeMs")?;
        let move_count = integer_field(fields.get("moveCount"), "moveCount")?;

        match board_rows(fields.get("finalBoard")) {
            Ok(final_board) => Ok(Self::new(session_token, completion_time_ms, move_count, final_board)),
            Err(board_error) => {
                check_scalars(&session_token, completion_time_ms, move_count)?;
                Err(board_error)
            }
        }
    }
}

fn malformed(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::MalformedRequest {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn integer_field(value: Option<&Value>, field: &str) -> Result<i64, ValidationError> {
    match value {
        Some(v) => v.as_i64().ok_or_else(|| malformed(field, format!("expected an integer, got {}", v))),
        None => Err(malformed(field, "missing")),
    }
}

fn board_rows(value: Option<&Value>) -> Result<Vec<Vec<i64>>, ValidationError> {
    let rows = value
        .ok_or_else(|| invalid_board("finalBoard is missing"))?
        .as_array()
        .ok_or_else(|| invalid_board("finalBoard is not an array of rows"))?;

    rows.iter()
        .enumerate()
        .map(|(r, row)| -> Result<Vec<i64>, ValidationError> {
            let cells = row
                .as_array()
                .ok_or_else(|| invalid_board(format!("row {} is not an array", r)))?;
            cells
                .iter()
                .enumerate()
                .map(|(c, cell)| {
                    cell.as_i64()
                        .ok_or_else(|| invalid_board(format!("cell ({}, {}) holds {}", r, c, cell)))
                })
                .collect()
        })
        .collect()
}

/// A candidate that passed every check.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ValidScore {
    session_token: SessionToken,
    completion_time_ms: i64,
    move_count: i64,
    final_board: Board,
}

/// A failed plausibility check.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ValidationError {
    /// Token is not 32 lowercase hex characters.
    #[display("Session token is malformed")]
    InvalidSessionToken,
    /// Completed faster than humanly plausible.
    #[display("Completion time {actual}ms is below the {}ms minimum", MIN_COMPLETION_TIME_MS)]
    TimeTooShort {
        /// Claimed time.
        actual: i64,
    },
    /// Fewer moves than reaching the winning tile takes.
    #[display("Move count {actual} is below the minimum of {}", MIN_MOVE_COUNT)]
    MoveCountTooLow {
        /// Claimed move count.
        actual: i64,
    },
    /// Not a 4x4 grid of empty cells and powers of two.
    #[display("Final board is invalid: {reason}")]
    InvalidBoardState {
        /// What is wrong with the board.
        reason: String,
    },
    /// No cell holds the winning tile.
    #[display("Final board has no {} tile", WIN_TILE)]
    NoWinTile,
    /// A field has the wrong JSON type or is missing.
    #[display("Field {field} is malformed: {reason}")]
    MalformedRequest {
        /// Offending field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ValidationError {
    /// Wire-level kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::InvalidSessionToken => ErrorKind::InvalidSessionToken,
            ValidationError::TimeTooShort { .. } => ErrorKind::TimeTooShort,
            ValidationError::MoveCountTooLow { .. } => ErrorKind::MoveCountTooLow,
            ValidationError::InvalidBoardState { .. } => ErrorKind::InvalidBoardState,
            ValidationError::NoWinTile => ErrorKind::NoWinTile,
            ValidationError::MalformedRequest { .. } => ErrorKind::MalformedRequest,
        }
    }
}

fn invalid_board(reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidBoardState {
        reason: reason.into(),
    }
}

/// Converts loose rows into a [`Board`], checking shape and tile values.
fn parse_board(rows: &[Vec<i64>]) -> Result<Board, ValidationError> {
    if rows.len() != SIZE {
        return Err(invalid_board(format!("expected {} rows, got {}", SIZE, rows.len())));
    }

    let mut cells = [[0u32; SIZE]; SIZE];
    for (r, row) in rows.iter().enumerate() {
        if row.len() != SIZE {
            return Err(invalid_board(format!(
                "row {} has {} cells, expected {}",
                r,
                row.len(),
                SIZE
            )));
        }
        for (c, &value) in row.iter().enumerate() {
            cells[r][c] = u32::try_from(value).map_err(|_| {
                invalid_board(format!("cell ({}, {}) holds {}", r, c, value))
            })?;
        }
    }

    Board::from_rows(cells).map_err(|e| invalid_board(e.to_string()))
}

/// Checks a candidate. All checks must pass; the first failure is
/// reported, in this order: token, time, moves, board shape, win tile.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
#[instrument(skip(candidate), fields(
    session_token = %candidate.session_token,
    completion_time_ms = candidate.completion_time_ms,
    move_count = candidate.move_count,
))]
pub fn validate(candidate: &ScoreCandidate) -> Result<ValidScore, ValidationError> {
    let result = check(candidate);
    match &result {
        Ok(_) => debug!("Candidate passed validation"),
        Err(e) => warn!(kind = %e.kind(), error = %e, "Candidate rejected"),
    }
    result
}

/// Token, time and move checks, in that order.
fn check_scalars(token: &str, completion_time_ms: i64, move_count: i64) -> Result<SessionToken, ValidationError> {
    let session_token = SessionToken::parse(token).map_err(|_| ValidationError::InvalidSessionToken)?;

    if completion_time_ms < MIN_COMPLETION_TIME_MS {
        return Err(ValidationError::TimeTooShort {
            actual: completion_time_ms,
        });
    }

    if move_count < MIN_MOVE_COUNT {
        return Err(ValidationError::MoveCountTooLow { actual: move_count });
    }

    Ok(session_token)
}

fn check(candidate: &ScoreCandidate) -> Result<ValidScore, ValidationError> {
    let session_token = check_scalars(
        &candidate.session_token,
        candidate.completion_time_ms,
        candidate.move_count,
    )?;

    let final_board = parse_board(&candidate.final_board)?;
    if !rules::is_win(&final_board) {
        return Err(ValidationError::NoWinTile);
    }

    Ok(ValidScore {
        session_token,
        completion_time_ms: candidate.completion_time_ms,
        move_count: candidate.move_count,
        final_board,
    })
}
