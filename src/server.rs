//! HTTP surface: score submission, leaderboard and history.

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{Extensions, HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::identity::{Identity, IdentityResolver, TrustedHeaderIdentity};
use crate::ranking::{HistoryEntry, LeaderboardEntry, RankingService};
use crate::submission::{RankResult, SubmissionPipeline};
use crate::validation::ScoreCandidate;
use crate::{ErrorKind, ScoreRepository, ServiceConfig, SubmissionError};

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pipeline: SubmissionPipeline,
    ranking: RankingService,
    identity: Arc<dyn IdentityResolver>,
    allowed_origins: Arc<Vec<String>>,
}

impl AppState {
    /// Builds state over one repository.
    pub fn new(
        repository: ScoreRepository,
        identity: Arc<dyn IdentityResolver>,
        allowed_origins: Vec<String>,
    ) -> Self {
        Self {
            pipeline: SubmissionPipeline::new(repository.clone()),
            ranking: RankingService::new(repository),
            identity,
            allowed_origins: Arc::new(allowed_origins),
        }
    }

    /// Builds state from configuration, trusting the configured account header.
    pub fn from_config(repository: ScoreRepository, config: &ServiceConfig) -> Self {
        Self::new(
            repository,
            Arc::new(TrustedHeaderIdentity::new(config.account_header().clone())),
            config.allowed_origins().clone(),
        )
    }

    fn resolve(&self, headers: &HeaderMap, extensions: &Extensions) -> Identity {
        let peer = extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        self.identity.resolve(headers, peer)
    }

    fn origin_allowed(&self, headers: &HeaderMap) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        headers
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|origin| self.allowed_origins.iter().any(|o| o == origin))
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/scores", post(submit_score))
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/history", get(history))
        .route("/health", get(health))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────
//  Wire types
// ─────────────────────────────────────────────────────────────

/// Successful submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    ok: bool,
    #[serde(flatten)]
    result: RankResult,
}

/// `?limit=N` on the read endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LimitQuery {
    /// Requested number of rows; defaulted and clamped by the service.
    pub limit: Option<i64>,
}

/// Failure reported to the client as `{ok: false, error, message}`.
#[derive(Debug, Clone)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    ok: bool,
    error: ErrorKind,
    message: String,
}

const GENERIC_FAILURE: &str = "The score could not be recorded; please try again";

impl ApiError {
    fn persistence(detail: impl std::fmt::Display) -> Self {
        error!(error = %detail, "Persistence failure");
        Self {
            kind: ErrorKind::PersistenceFailure,
            message: GENERIC_FAILURE.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::DuplicateSubmission => StatusCode::CONFLICT,
            ErrorKind::UnauthorizedOrigin | ErrorKind::UnknownAccount => StatusCode::FORBIDDEN,
            ErrorKind::PersistenceFailure => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        let kind = err.kind();
        if !kind.is_client_error() {
            return Self::persistence(err);
        }
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            kind: ErrorKind::MalformedRequest,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            ok: false,
            error: self.kind,
            message: self.message,
        };
        (status, Json(body)).into_response()
    }
}

// ─────────────────────────────────────────────────────────────
//  Handlers
// ─────────────────────────────────────────────────────────────

#[instrument(skip_all)]
async fn submit_score(
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    if !state.origin_allowed(&headers) {
        warn!(origin = ?headers.get(header::ORIGIN), "Submission from disallowed origin");
        return Err(ApiError {
            kind: ErrorKind::UnauthorizedOrigin,
            message: "Submissions are not accepted from this origin".to_string(),
        });
    }
    let Json(body) = payload.inspect_err(|e| warn!(error = %e, "Unreadable submission body"))?;
    if let Some(action) = body.get("action").and_then(Value::as_str).filter(|a| *a != "submit") {
        debug!(action, "Ignoring unexpected action field");
    }
    let candidate = ScoreCandidate::from_json(&body).map_err(|e| {
        warn!(kind = %e.kind(), error = %e, "Submission body rejected");
        SubmissionError::from(e)
    })?;

    let identity = state.resolve(&headers, &extensions);
    debug!(session_token = %candidate.session_token, account_id = ?identity.account_id(), "Submission received");
    let pipeline = state.pipeline.clone();

    let result = tokio::task::spawn_blocking(move || pipeline.submit(&candidate, &identity))
        .await
        .map_err(ApiError::persistence)??;

    info!(rank = ?result.rank, "Submission accepted");
    Ok(Json(SubmitResponse { ok: true, result }))
}

#[instrument(skip_all)]
async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let ranking = state.ranking.clone();
    let entries = tokio::task::spawn_blocking(move || ranking.leaderboard(query.limit))
        .await
        .map_err(ApiError::persistence)?
        .map_err(ApiError::persistence)?;
    Ok(Json(entries))
}

#[instrument(skip_all)]
async fn history(
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let identity = state.resolve(&headers, &extensions);
    let ranking = state.ranking.clone();
    let entries = tokio::task::spawn_blocking(move || ranking.history(&identity, query.limit))
        .await
        .map_err(ApiError::persistence)?
        .map_err(ApiError::persistence)?;
    Ok(Json(entries))
}

async fn health() -> &'static str {
    "ok"
}
