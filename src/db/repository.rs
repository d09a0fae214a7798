//! Database repository for accounts and score records.

use diesel::connection::SimpleConnection;
use diesel::dsl::count_star;
use diesel::expression::BoxableExpression;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Bool;
use diesel::sqlite::Sqlite;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument, warn};

use crate::db::schema::{accounts, scores};
use crate::db::{Account, DbError, NewAccount, NewScoreRecord, ScoreRecord};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long a connection waits for a competing writer before failing.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Result of the constrained insert.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// The record was written.
    Inserted(ScoreRecord),
    /// A record with the same session token already exists; nothing was written.
    DuplicateToken,
    /// The record names an account that does not exist; nothing was written.
    UnknownAccount,
}

/// Counts needed to rank a freshly inserted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankCounts {
    /// Ranked records strictly better than the inserted one.
    pub better: i64,
    /// All ranked records, the inserted one included.
    pub total: i64,
    /// Other records of the same account strictly better than the inserted one.
    pub better_own: i64,
}

/// Strictly better under the leaderboard order: faster, or as fast with fewer moves.
fn strictly_better(
    completion_time_ms: i64,
    move_count: i64,
) -> Box<dyn BoxableExpression<scores::table, Sqlite, SqlType = Bool>> {
    Box::new(
        scores::completion_time_ms.lt(completion_time_ms).or(scores::completion_time_ms
            .eq(completion_time_ms)
            .and(scores::move_count.lt(move_count))),
    )
}

/// Database repository for the leaderboard.
///
/// Opens one SQLite connection per operation, so the repository is cheap to
/// clone into request handlers and blocking tasks.
#[derive(Debug, Clone)]
pub struct ScoreRepository {
    db_path: String,
}

impl ScoreRepository {
    /// Creates a repository for the database at the given path.
    ///
    /// No connection is opened here; call [`ScoreRepository::initialize`]
    /// once at startup to provision the schema.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path must not be empty"));
        }
        info!(path = %db_path, "Creating ScoreRepository");
        Ok(Self { db_path })
    }

    /// Returns the database path.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection that waits on competing writers
    /// and enforces foreign keys.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))?;
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            BUSY_TIMEOUT_MS
        ))?;
        Ok(conn)
    }

    /// Applies pending migrations and enables WAL journaling.
    ///
    /// Runs once at service startup (or from the `migrate` command), never
    /// on the request path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn initialize(&self) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        conn.batch_execute("PRAGMA journal_mode = WAL;")?;

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;

        info!(applied = applied.len(), path = %self.db_path, "Schema initialized");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    //  Accounts
    // ─────────────────────────────────────────────────────────────

    /// Registers an account nickname.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the nickname is taken or a database error occurs.
    #[instrument(skip(self))]
    pub fn create_account(&self, nickname: String) -> Result<Account, DbError> {
        debug!(nickname = %nickname, "Creating account");
        let mut conn = self.connection()?;

        let account = diesel::insert_into(accounts::table)
            .values(&NewAccount::new(nickname))
            .returning(Account::as_returning())
            .get_result(&mut conn)?;

        info!(account_id = account.id(), nickname = %account.nickname(), "Account created");
        Ok(account)
    }

    /// Gets an account by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_account(&self, account_id: i32) -> Result<Option<Account>, DbError> {
        let mut conn = self.connection()?;
        let account = accounts::table
            .find(account_id)
            .select(Account::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(account)
    }

    /// Gets an account by nickname. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_account_by_nickname(&self, nickname: &str) -> Result<Option<Account>, DbError> {
        debug!(nickname = %nickname, "Looking up account by nickname");
        let mut conn = self.connection()?;

        let account = accounts::table
            .filter(accounts::nickname.eq(nickname))
            .select(Account::as_select())
            .first(&mut conn)
            .optional()?;

        if account.is_none() {
            debug!("Account not found");
        }
        Ok(account)
    }

    /// Loads the accounts with the given ids, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub fn get_accounts(&self, ids: &[i32]) -> Result<Vec<Account>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.connection()?;
        let found = accounts::table
            .filter(accounts::id.eq_any(ids))
            .select(Account::as_select())
            .load(&mut conn)?;
        Ok(found)
    }

    // ─────────────────────────────────────────────────────────────
    //  Scores
    // ─────────────────────────────────────────────────────────────

    /// Inserts a score unless its session token is already stored.
    ///
    /// The uniqueness constraint on `session_token` decides: the insert is a
    /// single `ON CONFLICT DO NOTHING` statement, so concurrent submissions of
    /// the same token produce exactly one row. An `account_id` without an
    /// `accounts` row fails the foreign key and writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on any database failure other than the conflict
    /// or the foreign key.
    #[instrument(skip(self, score), fields(session_token = %score.session_token(), account_id = ?score.account_id()))]
    pub fn insert_score(&self, score: &NewScoreRecord) -> Result<InsertOutcome, DbError> {
        debug!("Inserting score");
        let mut conn = self.connection()?;

        let result = diesel::insert_into(scores::table)
            .values(score)
            .on_conflict(scores::session_token)
            .do_nothing()
            .returning(ScoreRecord::as_returning())
            .get_result(&mut conn)
            .optional();

        match result {
            Ok(Some(record)) => {
                info!(score_id = record.id(), "Score recorded");
                Ok(InsertOutcome::Inserted(record))
            }
            Ok(None) | Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                warn!("Duplicate session token; nothing written");
                Ok(InsertOutcome::DuplicateToken)
            }
            Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
                warn!("Score names an unknown account; nothing written");
                Ok(InsertOutcome::UnknownAccount)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Looks up a record by session token.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn find_by_session_token(&self, session_token: &str) -> Result<Option<ScoreRecord>, DbError> {
        let mut conn = self.connection()?;
        let record = scores::table
            .filter(scores::session_token.eq(session_token))
            .select(ScoreRecord::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(record)
    }

    /// Counts every stored record, ranked or anonymous.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn count_scores(&self) -> Result<i64, DbError> {
        let mut conn = self.connection()?;
        Ok(scores::table.select(count_star()).first(&mut conn)?)
    }

    /// Computes the counts that rank `record` among account-linked records.
    ///
    /// Reads only committed, immutable rows, so no locking is needed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, record), fields(score_id = record.id()))]
    pub fn rank_counts(&self, record: &ScoreRecord) -> Result<RankCounts, DbError> {
        let mut conn = self.connection()?;
        let time = *record.completion_time_ms();
        let moves = *record.move_count();

        let better = scores::table
            .filter(scores::account_id.is_not_null())
            .filter(strictly_better(time, moves))
            .count()
            .get_result::<i64>(&mut conn)?;

        let total = scores::table
            .filter(scores::account_id.is_not_null())
            .count()
            .get_result::<i64>(&mut conn)?;

        let better_own = match record.account_id() {
            Some(account_id) => scores::table
                .filter(scores::account_id.eq(*account_id))
                .filter(scores::id.ne(*record.id()))
                .filter(strictly_better(time, moves))
                .count()
                .get_result::<i64>(&mut conn)?,
            None => 0,
        };

        let counts = RankCounts {
            better,
            total,
            better_own,
        };
        debug!(?counts, "Rank counts computed");
        Ok(counts)
    }

    /// Best account-linked records: fastest first, fewer moves on ties,
    /// insertion order among exact ties.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn top_ranked(&self, limit: i64) -> Result<Vec<ScoreRecord>, DbError> {
        let mut conn = self.connection()?;
        let records = scores::table
            .filter(scores::account_id.is_not_null())
            .order((
                scores::completion_time_ms.asc(),
                scores::move_count.asc(),
                scores::id.asc(),
            ))
            .limit(limit)
            .select(ScoreRecord::as_select())
            .load(&mut conn)?;

        info!(count = records.len(), "Leaderboard loaded");
        Ok(records)
    }

    /// Most recent records of one account, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn recent_for_account(&self, account_id: i32, limit: i64) -> Result<Vec<ScoreRecord>, DbError> {
        let mut conn = self.connection()?;
        let records = scores::table
            .filter(scores::account_id.eq(account_id))
            .order((scores::created_at.desc(), scores::id.desc()))
            .limit(limit)
            .select(ScoreRecord::as_select())
            .load(&mut conn)?;

        info!(account_id, count = records.len(), "History loaded");
        Ok(records)
    }
}
