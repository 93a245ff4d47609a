//! # Storage Errors
//!
//! Every sqlx failure is sorted into a [`DbError`] variant before it leaves
//! this crate, so callers pick an HTTP status from the variant alone.
//!
//! ```text
//! sqlx::Error ──► DbError ──► ApiError (apps/api)
//!
//!  RowNotFound                      NotFound
//!  Database(kind = ForeignKey)      ForeignKeyViolation
//!  Database(code = 1811, FK msg)    ForeignKeyViolation
//!  Database(code = 5/6, BUSY)       Busy
//!  Database(other)                  QueryFailed
//!  PoolTimedOut                     PoolExhausted
//!  PoolClosed / Io / Tls            ConnectionFailed
//!  anything else                    Internal
//! ```

use sqlx::error::ErrorKind;
use thiserror::Error;

/// SQLite primary result codes for lock contention.
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

/// Extended code raised by `ON DELETE RESTRICT` actions.
const SQLITE_CONSTRAINT_TRIGGER: &str = "1811";
const FOREIGN_KEY_MESSAGE: &str = "FOREIGN KEY constraint failed";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// The addressed row does not exist.
    ///
    /// ## When This Occurs
    /// - UPDATE / DELETE matched nothing
    /// - `fetch_one` returned no rows
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A delete would orphan rows that still point at the target.
    ///
    /// ## When This Occurs
    /// - Deleting a product that appears in the ledger
    /// - Deleting a category that still has products
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A write names a related row that does not exist.
    ///
    /// ## When This Occurs
    /// - Creating or updating a product with an unknown `category_id`
    #[error("Referenced {entity} does not exist: {id}")]
    InvalidReference { entity: String, id: String },

    /// The database stayed locked for longer than `busy_timeout`.
    #[error("Database is busy: {0}")]
    Busy(String),

    /// The pool could not open or reach the database file.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite rejected a statement (constraint, syntax, I/O).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// BEGIN or COMMIT failed for a reason other than lock contention.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// No connection became free within `connect_timeout`.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn foreign_key(message: impl Into<String>) -> Self {
        DbError::ForeignKeyViolation {
            message: message.into(),
        }
    }

    pub fn invalid_reference(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::InvalidReference {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Classifies a failed BEGIN or COMMIT. Contention and pool problems
    /// keep their own variant.
    pub fn from_transaction(err: sqlx::Error) -> Self {
        match DbError::from(err) {
            e @ (DbError::Busy(_) | DbError::PoolExhausted | DbError::ConnectionFailed(_)) => e,
            other => DbError::TransactionFailed(other.to_string()),
        }
    }

    /// True for errors that a later retry may not hit.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Busy(_) | DbError::PoolExhausted)
    }
}

/// True when SQLite reports `SQLITE_BUSY` / `SQLITE_LOCKED`, including the
/// extended codes (`code & 0xff`).
fn is_lock_contention(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i64>().ok())
        .map(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
        .unwrap_or(false)
}

/// True for a foreign-key RESTRICT action, which sqlx leaves unclassified.
fn is_restrict_action(code: Option<&str>, message: &str) -> bool {
    code == Some(SQLITE_CONSTRAINT_TRIGGER) && message == FOREIGN_KEY_MESSAGE
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::ForeignKeyViolation => DbError::foreign_key(message),
                    _ if is_restrict_action(db_err.code().as_deref(), &message) => {
                        DbError::foreign_key(message)
                    }
                    _ if is_lock_contention(db_err.code().as_deref()) => DbError::Busy(message),
                    _ => DbError::QueryFailed(message),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
