//! # Database Handle
//!
//! Opens the SQLite pool and hands out repositories.
//!
//! ## Connection Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SqlitePool (WAL)                                 │
//! │                                                                         │
//! │  GET /products   ──► conn A   reads a snapshot, never waits on writers │
//! │  GET /report     ──► conn B   same                                     │
//! │  POST /checkout  ──► conn C   BEGIN IMMEDIATE, owns the write lock     │
//! │  POST /checkout  ──► conn D   queues on busy_timeout until C commits   │
//! │                                                                         │
//! │  max_connections bounds A..D; acquire waits up to connect_timeout.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every connection is opened with:
//! - `journal_mode = WAL`
//! - `synchronous = NORMAL`
//! - `foreign_keys = ON` (off by default in SQLite)
//! - `busy_timeout` from [`DbConfig`]

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::category::CategoryRepository;
use crate::repository::checkout::CheckoutRepository;
use crate::repository::product::ProductRepository;
use crate::repository::report::ReportRepository;
use crate::repository::transaction::TransactionRepository;

/// Path that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Pool and SQLite settings.
///
/// ```rust,ignore
/// let config = DbConfig::new("./kasir.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first open. [`IN_MEMORY_PATH`] for tests.
    pub database_path: PathBuf,

    /// Upper bound on pooled connections. Default: 5
    pub max_connections: u32,

    /// Connections kept open while idle. Default: 1
    pub min_connections: u32,

    /// How long `acquire` waits for a free connection. Default: 30s
    pub connect_timeout: Duration,

    /// Unused connections above `min_connections` close after this. Default: 10m
    pub idle_timeout: Duration,

    /// How long a connection waits for SQLite's write lock. Default: 5s
    pub busy_timeout: Duration,

    /// Upper bound on one checkout, lock wait included. Default: 10s
    pub checkout_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            database_path: PathBuf::from("./kasir.db"),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            checkout_timeout: Duration::from_secs(10),
        }
    }
}

impl DbConfig {
    /// Defaults for a database file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            ..Default::default()
        }
    }

    /// A private, migrated, in-memory database.
    ///
    /// Limited to one connection: each new connection to `:memory:` would
    /// otherwise see its own empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY_PATH),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    /// True for [`IN_MEMORY_PATH`].
    pub fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(IN_MEMORY_PATH)
    }

    /// Per-connection SQLite options.
    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let base = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
        };

        Ok(base
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared database handle.
///
/// Clones share one pool. Repositories are cheap and created per call:
/// ```rust,ignore
/// let product = state.db.products().get_by_id(id).await?;
/// let sale = state.db.checkout().checkout(&items).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    checkout_timeout: Duration,
}

impl Database {
    /// Opens the pool and migrates the schema.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opening database"
        );

        let options = config.connect_options()?;
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(busy_timeout = ?config.busy_timeout, "Pool ready");

        let db = Database {
            pool,
            checkout_timeout: config.checkout_timeout,
        };

        db.run_migrations().await?;

        Ok(db)
    }

    /// Applies pending embedded migrations. Safe to call repeatedly.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// The underlying pool, for ad-hoc queries in tools and tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    /// Read-only ledger access.
    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// The only writer of the ledger, bounded by `checkout_timeout`.
    pub fn checkout(&self) -> CheckoutRepository {
        CheckoutRepository::new(self.pool.clone(), self.checkout_timeout)
    }

    /// Closes every connection. Later queries fail with `PoolExhausted`
    /// or `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// True if a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
