//! # Schema Migrations
//!
//! The SQL under `migrations/sqlite/` is compiled into the binary, so a
//! fresh deployment only needs a writable path.
//!
//! ```text
//! 001_initial_schema.sql   categories, products, transactions, transaction_items
//! ```
//!
//! Applied versions are tracked by sqlx in `_sqlx_migrations`. Files are
//! append-only: a shipped migration is never edited, a new `NNN_*.sql`
//! is added instead.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How far the database schema is behind the embedded migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub embedded: usize,
    pub applied: usize,
}

impl MigrationStatus {
    /// True when every embedded migration has been applied.
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Applies every embedded migration the database hasn't seen yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying pending migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema up to date");
    Ok(())
}

/// Reads the applied-migration count from `_sqlx_migrations`.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: usize::try_from(applied).unwrap_or_default(),
    })
}
