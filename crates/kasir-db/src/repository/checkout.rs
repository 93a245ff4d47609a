//! # Checkout Repository
//!
//! SQLite implementation of the checkout store, plus the entry point that
//! runs the engine under a timeout.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Checkout = One Write Transaction                 │
//! │                                                                         │
//! │  BEGIN IMMEDIATE          ← takes the database write lock up front     │
//! │       │                     (other checkouts wait up to busy_timeout)  │
//! │       ▼                                                                 │
//! │  SELECT ... WHERE id IN (...)          snapshot                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET stock = stock - n                                 │
//! │   WHERE id = ? AND stock >= n          re-checked at write time        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT transactions / transaction_items                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Error, timeout or client disconnect before COMMIT:                    │
//! │  sqlx::Transaction is dropped → ROLLBACK                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A deferred `BEGIN` would read under a shared lock and then fail to
//! upgrade with SQLITE_BUSY when two checkouts race. Taking the write lock
//! first turns that race into an ordinary queue.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, error, info, warn};

use crate::error::DbError;
use kasir_core::checkout::{normalize_items, run_checkout, CheckoutStore, PlannedLine};
use kasir_core::{CheckoutError, CheckoutItem, Money, Product, Transaction, TransactionLineItem};

/// Checkout outcome as seen by callers of this crate.
pub type CheckoutResult<T> = Result<T, CheckoutError<DbError>>;

// =============================================================================
// Store
// =============================================================================

/// A checkout scope backed by one SQLite write transaction.
pub struct SqliteCheckoutStore {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl SqliteCheckoutStore {
    /// Opens the scope, waiting for the database write lock.
    pub async fn begin(pool: &SqlitePool) -> Result<Self, DbError> {
        let tx = pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(DbError::from_transaction)?;
        Ok(SqliteCheckoutStore { tx })
    }
}

impl CheckoutStore for SqliteCheckoutStore {
    type Error = DbError;

    async fn products_by_ids(&mut self, ids: &[i64]) -> Result<HashMap<i64, Product>, DbError> {
        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT id, name, price, stock, category_id, created_at, updated_at \
             FROM products WHERE id IN (",
        );
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let products = query
            .build_query_as::<Product>()
            .fetch_all(&mut *self.tx)
            .await?;

        debug!(requested = ids.len(), found = products.len(), "Resolved checkout products");
        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }

    async fn decrement_stock(&mut self, product_id: i64, quantity: i64) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn create_transaction(
        &mut self,
        total: Money,
        lines: &[PlannedLine],
    ) -> Result<Transaction, DbError> {
        let created_at = Utc::now();

        let transaction_id = sqlx::query(
            r#"
            INSERT INTO transactions (total_amount, created_at)
            VALUES (?1, ?2)
            "#,
        )
        .bind(total)
        .bind(created_at)
        .execute(&mut *self.tx)
        .await?
        .last_insert_rowid();

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let item_id = sqlx::query(
                r#"
                INSERT INTO transaction_items (
                    transaction_id, product_id, product_name,
                    quantity, unit_price, subtotal
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(transaction_id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.subtotal)
            .execute(&mut *self.tx)
            .await?
            .last_insert_rowid();

            items.push(TransactionLineItem {
                id: item_id,
                transaction_id,
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            });
        }

        Ok(Transaction {
            id: transaction_id,
            total_amount: total,
            created_at,
            items,
        })
    }

    async fn commit(self) -> Result<(), DbError> {
        self.tx.commit().await.map_err(DbError::from_transaction)
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Entry point for checkouts against the SQLite pool.
#[derive(Debug, Clone)]
pub struct CheckoutRepository {
    pool: SqlitePool,
    timeout: Duration,
}

impl CheckoutRepository {
    /// Creates a new CheckoutRepository.
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        CheckoutRepository { pool, timeout }
    }

    /// Converts a cart into a committed transaction.
    ///
    /// ## Returns
    /// * `Ok(Transaction)` - Stock decremented and sale recorded together
    /// * `Err(CheckoutError::Domain)` - Bad input, unknown product or short
    ///   stock; nothing written
    /// * `Err(CheckoutError::Store)` - SQLite failed; rolled back
    /// * `Err(CheckoutError::Timeout)` - Exceeded the configured bound;
    ///   rolled back
    ///
    /// Not idempotent: repeating a request records a second sale.
    pub async fn checkout(&self, items: &[CheckoutItem]) -> CheckoutResult<Transaction> {
        // Malformed carts never take the write lock
        normalize_items(items)?;

        debug!(lines = items.len(), "Starting checkout");

        let outcome = tokio::time::timeout(self.timeout, async {
            match SqliteCheckoutStore::begin(&self.pool).await {
                Ok(store) => run_checkout(store, items).await,
                Err(err) => Err(CheckoutError::Store(err)),
            }
        })
        .await
        .unwrap_or(Err(CheckoutError::Timeout(self.timeout)));

        match &outcome {
            Ok(tx) => info!(
                transaction_id = tx.id,
                total_amount = %tx.total_amount,
                lines = tx.items.len(),
                "Checkout committed"
            ),
            Err(err) if err.is_client_error() => warn!(error = %err, "Checkout rejected"),
            Err(err) => error!(error = %err, "Checkout failed"),
        }

        outcome
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
