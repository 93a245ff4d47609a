//! # Transaction Repository
//!
//! Read-only access to the ledger. Rows are written only by
//! [`crate::repository::checkout`] and never updated afterwards, so reads
//! take no locks beyond SQLite's snapshot.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use kasir_core::{Transaction, TransactionLineItem};

/// Repository for reading recorded sales.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Gets a transaction with its line items in insertion order.
    ///
    /// ## Returns
    /// * `Ok(Some(Transaction))` - Transaction found
    /// * `Ok(None)` - No such transaction
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Transaction>> {
        debug!(id = %id, "Loading transaction");

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, total_amount, created_at
            FROM transactions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut transaction) = transaction else {
            return Ok(None);
        };

        transaction.items = self.get_items(id).await?;
        Ok(Some(transaction))
    }

    /// Gets the line items of a transaction.
    pub async fn get_items(&self, transaction_id: i64) -> DbResult<Vec<TransactionLineItem>> {
        let items = sqlx::query_as::<_, TransactionLineItem>(
            r#"
            SELECT id, transaction_id, product_id, product_name,
                   quantity, unit_price, subtotal
            FROM transaction_items
            WHERE transaction_id = ?1
            ORDER BY id
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts recorded transactions (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
