//! # Report Repository
//!
//! Daily rollup over the ledger.
//!
//! ## Today's Report
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transactions  WHERE date(created_at) = '2026-10-19'                    │
//! │       │                                                                 │
//! │       ├── SUM(total_amount)  → total_revenue                           │
//! │       └── COUNT(*)           → total_transactions                      │
//! │                                                                         │
//! │  transaction_items ⋈ transactions (same day)                           │
//! │       │                                                                 │
//! │       └── GROUP BY product_id                                          │
//! │           ORDER BY SUM(quantity) DESC, name ASC  LIMIT 1               │
//! │           → best_seller { name, quantity_sold } | null                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Days are UTC calendar days. `created_at` is stored as RFC 3339 with an
//! offset, which SQLite's `date()` normalizes to UTC.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use kasir_core::{BestSeller, Money, SalesReport};

/// Repository for sales reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Report for the current UTC day.
    pub async fn today(&self) -> DbResult<SalesReport> {
        self.for_date(Utc::now().date_naive()).await
    }

    /// Report for one UTC calendar day.
    pub async fn for_date(&self, day: NaiveDate) -> DbResult<SalesReport> {
        let day = day.format("%Y-%m-%d").to_string();
        debug!(day = %day, "Building sales report");

        let (total_revenue, total_transactions): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_amount), 0), COUNT(*)
            FROM transactions
            WHERE date(created_at) = ?1
            "#,
        )
        .bind(&day)
        .fetch_one(&self.pool)
        .await?;

        // The bare product_name column takes its value from the row that
        // supplied MAX(ti.id), i.e. the latest name snapshot for the product.
        let best_seller = sqlx::query_as::<_, BestSeller>(
            r#"
            SELECT ti.product_name AS name,
                   SUM(ti.quantity) AS quantity_sold,
                   MAX(ti.id) AS latest_item
            FROM transaction_items ti
            INNER JOIN transactions t ON t.id = ti.transaction_id
            WHERE date(t.created_at) = ?1
            GROUP BY ti.product_id
            ORDER BY quantity_sold DESC, name ASC
            LIMIT 1
            "#,
        )
        .bind(&day)
        .fetch_optional(&self.pool)
        .await?;

        Ok(SalesReport {
            total_revenue: Money::from_minor(total_revenue),
            total_transactions,
            best_seller,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use kasir_core::{CheckoutItem, NewProduct};

    async fn db_with_products() -> (Database, i64, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut ids = Vec::new();
        for (name, price) in [("Indomie Goreng", 3000), ("Teh Botol", 5000)] {
            let p = db
                .products()
                .insert(&NewProduct {
                    name: name.to_string(),
                    price: Money::from_minor(price),
                    stock: 100,
                    category_id: None,
                })
                .await
                .unwrap();
            ids.push(p.id);
        }
        (db, ids[0], ids[1])
    }

    fn item(product_id: i64, quantity: i64) -> CheckoutItem {
        CheckoutItem {
            product_id,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_empty_day() {
        let (db, _, _) = db_with_products().await;
        let report = db.reports().today().await.unwrap();
        assert_eq!(report, SalesReport::empty());
    }

    #[tokio::test]
    async fn test_today_rollup() {
        let (db, indomie, teh) = db_with_products().await;

        db.checkout()
            .checkout(&[item(indomie, 4), item(teh, 1)])
            .await
            .unwrap();
        db.checkout().checkout(&[item(teh, 2)]).await.unwrap();
        db.checkout().checkout(&[item(indomie, 1)]).await.unwrap();

        let report = db.reports().today().await.unwrap();
        assert_eq!(report.total_transactions, 3);
        assert_eq!(report.total_revenue, Money::from_minor(12000 + 5000 + 10000 + 3000));
        assert_eq!(
            report.best_seller,
            Some(BestSeller {
                name: "Indomie Goreng".to_string(),
                quantity_sold: 5
            })
        );
    }

    #[tokio::test]
    async fn test_tie_broken_by_name() {
        let (db, indomie, teh) = db_with_products().await;
        db.checkout()
            .checkout(&[item(teh, 2), item(indomie, 2)])
            .await
            .unwrap();

        let report = db.reports().today().await.unwrap();
        assert_eq!(report.best_seller.unwrap().name, "Indomie Goreng");
    }

    #[tokio::test]
    async fn test_other_days_are_excluded() {
        let (db, indomie, _) = db_with_products().await;
        let yesterday = Utc.from_utc_datetime(
            &(Utc::now() - Duration::days(1))
                .date_naive()
                .and_hms_opt(23, 59, 0)
                .unwrap(),
        );

        let tx_id = sqlx::query("INSERT INTO transactions (total_amount, created_at) VALUES (?1, ?2)")
            .bind(9000_i64)
            .bind(yesterday)
            .execute(db.pool())
            .await
            .unwrap()
            .last_insert_rowid();
        sqlx::query(
            "INSERT INTO transaction_items (transaction_id, product_id, product_name, quantity, unit_price, subtotal) \
             VALUES (?1, ?2, 'Indomie Goreng', 3, 3000, 9000)",
        )
        .bind(tx_id)
        .bind(indomie)
        .execute(db.pool())
        .await
        .unwrap();

        assert_eq!(db.reports().today().await.unwrap(), SalesReport::empty());

        let report = db.reports().for_date(yesterday.date_naive()).await.unwrap();
        assert_eq!(report.total_transactions, 1);
        assert_eq!(report.total_revenue, Money::from_minor(9000));
        assert_eq!(report.best_seller.unwrap().quantity_sold, 3);
    }
}
