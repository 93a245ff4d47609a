//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations (full-replace update)
//! - Category embedding on single reads
//!
//! Stock is written here only by create/update. Checkout decrements go
//! through [`crate::repository::checkout`] inside a write transaction.
//!
//! ## Category Reference
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert / update with category_id = Some(7)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  categories.exists(7)?                                                 │
//! │       ├── no  → DbError::InvalidReference (client error)               │
//! │       └── yes → write row (FK still enforced by SQLite)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::category::CategoryRepository;
use kasir_core::{NewProduct, Product};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let all = repo.list().await?;
/// let product = repo.get_by_id(1).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product ordered by id. Categories are not embedded.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, stock, category_id, created_at, updated_at
            FROM products
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID, with its category embedded when set.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, stock, category_id, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut product) = product else {
            return Ok(None);
        };

        if let Some(category_id) = product.category_id {
            product.category = self.categories().get_by_id(category_id).await?;
        }

        Ok(Some(product))
    }

    /// Inserts a new product. The payload must already be validated.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with its assigned id
    /// * `Err(DbError::InvalidReference)` - `category_id` doesn't exist
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        debug!(name = %product.name, "Inserting product");

        self.check_category(product.category_id).await?;

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO products (name, price, stock, category_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.category_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Replaces every mutable field of a product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored product after the update
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::InvalidReference)` - `category_id` doesn't exist
    pub async fn update(&self, id: i64, product: &NewProduct) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        self.check_category(product.category_id).await?;

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                price = ?3,
                stock = ?4,
                category_id = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.category_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// ## Why No Soft Delete?
    /// Line items snapshot name and price, and the ledger's foreign key
    /// blocks deleting a product that has been sold.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::ForeignKeyViolation)` - Product appears in the ledger
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => {
                    DbError::foreign_key(format!("product {id} is referenced by transactions"))
                }
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn check_category(&self, category_id: Option<i64>) -> DbResult<()> {
        match category_id {
            Some(id) if !self.categories().exists(id).await? => {
                Err(DbError::invalid_reference("category", id))
            }
            _ => Ok(()),
        }
    }

    fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use kasir_core::{CheckoutItem, Money, NewCategory};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn indomie(category_id: Option<i64>) -> NewProduct {
        NewProduct {
            name: "Indomie Goreng".to_string(),
            price: Money::from_minor(3000),
            stock: 10,
            category_id,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = db().await;
        let repo = db.products();

        let created = repo.insert(&indomie(None)).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.price, Money::from_minor(3000));
        assert_eq!(created.stock, 10);
        assert!(created.category.is_none());

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_embeds_category() {
        let db = db().await;
        let category = db
            .categories()
            .insert(&NewCategory {
                name: "Makanan".to_string(),
                description: "Mie instan".to_string(),
            })
            .await
            .unwrap();

        let created = db.products().insert(&indomie(Some(category.id))).await.unwrap();
        let fetched = db.products().get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.category_id, Some(category.id));
        assert_eq!(fetched.category.unwrap().name, "Makanan");
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let db = db().await;
        let err = db.products().insert(&indomie(Some(77))).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidReference { .. }));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let db = db().await;
        let repo = db.products();
        let created = repo.insert(&indomie(None)).await.unwrap();

        let updated = repo
            .update(
                created.id,
                &NewProduct {
                    name: "Indomie Soto".to_string(),
                    price: Money::from_minor(3500),
                    stock: 4,
                    category_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Indomie Soto");
        assert_eq!(updated.price, Money::from_minor(3500));
        assert_eq!(updated.stock, 4);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let db = db().await;
        let repo = db.products();

        assert!(repo.get_by_id(5).await.unwrap().is_none());
        assert!(matches!(
            repo.update(5, &indomie(None)).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(repo.delete(5).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_sold_product_is_conflict() {
        let db = db().await;
        let product = db.products().insert(&indomie(None)).await.unwrap();
        db.checkout()
            .checkout(&[CheckoutItem {
                product_id: product.id,
                quantity: 1,
            }])
            .await
            .unwrap();

        let err = db.products().delete(product.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(db.products().get_by_id(product.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_unsold_product() {
        let db = db().await;
        let product = db.products().insert(&indomie(None)).await.unwrap();
        db.products().delete(product.id).await.unwrap();
        assert!(db.products().get_by_id(product.id).await.unwrap().is_none());
    }
}
