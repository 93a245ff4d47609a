//! # Category Repository
//!
//! Database operations for product categories.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kasir_core::{Category, NewCategory};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists every category ordered by id.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM categories
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = categories.len(), "Listed categories");
        Ok(categories)
    }

    /// Gets a category by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Category))` - Category found
    /// * `Ok(None)` - Category not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM categories
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Returns true if a category with this id exists.
    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Inserts a new category. The payload must already be validated.
    pub async fn insert(&self, category: &NewCategory) -> DbResult<Category> {
        debug!(name = %category.name, "Inserting category");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO categories (name, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            "#,
        )
        .bind(&category.name)
        .bind(&category.description)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Replaces a category's name and description.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Category doesn't exist
    pub async fn update(&self, id: i64, category: &NewCategory) -> DbResult<Category> {
        debug!(id = %id, "Updating category");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE categories SET
                name = ?2,
                description = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Deletes a category.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Category doesn't exist
    /// * `Err(DbError::ForeignKeyViolation)` - Products still use it
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => {
                    DbError::foreign_key(format!("category {id} is still assigned to products"))
                }
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
