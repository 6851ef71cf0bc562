//! Repository for the `categories` table.

use sqlx::{PgConnection, PgPool};

use rota_core::types::DbId;

use crate::models::category::{Category, CreateCategory, UpdateCategory};

/// Column list for the `categories` table.
const COLUMNS: &str = "id, period_id, name, role_mode, required_role_ids, \
    allow_self_unregister, created_at, updated_at";

/// Provides CRUD operations for categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Insert a new category under a period.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCategory,
    ) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories \
                (period_id, name, role_mode, required_role_ids, allow_self_unregister) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(input.period_id)
            .bind(&input.name)
            .bind(input.role_mode)
            .bind(&input.required_role_ids)
            .bind(input.allow_self_unregister)
            .fetch_one(pool)
            .await
    }

    /// Find a category by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a category and lock its row for the duration of the
    /// caller's transaction (used by `move_category`).
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List all categories under a period.
    pub async fn list_for_period(
        pool: &PgPool,
        period_id: DbId,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE period_id = $1 ORDER BY id");
        sqlx::query_as::<_, Category>(&query)
            .bind(period_id)
            .fetch_all(pool)
            .await
    }

    /// Update a category in place. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET \
                name = COALESCE($2, name), \
                role_mode = COALESCE($3, role_mode), \
                required_role_ids = COALESCE($4, required_role_ids), \
                allow_self_unregister = COALESCE($5, allow_self_unregister), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.role_mode)
            .bind(&input.required_role_ids)
            .bind(input.allow_self_unregister)
            .fetch_optional(pool)
            .await
    }

    /// Reassign a category to a new period. The caller regenerates the
    /// category's slots against the new range in the same transaction.
    pub async fn set_period(
        conn: &mut PgConnection,
        id: DbId,
        new_period_id: DbId,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET period_id = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(new_period_id)
            .fetch_optional(conn)
            .await
    }

    /// Delete a category and, via cascade, its slots, occurrences, and
    /// claims. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
