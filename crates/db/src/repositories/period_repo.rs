//! Repository for the `periods` table.

use sqlx::{PgConnection, PgPool};

use rota_core::types::DbId;

use crate::models::period::{CreatePeriod, Period, UpdatePeriod};

/// Column list for the `periods` table.
const COLUMNS: &str = "id, name, starts_at, ends_at, visible_from, visible_until, \
    signup_opens, signup_closes, modify_opens, modify_closes, allowed_role_ids, \
    created_at, updated_at";

/// Provides CRUD operations for periods.
pub struct PeriodRepo;

impl PeriodRepo {
    /// Insert a new period.
    pub async fn create(conn: &mut PgConnection, input: &CreatePeriod) -> Result<Period, sqlx::Error> {
        let query = format!(
            "INSERT INTO periods \
                (name, starts_at, ends_at, visible_from, visible_until, \
                 signup_opens, signup_closes, modify_opens, modify_closes, allowed_role_ids) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Period>(&query)
            .bind(&input.name)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.visible_from)
            .bind(input.visible_until)
            .bind(input.signup_opens)
            .bind(input.signup_closes)
            .bind(input.modify_opens)
            .bind(input.modify_closes)
            .bind(&input.allowed_role_ids)
            .fetch_one(conn)
            .await
    }

    /// Find a period by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Period>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM periods WHERE id = $1");
        sqlx::query_as::<_, Period>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a period and lock its row for the duration of the caller's
    /// transaction. Used by structural edits that regenerate descendant
    /// occurrences.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Period>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM periods WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Period>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List all periods, most recent range first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Period>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM periods ORDER BY starts_at DESC, id");
        sqlx::query_as::<_, Period>(&query).fetch_all(pool).await
    }

    /// Update a period. Only non-`None` fields are applied.
    ///
    /// Window endpoints carry an explicit presence flag so that
    /// `Some(None)` clears a configured endpoint; COALESCE cannot
    /// express that.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdatePeriod,
    ) -> Result<Option<Period>, sqlx::Error> {
        let query = format!(
            "UPDATE periods SET \
                name = COALESCE($2, name), \
                starts_at = COALESCE($3, starts_at), \
                ends_at = COALESCE($4, ends_at), \
                visible_from = CASE WHEN $5 THEN $6::timestamptz ELSE visible_from END, \
                visible_until = CASE WHEN $7 THEN $8::timestamptz ELSE visible_until END, \
                signup_opens = CASE WHEN $9 THEN $10::timestamptz ELSE signup_opens END, \
                signup_closes = CASE WHEN $11 THEN $12::timestamptz ELSE signup_closes END, \
                modify_opens = CASE WHEN $13 THEN $14::timestamptz ELSE modify_opens END, \
                modify_closes = CASE WHEN $15 THEN $16::timestamptz ELSE modify_closes END, \
                allowed_role_ids = COALESCE($17, allowed_role_ids), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Period>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.visible_from.is_some())
            .bind(input.visible_from.flatten())
            .bind(input.visible_until.is_some())
            .bind(input.visible_until.flatten())
            .bind(input.signup_opens.is_some())
            .bind(input.signup_opens.flatten())
            .bind(input.signup_closes.is_some())
            .bind(input.signup_closes.flatten())
            .bind(input.modify_opens.is_some())
            .bind(input.modify_opens.flatten())
            .bind(input.modify_closes.is_some())
            .bind(input.modify_closes.flatten())
            .bind(&input.allowed_role_ids)
            .fetch_optional(conn)
            .await
    }

    /// Delete a period and, via cascade, every descendant category,
    /// slot, occurrence, and claim. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM periods WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
