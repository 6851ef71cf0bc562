//! Repository for the `slot_claims` table.

use sqlx::{PgConnection, PgPool};

use rota_core::types::DbId;

use crate::models::claim::SlotClaim;

/// Column list for the `slot_claims` table.
const COLUMNS: &str = "id, slot_id, user_id, created_at";

/// Provides claim operations keyed by (slot, user).
pub struct SlotClaimRepo;

impl SlotClaimRepo {
    /// Insert a standing claim. The `uq_slot_claims_slot_user`
    /// constraint rejects duplicates that race past the precondition
    /// check.
    pub async fn insert(
        conn: &mut PgConnection,
        slot_id: DbId,
        user_id: DbId,
    ) -> Result<SlotClaim, sqlx::Error> {
        let query = format!(
            "INSERT INTO slot_claims (slot_id, user_id) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SlotClaim>(&query)
            .bind(slot_id)
            .bind(user_id)
            .fetch_one(conn)
            .await
    }

    /// Find a user's claim on a slot.
    pub async fn find(
        conn: &mut PgConnection,
        slot_id: DbId,
        user_id: DbId,
    ) -> Result<Option<SlotClaim>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM slot_claims WHERE slot_id = $1 AND user_id = $2");
        sqlx::query_as::<_, SlotClaim>(&query)
            .bind(slot_id)
            .bind(user_id)
            .fetch_optional(conn)
            .await
    }

    /// Count standing claims on a slot. Registration reads this under
    /// the slot row lock.
    pub async fn count_for_slot(
        conn: &mut PgConnection,
        slot_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM slot_claims WHERE slot_id = $1")
                .bind(slot_id)
                .fetch_one(conn)
                .await?;
        Ok(count)
    }

    /// Delete a user's claim on a slot. Returns `true` if a row was
    /// deleted.
    pub async fn delete(
        conn: &mut PgConnection,
        slot_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM slot_claims WHERE slot_id = $1 AND user_id = $2")
            .bind(slot_id)
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List all claims on a slot.
    pub async fn list_for_slot(
        pool: &PgPool,
        slot_id: DbId,
    ) -> Result<Vec<SlotClaim>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM slot_claims WHERE slot_id = $1 ORDER BY created_at");
        sqlx::query_as::<_, SlotClaim>(&query)
            .bind(slot_id)
            .fetch_all(pool)
            .await
    }

    /// IDs of every user holding a claim on a slot, for event deltas.
    pub async fn user_ids_for_slot(
        conn: &mut PgConnection,
        slot_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> =
            sqlx::query_as("SELECT user_id FROM slot_claims WHERE slot_id = $1 ORDER BY user_id")
                .bind(slot_id)
                .fetch_all(conn)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
