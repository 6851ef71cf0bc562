//! Repository for the `occurrence_claims` table.
//!
//! Capacity accounting counts only non-`dropped` rows; `dropped` rows
//! are retained as history and double as the vacancy signal for
//! pick-up.

use sqlx::{PgConnection, PgPool};

use rota_core::types::DbId;

use crate::models::claim::{ClaimStatus, OccurrenceClaim};

/// Column list for the `occurrence_claims` table.
const COLUMNS: &str = "id, occurrence_id, user_id, status, created_at, updated_at";

/// Provides status-tagged claim operations per occurrence.
pub struct OccurrenceClaimRepo;

impl OccurrenceClaimRepo {
    /// Insert a claim row with an explicit status.
    pub async fn insert(
        conn: &mut PgConnection,
        occurrence_id: DbId,
        user_id: DbId,
        status: ClaimStatus,
    ) -> Result<OccurrenceClaim, sqlx::Error> {
        let query = format!(
            "INSERT INTO occurrence_claims (occurrence_id, user_id, status) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OccurrenceClaim>(&query)
            .bind(occurrence_id)
            .bind(user_id)
            .bind(status)
            .fetch_one(conn)
            .await
    }

    /// Fan out an `assigned` row onto every existing occurrence of a
    /// slot, as part of slot-level registration. Returns the number of
    /// rows created.
    pub async fn fan_out_assigned(
        conn: &mut PgConnection,
        slot_id: DbId,
        user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO occurrence_claims (occurrence_id, user_id, status) \
             SELECT o.id, $2, 'assigned' FROM occurrences o WHERE o.slot_id = $1",
        )
        .bind(slot_id)
        .bind(user_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Fan out `assigned` rows onto every occurrence of a slot for
    /// every standing slot-claim holder. Called after regeneration so a
    /// slot claim keeps implying an `assigned` row on each occurrence.
    pub async fn fan_out_all_claimants(
        conn: &mut PgConnection,
        slot_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO occurrence_claims (occurrence_id, user_id, status) \
             SELECT o.id, sc.user_id, 'assigned' \
             FROM occurrences o \
             JOIN slot_claims sc ON sc.slot_id = o.slot_id \
             WHERE o.slot_id = $1",
        )
        .bind(slot_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete every claim row (any status) a user holds under a slot's
    /// occurrences, as part of unregistration. Returns the number of
    /// rows removed.
    pub async fn delete_for_slot_user(
        conn: &mut PgConnection,
        slot_id: DbId,
        user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM occurrence_claims oc \
             USING occurrences o \
             WHERE oc.occurrence_id = o.id AND o.slot_id = $1 AND oc.user_id = $2",
        )
        .bind(slot_id)
        .bind(user_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Find a user's active (non-dropped) claim on an occurrence.
    /// The partial unique index guarantees at most one.
    pub async fn find_active(
        conn: &mut PgConnection,
        occurrence_id: DbId,
        user_id: DbId,
    ) -> Result<Option<OccurrenceClaim>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM occurrence_claims \
             WHERE occurrence_id = $1 AND user_id = $2 AND status <> 'dropped'"
        );
        sqlx::query_as::<_, OccurrenceClaim>(&query)
            .bind(occurrence_id)
            .bind(user_id)
            .fetch_optional(conn)
            .await
    }

    /// Whether a user holds any row (any status) on an occurrence.
    pub async fn exists_any(
        conn: &mut PgConnection,
        occurrence_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM occurrence_claims \
             WHERE occurrence_id = $1 AND user_id = $2)",
        )
        .bind(occurrence_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;
        Ok(exists)
    }

    /// Flip a claim row's status.
    pub async fn set_status(
        conn: &mut PgConnection,
        claim_id: DbId,
        status: ClaimStatus,
    ) -> Result<OccurrenceClaim, sqlx::Error> {
        let query = format!(
            "UPDATE occurrence_claims SET status = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OccurrenceClaim>(&query)
            .bind(claim_id)
            .bind(status)
            .fetch_one(conn)
            .await
    }

    /// Count active (non-dropped) claims on an occurrence.
    pub async fn count_active(
        conn: &mut PgConnection,
        occurrence_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM occurrence_claims \
             WHERE occurrence_id = $1 AND status <> 'dropped'",
        )
        .bind(occurrence_id)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }

    /// Highest active-claim count across a slot's occurrences.
    ///
    /// Registration reads this after its fan-out, still under the slot
    /// row lock: pick-ups can leave an individual occurrence fuller
    /// than the slot-claim count suggests, so the per-occurrence
    /// ceiling has to be re-checked before commit.
    pub async fn max_active_for_slot(
        conn: &mut PgConnection,
        slot_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (max,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(cnt), 0) FROM ( \
                 SELECT COUNT(*) AS cnt FROM occurrence_claims oc \
                 JOIN occurrences o ON o.id = oc.occurrence_id \
                 WHERE o.slot_id = $1 AND oc.status <> 'dropped' \
                 GROUP BY oc.occurrence_id \
             ) AS per_occurrence",
        )
        .bind(slot_id)
        .fetch_one(conn)
        .await?;
        Ok(max)
    }

    /// Count dropped rows on an occurrence (the vacancy signal).
    pub async fn count_dropped(
        conn: &mut PgConnection,
        occurrence_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM occurrence_claims \
             WHERE occurrence_id = $1 AND status = 'dropped'",
        )
        .bind(occurrence_id)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }

    /// List all claim rows on an occurrence, history included. The
    /// attendance subsystem reads this; it never mutates engine state.
    pub async fn list_for_occurrence(
        pool: &PgPool,
        occurrence_id: DbId,
    ) -> Result<Vec<OccurrenceClaim>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM occurrence_claims \
             WHERE occurrence_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, OccurrenceClaim>(&query)
            .bind(occurrence_id)
            .fetch_all(pool)
            .await
    }

    /// IDs of users with an active claim on an occurrence, for event
    /// deltas.
    pub async fn active_user_ids(
        conn: &mut PgConnection,
        occurrence_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT user_id FROM occurrence_claims \
             WHERE occurrence_id = $1 AND status <> 'dropped' ORDER BY user_id",
        )
        .bind(occurrence_id)
        .fetch_all(conn)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
