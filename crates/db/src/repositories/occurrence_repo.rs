//! Repository for the `occurrences` table.
//!
//! Occurrences are derived rows. The only write path is
//! [`OccurrenceRepo::replace_for_slot`]: delete everything for the
//! slot, then bulk-insert the freshly expanded instants. Claims hang
//! off occurrences with `ON DELETE CASCADE`, so replacement clears
//! stale claims with the rows they referenced.

use sqlx::{PgConnection, PgPool};

use rota_core::types::{DbId, Timestamp};

use crate::models::occurrence::{Occurrence, OccurrenceDetail};

/// Column list for the `occurrences` table.
const COLUMNS: &str = "id, slot_id, starts_at, created_at";

/// Column list for the occurrence + slot + category + period join.
const DETAIL_COLUMNS: &str = "o.id, o.slot_id, o.starts_at, rs.capacity, \
    c.id AS category_id, c.role_mode, c.required_role_ids, \
    p.id AS period_id, p.allowed_role_ids, p.modify_opens, p.modify_closes";

/// Provides replace-all and read operations for occurrences.
pub struct OccurrenceRepo;

impl OccurrenceRepo {
    /// Replace every occurrence of a slot with the given instants.
    ///
    /// Runs inside the caller's transaction so no reader observes the
    /// slot with a partial occurrence set. Returns the new rows in
    /// ascending order.
    pub async fn replace_for_slot(
        conn: &mut PgConnection,
        slot_id: DbId,
        times: &[Timestamp],
    ) -> Result<Vec<Occurrence>, sqlx::Error> {
        sqlx::query("DELETE FROM occurrences WHERE slot_id = $1")
            .bind(slot_id)
            .execute(&mut *conn)
            .await?;

        if times.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "INSERT INTO occurrences (slot_id, starts_at) \
             SELECT $1, t FROM UNNEST($2::timestamptz[]) AS t \
             RETURNING {COLUMNS}"
        );
        let mut rows = sqlx::query_as::<_, Occurrence>(&query)
            .bind(slot_id)
            .bind(times)
            .fetch_all(conn)
            .await?;
        rows.sort_by_key(|o| o.starts_at);
        Ok(rows)
    }

    /// Find an occurrence by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Occurrence>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM occurrences WHERE id = $1");
        sqlx::query_as::<_, Occurrence>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load an occurrence with its slot, category, and period context,
    /// taking exclusive locks on the occurrence row and the owning
    /// slot row.
    ///
    /// Drop and pick-up serialize per occurrence on the first lock;
    /// the slot lock orders them against registration, whose fan-out
    /// re-checks the per-occurrence ceiling a pick-up may have raised.
    pub async fn find_detail_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<OccurrenceDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} \
             FROM occurrences o \
             JOIN recurring_slots rs ON rs.id = o.slot_id \
             JOIN categories c ON c.id = rs.category_id \
             JOIN periods p ON p.id = c.period_id \
             WHERE o.id = $1 \
             FOR UPDATE OF o, rs"
        );
        sqlx::query_as::<_, OccurrenceDetail>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List all occurrences of a slot, ascending.
    pub async fn list_for_slot(
        pool: &PgPool,
        slot_id: DbId,
    ) -> Result<Vec<Occurrence>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM occurrences WHERE slot_id = $1 ORDER BY starts_at"
        );
        sqlx::query_as::<_, Occurrence>(&query)
            .bind(slot_id)
            .fetch_all(pool)
            .await
    }

    /// Count a slot's occurrences within the caller's transaction.
    pub async fn count_for_slot(
        conn: &mut PgConnection,
        slot_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM occurrences WHERE slot_id = $1")
                .bind(slot_id)
                .fetch_one(conn)
                .await?;
        Ok(count)
    }
}
