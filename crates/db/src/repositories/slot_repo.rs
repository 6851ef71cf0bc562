//! Repository for the `recurring_slots` table.

use sqlx::{PgConnection, PgPool};

use rota_core::types::DbId;

use crate::models::slot::{CreateSlot, RecurringSlot, SlotAvailability, SlotDetail, UpdateSlot};

/// Column list for the `recurring_slots` table.
const COLUMNS: &str =
    "id, category_id, day_of_week, starts_at, ends_at, capacity, created_at, updated_at";

/// Column list for the slot + category + period join.
const DETAIL_COLUMNS: &str = "rs.id, rs.category_id, rs.day_of_week, rs.starts_at, rs.ends_at, \
    rs.capacity, c.role_mode, c.required_role_ids, c.allow_self_unregister, \
    p.id AS period_id, p.starts_at AS period_starts_at, p.ends_at AS period_ends_at, \
    p.allowed_role_ids, p.signup_opens, p.signup_closes, p.modify_opens, p.modify_closes";

/// Provides CRUD and locking operations for recurring slots.
pub struct SlotRepo;

impl SlotRepo {
    /// Insert a new recurring slot. The caller generates its
    /// occurrences in the same transaction.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateSlot,
    ) -> Result<RecurringSlot, sqlx::Error> {
        let query = format!(
            "INSERT INTO recurring_slots (category_id, day_of_week, starts_at, ends_at, capacity) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RecurringSlot>(&query)
            .bind(input.category_id)
            .bind(input.day_of_week)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.capacity)
            .fetch_one(conn)
            .await
    }

    /// Find a slot by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<RecurringSlot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM recurring_slots WHERE id = $1");
        sqlx::query_as::<_, RecurringSlot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load a slot with its category and period context, taking an
    /// exclusive lock on the slot row.
    ///
    /// Registration holds this lock from the claim-count read through
    /// the claim insert, so concurrent registrations for the same slot
    /// are strictly ordered rather than racing on a stale count.
    pub async fn find_detail_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<SlotDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} \
             FROM recurring_slots rs \
             JOIN categories c ON c.id = rs.category_id \
             JOIN periods p ON p.id = c.period_id \
             WHERE rs.id = $1 \
             FOR UPDATE OF rs"
        );
        sqlx::query_as::<_, SlotDetail>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List all slots under a category.
    pub async fn list_for_category(
        pool: &PgPool,
        category_id: DbId,
    ) -> Result<Vec<RecurringSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM recurring_slots WHERE category_id = $1 \
             ORDER BY day_of_week, starts_at, id"
        );
        sqlx::query_as::<_, RecurringSlot>(&query)
            .bind(category_id)
            .fetch_all(pool)
            .await
    }

    /// List every slot under a period (across all its categories),
    /// locking the slot rows. Used by regeneration.
    pub async fn list_for_period_for_update(
        conn: &mut PgConnection,
        period_id: DbId,
    ) -> Result<Vec<RecurringSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM recurring_slots rs \
             JOIN categories c ON c.id = rs.category_id \
             WHERE c.period_id = $1 \
             ORDER BY rs.id \
             FOR UPDATE OF rs",
            "rs.id, rs.category_id, rs.day_of_week, rs.starts_at, rs.ends_at, rs.capacity, \
             rs.created_at, rs.updated_at"
        );
        sqlx::query_as::<_, RecurringSlot>(&query)
            .bind(period_id)
            .fetch_all(conn)
            .await
    }

    /// List every slot under a category, locking the slot rows. Used by
    /// category moves.
    pub async fn list_for_category_for_update(
        conn: &mut PgConnection,
        category_id: DbId,
    ) -> Result<Vec<RecurringSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM recurring_slots WHERE category_id = $1 \
             ORDER BY id \
             FOR UPDATE"
        );
        sqlx::query_as::<_, RecurringSlot>(&query)
            .bind(category_id)
            .fetch_all(conn)
            .await
    }

    /// Update a slot. Only non-`None` fields are applied. The caller
    /// regenerates occurrences when the recurrence changed.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateSlot,
    ) -> Result<Option<RecurringSlot>, sqlx::Error> {
        let query = format!(
            "UPDATE recurring_slots SET \
                day_of_week = COALESCE($2, day_of_week), \
                starts_at = COALESCE($3, starts_at), \
                ends_at = COALESCE($4, ends_at), \
                capacity = COALESCE($5, capacity), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RecurringSlot>(&query)
            .bind(id)
            .bind(input.day_of_week)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.capacity)
            .fetch_optional(conn)
            .await
    }

    /// Delete a slot (cascades to occurrences and claims). Returns
    /// `true` if a row was deleted.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM recurring_slots WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Capacity summary: configured capacity, standing claims, and the
    /// remainder. Derived from the store at call time; nothing caches
    /// capacity in memory.
    pub async fn availability(
        pool: &PgPool,
        slot_id: DbId,
    ) -> Result<Option<SlotAvailability>, sqlx::Error> {
        let row: Option<(i32, i64)> = sqlx::query_as(
            "SELECT rs.capacity, COUNT(sc.id) \
             FROM recurring_slots rs \
             LEFT JOIN slot_claims sc ON sc.slot_id = rs.id \
             WHERE rs.id = $1 \
             GROUP BY rs.capacity",
        )
        .bind(slot_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|(capacity, claimed)| SlotAvailability {
            slot_id,
            capacity,
            claimed,
            available: i64::from(capacity) - claimed,
        }))
    }
}
