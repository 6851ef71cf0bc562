//! Administrative operations and the occurrence generation engine.
//!
//! Regeneration policy: any change to a period's bounds, a category's
//! owning period, or a slot's recurrence replaces the affected slots'
//! occurrences wholesale (delete-then-recreate, never an incremental
//! diff) inside the triggering transaction. A slot whose regeneration
//! yields zero occurrences is deleted rather than left dangling.
//! Standing slot claims are re-fanned onto the fresh occurrences so a
//! claim keeps implying an `assigned` row on every occurrence.

use chrono::NaiveTime;
use serde::Serialize;
use sqlx::PgConnection;
use validator::Validate;

use rota_core::occurrence::occurrence_times;
use rota_core::types::{DbId, Timestamp};
use rota_core::window::Window;
use rota_core::CoreError;
use rota_db::models::category::{Category, CreateCategory, UpdateCategory};
use rota_db::models::period::{CreatePeriod, Period, UpdatePeriod};
use rota_db::models::slot::{CreateSlot, RecurringSlot, UpdateSlot};
use rota_db::repositories::{
    CategoryRepo, OccurrenceClaimRepo, OccurrenceRepo, PeriodRepo, SlotClaimRepo, SlotRepo,
};
use rota_events::{AvailabilityDelta, EventKind, ScheduleEvent};

use crate::Engine;

/// Outcome of regenerating every slot under a period.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub period_id: DbId,
    pub slots_processed: usize,
    pub slots_deleted: usize,
    pub occurrences_created: usize,
}

/// Outcome of regenerating a single slot.
#[derive(Debug, Clone, Serialize)]
pub struct SlotRegeneration {
    pub slot_id: DbId,
    /// True when the new range contained no matching weekday and the
    /// slot was deleted instead of left without occurrences.
    pub slot_deleted: bool,
    pub occurrences_created: usize,
}

impl Engine {
    // -----------------------------------------------------------------------
    // Periods
    // -----------------------------------------------------------------------

    /// Create a period after validating its bounds and window pairs.
    pub async fn create_period(&self, input: &CreatePeriod) -> Result<Period, CoreError> {
        input
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        validate_period_shape(
            input.starts_at,
            input.ends_at,
            &[
                ("visibility", input.visible_from, input.visible_until),
                ("signup", input.signup_opens, input.signup_closes),
                ("modify", input.modify_opens, input.modify_closes),
            ],
        )?;

        let mut tx = self.begin().await?;
        let period = PeriodRepo::create(&mut *tx, input).await?;
        tx.commit().await.map_err(CoreError::from)?;

        tracing::info!(period_id = period.id, name = %period.name, "Period created");
        Ok(period)
    }

    /// Update a period. A `starts_at`/`ends_at` change regenerates
    /// every descendant slot's occurrences in the same transaction and
    /// yields a pending regeneration event.
    pub async fn update_period(
        &self,
        period_id: DbId,
        input: &UpdatePeriod,
    ) -> Result<(Period, Option<ScheduleEvent>), CoreError> {
        let mut tx = self.begin().await?;

        let current = PeriodRepo::find_for_update(&mut *tx, period_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Period",
                id: period_id,
            })?;

        let starts_at = input.starts_at.unwrap_or(current.starts_at);
        let ends_at = input.ends_at.unwrap_or(current.ends_at);
        validate_period_shape(
            starts_at,
            ends_at,
            &[
                (
                    "visibility",
                    input.visible_from.unwrap_or(current.visible_from),
                    input.visible_until.unwrap_or(current.visible_until),
                ),
                (
                    "signup",
                    input.signup_opens.unwrap_or(current.signup_opens),
                    input.signup_closes.unwrap_or(current.signup_closes),
                ),
                (
                    "modify",
                    input.modify_opens.unwrap_or(current.modify_opens),
                    input.modify_closes.unwrap_or(current.modify_closes),
                ),
            ],
        )?;

        let period = PeriodRepo::update(&mut *tx, period_id, input)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Period",
                id: period_id,
            })?;

        let bounds_changed =
            period.starts_at != current.starts_at || period.ends_at != current.ends_at;
        let event = if bounds_changed {
            let summary = regenerate_period(&mut *tx, &period).await?;
            tracing::info!(
                period_id,
                slots_processed = summary.slots_processed,
                slots_deleted = summary.slots_deleted,
                occurrences_created = summary.occurrences_created,
                "Period bounds changed, occurrences regenerated"
            );
            Some(ScheduleEvent::new(
                EventKind::OccurrencesRegenerated,
                period.id,
            ))
        } else {
            None
        };

        tx.commit().await.map_err(CoreError::from)?;
        Ok((period, event))
    }

    /// Delete a period and everything under it.
    pub async fn delete_period(&self, period_id: DbId) -> Result<(), CoreError> {
        if !PeriodRepo::delete(&self.pool, period_id).await? {
            return Err(CoreError::NotFound {
                entity: "Period",
                id: period_id,
            });
        }
        tracing::info!(period_id, "Period deleted");
        Ok(())
    }

    /// Expand every slot under the period's categories into
    /// occurrences. Idempotent: each slot's occurrences are replaced
    /// wholesale.
    pub async fn generate_for_period(
        &self,
        period_id: DbId,
    ) -> Result<(GenerationSummary, ScheduleEvent), CoreError> {
        let mut tx = self.begin().await?;

        let period = PeriodRepo::find_for_update(&mut *tx, period_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Period",
                id: period_id,
            })?;

        let summary = regenerate_period(&mut *tx, &period).await?;
        tx.commit().await.map_err(CoreError::from)?;

        tracing::info!(
            period_id,
            slots_processed = summary.slots_processed,
            slots_deleted = summary.slots_deleted,
            occurrences_created = summary.occurrences_created,
            "Occurrences generated for period"
        );
        let event = ScheduleEvent::new(EventKind::OccurrencesRegenerated, period_id);
        Ok((summary, event))
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    /// Create a category under an existing period.
    pub async fn create_category(&self, input: &CreateCategory) -> Result<Category, CoreError> {
        input
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        PeriodRepo::find_by_id(&self.pool, input.period_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Period",
                id: input.period_id,
            })?;
        let category = CategoryRepo::create(&self.pool, input).await?;
        tracing::info!(
            category_id = category.id,
            period_id = category.period_id,
            "Category created"
        );
        Ok(category)
    }

    /// Update a category in place (no period move, no regeneration).
    pub async fn update_category(
        &self,
        category_id: DbId,
        input: &UpdateCategory,
    ) -> Result<Category, CoreError> {
        CategoryRepo::update(&self.pool, category_id, input)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Category",
                id: category_id,
            })
    }

    /// Reassign a category to another period, regenerating every slot
    /// under it against the new range. Slots with no occurrence in the
    /// new range are deleted.
    pub async fn move_category(
        &self,
        category_id: DbId,
        new_period_id: DbId,
    ) -> Result<(Category, ScheduleEvent), CoreError> {
        let mut tx = self.begin().await?;

        CategoryRepo::find_for_update(&mut *tx, category_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Category",
                id: category_id,
            })?;
        let period = PeriodRepo::find_for_update(&mut *tx, new_period_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Period",
                id: new_period_id,
            })?;

        let category = CategoryRepo::set_period(&mut *tx, category_id, new_period_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Category",
                id: category_id,
            })?;

        let slots = SlotRepo::list_for_category_for_update(&mut *tx, category_id).await?;
        let mut deleted = 0usize;
        let mut created = 0usize;
        for slot in &slots {
            let regen = regenerate_slot(
                &mut *tx,
                period.starts_at,
                period.ends_at,
                slot.id,
                slot.day_of_week,
                slot.starts_at,
            )
            .await?;
            if regen.slot_deleted {
                deleted += 1;
            }
            created += regen.occurrences_created;
        }
        tx.commit().await.map_err(CoreError::from)?;

        tracing::info!(
            category_id,
            new_period_id,
            slots_deleted = deleted,
            occurrences_created = created,
            "Category moved between periods"
        );
        let event = ScheduleEvent::new(EventKind::OccurrencesRegenerated, new_period_id);
        Ok((category, event))
    }

    /// Delete a category and everything under it.
    pub async fn delete_category(&self, category_id: DbId) -> Result<(), CoreError> {
        if !CategoryRepo::delete(&self.pool, category_id).await? {
            return Err(CoreError::NotFound {
                entity: "Category",
                id: category_id,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Slots
    // -----------------------------------------------------------------------

    /// Create a recurring slot and materialize its occurrences within
    /// the owning period's range. A recurrence that never occurs in the
    /// range is rejected outright.
    pub async fn create_slot(
        &self,
        input: &CreateSlot,
    ) -> Result<(RecurringSlot, usize), CoreError> {
        input
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        if input.starts_at >= input.ends_at {
            return Err(CoreError::Validation(
                "slot start time must precede its end time".to_string(),
            ));
        }

        let mut tx = self.begin().await?;

        let category = CategoryRepo::find_for_update(&mut *tx, input.category_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Category",
                id: input.category_id,
            })?;
        // Lock the period row so slot creation serializes with period
        // bound edits (which regenerate under the same lock).
        let period = PeriodRepo::find_for_update(&mut *tx, category.period_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Period",
                id: category.period_id,
            })?;

        let times = occurrence_times(
            period.starts_at,
            period.ends_at,
            input.day_of_week,
            input.starts_at,
        );
        if times.is_empty() {
            return Err(CoreError::Validation(format!(
                "slot on weekday {} never occurs within period {}",
                input.day_of_week, period.id
            )));
        }

        let slot = SlotRepo::create(&mut *tx, input).await?;
        let occurrences = OccurrenceRepo::replace_for_slot(&mut *tx, slot.id, &times).await?;
        tx.commit().await.map_err(CoreError::from)?;

        tracing::info!(
            slot_id = slot.id,
            category_id = slot.category_id,
            occurrences = occurrences.len(),
            "Slot created"
        );
        Ok((slot, occurrences.len()))
    }

    /// Update a slot. A weekday or time change triggers regeneration;
    /// if the new recurrence never occurs in the period the slot is
    /// deleted and the regeneration outcome says so.
    pub async fn update_slot(
        &self,
        slot_id: DbId,
        input: &UpdateSlot,
    ) -> Result<(RecurringSlot, Option<SlotRegeneration>), CoreError> {
        if let Some(day) = input.day_of_week {
            if !(0..=6).contains(&day) {
                return Err(CoreError::Validation(
                    "day_of_week must be between 0 and 6".to_string(),
                ));
            }
        }
        if let Some(capacity) = input.capacity {
            if capacity < 1 {
                return Err(CoreError::Validation(
                    "capacity must be at least 1".to_string(),
                ));
            }
        }

        let mut tx = self.begin().await?;

        let detail = SlotRepo::find_detail_for_update(&mut *tx, slot_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "RecurringSlot",
                id: slot_id,
            })?;

        let new_start = input.starts_at.unwrap_or(detail.starts_at);
        let new_end = input.ends_at.unwrap_or(detail.ends_at);
        if new_start >= new_end {
            return Err(CoreError::Validation(
                "slot start time must precede its end time".to_string(),
            ));
        }

        let slot = SlotRepo::update(&mut *tx, slot_id, input)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "RecurringSlot",
                id: slot_id,
            })?;

        let recurrence_changed =
            slot.day_of_week != detail.day_of_week || slot.starts_at != detail.starts_at;
        let regeneration = if recurrence_changed {
            let regen = regenerate_slot(
                &mut *tx,
                detail.period_starts_at,
                detail.period_ends_at,
                slot.id,
                slot.day_of_week,
                slot.starts_at,
            )
            .await?;
            tracing::info!(
                slot_id,
                slot_deleted = regen.slot_deleted,
                occurrences_created = regen.occurrences_created,
                "Slot recurrence changed, occurrences regenerated"
            );
            Some(regen)
        } else {
            None
        };

        tx.commit().await.map_err(CoreError::from)?;
        Ok((slot, regeneration))
    }

    /// Delete a slot (cascades to occurrences and claims).
    pub async fn delete_slot(&self, slot_id: DbId) -> Result<(), CoreError> {
        let mut tx = self.begin().await?;
        if !SlotRepo::delete(&mut *tx, slot_id).await? {
            return Err(CoreError::NotFound {
                entity: "RecurringSlot",
                id: slot_id,
            });
        }
        tx.commit().await.map_err(CoreError::from)?;
        tracing::info!(slot_id, "Slot deleted");
        Ok(())
    }

    /// Regenerate one slot's occurrences from its owning period's
    /// current range. The slot is deleted when the result is empty.
    pub async fn regenerate_for_slot(
        &self,
        slot_id: DbId,
    ) -> Result<(SlotRegeneration, ScheduleEvent), CoreError> {
        let mut tx = self.begin().await?;

        let detail = SlotRepo::find_detail_for_update(&mut *tx, slot_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "RecurringSlot",
                id: slot_id,
            })?;

        let regen = regenerate_slot(
            &mut *tx,
            detail.period_starts_at,
            detail.period_ends_at,
            detail.id,
            detail.day_of_week,
            detail.starts_at,
        )
        .await?;

        let (claimed, affected) = if regen.slot_deleted {
            (0, Vec::new())
        } else {
            (
                SlotClaimRepo::count_for_slot(&mut *tx, slot_id).await?,
                SlotClaimRepo::user_ids_for_slot(&mut *tx, slot_id).await?,
            )
        };
        tx.commit().await.map_err(CoreError::from)?;

        let event = ScheduleEvent::new(EventKind::OccurrencesRegenerated, detail.period_id)
            .with_slot(slot_id)
            .with_delta(AvailabilityDelta {
                available_slots: i64::from(detail.capacity) - claimed,
                total_slots: i64::from(detail.capacity),
                affected_users: affected,
            });
        Ok((regen, event))
    }
}

// ---------------------------------------------------------------------------
// Shared regeneration plumbing
// ---------------------------------------------------------------------------

/// Replace one slot's occurrences from the given period range, deleting
/// the slot when the expansion is empty, and re-fanning standing slot
/// claims onto the fresh rows.
async fn regenerate_slot(
    conn: &mut PgConnection,
    period_starts_at: Timestamp,
    period_ends_at: Timestamp,
    slot_id: DbId,
    day_of_week: i16,
    slot_start: NaiveTime,
) -> Result<SlotRegeneration, sqlx::Error> {
    let times = occurrence_times(period_starts_at, period_ends_at, day_of_week, slot_start);

    if times.is_empty() {
        SlotRepo::delete(&mut *conn, slot_id).await?;
        return Ok(SlotRegeneration {
            slot_id,
            slot_deleted: true,
            occurrences_created: 0,
        });
    }

    let occurrences = OccurrenceRepo::replace_for_slot(&mut *conn, slot_id, &times).await?;
    OccurrenceClaimRepo::fan_out_all_claimants(&mut *conn, slot_id).await?;
    Ok(SlotRegeneration {
        slot_id,
        slot_deleted: false,
        occurrences_created: occurrences.len(),
    })
}

/// Regenerate every slot under a period.
async fn regenerate_period(
    conn: &mut PgConnection,
    period: &Period,
) -> Result<GenerationSummary, sqlx::Error> {
    let slots = SlotRepo::list_for_period_for_update(&mut *conn, period.id).await?;

    let mut deleted = 0usize;
    let mut created = 0usize;
    for slot in &slots {
        let regen = regenerate_slot(
            &mut *conn,
            period.starts_at,
            period.ends_at,
            slot.id,
            slot.day_of_week,
            slot.starts_at,
        )
        .await?;
        if regen.slot_deleted {
            deleted += 1;
        }
        created += regen.occurrences_created;
    }

    Ok(GenerationSummary {
        period_id: period.id,
        slots_processed: slots.len(),
        slots_deleted: deleted,
        occurrences_created: created,
    })
}

/// Shared shape validation for period create/update: ordered bounds and
/// non-inverted window pairs.
fn validate_period_shape(
    starts_at: Timestamp,
    ends_at: Timestamp,
    windows: &[(&str, Option<Timestamp>, Option<Timestamp>)],
) -> Result<(), CoreError> {
    if starts_at >= ends_at {
        return Err(CoreError::Validation(
            "period start must precede its end".to_string(),
        ));
    }
    for (label, opens, closes) in windows {
        Window::new(*opens, *closes).validate(label)?;
    }
    Ok(())
}
