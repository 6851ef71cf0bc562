//! Read surface: visibility-gated period listing, capacity summaries,
//! and the occurrence roster consumed by the attendance subsystem.

use chrono::Utc;

use rota_core::eligibility::can_access_period;
use rota_core::types::DbId;
use rota_core::{Actor, CoreError};
use rota_db::models::claim::OccurrenceClaim;
use rota_db::models::occurrence::Occurrence;
use rota_db::models::period::Period;
use rota_db::models::slot::SlotAvailability;
use rota_db::repositories::{OccurrenceClaimRepo, OccurrenceRepo, PeriodRepo, SlotRepo};

use crate::Engine;

impl Engine {
    /// Periods the actor may see: visibility window open (or absent)
    /// and the period's role restriction satisfied.
    pub async fn list_visible_periods(&self, actor: &Actor) -> Result<Vec<Period>, CoreError> {
        let now = Utc::now();
        let periods = PeriodRepo::list(&self.pool).await?;
        Ok(periods
            .into_iter()
            .filter(|p| {
                p.visibility_window().contains(now)
                    && can_access_period(actor, &p.allowed_role_ids)
            })
            .collect())
    }

    /// Capacity summary for a slot, derived from the store at call
    /// time.
    pub async fn slot_availability(&self, slot_id: DbId) -> Result<SlotAvailability, CoreError> {
        SlotRepo::availability(&self.pool, slot_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "RecurringSlot",
                id: slot_id,
            })
    }

    /// All occurrences of a slot, ascending.
    pub async fn slot_occurrences(&self, slot_id: DbId) -> Result<Vec<Occurrence>, CoreError> {
        SlotRepo::find_by_id(&self.pool, slot_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "RecurringSlot",
                id: slot_id,
            })?;
        Ok(OccurrenceRepo::list_for_slot(&self.pool, slot_id).await?)
    }

    /// Every claim row on an occurrence, dropped history included.
    /// Read-only; the attendance subsystem correlates live sessions
    /// with scheduled shifts through this.
    pub async fn occurrence_roster(
        &self,
        occurrence_id: DbId,
    ) -> Result<Vec<OccurrenceClaim>, CoreError> {
        OccurrenceRepo::find_by_id(&self.pool, occurrence_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Occurrence",
                id: occurrence_id,
            })?;
        Ok(OccurrenceClaimRepo::list_for_occurrence(&self.pool, occurrence_id).await?)
    }
}
