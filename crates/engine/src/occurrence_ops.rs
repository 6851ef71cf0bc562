//! Per-occurrence drop and pick-up.
//!
//! State machine per (occurrence, user):
//!
//! ```text
//! [no row] --register (slot-level)--> assigned
//! assigned --drop-->                  dropped
//! dropped  --pickup (other user)-->   picked_up   (new row, new user)
//! ```
//!
//! A drop leaves the slot claim untouched, preserving the recurring
//! claim on unaffected occurrences, and the dropped row is kept as
//! history. Both operations serialize on a `FOR UPDATE` lock on the
//! occurrence row, plus the owning slot row so a pick-up cannot race a
//! registration's fan-out past the per-occurrence capacity ceiling.

use chrono::Utc;

use rota_core::eligibility::{can_access_period, is_eligible};
use rota_core::types::DbId;
use rota_core::{Actor, CoreError};
use rota_db::models::claim::{ClaimStatus, OccurrenceClaim};
use rota_db::repositories::{OccurrenceClaimRepo, OccurrenceRepo, SlotClaimRepo};
use rota_events::{AvailabilityDelta, EventKind, ScheduleEvent};

use crate::Engine;

impl Engine {
    /// Drop one occurrence of a slot the user is assigned to.
    ///
    /// Preconditions: occurrence exists (`NotFound`) and lies strictly
    /// in the future (`WindowClosed`) → modify window open
    /// (`WindowClosed`) → the caller holds an active row on it
    /// (`NotFound`). The row's status flips to `dropped`.
    pub async fn drop_occurrence(
        &self,
        occurrence_id: DbId,
        actor: &Actor,
    ) -> Result<(OccurrenceClaim, ScheduleEvent), CoreError> {
        let mut tx = self.begin().await?;

        let occ = OccurrenceRepo::find_detail_for_update(&mut *tx, occurrence_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Occurrence",
                id: occurrence_id,
            })?;

        let now = Utc::now();
        if occ.starts_at <= now {
            return Err(CoreError::WindowClosed(format!(
                "occurrence {occurrence_id} has already started"
            )));
        }
        if !occ.modify_window().contains(now) {
            return Err(CoreError::WindowClosed(format!(
                "modify window for period {} is not open",
                occ.period_id
            )));
        }

        let claim = OccurrenceClaimRepo::find_active(&mut *tx, occurrence_id, actor.user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "OccurrenceClaim",
                id: occurrence_id,
            })?;

        let dropped = OccurrenceClaimRepo::set_status(&mut *tx, claim.id, ClaimStatus::Dropped)
            .await?;
        let active = OccurrenceClaimRepo::count_active(&mut *tx, occurrence_id).await?;
        let affected = OccurrenceClaimRepo::active_user_ids(&mut *tx, occurrence_id).await?;

        tx.commit().await.map_err(CoreError::from)?;

        tracing::info!(
            occurrence_id,
            user_id = actor.user_id,
            claim_id = dropped.id,
            "Occurrence dropped"
        );

        let event = ScheduleEvent::new(EventKind::OccurrenceDropped, occ.period_id)
            .with_occurrence(occurrence_id)
            .with_user(actor.user_id)
            .with_delta(AvailabilityDelta {
                available_slots: i64::from(occ.capacity) - active,
                total_slots: i64::from(occ.capacity),
                affected_users: affected,
            });
        Ok((dropped, event))
    }

    /// Pick up a vacancy another user's drop left on an occurrence.
    ///
    /// Preconditions: occurrence exists (`NotFound`) and lies strictly
    /// in the future (`WindowClosed`) → modify window open
    /// (`WindowClosed`) → eligibility (`Forbidden`) → the caller holds
    /// no row of any status on the occurrence (`AlreadyExists`) and no
    /// standing claim on the owning slot (`Forbidden`) → a vacancy
    /// exists: at least one `dropped` row and active count below
    /// capacity (`CapacityExceeded`). Inserts a new `picked_up` row;
    /// the dropped row remains as history.
    pub async fn pickup_occurrence(
        &self,
        occurrence_id: DbId,
        actor: &Actor,
    ) -> Result<(OccurrenceClaim, ScheduleEvent), CoreError> {
        let mut tx = self.begin().await?;

        let occ = OccurrenceRepo::find_detail_for_update(&mut *tx, occurrence_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Occurrence",
                id: occurrence_id,
            })?;

        let now = Utc::now();
        if occ.starts_at <= now {
            return Err(CoreError::WindowClosed(format!(
                "occurrence {occurrence_id} has already started"
            )));
        }
        if !occ.modify_window().contains(now) {
            return Err(CoreError::WindowClosed(format!(
                "modify window for period {} is not open",
                occ.period_id
            )));
        }

        if !can_access_period(actor, &occ.allowed_role_ids)
            || !is_eligible(actor, occ.role_mode, &occ.required_role_ids)
        {
            return Err(CoreError::Forbidden(format!(
                "user {} does not satisfy the role requirements for occurrence {occurrence_id}",
                actor.user_id
            )));
        }

        if OccurrenceClaimRepo::exists_any(&mut *tx, occurrence_id, actor.user_id).await? {
            return Err(CoreError::AlreadyExists(format!(
                "user {} already holds a claim on occurrence {occurrence_id}",
                actor.user_id
            )));
        }
        // A standing slot claim already covers this occurrence (or did
        // until its holder dropped it); re-claiming through pick-up is
        // disallowed.
        if SlotClaimRepo::find(&mut *tx, occ.slot_id, actor.user_id)
            .await?
            .is_some()
        {
            return Err(CoreError::Forbidden(format!(
                "user {} holds a standing claim on slot {} and cannot pick up its occurrences",
                actor.user_id, occ.slot_id
            )));
        }

        let vacancies = OccurrenceClaimRepo::count_dropped(&mut *tx, occurrence_id).await?;
        let active = OccurrenceClaimRepo::count_active(&mut *tx, occurrence_id).await?;
        if vacancies == 0 || active >= i64::from(occ.capacity) {
            return Err(CoreError::CapacityExceeded {
                slot_id: occ.slot_id,
                capacity: occ.capacity,
            });
        }

        let claim =
            OccurrenceClaimRepo::insert(&mut *tx, occurrence_id, actor.user_id, ClaimStatus::PickedUp)
                .await?;
        let active = OccurrenceClaimRepo::count_active(&mut *tx, occurrence_id).await?;
        let affected = OccurrenceClaimRepo::active_user_ids(&mut *tx, occurrence_id).await?;

        tx.commit().await.map_err(CoreError::from)?;

        tracing::info!(
            occurrence_id,
            user_id = actor.user_id,
            claim_id = claim.id,
            "Occurrence picked up"
        );

        let event = ScheduleEvent::new(EventKind::OccurrencePickedUp, occ.period_id)
            .with_occurrence(occurrence_id)
            .with_user(actor.user_id)
            .with_delta(AvailabilityDelta {
                available_slots: i64::from(occ.capacity) - active,
                total_slots: i64::from(occ.capacity),
                affected_users: affected,
            });
        Ok((claim, event))
    }
}
