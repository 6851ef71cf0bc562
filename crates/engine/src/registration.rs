//! Slot-level registration and unregistration.
//!
//! Registration is the capacity-critical path: the slot row is locked
//! `FOR UPDATE` before the claim count is read and the lock is held
//! through the claim insert and occurrence fan-out, so concurrent
//! registrations for the same slot are strictly ordered. Two users
//! racing for the last seat cannot both observe `count < capacity`.

use chrono::Utc;
use serde::Serialize;

use rota_core::eligibility::{can_access_period, is_eligible};
use rota_core::types::DbId;
use rota_core::{Actor, CoreError};
use rota_db::models::claim::SlotClaim;
use rota_db::repositories::{OccurrenceClaimRepo, SlotClaimRepo, SlotRepo};
use rota_events::{AvailabilityDelta, EventKind, ScheduleEvent};

use crate::Engine;

/// Outcome of a successful registration.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub claim: SlotClaim,
    /// Number of `assigned` occurrence-claim rows fanned out.
    pub occurrence_claims: u64,
    /// Pending event to publish after this call returns.
    pub event: ScheduleEvent,
}

impl Engine {
    /// Register a user for a recurring slot.
    ///
    /// Preconditions, checked in order, each a distinct failure:
    /// slot exists (`NotFound`) → eligibility (`Forbidden`) → signup
    /// window open (`WindowClosed`) → no existing claim
    /// (`AlreadyExists`) → claim count below capacity
    /// (`CapacityExceeded`) → after fan-out, no occurrence over its
    /// per-occurrence ceiling (`CapacityExceeded`; pick-ups can fill
    /// an occurrence beyond what the slot-claim count shows).
    ///
    /// On success the slot claim is inserted and one `assigned`
    /// occurrence claim is fanned out per existing occurrence, all in
    /// one transaction.
    pub async fn register(
        &self,
        slot_id: DbId,
        actor: &Actor,
    ) -> Result<Registration, CoreError> {
        let mut tx = self.begin().await?;

        let slot = SlotRepo::find_detail_for_update(&mut *tx, slot_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "RecurringSlot",
                id: slot_id,
            })?;

        if !can_access_period(actor, &slot.allowed_role_ids)
            || !is_eligible(actor, slot.role_mode, &slot.required_role_ids)
        {
            return Err(CoreError::Forbidden(format!(
                "user {} does not satisfy the role requirements for slot {slot_id}",
                actor.user_id
            )));
        }

        let now = Utc::now();
        if !slot.signup_window().contains(now) {
            return Err(CoreError::WindowClosed(format!(
                "signup window for period {} is not open",
                slot.period_id
            )));
        }

        if SlotClaimRepo::find(&mut *tx, slot_id, actor.user_id)
            .await?
            .is_some()
        {
            return Err(CoreError::AlreadyExists(format!(
                "user {} already claims slot {slot_id}",
                actor.user_id
            )));
        }

        let claimed = SlotClaimRepo::count_for_slot(&mut *tx, slot_id).await?;
        if claimed >= i64::from(slot.capacity) {
            return Err(CoreError::CapacityExceeded {
                slot_id,
                capacity: slot.capacity,
            });
        }

        let claim = SlotClaimRepo::insert(&mut *tx, slot_id, actor.user_id).await?;
        let fanned = OccurrenceClaimRepo::fan_out_assigned(&mut *tx, slot_id, actor.user_id).await?;

        // The slot-claim count alone cannot see seats taken by
        // pick-ups (their holders have no slot claim), so an
        // occurrence can already be full even though the slot is not.
        // Re-check the per-occurrence ceiling after the fan-out; the
        // rollback undoes the claim and its rows.
        let max_active = OccurrenceClaimRepo::max_active_for_slot(&mut *tx, slot_id).await?;
        if max_active > i64::from(slot.capacity) {
            return Err(CoreError::CapacityExceeded {
                slot_id,
                capacity: slot.capacity,
            });
        }

        let affected = SlotClaimRepo::user_ids_for_slot(&mut *tx, slot_id).await?;

        tx.commit().await.map_err(CoreError::from)?;

        tracing::info!(
            slot_id,
            user_id = actor.user_id,
            occurrence_claims = fanned,
            "User registered for slot"
        );

        let event = ScheduleEvent::new(EventKind::SlotRegistered, slot.period_id)
            .with_slot(slot_id)
            .with_user(actor.user_id)
            .with_delta(AvailabilityDelta {
                available_slots: i64::from(slot.capacity) - (claimed + 1),
                total_slots: i64::from(slot.capacity),
                affected_users: affected,
            });

        Ok(Registration {
            claim,
            occurrence_claims: fanned,
            event,
        })
    }

    /// Unregister a user from a recurring slot.
    ///
    /// Preconditions: the category permits self-service unregistration
    /// (system accounts bypass this) → signup window open → a standing
    /// claim exists. On success the slot claim and every
    /// occurrence-claim row the user holds under the slot are removed.
    pub async fn unregister(
        &self,
        slot_id: DbId,
        actor: &Actor,
    ) -> Result<ScheduleEvent, CoreError> {
        let mut tx = self.begin().await?;

        let slot = SlotRepo::find_detail_for_update(&mut *tx, slot_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "RecurringSlot",
                id: slot_id,
            })?;

        if !slot.allow_self_unregister && !actor.is_system {
            return Err(CoreError::Forbidden(format!(
                "self-service unregistration is disabled for category {}",
                slot.category_id
            )));
        }

        let now = Utc::now();
        if !slot.signup_window().contains(now) {
            return Err(CoreError::WindowClosed(format!(
                "signup window for period {} is not open",
                slot.period_id
            )));
        }

        let claim = SlotClaimRepo::find(&mut *tx, slot_id, actor.user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "SlotClaim",
                id: slot_id,
            })?;

        SlotClaimRepo::delete(&mut *tx, slot_id, actor.user_id).await?;
        let removed =
            OccurrenceClaimRepo::delete_for_slot_user(&mut *tx, slot_id, actor.user_id).await?;
        let claimed = SlotClaimRepo::count_for_slot(&mut *tx, slot_id).await?;
        let affected = SlotClaimRepo::user_ids_for_slot(&mut *tx, slot_id).await?;

        tx.commit().await.map_err(CoreError::from)?;

        tracing::info!(
            slot_id,
            user_id = actor.user_id,
            claim_id = claim.id,
            occurrence_claims_removed = removed,
            "User unregistered from slot"
        );

        Ok(ScheduleEvent::new(EventKind::SlotUnregistered, slot.period_id)
            .with_slot(slot_id)
            .with_user(actor.user_id)
            .with_delta(AvailabilityDelta {
                available_slots: i64::from(slot.capacity) - claimed,
                total_slots: i64::from(slot.capacity),
                affected_users: affected,
            }))
    }
}
