//! Claim entity models: the durable slot-level claim and the
//! status-tagged per-occurrence claim.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rota_core::types::{DbId, Timestamp};

/// Status of a per-occurrence claim.
///
/// Capacity accounting counts only non-`Dropped` rows; `Dropped` rows
/// are retained as history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Created by slot-level registration fan-out.
    Assigned,
    /// The holder gave this one occurrence up; the slot claim remains.
    Dropped,
    /// A different user filled a vacancy left by a drop.
    PickedUp,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Assigned => "assigned",
            ClaimStatus::Dropped => "dropped",
            ClaimStatus::PickedUp => "picked_up",
        }
    }
}

/// A row from the `slot_claims` table: a user's standing claim on a
/// recurring slot. Unique per (slot, user).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SlotClaim {
    pub id: DbId,
    pub slot_id: DbId,
    pub user_id: DbId,
    pub created_at: Timestamp,
}

/// A row from the `occurrence_claims` table: one user's status on one
/// occurrence.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OccurrenceClaim {
    pub id: DbId,
    pub occurrence_id: DbId,
    pub user_id: DbId,
    pub status: ClaimStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
