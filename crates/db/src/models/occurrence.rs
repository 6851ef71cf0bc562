//! Occurrence entity model.
//!
//! Occurrences are fully derived rows: one dated instance of a
//! recurring slot, destroyed and recreated wholesale whenever the
//! owning period's range or the slot's recurrence changes.

use serde::Serialize;
use sqlx::FromRow;

use rota_core::eligibility::RoleMode;
use rota_core::types::{DbId, Timestamp};
use rota_core::window::Window;

/// A row from the `occurrences` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Occurrence {
    pub id: DbId,
    pub slot_id: DbId,
    pub starts_at: Timestamp,
    pub created_at: Timestamp,
}

/// An occurrence joined with its slot, category, and period, as loaded
/// (and row-locked) for drop/pick-up decisions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OccurrenceDetail {
    pub id: DbId,
    pub slot_id: DbId,
    pub starts_at: Timestamp,
    pub capacity: i32,
    pub category_id: DbId,
    pub role_mode: RoleMode,
    pub required_role_ids: Vec<DbId>,
    pub period_id: DbId,
    pub allowed_role_ids: Vec<DbId>,
    pub modify_opens: Option<Timestamp>,
    pub modify_closes: Option<Timestamp>,
}

impl OccurrenceDetail {
    pub fn modify_window(&self) -> Window {
        Window::new(self.modify_opens, self.modify_closes)
    }
}
