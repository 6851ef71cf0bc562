//! Recurring slot entity model.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use rota_core::eligibility::RoleMode;
use rota_core::types::{DbId, Timestamp};
use rota_core::window::Window;

/// A row from the `recurring_slots` table: a weekly recurrence
/// (day + time + capacity) under one category.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecurringSlot {
    pub id: DbId,
    pub category_id: DbId,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: i16,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub capacity: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a recurring slot.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSlot {
    pub category_id: DbId,
    #[validate(range(min = 0, max = 6))]
    pub day_of_week: i16,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    #[validate(range(min = 1))]
    pub capacity: i32,
}

/// DTO for patching a recurring slot. Only non-`None` fields are
/// applied; a weekday or time change triggers regeneration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSlot {
    pub day_of_week: Option<i16>,
    pub starts_at: Option<NaiveTime>,
    pub ends_at: Option<NaiveTime>,
    pub capacity: Option<i32>,
}

/// A slot joined with its owning category and period, as loaded (and
/// row-locked) for registration decisions. One round trip gathers
/// every gating input.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SlotDetail {
    pub id: DbId,
    pub category_id: DbId,
    pub day_of_week: i16,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub capacity: i32,
    pub role_mode: RoleMode,
    pub required_role_ids: Vec<DbId>,
    pub allow_self_unregister: bool,
    pub period_id: DbId,
    pub period_starts_at: Timestamp,
    pub period_ends_at: Timestamp,
    pub allowed_role_ids: Vec<DbId>,
    pub signup_opens: Option<Timestamp>,
    pub signup_closes: Option<Timestamp>,
    pub modify_opens: Option<Timestamp>,
    pub modify_closes: Option<Timestamp>,
}

impl SlotDetail {
    pub fn signup_window(&self) -> Window {
        Window::new(self.signup_opens, self.signup_closes)
    }

    pub fn modify_window(&self) -> Window {
        Window::new(self.modify_opens, self.modify_closes)
    }
}

/// Capacity summary for one slot.
#[derive(Debug, Clone, Serialize)]
pub struct SlotAvailability {
    pub slot_id: DbId,
    pub capacity: i32,
    pub claimed: i64,
    pub available: i64,
}
