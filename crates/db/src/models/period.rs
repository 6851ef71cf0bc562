//! Period entity model.
//!
//! A period bounds all scheduling activity to a date range and carries
//! three optional sub-windows: visibility, signup, and modify.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use rota_core::types::{DbId, Timestamp};
use rota_core::window::Window;

/// A row from the `periods` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Period {
    pub id: DbId,
    pub name: String,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub visible_from: Option<Timestamp>,
    pub visible_until: Option<Timestamp>,
    pub signup_opens: Option<Timestamp>,
    pub signup_closes: Option<Timestamp>,
    pub modify_opens: Option<Timestamp>,
    pub modify_closes: Option<Timestamp>,
    /// Empty = no role restriction.
    pub allowed_role_ids: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Period {
    pub fn visibility_window(&self) -> Window {
        Window::new(self.visible_from, self.visible_until)
    }

    pub fn signup_window(&self) -> Window {
        Window::new(self.signup_opens, self.signup_closes)
    }

    pub fn modify_window(&self) -> Window {
        Window::new(self.modify_opens, self.modify_closes)
    }
}

/// DTO for creating a period.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePeriod {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub visible_from: Option<Timestamp>,
    pub visible_until: Option<Timestamp>,
    pub signup_opens: Option<Timestamp>,
    pub signup_closes: Option<Timestamp>,
    pub modify_opens: Option<Timestamp>,
    pub modify_closes: Option<Timestamp>,
    #[serde(default)]
    pub allowed_role_ids: Vec<DbId>,
}

/// DTO for patching a period. Only non-`None` fields are applied.
///
/// Window endpoints are doubly optional: the outer `None` leaves the
/// column unchanged, `Some(None)` clears it back to unrestricted, and
/// `Some(Some(t))` sets it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePeriod {
    pub name: Option<String>,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    pub visible_from: Option<Option<Timestamp>>,
    pub visible_until: Option<Option<Timestamp>>,
    pub signup_opens: Option<Option<Timestamp>>,
    pub signup_closes: Option<Option<Timestamp>>,
    pub modify_opens: Option<Option<Timestamp>>,
    pub modify_closes: Option<Option<Timestamp>>,
    pub allowed_role_ids: Option<Vec<DbId>>,
}
