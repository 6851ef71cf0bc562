//! Category entity model.
//!
//! A category is a class of work under one period, carrying the
//! role-eligibility rule for registration.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use rota_core::eligibility::RoleMode;
use rota_core::types::{DbId, Timestamp};

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub period_id: DbId,
    pub name: String,
    pub role_mode: RoleMode,
    pub required_role_ids: Vec<DbId>,
    /// Whether members may unregister themselves from slots in this
    /// category during the signup window.
    pub allow_self_unregister: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a category.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategory {
    pub period_id: DbId,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub role_mode: RoleMode,
    #[serde(default)]
    pub required_role_ids: Vec<DbId>,
    #[serde(default = "default_true")]
    pub allow_self_unregister: bool,
}

/// DTO for patching a category. Only non-`None` fields are applied;
/// moving a category between periods goes through the engine's
/// `move_category` (the patch deliberately excludes `period_id`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub role_mode: Option<RoleMode>,
    pub required_role_ids: Option<Vec<DbId>>,
    pub allow_self_unregister: Option<bool>,
}

fn default_true() -> bool {
    true
}
