//! Role-based eligibility gating for categories and periods.

use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::types::DbId;

/// How a category's required role set gates registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoleMode {
    /// No role requirement; any authenticated user is eligible.
    Disabled,
    /// The actor must hold every required role.
    All,
    /// The actor must hold at least one required role.
    Any,
}

/// Evaluate a category's role requirement against an actor.
///
/// System accounts bypass the gate before any mode logic runs.
pub fn is_eligible(actor: &Actor, mode: RoleMode, required_role_ids: &[DbId]) -> bool {
    if actor.is_system {
        return true;
    }
    match mode {
        RoleMode::Disabled => true,
        RoleMode::All => required_role_ids.iter().all(|r| actor.has_role(*r)),
        RoleMode::Any => required_role_ids.iter().any(|r| actor.has_role(*r)),
    }
}

/// Evaluate a period's role restriction against an actor.
///
/// An empty `allowed_role_ids` means the period is unrestricted;
/// otherwise the actor must hold at least one listed role. System
/// accounts always pass.
pub fn can_access_period(actor: &Actor, allowed_role_ids: &[DbId]) -> bool {
    if actor.is_system || allowed_role_ids.is_empty() {
        return true;
    }
    allowed_role_ids.iter().any(|r| actor.has_role(*r))
}
