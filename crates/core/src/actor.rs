//! Identity snapshot supplied by the external identity/role provider.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// The caller of an engine operation.
///
/// The engine consumes nothing about a user beyond this: its id, the
/// set of role ids it holds, and whether it is a system/administrator
/// account (which bypasses every eligibility gate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: DbId,
    pub role_ids: Vec<DbId>,
    pub is_system: bool,
}

impl Actor {
    /// A regular user holding the given roles.
    pub fn user(user_id: DbId, role_ids: Vec<DbId>) -> Self {
        Self {
            user_id,
            role_ids,
            is_system: false,
        }
    }

    /// A system/administrator account.
    pub fn system(user_id: DbId) -> Self {
        Self {
            user_id,
            role_ids: Vec::new(),
            is_system: true,
        }
    }

    pub fn has_role(&self, role_id: DbId) -> bool {
        self.role_ids.contains(&role_id)
    }
}
