use crate::types::DbId;

/// Domain error taxonomy shared by the repository and engine layers.
///
/// Every precondition failure maps to a specific variant before any
/// mutation happens; [`CoreError::Conflict`] is the only class callers
/// should automatically retry.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Window closed: {0}")]
    WindowClosed(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Capacity exceeded for slot {slot_id} (capacity {capacity})")]
    CapacityExceeded { slot_id: DbId, capacity: i32 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether a caller may safely retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Conflict(_))
    }
}

impl From<sqlx::Error> for CoreError {
    /// Classify a sqlx error into the domain taxonomy.
    ///
    /// - `RowNotFound` is `Internal`: repositories use `fetch_optional`
    ///   and translate missing rows themselves, so a raw `RowNotFound`
    ///   escaping means a query bug.
    /// - Unique violations (23505) on `uq_`-prefixed constraints map to
    ///   `AlreadyExists` (a duplicate claim raced past the precondition
    ///   check); other unique violations map to `Conflict`.
    /// - Lock timeouts (55P03), canceled statements (57014), and
    ///   serialization failures (40001) map to the retryable `Conflict`.
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code();
                match code.as_deref() {
                    Some("23505") => {
                        let constraint = db_err.constraint().unwrap_or("unknown");
                        if constraint.starts_with("uq_") {
                            CoreError::AlreadyExists(format!(
                                "duplicate value violates unique constraint {constraint}"
                            ))
                        } else {
                            CoreError::Conflict(format!(
                                "unique constraint violation: {constraint}"
                            ))
                        }
                    }
                    Some("55P03") | Some("57014") | Some("40001") => CoreError::Conflict(
                        "lock contention or statement timeout, retry the operation".to_string(),
                    ),
                    _ => CoreError::Internal(db_err.to_string()),
                }
            }
            other => CoreError::Internal(other.to_string()),
        }
    }
}
