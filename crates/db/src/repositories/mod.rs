//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods.
//! Plain reads accept `&PgPool`; methods that must run inside a caller's
//! transaction accept `&mut PgConnection` (pass `&mut *tx`).

pub mod category_repo;
pub mod occurrence_claim_repo;
pub mod occurrence_repo;
pub mod period_repo;
pub mod slot_claim_repo;
pub mod slot_repo;

pub use category_repo::CategoryRepo;
pub use occurrence_claim_repo::OccurrenceClaimRepo;
pub use occurrence_repo::OccurrenceRepo;
pub use period_repo::PeriodRepo;
pub use slot_claim_repo::SlotClaimRepo;
pub use slot_repo::SlotRepo;
