//! Transactional orchestration layer for shift scheduling.
//!
//! [`Engine`] is the single entry point for every scheduling mutation:
//! period/category/slot administration with occurrence regeneration,
//! capacity-gated slot registration, and per-occurrence drop/pick-up.
//!
//! Invariants the engine upholds:
//!
//! - Every mutating operation runs in exactly one transaction; partial
//!   application (a slot claim without its occurrence fan-out, a slot
//!   with half its occurrences) is never observable.
//! - Registration serializes on an exclusive `FOR UPDATE` lock on the
//!   slot row, held from the claim-count read through the insert, so
//!   two users racing for the last seat cannot both succeed.
//! - Drop/pick-up serialize per occurrence and take the slot row lock
//!   too, ordering them against registration fan-out; a partial unique
//!   index on active claims backstops the same-user race.
//! - Capacity is always re-derived from the store at decision time;
//!   nothing caches it in memory.
//! - Lock waits and statement execution are time-bounded (`SET LOCAL
//!   lock_timeout` / `statement_timeout`); exceeding them surfaces as
//!   the retryable [`CoreError::Conflict`].
//!
//! Mutations return the resulting entity together with a pending
//! [`ScheduleEvent`](rota_events::ScheduleEvent). The engine never
//! publishes; callers hand the event to an
//! [`EventBus`](rota_events::EventBus) after the call returns, which is
//! by construction after commit.

mod config;
mod generation;
mod occurrence_ops;
mod queries;
mod registration;

pub use config::EngineConfig;
pub use generation::{GenerationSummary, SlotRegeneration};
pub use registration::Registration;

use sqlx::{PgPool, Postgres, Transaction};

use rota_core::CoreError;

/// The scheduling engine. Cheap to clone; holds the pool and config.
#[derive(Clone)]
pub struct Engine {
    pool: PgPool,
    config: EngineConfig,
}

impl Engine {
    pub fn new(pool: PgPool, config: EngineConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Open a transaction with the configured lock-wait and execution
    /// time bounds applied.
    pub(crate) async fn begin(&self) -> Result<Transaction<'static, Postgres>, CoreError> {
        let mut tx = self.pool.begin().await.map_err(CoreError::from)?;
        // SET LOCAL takes no bind parameters; the values are integers
        // from our own config.
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.config.lock_timeout_ms
        ))
        .execute(&mut *tx)
        .await
        .map_err(CoreError::from)?;
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{}ms'",
            self.config.statement_timeout_ms
        ))
        .execute(&mut *tx)
        .await
        .map_err(CoreError::from)?;
        Ok(tx)
    }
}
