/// Engine configuration loaded from environment variables.
///
/// Both knobs bound how long a mutating transaction may spend inside
/// the database: `lock_timeout` caps waiting on a row lock (registration
/// bursts at term start contend on popular slots) and
/// `statement_timeout` caps total statement execution. Exceeding either
/// surfaces as a retryable `Conflict`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Per-statement lock-wait bound in milliseconds (default: `2000`).
    pub lock_timeout_ms: u64,
    /// Per-statement execution bound in milliseconds (default: `10000`).
    pub statement_timeout_ms: u64,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default |
    /// |-------------------------|---------|
    /// | `LOCK_TIMEOUT_MS`       | `2000`  |
    /// | `STATEMENT_TIMEOUT_MS`  | `10000` |
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let lock_timeout_ms: u64 = std::env::var("LOCK_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".into())
            .parse()
            .expect("LOCK_TIMEOUT_MS must be a valid u64");

        let statement_timeout_ms: u64 = std::env::var("STATEMENT_TIMEOUT_MS")
            .unwrap_or_else(|_| "10000".into())
            .parse()
            .expect("STATEMENT_TIMEOUT_MS must be a valid u64");

        Self {
            lock_timeout_ms,
            statement_timeout_ms,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 2_000,
            statement_timeout_ms: 10_000,
        }
    }
}
