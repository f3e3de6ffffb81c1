//! # System Constants
//!
//! Operational defaults for the migrator. Every value here can be overridden
//! through `MigratorConfig`; these are the numbers the tool falls back to when
//! a setting is absent.

/// Default number of source records fetched per content type
pub const DEFAULT_RECORD_PAGE_SIZE: usize = 500;

/// Number of consecutive record creates before the pacing pause kicks in
pub const DEFAULT_PACING_BATCH_SIZE: usize = 5;

/// Length of the pacing pause between record batches, also used as retry backoff
pub const DEFAULT_PACING_DELAY_MS: u64 = 1_000;

/// Attempts allowed for a call failing with a transient error (first try included)
pub const DEFAULT_TRANSIENT_RETRY_LIMIT: u32 = 3;

/// Rate ceilings of the two remote API tiers
pub mod rate_limits {
    /// Length of one fixed rate window
    pub const DEFAULT_WINDOW_SECONDS: u64 = 60;

    /// Calls per window granted to the read (delivery) API
    pub const DEFAULT_READ_CALLS_PER_WINDOW: u32 = 55;

    /// Calls per window granted to the read/write (management) API
    pub const DEFAULT_WRITE_CALLS_PER_WINDOW: u32 = 7;
}

/// Environment variable names
pub mod env {
    /// Prefix for structured configuration overrides (`MIGRATOR_RATE_LIMITS__WINDOW_SECONDS`)
    pub const CONFIG_PREFIX: &str = "MIGRATOR";

    /// Runtime environment name used to pick the default log level
    pub const RUNTIME_ENVIRONMENT: &str = "MIGRATOR_ENV";

    /// `json` switches console logging to JSON lines
    pub const LOG_FORMAT: &str = "MIGRATOR_LOG_FORMAT";

    // Plain variables understood by the original tool's `.env` files
    pub const SPACE: &str = "SPACE";
    pub const FROM_ENV: &str = "FROM_ENV";
    pub const TO_ENV: &str = "TO_ENV";
    pub const READ_ACCESS_TOKEN: &str = "READ_ACCESS_TOKEN";
    pub const MANAGE_ACCESS_TOKEN: &str = "MANAGE_ACCESS_TOKEN";
}

/// Masked value shown in place of credentials
pub const REDACTED: &str = "[REDACTED]";
