//! # Migrator Configuration System
//!
//! Layered configuration for a migration run:
//!
//! 1. compiled-in defaults (`crate::constants`)
//! 2. an optional TOML/YAML/JSON file
//! 3. `MIGRATOR_`-prefixed environment variables, `__` between nested keys
//!    (`MIGRATOR_RATE_LIMITS__WRITE_CALLS_PER_WINDOW=5`)
//! 4. the plain `.env` variables of the original tool (`SPACE`, `FROM_ENV`,
//!    `TO_ENV`, `READ_ACCESS_TOKEN`, `MANAGE_ACCESS_TOKEN`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use space_migrator::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::load(None)?;
//! let window = config.rate_limits.window_seconds;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::{self, rate_limits, REDACTED};
use crate::orchestration::error_classifier::ClassifierConfig;
use crate::resilience::RateLimitConfig;
use crate::state_machine::StageSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Semaphore;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Root configuration of the migrator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigratorConfig {
    /// Content space both environments live in
    pub space: String,
    pub source_environment: String,
    pub target_environment: String,
    /// Credential of the read (delivery) API
    pub read_access_token: String,
    /// Credential of the read/write (management) API
    pub manage_access_token: String,
    pub rate_limits: RateLimitSettings,
    pub migration: MigrationSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub read_calls_per_window: u32,
    pub write_calls_per_window: u32,
    pub window_seconds: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            read_calls_per_window: rate_limits::DEFAULT_READ_CALLS_PER_WINDOW,
            write_calls_per_window: rate_limits::DEFAULT_WRITE_CALLS_PER_WINDOW,
            window_seconds: rate_limits::DEFAULT_WINDOW_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationSettings {
    pub record_page_size: usize,
    pub pacing_batch_size: usize,
    pub pacing_delay_ms: u64,
    pub transient_retry_limit: u32,
    pub continue_on_ignorable: bool,
    /// Upper bound on resources migrated at the same time; unbounded when unset
    pub max_concurrent_resources: Option<usize>,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            record_page_size: constants::DEFAULT_RECORD_PAGE_SIZE,
            pacing_batch_size: constants::DEFAULT_PACING_BATCH_SIZE,
            pacing_delay_ms: constants::DEFAULT_PACING_DELAY_MS,
            transient_retry_limit: constants::DEFAULT_TRANSIENT_RETRY_LIMIT,
            continue_on_ignorable: true,
            max_concurrent_resources: None,
        }
    }
}

impl MigratorConfig {
    /// Validate configuration for consistency and required fields
    pub fn validate(&self) -> ConfigResult<()> {
        if self.source_environment.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "source_environment",
                "environment configuration (FROM_ENV)",
            ));
        }

        if self.target_environment.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "target_environment",
                "environment configuration (TO_ENV)",
            ));
        }

        if self.source_environment == self.target_environment {
            return Err(ConfigurationError::invalid_value(
                "target_environment",
                self.target_environment.clone(),
                "source and target environments must differ",
            ));
        }

        // Rate limit validation
        if self.rate_limits.read_calls_per_window == 0 {
            return Err(ConfigurationError::invalid_value(
                "rate_limits.read_calls_per_window",
                "0",
                "read ceiling must be greater than 0",
            ));
        }

        if self.rate_limits.write_calls_per_window == 0 {
            return Err(ConfigurationError::invalid_value(
                "rate_limits.write_calls_per_window",
                "0",
                "write ceiling must be greater than 0",
            ));
        }

        if self.rate_limits.write_calls_per_window > self.rate_limits.read_calls_per_window {
            return Err(ConfigurationError::invalid_value(
                "rate_limits.write_calls_per_window",
                self.rate_limits.write_calls_per_window.to_string(),
                "write ceiling cannot exceed the read ceiling",
            ));
        }

        if self.rate_limits.window_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "rate_limits.window_seconds",
                "0",
                "window must be at least one second",
            ));
        }

        // Migration stage validation
        if self.migration.record_page_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "migration.record_page_size",
                "0",
                "page size must be greater than 0",
            ));
        }

        if self.migration.pacing_batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "migration.pacing_batch_size",
                "0",
                "pacing batch size must be greater than 0",
            ));
        }

        if self.migration.transient_retry_limit == 0 {
            return Err(ConfigurationError::invalid_value(
                "migration.transient_retry_limit",
                "0",
                "at least one attempt per call is required",
            ));
        }

        match self.migration.max_concurrent_resources {
            Some(0) => {
                return Err(ConfigurationError::invalid_value(
                    "migration.max_concurrent_resources",
                    "0",
                    "leave unset for no cap, or set a positive limit",
                ));
            }
            Some(limit) if limit > Semaphore::MAX_PERMITS => {
                return Err(ConfigurationError::invalid_value(
                    "migration.max_concurrent_resources",
                    limit.to_string(),
                    format!("limit cannot exceed {}", Semaphore::MAX_PERMITS),
                ));
            }
            _ => {}
        }

        Ok(())
    }

    /// JSON view safe for logs, with credentials masked
    pub fn sanitized(&self) -> serde_json::Value {
        let mut value = serde_json::json!(self);
        if let Some(map) = value.as_object_mut() {
            for key in ["read_access_token", "manage_access_token"] {
                if let Some(token) = map.get_mut(key) {
                    let masked = token.as_str().is_some_and(|t| !t.is_empty());
                    if masked {
                        *token = serde_json::Value::String(REDACTED.to_string());
                    }
                }
            }
        }
        value
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            read_calls_per_window: self.rate_limits.read_calls_per_window,
            write_calls_per_window: self.rate_limits.write_calls_per_window,
            window: Duration::from_secs(self.rate_limits.window_seconds),
        }
    }

    /// Retries back off by the pacing delay
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            transient_retry_limit: self.migration.transient_retry_limit,
            retry_delay: Duration::from_millis(self.migration.pacing_delay_ms),
        }
    }

    pub fn stage_settings(&self) -> StageSettings {
        StageSettings {
            record_page_size: self.migration.record_page_size,
            pacing_batch_size: self.migration.pacing_batch_size,
            pacing_delay: Duration::from_millis(self.migration.pacing_delay_ms),
            continue_on_ignorable: self.migration.continue_on_ignorable,
        }
    }
}
