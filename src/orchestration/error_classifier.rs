//! # Remote Outcome Classification
//!
//! Decides how the state machine reacts to a failed remote call.
//!
//! ## Overview
//!
//! Every failure is reduced to one of two outcomes:
//!
//! - **Ignorable**: the resource is absent on a fetch. For the target this
//!   drives the create branch; for the source it means there is nothing to
//!   migrate for this stage.
//! - **Fatal**: anything else. Fatal at the schema stage aborts the resource,
//!   fatal at the metadata or record stage is recorded and the resource moves on.
//!
//! Transient failures get a bounded number of retries before they are
//! classified, and only an unrecoverable credential failure aborts the run.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ RemoteError │────▶│ OutcomeClassifier│────▶│ Ignorable │ Fatal │
//! │ + CallKind  │     │  (+ retry delay) │     │  (+ abort run?)   │
//! └─────────────┘     └──────────────────┘     └──────────────────┘
//! ```

use crate::remote::{RemoteError, RemoteErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How a failed call affects the current stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeClass {
    Ignorable,
    Fatal,
}

impl fmt::Display for OutcomeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignorable => write!(f, "ignorable"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// Whether the failed call read or wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Fetch,
    Write,
}

/// Strategy for classifying remote failures
pub trait OutcomeClassifier: Send + Sync {
    /// Classify a failure that will not be retried any further
    fn classify(&self, error: &RemoteError, call: CallKind) -> OutcomeClass;

    /// Delay before retrying, or `None` when `attempt` (1-based) was the last try
    fn retry_delay(&self, error: &RemoteError, attempt: u32) -> Option<Duration>;

    /// Whether this failure must stop the whole run
    fn aborts_run(&self, error: &RemoteError) -> bool;

    fn classifier_name(&self) -> &'static str;
}

/// Retry behavior of the standard classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Attempts per call for transient failures, first try included
    pub transient_retry_limit: u32,
    /// Fixed pause between attempts
    pub retry_delay: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            transient_retry_limit: crate::constants::DEFAULT_TRANSIENT_RETRY_LIMIT,
            retry_delay: Duration::from_millis(crate::constants::DEFAULT_PACING_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StandardOutcomeClassifier {
    config: ClassifierConfig,
}

impl StandardOutcomeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}

impl OutcomeClassifier for StandardOutcomeClassifier {
    fn classify(&self, error: &RemoteError, call: CallKind) -> OutcomeClass {
        match (error.kind, call) {
            (RemoteErrorKind::NotFound, CallKind::Fetch) => OutcomeClass::Ignorable,
            _ => OutcomeClass::Fatal,
        }
    }

    fn retry_delay(&self, error: &RemoteError, attempt: u32) -> Option<Duration> {
        if error.kind == RemoteErrorKind::Transient && attempt < self.config.transient_retry_limit
        {
            Some(self.config.retry_delay)
        } else {
            None
        }
    }

    fn aborts_run(&self, error: &RemoteError) -> bool {
        error.kind == RemoteErrorKind::Unauthorized
    }

    fn classifier_name(&self) -> &'static str {
        "standard"
    }
}
