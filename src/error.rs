use crate::config::ConfigurationError;
use crate::remote::RemoteError;
use thiserror::Error;

/// Errors surfaced by the migrator outside of per-resource stage outcomes.
///
/// Remote failures that happen while a resource is being migrated are recorded
/// on its `ResourceMigrationRecord` and never escape `MigrationOrchestrator::run`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MigrationError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("State transition error: {0}")]
    StateTransition(String),
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl From<serde_json::Error> for MigrationError {
    fn from(error: serde_json::Error) -> Self {
        MigrationError::Snapshot(format!("JSON serialization error: {error}"))
    }
}

impl From<ConfigurationError> for MigrationError {
    fn from(error: ConfigurationError) -> Self {
        MigrationError::Configuration(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;
