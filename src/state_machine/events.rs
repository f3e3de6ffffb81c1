use serde::{Deserialize, Serialize};

/// Events that drive a resource through its migration states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MigrationEvent {
    /// Begin the schema stage
    Start,
    /// The target already has the schema
    SchemaFound,
    /// The target does not have the schema yet
    SchemaMissing,
    /// The create or update of the schema went through
    SchemaWritten,
    /// Metadata handled and records were requested
    BeginRecords,
    /// No more stages to run
    Finish,
    /// Fatal failure with error message
    Fail(String),
    /// The run was cancelled
    Cancel,
}

impl MigrationEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::SchemaFound => "schema_found",
            Self::SchemaMissing => "schema_missing",
            Self::SchemaWritten => "schema_written",
            Self::BeginRecords => "begin_records",
            Self::Finish => "finish",
            Self::Fail(_) => "fail",
            Self::Cancel => "cancel",
        }
    }

    /// Create a failure event with the given error message
    pub fn fail_with_error(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }
}
