//! Per-resource migration record.
//!
//! Owned and written by exactly one state machine while its resource is in
//! flight; handed to the reporter once the machine reaches a terminal state.

use super::ResourceIdentifier;
use crate::remote::RemoteErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaStage {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataStage {
    Pending,
    Succeeded,
    /// Nothing to propagate, or the schema stage never succeeded
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStage {
    Pending,
    /// Every fetched record was created in the target
    Succeeded,
    /// At least one record was created and at least one failed
    PartiallySucceeded,
    /// Not requested, no source records, or the schema stage never succeeded
    Skipped,
    /// Records were attempted and none was created
    Failed,
}

impl RecordStage {
    /// At least one record reached the target
    pub fn migrated_any(&self) -> bool {
        matches!(self, Self::Succeeded | Self::PartiallySucceeded)
    }
}

/// Which write created the schema in the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaAction {
    Created,
    Updated,
}

/// The three sequential stages of one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStage {
    Schema,
    Metadata,
    Records,
}

impl fmt::Display for MigrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Metadata => write!(f, "metadata"),
            Self::Records => write!(f, "records"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Remote(RemoteErrorKind),
    /// The resource does not exist in the source environment
    SourceMissing,
    Cancelled,
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(kind) => write!(f, "{kind}"),
            Self::SourceMissing => write!(f, "source_missing"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: MigrationStage,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMigrationRecord {
    pub id: ResourceIdentifier,
    pub schema_stage: SchemaStage,
    pub metadata_stage: MetadataStage,
    pub record_stage: RecordStage,
    pub schema_action: Option<SchemaAction>,
    pub migrated_record_count: usize,
    pub failed_record_count: usize,
    pub failures: Vec<StageFailure>,
}

impl ResourceMigrationRecord {
    pub fn new(id: ResourceIdentifier) -> Self {
        Self {
            id,
            schema_stage: SchemaStage::Pending,
            metadata_stage: MetadataStage::Pending,
            record_stage: RecordStage::Pending,
            schema_action: None,
            migrated_record_count: 0,
            failed_record_count: 0,
            failures: Vec::new(),
        }
    }

    /// Record for an identifier the run never started because it was cancelled
    pub fn cancelled_before_start(id: ResourceIdentifier, reason: &str) -> Self {
        let mut record = Self::new(id);
        record.fail_schema(FailureKind::Cancelled, reason);
        record
    }

    /// Mark the schema stage failed and close the stages that depend on it
    pub fn fail_schema(&mut self, kind: FailureKind, message: impl Into<String>) {
        self.schema_stage = SchemaStage::Failed;
        self.metadata_stage = MetadataStage::Skipped;
        self.record_stage = RecordStage::Skipped;
        self.push_failure(MigrationStage::Schema, kind, message);
    }

    pub fn push_failure(
        &mut self,
        stage: MigrationStage,
        kind: FailureKind,
        message: impl Into<String>,
    ) {
        self.failures.push(StageFailure {
            stage,
            kind,
            message: message.into(),
        });
    }

    pub fn schema_succeeded(&self) -> bool {
        self.schema_stage == SchemaStage::Succeeded
    }

    pub fn is_cancelled(&self) -> bool {
        self.failures
            .iter()
            .any(|failure| failure.kind == FailureKind::Cancelled)
    }

    pub fn failure_for(&self, stage: MigrationStage) -> Option<&StageFailure> {
        self.failures.iter().find(|failure| failure.stage == stage)
    }

    /// No stage is left `Pending`
    pub fn is_finalized(&self) -> bool {
        self.schema_stage != SchemaStage::Pending
            && self.metadata_stage != MetadataStage::Pending
            && self.record_stage != RecordStage::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_schema_closes_dependent_stages() {
        let id = ResourceIdentifier::new("blogPost").unwrap();
        let mut record = ResourceMigrationRecord::new(id);
        record.fail_schema(
            FailureKind::Remote(RemoteErrorKind::Permission),
            "cannot create",
        );

        assert_eq!(record.schema_stage, SchemaStage::Failed);
        assert_eq!(record.metadata_stage, MetadataStage::Skipped);
        assert_eq!(record.record_stage, RecordStage::Skipped);
        assert!(record.is_finalized());
        assert_eq!(
            record.failure_for(MigrationStage::Schema).unwrap().kind,
            FailureKind::Remote(RemoteErrorKind::Permission)
        );
    }

    #[test]
    fn test_cancelled_before_start_is_distinguishable() {
        let record = ResourceMigrationRecord::cancelled_before_start(
            ResourceIdentifier::new("author").unwrap(),
            "run cancelled",
        );
        assert!(record.is_cancelled());
        assert!(!record.schema_succeeded());
    }

    #[test]
    fn test_partial_success_counts_as_migrated() {
        assert!(RecordStage::PartiallySucceeded.migrated_any());
        assert!(RecordStage::Succeeded.migrated_any());
        assert!(!RecordStage::Failed.migrated_any());
        assert!(!RecordStage::Skipped.migrated_any());
    }
}
