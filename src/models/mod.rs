//! # Migration Data Model
//!
//! - [`MigrationRequest`] - what a run was asked to migrate
//! - [`ResourceMigrationRecord`] - per-resource stage outcomes
//! - [`RunSummary`] - the reconciliation produced at the end of a run

pub mod record;
pub mod request;
pub mod summary;

pub use record::{
    FailureKind, MetadataStage, MigrationStage, RecordStage, ResourceMigrationRecord,
    SchemaAction, SchemaStage, StageFailure,
};
pub use request::{parse_identifier_list, parse_yes_no, MigrationRequest, ResourceIdentifier};
pub use summary::RunSummary;
