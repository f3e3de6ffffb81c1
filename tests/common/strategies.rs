use proptest::prelude::*;
use space_migrator::models::{
    FailureKind, MetadataStage, RecordStage, ResourceIdentifier, ResourceMigrationRecord,
    SchemaAction, SchemaStage,
};
use space_migrator::remote::RemoteErrorKind;
use std::collections::BTreeSet;

/// Strategy for generating content type ids
pub fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,15}"
}

/// Strategy for generating non-empty sets of distinct ids
pub fn identifier_set_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(identifier_strategy(), 1..12)
        .prop_map(|set: BTreeSet<String>| set.into_iter().collect())
}

/// How a generated resource ended up
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    /// No record reported back for the identifier
    Missing,
    SchemaFailed,
    Migrated(RecordStage),
}

pub fn outcome_strategy() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::Missing),
        Just(Outcome::SchemaFailed),
        Just(Outcome::Migrated(RecordStage::Succeeded)),
        Just(Outcome::Migrated(RecordStage::PartiallySucceeded)),
        Just(Outcome::Migrated(RecordStage::Skipped)),
        Just(Outcome::Migrated(RecordStage::Failed)),
    ]
}

/// Build the finalized record for one generated outcome
pub fn record_for(id: &str, outcome: Outcome, migrate_records: bool) -> Option<ResourceMigrationRecord> {
    let id = ResourceIdentifier::new(id).unwrap();
    match outcome {
        Outcome::Missing => None,
        Outcome::SchemaFailed => {
            let mut record = ResourceMigrationRecord::new(id);
            record.fail_schema(FailureKind::Remote(RemoteErrorKind::Permission), "denied");
            Some(record)
        }
        Outcome::Migrated(stage) => {
            let mut record = ResourceMigrationRecord::new(id);
            record.schema_stage = SchemaStage::Succeeded;
            record.schema_action = Some(SchemaAction::Created);
            record.metadata_stage = MetadataStage::Succeeded;
            record.record_stage = if migrate_records {
                stage
            } else {
                RecordStage::Skipped
            };
            record.migrated_record_count = if record.record_stage.migrated_any() { 2 } else { 0 };
            Some(record)
        }
    }
}
