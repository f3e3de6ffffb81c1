//! # Reconciliation Reporter
//!
//! Reconciles the finalized records of a run against what was requested. Any
//! requested identifier without a successful record lands in a failure list,
//! so a missing record can never pass for a success.

use crate::models::{
    MetadataStage, MigrationRequest, RecordStage, ResourceIdentifier, ResourceMigrationRecord,
    RunSummary, SchemaAction,
};
use std::collections::HashMap;

pub struct ReconciliationReporter;

impl ReconciliationReporter {
    /// Partition the requested identifiers by outcome.
    ///
    /// Pure: the order of `records` has no effect on the result, records for
    /// identifiers that were never requested are ignored, and the first record
    /// seen for a duplicated identifier wins.
    pub fn summarize(
        request: &MigrationRequest,
        records: &[ResourceMigrationRecord],
    ) -> RunSummary {
        let mut by_id: HashMap<&ResourceIdentifier, &ResourceMigrationRecord> =
            HashMap::with_capacity(records.len());
        for record in records {
            by_id.entry(&record.id).or_insert(record);
        }

        let migrate_records = request.migrate_records();
        let mut summary = RunSummary {
            requested: request.identifiers().to_vec(),
            migrate_records,
            ..Default::default()
        };

        for id in request.identifiers() {
            let Some(record) = by_id.get(id).copied() else {
                // omission: no worker reported back for this identifier
                summary.schema_failed.push(id.clone());
                if migrate_records {
                    summary.records_failed.push(id.clone());
                }
                continue;
            };

            if record.schema_succeeded() {
                summary.schema_succeeded.push(id.clone());
                match record.schema_action {
                    Some(SchemaAction::Created) => summary.schemas_created.push(id.clone()),
                    Some(SchemaAction::Updated) => summary.schemas_updated.push(id.clone()),
                    None => {}
                }
            } else {
                summary.schema_failed.push(id.clone());
            }

            if record.metadata_stage == MetadataStage::Failed {
                summary.metadata_failed.push(id.clone());
            }

            if record.is_cancelled() {
                summary.cancelled.push(id.clone());
            }

            summary.migrated_record_count += record.migrated_record_count;

            if !migrate_records {
                continue;
            }

            match record.record_stage {
                RecordStage::Succeeded => summary.records_succeeded.push(id.clone()),
                RecordStage::PartiallySucceeded => {
                    summary.records_succeeded.push(id.clone());
                    summary.records_partial.push(id.clone());
                }
                RecordStage::Skipped if record.schema_succeeded() => {
                    summary.records_skipped.push(id.clone());
                    summary.records_failed.push(id.clone());
                }
                _ => summary.records_failed.push(id.clone()),
            }
        }

        summary
    }
}
