use super::ResourceIdentifier;
use serde::{Deserialize, Serialize};

/// Reconciliation of a finished run against its request.
///
/// Every list follows the order of the request, so two runs finishing their
/// resources in different orders produce equal summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub requested: Vec<ResourceIdentifier>,
    pub migrate_records: bool,

    pub schema_succeeded: Vec<ResourceIdentifier>,
    /// Complement of `schema_succeeded` within `requested`
    pub schema_failed: Vec<ResourceIdentifier>,
    pub schemas_created: Vec<ResourceIdentifier>,
    pub schemas_updated: Vec<ResourceIdentifier>,

    pub metadata_failed: Vec<ResourceIdentifier>,

    /// At least one record migrated (includes `records_partial`)
    pub records_succeeded: Vec<ResourceIdentifier>,
    pub records_partial: Vec<ResourceIdentifier>,
    /// Complement of `records_succeeded` within `requested` (empty when records were not requested)
    pub records_failed: Vec<ResourceIdentifier>,
    /// Schema succeeded but there was nothing to migrate
    pub records_skipped: Vec<ResourceIdentifier>,
    pub migrated_record_count: usize,

    pub cancelled: Vec<ResourceIdentifier>,
}

impl RunSummary {
    pub fn requested_count(&self) -> usize {
        self.requested.len()
    }

    pub fn completed_count(&self) -> usize {
        self.schema_succeeded.len()
    }

    /// Every requested schema made it (and entries too, when requested)
    pub fn all_migrated(&self) -> bool {
        self.schema_failed.is_empty() && (!self.migrate_records || self.records_failed.is_empty())
    }

    pub fn was_cancelled(&self) -> bool {
        !self.cancelled.is_empty()
    }

    /// Requested identifiers missing from a success set, in request order
    pub fn not_migrated(&self) -> Vec<ResourceIdentifier> {
        self.requested
            .iter()
            .filter(|id| {
                self.schema_failed.contains(id)
                    || (self.migrate_records && self.records_failed.contains(id))
            })
            .cloned()
            .collect()
    }
}
