//! # In-Memory Environment
//!
//! A complete environment held in memory and backed by a JSON snapshot file.
//! It implements both client traits, so the same type can play the source
//! (read side) or the target (write side) of a migration. The `space-migrate`
//! binary uses it for snapshot-to-snapshot rehearsals; the test suite uses its
//! fault injection and call log.

use super::{
    MetadataPayload, RecordPayload, RemoteError, RemoteErrorKind, RemoteOperation, RemoteOutcome,
    RemoteReadClient, RemoteWriteClient, SchemaPayload,
};
use crate::error::{MigrationError, Result};
use crate::models::ResourceIdentifier;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Serialized form of one environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceSnapshot {
    #[serde(default)]
    pub schemas: BTreeMap<String, SchemaPayload>,
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataPayload>,
    #[serde(default)]
    pub records: BTreeMap<String, Vec<RecordPayload>>,
}

/// Makes matching calls fail with the given kind
#[derive(Debug, Clone, PartialEq)]
pub struct FaultRule {
    pub operation: RemoteOperation,
    /// Restrict the fault to one identifier; `None` matches every identifier
    pub id: Option<String>,
    pub kind: RemoteErrorKind,
    /// How many more calls fail; `None` fails forever
    pub remaining: Option<u32>,
}

impl FaultRule {
    pub fn new(operation: RemoteOperation, kind: RemoteErrorKind) -> Self {
        Self {
            operation,
            id: None,
            kind,
            remaining: None,
        }
    }

    pub fn for_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn times(mut self, count: u32) -> Self {
        self.remaining = Some(count);
        self
    }

    fn matches(&self, operation: RemoteOperation, id: &ResourceIdentifier) -> bool {
        self.operation == operation
            && self
                .id
                .as_deref()
                .map_or(true, |rule_id| rule_id == id.as_str())
            && self.remaining != Some(0)
    }
}

/// In-memory environment implementing both remote capabilities
#[derive(Debug)]
pub struct InMemorySpace {
    name: String,
    snapshot: RwLock<SpaceSnapshot>,
    faults: Mutex<Vec<FaultRule>>,
    calls: Mutex<Vec<(RemoteOperation, ResourceIdentifier)>>,
}

impl InMemorySpace {
    pub fn new(name: impl Into<String>, snapshot: SpaceSnapshot) -> Self {
        Self {
            name: name.into(),
            snapshot: RwLock::new(snapshot),
            faults: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, SpaceSnapshot::default())
    }

    /// Load an environment from a JSON snapshot file
    pub fn load_snapshot(name: impl Into<String>, path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MigrationError::Snapshot(format!("Failed to read '{}': {e}", path.display()))
        })?;
        let snapshot: SpaceSnapshot = serde_json::from_str(&contents)?;
        Ok(Self::new(name, snapshot))
    }

    /// Write the current state back out as a JSON snapshot
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(&*self.snapshot.read())?;
        std::fs::write(path, contents).map_err(|e| {
            MigrationError::Snapshot(format!("Failed to write '{}': {e}", path.display()))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshot(&self) -> SpaceSnapshot {
        self.snapshot.read().clone()
    }

    pub fn insert_schema(&self, id: &str, payload: SchemaPayload) {
        self.snapshot.write().schemas.insert(id.to_string(), payload);
    }

    pub fn insert_metadata(&self, id: &str, payload: MetadataPayload) {
        self.snapshot.write().metadata.insert(id.to_string(), payload);
    }

    pub fn insert_records(&self, id: &str, records: Vec<RecordPayload>) {
        self.snapshot.write().records.insert(id.to_string(), records);
    }

    pub fn inject_fault(&self, rule: FaultRule) {
        self.faults.lock().push(rule);
    }

    /// Every call received so far, in arrival order
    pub fn calls(&self) -> Vec<(RemoteOperation, ResourceIdentifier)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, operation: RemoteOperation) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(op, _)| *op == operation)
            .count()
    }

    pub fn record_count(&self, id: &str) -> usize {
        self.snapshot.read().records.get(id).map_or(0, Vec::len)
    }

    /// Log the call and fail it if a fault rule matches
    fn enter(&self, operation: RemoteOperation, id: &ResourceIdentifier) -> RemoteOutcome<()> {
        self.calls.lock().push((operation, id.clone()));

        let mut faults = self.faults.lock();
        if let Some(rule) = faults.iter_mut().find(|rule| rule.matches(operation, id)) {
            if let Some(remaining) = rule.remaining.as_mut() {
                *remaining -= 1;
            }
            debug!(space = %self.name, %operation, id = %id, kind = %rule.kind, "Injected fault");
            return Err(RemoteError::new(
                rule.kind,
                format!("injected {operation} failure for {id}"),
            )
            .with_context(self.context(operation)));
        }
        Ok(())
    }

    fn context(&self, operation: RemoteOperation) -> String {
        format!("{operation}@{}", self.name)
    }

    fn missing(&self, operation: RemoteOperation, what: &str, id: &ResourceIdentifier) -> RemoteError {
        RemoteError::not_found(format!("{what} '{id}' not found in {}", self.name))
            .with_context(self.context(operation))
    }
}

#[async_trait]
impl RemoteReadClient for InMemorySpace {
    async fn fetch_schema(&self, id: &ResourceIdentifier) -> RemoteOutcome<SchemaPayload> {
        let operation = RemoteOperation::FetchSchema;
        self.enter(operation, id)?;
        self.snapshot
            .read()
            .schemas
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| self.missing(operation, "Content type", id))
    }

    async fn fetch_metadata(&self, id: &ResourceIdentifier) -> RemoteOutcome<MetadataPayload> {
        let operation = RemoteOperation::FetchMetadata;
        self.enter(operation, id)?;
        self.snapshot
            .read()
            .metadata
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| self.missing(operation, "Editor interface", id))
    }

    async fn fetch_records(
        &self,
        type_id: &ResourceIdentifier,
        page_size: usize,
    ) -> RemoteOutcome<Vec<RecordPayload>> {
        let operation = RemoteOperation::FetchRecords;
        self.enter(operation, type_id)?;
        let snapshot = self.snapshot.read();
        match snapshot.records.get(type_id.as_str()) {
            Some(records) => Ok(records.iter().take(page_size).cloned().collect()),
            None if snapshot.schemas.contains_key(type_id.as_str()) => Ok(Vec::new()),
            None => Err(self.missing(operation, "Content type", type_id)),
        }
    }
}

/// Snapshot writes are visible at once, so a written schema is already published
#[async_trait]
impl RemoteWriteClient for InMemorySpace {
    async fn fetch_target_schema(&self, id: &ResourceIdentifier) -> RemoteOutcome<SchemaPayload> {
        let operation = RemoteOperation::FetchTargetSchema;
        self.enter(operation, id)?;
        self.snapshot
            .read()
            .schemas
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| self.missing(operation, "Content type", id))
    }

    async fn create_schema(
        &self,
        id: &ResourceIdentifier,
        payload: &SchemaPayload,
    ) -> RemoteOutcome<()> {
        let operation = RemoteOperation::CreateSchema;
        self.enter(operation, id)?;
        let mut snapshot = self.snapshot.write();
        if snapshot.schemas.contains_key(id.as_str()) {
            return Err(RemoteError::validation(format!(
                "Content type '{id}' already exists in {}",
                self.name
            ))
            .with_context(self.context(operation)));
        }
        snapshot.schemas.insert(id.to_string(), payload.clone());
        Ok(())
    }

    async fn update_schema(
        &self,
        id: &ResourceIdentifier,
        payload: &SchemaPayload,
    ) -> RemoteOutcome<()> {
        let operation = RemoteOperation::UpdateSchema;
        self.enter(operation, id)?;
        let mut snapshot = self.snapshot.write();
        match snapshot.schemas.get_mut(id.as_str()) {
            Some(existing) => {
                *existing = payload.clone();
                Ok(())
            }
            None => Err(self.missing(operation, "Content type", id)),
        }
    }

    async fn update_metadata(
        &self,
        id: &ResourceIdentifier,
        payload: &MetadataPayload,
    ) -> RemoteOutcome<()> {
        let operation = RemoteOperation::UpdateMetadata;
        self.enter(operation, id)?;
        let mut snapshot = self.snapshot.write();
        if !snapshot.schemas.contains_key(id.as_str()) {
            return Err(self.missing(operation, "Content type", id));
        }
        snapshot.metadata.insert(id.to_string(), payload.clone());
        Ok(())
    }

    async fn create_record(
        &self,
        type_id: &ResourceIdentifier,
        payload: &RecordPayload,
    ) -> RemoteOutcome<()> {
        let operation = RemoteOperation::CreateRecord;
        self.enter(operation, type_id)?;
        let mut snapshot = self.snapshot.write();
        if !snapshot.schemas.contains_key(type_id.as_str()) {
            return Err(RemoteError::validation(format!(
                "Unknown content type '{type_id}' in {}",
                self.name
            ))
            .with_context(self.context(operation)));
        }
        snapshot
            .records
            .entry(type_id.to_string())
            .or_default()
            .push(payload.clone());
        Ok(())
    }
}
