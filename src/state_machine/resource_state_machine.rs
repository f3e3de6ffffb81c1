//! # Resource Migration State Machine
//!
//! Drives one resource identifier through its stages:
//!
//! ```text
//! Init → FetchingSchema → CreatingSchema ─┐
//!                       → UpdatingSchema ─┴→ PropagatingMetadata → [MigratingRecords] → Done
//!
//! any non-terminal state ──(fatal schema failure | cancel)──→ Failed
//! ```
//!
//! Stages run strictly in sequence. Every remote call takes a slot from the
//! shared rate limiter first, and every failure goes through the outcome
//! classifier before the machine decides where to go. Metadata and record
//! failures are recorded on the resource but do not undo a successful schema.

use super::errors::{StateMachineError, StateMachineResult};
use super::events::MigrationEvent;
use super::states::MigrationState;
use crate::constants;
use crate::logging::{log_remote_failure, log_stage_transition};
use crate::models::{
    FailureKind, MetadataStage, MigrationStage, RecordStage, ResourceIdentifier,
    ResourceMigrationRecord, SchemaAction, SchemaStage,
};
use crate::orchestration::cancellation::CancellationFlag;
use crate::orchestration::error_classifier::{CallKind, OutcomeClass, OutcomeClassifier};
use crate::remote::{
    RemoteError, RemoteOperation, RemoteOutcome, RemoteReadClient, RemoteWriteClient,
};
use crate::resilience::{RateLimiter, RecordPacer};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Knobs that shape the metadata and record stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSettings {
    pub record_page_size: usize,
    pub pacing_batch_size: usize,
    pub pacing_delay: Duration,
    /// Keep the run going when a requested resource is missing from the source
    pub continue_on_ignorable: bool,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            record_page_size: constants::DEFAULT_RECORD_PAGE_SIZE,
            pacing_batch_size: constants::DEFAULT_PACING_BATCH_SIZE,
            pacing_delay: Duration::from_millis(constants::DEFAULT_PACING_DELAY_MS),
            continue_on_ignorable: true,
        }
    }
}

/// Shared collaborators handed to every resource worker
#[derive(Clone)]
pub struct MigrationContext {
    pub source: Arc<dyn RemoteReadClient>,
    pub target: Arc<dyn RemoteWriteClient>,
    pub rate_limiter: Arc<RateLimiter>,
    pub classifier: Arc<dyn OutcomeClassifier>,
    pub cancellation: CancellationFlag,
    pub settings: StageSettings,
}

/// Pure transition table
pub fn determine_target_state(
    current: MigrationState,
    event: &MigrationEvent,
) -> StateMachineResult<MigrationState> {
    let target = match (current, event) {
        (MigrationState::Init, MigrationEvent::Start) => MigrationState::FetchingSchema,

        (MigrationState::FetchingSchema, MigrationEvent::SchemaFound) => {
            MigrationState::UpdatingSchema
        }
        (MigrationState::FetchingSchema, MigrationEvent::SchemaMissing) => {
            MigrationState::CreatingSchema
        }

        (
            MigrationState::CreatingSchema | MigrationState::UpdatingSchema,
            MigrationEvent::SchemaWritten,
        ) => MigrationState::PropagatingMetadata,

        (MigrationState::PropagatingMetadata, MigrationEvent::BeginRecords) => {
            MigrationState::MigratingRecords
        }
        (
            MigrationState::PropagatingMetadata | MigrationState::MigratingRecords,
            MigrationEvent::Finish,
        ) => MigrationState::Done,

        (from, MigrationEvent::Fail(_) | MigrationEvent::Cancel) if !from.is_terminal() => {
            MigrationState::Failed
        }

        (from, _) => {
            return Err(StateMachineError::InvalidTransition {
                from: from.to_string(),
                event: event.event_type().to_string(),
            })
        }
    };

    Ok(target)
}

/// One resource's migration; owns its record exclusively until it finishes
pub struct ResourceMigrationStateMachine {
    state: MigrationState,
    visited: Vec<MigrationState>,
    record: ResourceMigrationRecord,
    migrate_records: bool,
    context: MigrationContext,
}

impl ResourceMigrationStateMachine {
    pub fn new(id: ResourceIdentifier, migrate_records: bool, context: MigrationContext) -> Self {
        Self {
            state: MigrationState::Init,
            visited: vec![MigrationState::Init],
            record: ResourceMigrationRecord::new(id),
            migrate_records,
            context,
        }
    }

    pub fn current_state(&self) -> MigrationState {
        self.state
    }

    /// Every state entered so far, starting with `Init`
    pub fn visited_states(&self) -> &[MigrationState] {
        &self.visited
    }

    pub fn record(&self) -> &ResourceMigrationRecord {
        &self.record
    }

    pub fn into_record(self) -> ResourceMigrationRecord {
        self.record
    }

    /// Run every stage and hand back the finalized record
    pub async fn run(mut self) -> ResourceMigrationRecord {
        self.execute().await;
        self.into_record()
    }

    /// Run every stage until the machine reaches `Done` or `Failed`
    pub async fn execute(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        if let Err(err) = self.drive().await {
            error!(
                id = %self.record.id,
                state = %self.state,
                error = %err,
                "❌ Resource state machine aborted"
            );
            if self.record.schema_stage == SchemaStage::Pending {
                self.record.fail_schema(FailureKind::Internal, err.to_string());
            } else {
                self.record.push_failure(
                    MigrationStage::Schema,
                    FailureKind::Internal,
                    err.to_string(),
                );
            }
            self.state = MigrationState::Failed;
            self.visited.push(MigrationState::Failed);
        }

        self.close_pending_stages();
    }

    fn transition(&mut self, event: MigrationEvent) -> StateMachineResult<MigrationState> {
        let target = determine_target_state(self.state, &event)?;
        log_stage_transition(&self.record.id, self.state, target, event.event_type());
        self.state = target;
        self.visited.push(target);
        Ok(target)
    }

    async fn drive(&mut self) -> StateMachineResult<()> {
        if self.context.cancellation.is_cancelled() {
            let reason = self.cancellation_reason();
            self.record.fail_schema(FailureKind::Cancelled, reason);
            self.transition(MigrationEvent::Cancel)?;
            return Ok(());
        }

        self.transition(MigrationEvent::Start)?;
        if !self.run_schema_stage().await? {
            return Ok(());
        }

        if self.context.cancellation.is_cancelled() {
            return self.cancel_after_schema();
        }
        self.run_metadata_stage().await;

        if !self.migrate_records {
            self.record.record_stage = RecordStage::Skipped;
            self.transition(MigrationEvent::Finish)?;
            return Ok(());
        }

        if self.context.cancellation.is_cancelled() {
            return self.cancel_after_schema();
        }
        self.transition(MigrationEvent::BeginRecords)?;
        self.run_record_stage().await;
        self.transition(MigrationEvent::Finish)?;
        Ok(())
    }

    /// Returns whether the schema landed in the target
    async fn run_schema_stage(&mut self) -> StateMachineResult<bool> {
        let id = self.record.id.clone();
        let source = Arc::clone(&self.context.source);
        let target = Arc::clone(&self.context.target);

        let payload = match self
            .call(RemoteOperation::FetchSchema, || source.fetch_schema(&id))
            .await
        {
            Ok(payload) => payload,
            Err(err) => {
                self.fail_source_schema(err)?;
                return Ok(false);
            }
        };

        let action = match self
            .call(RemoteOperation::FetchTargetSchema, || {
                target.fetch_target_schema(&id)
            })
            .await
        {
            Ok(_) => {
                self.transition(MigrationEvent::SchemaFound)?;
                SchemaAction::Updated
            }
            Err(err) => match self.context.classifier.classify(&err, CallKind::Fetch) {
                OutcomeClass::Ignorable => {
                    self.transition(MigrationEvent::SchemaMissing)?;
                    SchemaAction::Created
                }
                OutcomeClass::Fatal => {
                    self.fail_schema(err)?;
                    return Ok(false);
                }
            },
        };

        let written = match action {
            SchemaAction::Created => {
                self.call(RemoteOperation::CreateSchema, || {
                    target.create_schema(&id, &payload)
                })
                .await
            }
            SchemaAction::Updated => {
                self.call(RemoteOperation::UpdateSchema, || {
                    target.update_schema(&id, &payload)
                })
                .await
            }
        };

        // a failed write is final; the opposite branch is never tried
        if let Err(err) = written {
            self.fail_schema(err)?;
            return Ok(false);
        }

        self.record.schema_stage = SchemaStage::Succeeded;
        self.record.schema_action = Some(action);
        info!(id = %id, action = ?action, "✅ Schema migrated");
        self.transition(MigrationEvent::SchemaWritten)?;
        Ok(true)
    }

    fn fail_source_schema(&mut self, err: RemoteError) -> StateMachineResult<()> {
        match self.context.classifier.classify(&err, CallKind::Fetch) {
            OutcomeClass::Ignorable => {
                warn!(id = %self.record.id, "Resource not found in source environment");
                if !self.context.settings.continue_on_ignorable {
                    self.context.cancellation.cancel(format!(
                        "'{}' not found in source and continue_on_ignorable is disabled",
                        self.record.id
                    ));
                }
                self.record
                    .fail_schema(FailureKind::SourceMissing, err.to_string());
                self.transition(MigrationEvent::fail_with_error(err.to_string()))?;
                Ok(())
            }
            OutcomeClass::Fatal => self.fail_schema(err),
        }
    }

    fn fail_schema(&mut self, err: RemoteError) -> StateMachineResult<()> {
        self.record
            .fail_schema(FailureKind::Remote(err.kind), err.to_string());
        self.transition(MigrationEvent::fail_with_error(err.to_string()))?;
        Ok(())
    }

    async fn run_metadata_stage(&mut self) {
        let id = self.record.id.clone();
        let source = Arc::clone(&self.context.source);
        let target = Arc::clone(&self.context.target);

        let payload = match self
            .call(RemoteOperation::FetchMetadata, || source.fetch_metadata(&id))
            .await
        {
            Ok(payload) => payload,
            Err(err) => {
                match self.context.classifier.classify(&err, CallKind::Fetch) {
                    OutcomeClass::Ignorable => {
                        debug!(id = %id, "No editor metadata in source, skipping");
                        self.record.metadata_stage = MetadataStage::Skipped;
                    }
                    OutcomeClass::Fatal => self.fail_stage(MigrationStage::Metadata, &err),
                }
                return;
            }
        };

        match self
            .call(RemoteOperation::UpdateMetadata, || {
                target.update_metadata(&id, &payload)
            })
            .await
        {
            Ok(()) => {
                self.record.metadata_stage = MetadataStage::Succeeded;
                debug!(id = %id, controls = payload.controls.len(), "Editor metadata propagated");
            }
            Err(err) => self.fail_stage(MigrationStage::Metadata, &err),
        }
    }

    async fn run_record_stage(&mut self) {
        let id = self.record.id.clone();
        let source = Arc::clone(&self.context.source);
        let target = Arc::clone(&self.context.target);
        let page_size = self.context.settings.record_page_size;

        let records = match self
            .call(RemoteOperation::FetchRecords, || {
                source.fetch_records(&id, page_size)
            })
            .await
        {
            Ok(records) => records,
            Err(err) => {
                match self.context.classifier.classify(&err, CallKind::Fetch) {
                    OutcomeClass::Ignorable => self.record.record_stage = RecordStage::Skipped,
                    OutcomeClass::Fatal => self.fail_stage(MigrationStage::Records, &err),
                }
                return;
            }
        };

        if records.is_empty() {
            debug!(id = %id, "No source records to migrate");
            self.record.record_stage = RecordStage::Skipped;
            return;
        }

        let mut pacer = RecordPacer::new(
            self.context.settings.pacing_batch_size,
            self.context.settings.pacing_delay,
        );
        let mut created = 0usize;
        let mut failed = 0usize;
        let mut last_error: Option<RemoteError> = None;

        for payload in &records {
            pacer.before_call().await;
            match self
                .call(RemoteOperation::CreateRecord, || {
                    target.create_record(&id, payload)
                })
                .await
            {
                Ok(()) => created += 1,
                Err(err) => {
                    failed += 1;
                    let stop = self.context.classifier.aborts_run(&err);
                    last_error = Some(err);
                    if stop {
                        break;
                    }
                }
            }
        }

        self.record.migrated_record_count = created;
        self.record.failed_record_count = failed;
        self.record.record_stage = match (created, failed) {
            (_, 0) => RecordStage::Succeeded,
            (0, _) => RecordStage::Failed,
            _ => RecordStage::PartiallySucceeded,
        };

        if let Some(err) = last_error {
            self.record.push_failure(
                MigrationStage::Records,
                FailureKind::Remote(err.kind),
                format!(
                    "{failed} of {} record creates failed; last error: {err}",
                    records.len()
                ),
            );
        }

        info!(
            id = %id,
            created,
            failed,
            pauses = pacer.pauses(),
            stage = ?self.record.record_stage,
            "Record migration finished"
        );
    }

    fn fail_stage(&mut self, stage: MigrationStage, err: &RemoteError) {
        match stage {
            MigrationStage::Metadata => self.record.metadata_stage = MetadataStage::Failed,
            MigrationStage::Records => self.record.record_stage = RecordStage::Failed,
            MigrationStage::Schema => self.record.schema_stage = SchemaStage::Failed,
        }
        self.record
            .push_failure(stage, FailureKind::Remote(err.kind), err.to_string());
    }

    /// Cancellation observed after the schema stage; its success still counts
    fn cancel_after_schema(&mut self) -> StateMachineResult<()> {
        let reason = self.cancellation_reason();
        if self.record.metadata_stage == MetadataStage::Pending {
            self.record.metadata_stage = MetadataStage::Failed;
            self.record
                .push_failure(MigrationStage::Metadata, FailureKind::Cancelled, reason.clone());
        }
        if self.record.record_stage == RecordStage::Pending {
            if self.migrate_records {
                self.record.record_stage = RecordStage::Failed;
                self.record
                    .push_failure(MigrationStage::Records, FailureKind::Cancelled, reason);
            } else {
                self.record.record_stage = RecordStage::Skipped;
            }
        }
        self.transition(MigrationEvent::Cancel)?;
        Ok(())
    }

    fn cancellation_reason(&self) -> String {
        self.context
            .cancellation
            .reason()
            .unwrap_or_else(|| "migration run cancelled".to_string())
    }

    /// Nothing may stay `Pending` once the machine stops
    fn close_pending_stages(&mut self) {
        if self.record.metadata_stage == MetadataStage::Pending {
            self.record.metadata_stage = MetadataStage::Skipped;
        }
        if self.record.record_stage == RecordStage::Pending {
            self.record.record_stage = RecordStage::Skipped;
        }
    }

    /// Rate-limited remote call with bounded retries for transient failures
    async fn call<T, F, Fut>(&self, operation: RemoteOperation, mut request: F) -> RemoteOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RemoteOutcome<T>>,
    {
        let mut attempt = 1u32;
        loop {
            self.context.rate_limiter.acquire(operation.tier()).await;

            let err = match request().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if let Some(delay) = self.context.classifier.retry_delay(&err, attempt) {
                warn!(
                    id = %self.record.id,
                    %operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "🔁 Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let call_kind = if operation.is_fetch() {
                CallKind::Fetch
            } else {
                CallKind::Write
            };
            let class = self.context.classifier.classify(&err, call_kind);
            log_remote_failure(&self.record.id, operation, &err, class);

            if self.context.classifier.aborts_run(&err) {
                self.context.cancellation.cancel(format!(
                    "{operation} for '{}' failed: {err}",
                    self.record.id
                ));
            }
            return Err(err);
        }
    }
}
