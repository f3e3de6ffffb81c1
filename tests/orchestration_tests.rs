//! End-to-end runs of the orchestrator against in-memory environments.

mod common;

use async_trait::async_trait;
use common::*;
use parking_lot::Mutex;
use space_migrator::models::{
    FailureKind, MetadataStage, MigrationStage, RecordStage, ResourceIdentifier, SchemaAction,
    SchemaStage,
};
use space_migrator::orchestration::{
    CallKind, MigrationOrchestrator, OrchestratorConfig, OutcomeClass, OutcomeClassifier,
    StandardOutcomeClassifier,
};
use space_migrator::remote::{
    FaultRule, InMemorySpace, MetadataPayload, RecordPayload, RemoteError, RemoteErrorKind,
    RemoteOperation, RemoteOutcome, RemoteWriteClient, SchemaPayload,
};
use space_migrator::resilience::RateLimitConfig;
use space_migrator::state_machine::StageSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn serial_config() -> OrchestratorConfig {
    OrchestratorConfig {
        max_concurrent_resources: Some(1),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_new_schema_with_records_is_fully_migrated() {
    let source = source_space(&[("blogPost", 3)]);
    let target = target_space();

    let (records, summary) = orchestrator(&source, &target, OrchestratorConfig::default())
        .run_detailed(&request(&["blogPost"], true))
        .await;

    assert_eq!(summary.schema_succeeded, ids(&["blogPost"]));
    assert_eq!(summary.schemas_created, ids(&["blogPost"]));
    assert_eq!(summary.records_succeeded, ids(&["blogPost"]));
    assert_eq!(summary.migrated_record_count, 3);
    assert!(summary.all_migrated());

    let record = &records[0];
    assert_eq!(record.schema_action, Some(SchemaAction::Created));
    assert_eq!(record.metadata_stage, MetadataStage::Succeeded);
    assert_eq!(record.record_stage, RecordStage::Succeeded);
    assert!(record.failures.is_empty());

    assert_eq!(target.record_count("blogPost"), 3);
    assert_eq!(target.snapshot().metadata["blogPost"], metadata());
}

#[tokio::test(start_paused = true)]
async fn test_permission_failure_on_create_stops_the_resource() {
    let source = source_space(&[("blogPost", 3)]);
    let target = target_space();
    target.inject_fault(FaultRule::new(
        RemoteOperation::CreateSchema,
        RemoteErrorKind::Permission,
    ));

    let (records, summary) = orchestrator(&source, &target, OrchestratorConfig::default())
        .run_detailed(&request(&["blogPost"], true))
        .await;

    assert_eq!(summary.schema_failed, ids(&["blogPost"]));
    assert_eq!(summary.records_failed, ids(&["blogPost"]));
    assert!(summary.schema_succeeded.is_empty());

    let record = &records[0];
    assert_eq!(record.schema_stage, SchemaStage::Failed);
    assert_eq!(record.metadata_stage, MetadataStage::Skipped);
    assert_eq!(record.record_stage, RecordStage::Skipped);
    assert_eq!(
        record.failure_for(MigrationStage::Schema).unwrap().kind,
        FailureKind::Remote(RemoteErrorKind::Permission)
    );

    // no update attempt after the failed create, and no later stage at all
    assert_eq!(target.call_count(RemoteOperation::UpdateSchema), 0);
    assert_eq!(source.call_count(RemoteOperation::FetchMetadata), 0);
    assert_eq!(source.call_count(RemoteOperation::FetchRecords), 0);
    assert_eq!(target.call_count(RemoteOperation::CreateRecord), 0);
}

#[tokio::test(start_paused = true)]
async fn test_second_run_updates_existing_schema() {
    let source = source_space(&[("author", 1)]);
    let target = target_space();
    let request = request(&["author"], false);

    let first = orchestrator(&source, &target, OrchestratorConfig::default())
        .run(&request)
        .await;
    let second = orchestrator(&source, &target, OrchestratorConfig::default())
        .run(&request)
        .await;

    assert_eq!(first.schemas_created, ids(&["author"]));
    assert_eq!(second.schemas_updated, ids(&["author"]));
    assert!(second.schema_failed.is_empty());
    assert_eq!(target.call_count(RemoteOperation::CreateSchema), 1);
    assert_eq!(target.call_count(RemoteOperation::UpdateSchema), 1);
}

#[tokio::test(start_paused = true)]
async fn test_records_not_requested_are_skipped() {
    let source = source_space(&[("author", 2), ("blogPost", 4)]);
    let target = target_space();
    target.inject_fault(
        FaultRule::new(RemoteOperation::CreateSchema, RemoteErrorKind::Validation)
            .for_id("blogPost"),
    );

    let (records, summary) = orchestrator(&source, &target, OrchestratorConfig::default())
        .run_detailed(&request(&["author", "blogPost"], false))
        .await;

    assert!(records
        .iter()
        .all(|record| record.record_stage == RecordStage::Skipped));
    assert_eq!(source.call_count(RemoteOperation::FetchRecords), 0);
    assert!(summary.records_succeeded.is_empty());
    assert!(summary.records_failed.is_empty());
    assert_eq!(summary.not_migrated(), ids(&["blogPost"]));
}

#[tokio::test(start_paused = true)]
async fn test_failing_resource_does_not_stop_siblings() {
    let source = source_space(&[("author", 1), ("blogPost", 1), ("category", 1)]);
    let target = target_space();
    target.inject_fault(
        FaultRule::new(RemoteOperation::FetchTargetSchema, RemoteErrorKind::Malformed)
            .for_id("blogPost"),
    );

    let (records, summary) = orchestrator(&source, &target, OrchestratorConfig::default())
        .run_detailed(&request(&["author", "blogPost", "category"], true))
        .await;

    assert_eq!(summary.schema_succeeded, ids(&["author", "category"]));
    assert_eq!(summary.schema_failed, ids(&["blogPost"]));
    assert_eq!(summary.records_succeeded, ids(&["author", "category"]));
    assert!(summary.cancelled.is_empty());

    // records come back in request order
    let order: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(order, ids(&["author", "blogPost", "category"]));
    assert!(records.iter().all(|r| r.is_finalized()));
}

#[tokio::test(start_paused = true)]
async fn test_partial_record_failure_is_reported() {
    let source = source_space(&[("blogPost", 3)]);
    let target = target_space();
    target.inject_fault(
        FaultRule::new(RemoteOperation::CreateRecord, RemoteErrorKind::Validation).times(1),
    );

    let (records, summary) = orchestrator(&source, &target, OrchestratorConfig::default())
        .run_detailed(&request(&["blogPost"], true))
        .await;

    let record = &records[0];
    assert_eq!(record.record_stage, RecordStage::PartiallySucceeded);
    assert_eq!(record.migrated_record_count, 2);
    assert_eq!(record.failed_record_count, 1);
    assert!(record.failure_for(MigrationStage::Records).is_some());

    assert_eq!(summary.records_succeeded, ids(&["blogPost"]));
    assert_eq!(summary.records_partial, ids(&["blogPost"]));
    assert_eq!(summary.migrated_record_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_every_record_failing_fails_the_stage() {
    let source = source_space(&[("blogPost", 2)]);
    let target = target_space();
    target.inject_fault(FaultRule::new(
        RemoteOperation::CreateRecord,
        RemoteErrorKind::Validation,
    ));

    let (records, summary) = orchestrator(&source, &target, OrchestratorConfig::default())
        .run_detailed(&request(&["blogPost"], true))
        .await;

    assert_eq!(records[0].record_stage, RecordStage::Failed);
    assert_eq!(records[0].failed_record_count, 2);
    // the schema still made it
    assert_eq!(summary.schema_succeeded, ids(&["blogPost"]));
    assert_eq!(summary.records_failed, ids(&["blogPost"]));
}

#[tokio::test(start_paused = true)]
async fn test_missing_and_failing_metadata() {
    let source = source_space(&[("blogPost", 0)]);
    // author has a schema but no editor metadata in the source
    source.insert_schema("author", schema("author"));
    let target = target_space();
    target.inject_fault(
        FaultRule::new(RemoteOperation::UpdateMetadata, RemoteErrorKind::Permission)
            .for_id("blogPost"),
    );

    let (records, summary) = orchestrator(&source, &target, OrchestratorConfig::default())
        .run_detailed(&request(&["author", "blogPost"], false))
        .await;

    assert_eq!(records[0].metadata_stage, MetadataStage::Skipped);
    assert_eq!(records[1].metadata_stage, MetadataStage::Failed);
    assert_eq!(summary.metadata_failed, ids(&["blogPost"]));
    // metadata failures never undo the schema
    assert_eq!(summary.schema_succeeded, ids(&["author", "blogPost"]));
    assert!(summary.all_migrated());
}

#[tokio::test(start_paused = true)]
async fn test_type_without_entries_skips_record_stage() {
    let source = source_space(&[("tag", 0)]);
    let target = target_space();

    let (records, summary) = orchestrator(&source, &target, OrchestratorConfig::default())
        .run_detailed(&request(&["tag"], true))
        .await;

    assert_eq!(records[0].record_stage, RecordStage::Skipped);
    assert_eq!(summary.records_skipped, ids(&["tag"]));
    assert_eq!(target.call_count(RemoteOperation::CreateRecord), 0);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried() {
    let source = source_space(&[("author", 0)]);
    source.inject_fault(
        FaultRule::new(RemoteOperation::FetchSchema, RemoteErrorKind::Transient).times(2),
    );
    let target = target_space();

    let summary = orchestrator(&source, &target, OrchestratorConfig::default())
        .run(&request(&["author"], false))
        .await;

    assert_eq!(summary.schema_succeeded, ids(&["author"]));
    assert_eq!(source.call_count(RemoteOperation::FetchSchema), 3);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_give_up_after_retry_limit() {
    let source = source_space(&[("author", 0)]);
    source.inject_fault(FaultRule::new(
        RemoteOperation::FetchSchema,
        RemoteErrorKind::Transient,
    ));
    let target = target_space();

    let (records, summary) = orchestrator(&source, &target, OrchestratorConfig::default())
        .run_detailed(&request(&["author"], false))
        .await;

    assert_eq!(summary.schema_failed, ids(&["author"]));
    assert_eq!(source.call_count(RemoteOperation::FetchSchema), 3);
    assert_eq!(
        records[0].failure_for(MigrationStage::Schema).unwrap().kind,
        FailureKind::Remote(RemoteErrorKind::Transient)
    );
}

#[tokio::test(start_paused = true)]
async fn test_credential_failure_aborts_the_run() {
    let source = source_space(&[("author", 1), ("blogPost", 1), ("category", 1)]);
    let target = target_space();
    target.inject_fault(
        FaultRule::new(RemoteOperation::CreateSchema, RemoteErrorKind::Unauthorized)
            .for_id("author"),
    );

    let (records, summary) = orchestrator(&source, &target, serial_config())
        .run_detailed(&request(&["author", "blogPost", "category"], true))
        .await;

    assert_eq!(
        records[0].failure_for(MigrationStage::Schema).unwrap().kind,
        FailureKind::Remote(RemoteErrorKind::Unauthorized)
    );
    assert_eq!(summary.cancelled, ids(&["blogPost", "category"]));
    assert_eq!(summary.schema_failed, ids(&["author", "blogPost", "category"]));
    assert!(summary.was_cancelled());
    assert_eq!(target.call_count(RemoteOperation::CreateSchema), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_run_marks_every_resource() {
    let source = source_space(&[("author", 1), ("blogPost", 1)]);
    let target = target_space();
    let orchestrator = orchestrator(&source, &target, OrchestratorConfig::default());
    orchestrator.cancellation().cancel("operator stop");

    let (records, summary) = orchestrator
        .run_detailed(&request(&["author", "blogPost"], true))
        .await;

    assert!(records.iter().all(|r| r.is_cancelled() && r.is_finalized()));
    assert_eq!(summary.cancelled, ids(&["author", "blogPost"]));
    assert_eq!(summary.schema_failed, ids(&["author", "blogPost"]));
    assert!(source.calls().is_empty());
    assert!(target.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_source_resource_respects_continue_flag() {
    let source = source_space(&[("author", 0)]);
    let target = target_space();

    let lenient = orchestrator(&source, &target, serial_config())
        .run_detailed(&request(&["ghost", "author"], false))
        .await;
    assert_eq!(
        lenient.0[0].failure_for(MigrationStage::Schema).unwrap().kind,
        FailureKind::SourceMissing
    );
    assert_eq!(lenient.1.schema_succeeded, ids(&["author"]));

    let mut strict_config = serial_config();
    strict_config.stages.continue_on_ignorable = false;
    let strict = orchestrator(&source, &target_space(), strict_config)
        .run_detailed(&request(&["ghost", "author"], false))
        .await;
    assert_eq!(strict.1.schema_failed, ids(&["ghost", "author"]));
    assert_eq!(strict.1.cancelled, ids(&["author"]));
}

#[tokio::test(start_paused = true)]
async fn test_record_creates_are_paced_and_rate_limited() {
    let source = source_space(&[("blogPost", 12)]);
    let target = target_space();
    let config = OrchestratorConfig {
        rate_limits: RateLimitConfig {
            read_calls_per_window: 55,
            write_calls_per_window: 7,
            window: Duration::from_secs(60),
        },
        ..Default::default()
    };
    let orchestrator = orchestrator(&source, &target, config);

    let started = Instant::now();
    let summary = orchestrator.run(&request(&["blogPost"], true)).await;
    let elapsed = started.elapsed();

    assert_eq!(summary.migrated_record_count, 12);
    // 15 write calls against a ceiling of 7 need three windows
    assert!(elapsed >= Duration::from_secs(120), "elapsed {elapsed:?}");

    let metrics = orchestrator.rate_limiter().metrics();
    assert_eq!(metrics.write.granted, 15);
    assert!(metrics.write.delayed >= 2);
    assert_eq!(metrics.read.delayed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_resources_run_concurrently_under_one_limiter() {
    let source = source_space(&[("a", 0), ("b", 0), ("c", 0), ("d", 0)]);
    let target = target_space();
    let orchestrator = orchestrator(&source, &target, OrchestratorConfig::default());

    let summary = orchestrator
        .run(&request(&["a", "b", "c", "d"], false))
        .await;

    assert_eq!(summary.schema_succeeded.len(), 4);
    // probe + create + metadata update per resource
    assert_eq!(orchestrator.rate_limiter().metrics().write.granted, 12);
    assert!(summary
        .requested
        .iter()
        .all(|id| target.snapshot().schemas.contains_key(ResourceIdentifier::as_str(id))));
}

/// Target that notes when each record create reaches it
struct TimedTarget {
    inner: Arc<InMemorySpace>,
    record_creates: Mutex<Vec<Instant>>,
}

#[async_trait]
impl RemoteWriteClient for TimedTarget {
    async fn fetch_target_schema(&self, id: &ResourceIdentifier) -> RemoteOutcome<SchemaPayload> {
        self.inner.fetch_target_schema(id).await
    }

    async fn create_schema(
        &self,
        id: &ResourceIdentifier,
        payload: &SchemaPayload,
    ) -> RemoteOutcome<()> {
        self.inner.create_schema(id, payload).await
    }

    async fn update_schema(
        &self,
        id: &ResourceIdentifier,
        payload: &SchemaPayload,
    ) -> RemoteOutcome<()> {
        self.inner.update_schema(id, payload).await
    }

    async fn update_metadata(
        &self,
        id: &ResourceIdentifier,
        payload: &MetadataPayload,
    ) -> RemoteOutcome<()> {
        self.inner.update_metadata(id, payload).await
    }

    async fn create_record(
        &self,
        type_id: &ResourceIdentifier,
        payload: &RecordPayload,
    ) -> RemoteOutcome<()> {
        self.record_creates.lock().push(Instant::now());
        self.inner.create_record(type_id, payload).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_record_creates_pause_between_batches() {
    let source = source_space(&[("blogPost", 12)]);
    let target = Arc::new(TimedTarget {
        inner: target_space(),
        record_creates: Mutex::new(Vec::new()),
    });
    let config = OrchestratorConfig {
        rate_limits: RateLimitConfig {
            read_calls_per_window: 1000,
            write_calls_per_window: 1000,
            window: Duration::from_secs(60),
        },
        stages: StageSettings {
            pacing_batch_size: 5,
            pacing_delay: Duration::from_secs(1),
            ..Default::default()
        },
        ..Default::default()
    };
    let orchestrator = MigrationOrchestrator::new(source, target.clone(), config);

    let started = Instant::now();
    let summary = orchestrator.run(&request(&["blogPost"], true)).await;
    let elapsed = started.elapsed();

    assert_eq!(summary.migrated_record_count, 12);
    // the write ceiling never binds, so all waiting is pacing
    assert_eq!(elapsed, Duration::from_secs(2));
    assert_eq!(orchestrator.rate_limiter().metrics().write.delayed, 0);

    let stamps = target.record_creates.lock().clone();
    assert_eq!(stamps.len(), 12);
    let gaps: Vec<Duration> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
    for (index, gap) in gaps.iter().enumerate() {
        // gaps[4] sits between creates 5 and 6, gaps[9] between 10 and 11
        let expected = if index == 4 || index == 9 {
            Duration::from_secs(1)
        } else {
            Duration::ZERO
        };
        assert_eq!(*gap, expected, "gap after create {}", index + 1);
    }
}

/// Treats a permission failure like a revoked credential
struct PermissionAbortsRun(StandardOutcomeClassifier);

impl OutcomeClassifier for PermissionAbortsRun {
    fn classify(&self, error: &RemoteError, call: CallKind) -> OutcomeClass {
        self.0.classify(error, call)
    }

    fn retry_delay(&self, error: &RemoteError, attempt: u32) -> Option<Duration> {
        self.0.retry_delay(error, attempt)
    }

    fn aborts_run(&self, error: &RemoteError) -> bool {
        error.kind == RemoteErrorKind::Permission || self.0.aborts_run(error)
    }

    fn classifier_name(&self) -> &'static str {
        "permission_aborts"
    }
}

#[tokio::test(start_paused = true)]
async fn test_custom_classifier_decides_run_abort() {
    let source = source_space(&[("author", 0), ("blogPost", 0)]);
    let target = target_space();
    target.inject_fault(
        FaultRule::new(RemoteOperation::CreateSchema, RemoteErrorKind::Permission).for_id("author"),
    );

    let summary = orchestrator(&source, &target, serial_config())
        .with_classifier(Arc::new(PermissionAbortsRun(StandardOutcomeClassifier::new())))
        .run(&request(&["author", "blogPost"], false))
        .await;

    assert_eq!(summary.schema_failed, ids(&["author", "blogPost"]));
    assert_eq!(summary.cancelled, ids(&["blogPost"]));
    assert_eq!(target.call_count(RemoteOperation::CreateSchema), 1);
}

#[tokio::test(start_paused = true)]
async fn test_oversized_concurrency_cap_is_clamped() {
    let source = source_space(&[("author", 0), ("blogPost", 0)]);
    let target = target_space();
    let config = OrchestratorConfig {
        max_concurrent_resources: Some(usize::MAX),
        ..Default::default()
    };

    let summary = orchestrator(&source, &target, config)
        .run(&request(&["author", "blogPost"], false))
        .await;

    assert!(summary.all_migrated());
}
