//! # Migration Orchestrator
//!
//! Fans a `MigrationRequest` out into one state machine per identifier, runs
//! them concurrently on a `JoinSet`, and reconciles the finished records into
//! a `RunSummary`.
//!
//! ## Concurrency
//!
//! Resources only share the rate limiter and the cancellation flag. A failing
//! resource never stops its siblings; only a run-aborting failure (or an
//! external cancel) does, and then only at stage boundaries. An optional
//! semaphore caps how many resources are in flight at once.

use super::cancellation::CancellationFlag;
use super::error_classifier::{ClassifierConfig, OutcomeClassifier, StandardOutcomeClassifier};
use crate::config::MigratorConfig;
use crate::logging::log_run_event;
use crate::models::{MigrationRequest, ResourceMigrationRecord, RunSummary};
use crate::remote::{RemoteReadClient, RemoteWriteClient};
use crate::reporting::ReconciliationReporter;
use crate::resilience::{RateLimitConfig, RateLimiter};
use crate::state_machine::{MigrationContext, ResourceMigrationStateMachine, StageSettings};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, Instrument, Span};
use uuid::Uuid;

/// Runtime settings of one orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub rate_limits: RateLimitConfig,
    pub classifier: ClassifierConfig,
    pub stages: StageSettings,
    /// Resources in flight at once; unbounded when `None`
    pub max_concurrent_resources: Option<usize>,
}

impl From<&MigratorConfig> for OrchestratorConfig {
    fn from(config: &MigratorConfig) -> Self {
        Self {
            rate_limits: config.rate_limit_config(),
            classifier: config.classifier_config(),
            stages: config.stage_settings(),
            max_concurrent_resources: config.migration.max_concurrent_resources,
        }
    }
}

pub struct MigrationOrchestrator {
    source: Arc<dyn RemoteReadClient>,
    target: Arc<dyn RemoteWriteClient>,
    rate_limiter: Arc<RateLimiter>,
    classifier: Arc<dyn OutcomeClassifier>,
    cancellation: CancellationFlag,
    config: OrchestratorConfig,
}

impl MigrationOrchestrator {
    pub fn new(
        source: Arc<dyn RemoteReadClient>,
        target: Arc<dyn RemoteWriteClient>,
        config: OrchestratorConfig,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limits));
        let classifier: Arc<dyn OutcomeClassifier> = Arc::new(
            StandardOutcomeClassifier::with_config(config.classifier.clone()),
        );

        Self {
            source,
            target,
            rate_limiter,
            classifier,
            cancellation: CancellationFlag::new(),
            config,
        }
    }

    /// Swap in a different outcome classification policy
    pub fn with_classifier(mut self, classifier: Arc<dyn OutcomeClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Handle for stopping the run from outside (signal handlers, tests)
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.rate_limiter)
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub async fn run(&self, request: &MigrationRequest) -> RunSummary {
        let (_, summary) = self.run_detailed(request).await;
        summary
    }

    /// Run every requested identifier and return the records, in request order, with their summary
    #[instrument(
        skip(self, request),
        fields(run_id = tracing::field::Empty, resources = request.len(), migrate_records = request.migrate_records())
    )]
    pub async fn run_detailed(
        &self,
        request: &MigrationRequest,
    ) -> (Vec<ResourceMigrationRecord>, RunSummary) {
        let run_id = Uuid::new_v4().to_string();
        Span::current().record("run_id", run_id.as_str());

        info!(
            classifier = self.classifier.classifier_name(),
            max_concurrent = ?self.config.max_concurrent_resources,
            "🚀 Starting migration run"
        );
        log_run_event(&run_id, "run_started", "running", None);

        let context = MigrationContext {
            source: Arc::clone(&self.source),
            target: Arc::clone(&self.target),
            rate_limiter: Arc::clone(&self.rate_limiter),
            classifier: Arc::clone(&self.classifier),
            cancellation: self.cancellation.clone(),
            settings: self.config.stages.clone(),
        };
        let semaphore = self
            .config
            .max_concurrent_resources
            .map(|limit| Arc::new(Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS))));

        let mut records = Vec::with_capacity(request.len());
        let mut workers = JoinSet::new();

        for id in request.identifiers() {
            if self.cancellation.is_cancelled() {
                let reason = self
                    .cancellation
                    .reason()
                    .unwrap_or_else(|| "migration run cancelled".to_string());
                debug!(id = %id, "Run cancelled before resource started");
                records.push(ResourceMigrationRecord::cancelled_before_start(
                    id.clone(),
                    &reason,
                ));
                continue;
            }

            let machine = ResourceMigrationStateMachine::new(
                id.clone(),
                request.migrate_records(),
                context.clone(),
            );
            let semaphore = semaphore.clone();

            workers.spawn(
                async move {
                    // a closed semaphore only means no cap
                    let _permit = match semaphore {
                        Some(semaphore) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };
                    machine.run().await
                }
                .in_current_span(),
            );
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(record) => records.push(record),
                Err(e) => {
                    error!(error = %e, "Resource worker panicked; its identifier will be reported as not migrated");
                }
            }
        }

        records.sort_by_key(|record| {
            request
                .identifiers()
                .iter()
                .position(|id| *id == record.id)
                .unwrap_or(usize::MAX)
        });

        let summary = ReconciliationReporter::summarize(request, &records);
        let metrics = self.rate_limiter.metrics();
        let status = if summary.all_migrated() {
            "completed"
        } else if summary.was_cancelled() {
            "cancelled"
        } else {
            "completed_with_failures"
        };

        info!(
            completed = summary.completed_count(),
            requested = summary.requested_count(),
            records_created = summary.migrated_record_count,
            read_calls = metrics.read.granted,
            write_calls = metrics.write.granted,
            delayed_calls = metrics.read.delayed + metrics.write.delayed,
            status,
            "🏁 Migration run finished"
        );
        log_run_event(
            &run_id,
            "run_finished",
            status,
            Some(&format!(
                "{} / {} schemas migrated",
                summary.completed_count(),
                summary.requested_count()
            )),
        );

        (records, summary)
    }
}
