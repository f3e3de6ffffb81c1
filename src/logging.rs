//! # Structured Logging Module
//!
//! Environment-aware structured logging for migration runs. Console output is
//! human readable by default; set `MIGRATOR_LOG_FORMAT=json` for one JSON object
//! per line. `RUST_LOG` wins over the environment-derived level when present.

use crate::constants::env;
use crate::models::ResourceIdentifier;
use crate::orchestration::error_classifier::OutcomeClass;
use crate::remote::{RemoteError, RemoteOperation};
use crate::state_machine::MigrationState;
use chrono::Utc;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let json = use_json_format();

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level.clone()));

        let console = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // Tests and embedding hosts may have installed a subscriber already
        if tracing_subscriber::registry().with(console).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = process::id(),
            environment = %environment,
            level = %log_level,
            json = json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(env::RUNTIME_ENVIRONMENT)
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "test" => "debug".to_string(),
        "development" => "debug".to_string(),
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

fn use_json_format() -> bool {
    std::env::var(env::LOG_FORMAT)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Log a resource moving between migration states
pub fn log_stage_transition(
    id: &ResourceIdentifier,
    from: MigrationState,
    to: MigrationState,
    event: &str,
) {
    tracing::debug!(
        id = %id,
        from = %from,
        to = %to,
        event = %event,
        "🔄 STAGE_TRANSITION"
    );
}

/// Log a remote call that failed after any retries were spent
pub fn log_remote_failure(
    id: &ResourceIdentifier,
    operation: RemoteOperation,
    error: &RemoteError,
    class: OutcomeClass,
) {
    match class {
        OutcomeClass::Ignorable => tracing::debug!(
            id = %id,
            operation = %operation,
            tier = %operation.tier(),
            kind = %error.kind,
            class = %class,
            error = %error,
            "🔍 REMOTE_MISS"
        ),
        OutcomeClass::Fatal => tracing::warn!(
            id = %id,
            operation = %operation,
            tier = %operation.tier(),
            kind = %error.kind,
            class = %class,
            error = %error,
            context = error.context.as_deref(),
            "❌ REMOTE_FAILURE"
        ),
    }
}

/// Log run-level milestones
pub fn log_run_event(run_id: &str, event: &str, status: &str, details: Option<&str>) {
    tracing::info!(
        run_id = %run_id,
        event = %event,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📋 RUN_EVENT"
    );
}
