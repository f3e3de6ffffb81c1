//! # Orchestration Engine
//!
//! Coordinates a migration run across many resources.
//!
//! ## Core Components
//!
//! - **MigrationOrchestrator**: spawns one state machine per requested identifier
//!   and reconciles the results
//! - **OutcomeClassifier**: decides whether a failed remote call is ignorable,
//!   fatal, retryable or run-aborting
//! - **CancellationFlag**: run-wide stop signal observed at stage boundaries

pub mod cancellation;
pub mod error_classifier;
pub mod orchestrator;

// Re-export core types and components for easy access
pub use cancellation::CancellationFlag;
pub use error_classifier::{
    CallKind, ClassifierConfig, OutcomeClass, OutcomeClassifier, StandardOutcomeClassifier,
};
pub use orchestrator::{MigrationOrchestrator, OrchestratorConfig};
