#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Space Migrator
//!
//! Rate-aware migration of content schemas, their editor metadata and their
//! entries from one environment of a content space to another.
//!
//! ## Overview
//!
//! A run takes a list of content type identifiers and, for each one, copies
//! the schema (creating it in the target or overwriting the existing one),
//! propagates its editor metadata and optionally copies its entries. Each
//! identifier runs through its own state machine; many identifiers run
//! concurrently but share one two-tier rate limiter, so the read and the
//! read/write APIs are never driven past their call ceilings.
//!
//! ## Module Organization
//!
//! - [`models`] - Requests, per-resource records and run summaries
//! - [`remote`] - Remote API capability traits, error taxonomy and an in-memory environment
//! - [`resilience`] - Two-tier rate limiter and record pacing
//! - [`state_machine`] - Per-resource migration state machine
//! - [`orchestration`] - Run orchestration, outcome classification and cancellation
//! - [`reporting`] - Reconciliation of records against the request
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use space_migrator::models::MigrationRequest;
//! use space_migrator::orchestration::{MigrationOrchestrator, OrchestratorConfig};
//! use space_migrator::remote::InMemorySpace;
//! use space_migrator::reporting::TextReportFormatter;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = Arc::new(InMemorySpace::load_snapshot("master", "master.json".as_ref())?);
//! let target = Arc::new(InMemorySpace::empty("staging"));
//!
//! let orchestrator = MigrationOrchestrator::new(source, target, OrchestratorConfig::default());
//! let request = MigrationRequest::from_prompt_input("blogPost author", "y")?;
//! let summary = orchestrator.run(&request).await;
//!
//! println!("{}", TextReportFormatter::render(&summary));
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod remote;
pub mod reporting;
pub mod resilience;
pub mod state_machine;

pub use config::{ConfigLoader, MigratorConfig};
pub use error::{MigrationError, Result};
pub use models::{MigrationRequest, ResourceIdentifier, ResourceMigrationRecord, RunSummary};
pub use orchestration::{MigrationOrchestrator, OrchestratorConfig};
pub use reporting::{ReconciliationReporter, TextReportFormatter};
