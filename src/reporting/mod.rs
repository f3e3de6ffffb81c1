//! # Reporting
//!
//! Turns the finalized per-resource records of a run into a `RunSummary`
//! and renders it for humans. The orchestrator only produces structured
//! data; formatting lives here.

pub mod formatter;
pub mod reporter;

pub use formatter::TextReportFormatter;
pub use reporter::ReconciliationReporter;
