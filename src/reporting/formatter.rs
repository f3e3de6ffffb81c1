//! Plain-text rendering of a `RunSummary` for the terminal.

use crate::models::{ResourceIdentifier, RunSummary};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextReportFormatter;

impl TextReportFormatter {
    pub fn render(summary: &RunSummary) -> String {
        let mut out = String::new();

        if summary.schema_succeeded.is_empty() {
            out.push_str("No ID's migrated...\n");
        } else {
            let _ = writeln!(
                out,
                "Completed: {} / {}",
                summary.completed_count(),
                summary.requested_count()
            );
            out.push_str("ID's that were successfully migrated...\n");
            let _ = writeln!(out, "{}", join(&summary.schema_succeeded));

            if !summary.schema_failed.is_empty() {
                out.push_str("\nID's that were not migrated...\n");
                let _ = writeln!(out, "{}", join(&summary.schema_failed));
            }
        }

        if summary.migrate_records {
            out.push('\n');
            if summary.records_succeeded.is_empty() {
                out.push_str("No entries migrated...\n");
            } else {
                out.push_str("Entries that were successfully migrated...\n");
                let _ = writeln!(out, "{}", join(&summary.records_succeeded));

                if !summary.records_partial.is_empty() {
                    out.push_str("\nEntries that were only partially migrated...\n");
                    let _ = writeln!(out, "{}", join(&summary.records_partial));
                }

                if !summary.records_failed.is_empty() {
                    out.push_str("\nEntries that were not migrated...\n");
                    let _ = writeln!(out, "{}", join(&summary.records_failed));
                }
            }
            let _ = writeln!(out, "Records created: {}", summary.migrated_record_count);
        }

        if !summary.metadata_failed.is_empty() {
            out.push_str("\nEditor metadata that failed to propagate...\n");
            let _ = writeln!(out, "{}", join(&summary.metadata_failed));
        }

        if summary.was_cancelled() {
            out.push_str("\nCancelled before completion...\n");
            let _ = writeln!(out, "{}", join(&summary.cancelled));
        }

        out
    }
}

fn join(ids: &[ResourceIdentifier]) -> String {
    ids.iter()
        .map(ResourceIdentifier::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<ResourceIdentifier> {
        values.iter().map(|v| ResourceIdentifier::new(*v).unwrap()).collect()
    }

    #[test]
    fn test_render_partial_run() {
        let summary = RunSummary {
            requested: ids(&["author", "blogPost"]),
            migrate_records: true,
            schema_succeeded: ids(&["author"]),
            schema_failed: ids(&["blogPost"]),
            records_succeeded: ids(&["author"]),
            records_failed: ids(&["blogPost"]),
            migrated_record_count: 4,
            ..Default::default()
        };

        let text = TextReportFormatter::render(&summary);

        assert!(text.contains("Completed: 1 / 2"));
        assert!(text.contains("ID's that were not migrated...\nblogPost"));
        assert!(text.contains("Entries that were successfully migrated...\nauthor"));
        assert!(text.contains("Records created: 4"));
        assert!(!text.contains("Cancelled"));
    }

    #[test]
    fn test_render_nothing_migrated() {
        let summary = RunSummary {
            requested: ids(&["blogPost"]),
            schema_failed: ids(&["blogPost"]),
            cancelled: ids(&["blogPost"]),
            ..Default::default()
        };

        let text = TextReportFormatter::render(&summary);

        assert!(text.starts_with("No ID's migrated..."));
        assert!(!text.contains("entries"));
        assert!(text.contains("Cancelled before completion...\nblogPost"));
    }
}
