//! Migration Request
//!
//! The input of a run: which content types to migrate and whether their
//! entries travel along. Built once at startup and read-only afterwards.

use crate::error::{MigrationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// Opaque key naming one migratable unit (a content type id)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceIdentifier(String);

impl ResourceIdentifier {
    /// Create an identifier, rejecting blank input
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MigrationError::InvalidRequest(
                "Resource identifier cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ResourceIdentifier {
    type Error = MigrationError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ResourceIdentifier {
    type Error = MigrationError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ResourceIdentifier> for String {
    fn from(id: ResourceIdentifier) -> Self {
        id.0
    }
}

impl AsRef<str> for ResourceIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What to migrate in one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RequestFields")]
pub struct MigrationRequest {
    identifiers: Vec<ResourceIdentifier>,
    migrate_records: bool,
}

/// Wire shape of a request; deserialized requests go through `MigrationRequest::new`
#[derive(Deserialize)]
struct RequestFields {
    identifiers: Vec<ResourceIdentifier>,
    migrate_records: bool,
}

impl TryFrom<RequestFields> for MigrationRequest {
    type Error = MigrationError;

    fn try_from(fields: RequestFields) -> Result<Self> {
        Self::new(fields.identifiers, fields.migrate_records)
    }
}

impl MigrationRequest {
    /// Build a request from an ordered list of identifiers.
    ///
    /// Duplicates are dropped (the first occurrence keeps its position) and an
    /// empty list is rejected.
    pub fn new(identifiers: Vec<ResourceIdentifier>, migrate_records: bool) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(identifiers.len());
        for id in identifiers {
            if seen.insert(id.clone()) {
                unique.push(id);
            } else {
                warn!(id = %id, "Duplicate resource identifier dropped from request");
            }
        }

        if unique.is_empty() {
            return Err(MigrationError::InvalidRequest(
                "At least one resource identifier is required".to_string(),
            ));
        }

        Ok(Self {
            identifiers: unique,
            migrate_records,
        })
    }

    /// Build a request from the two answers the interactive prompt collects:
    /// a space separated list of ids and a yes/no for entry migration
    pub fn from_prompt_input(ids_line: &str, migrate_records_answer: &str) -> Result<Self> {
        let identifiers = parse_identifier_list(ids_line);
        let migrate_records = parse_yes_no(migrate_records_answer)?;
        Self::new(identifiers, migrate_records)
    }

    pub fn identifiers(&self) -> &[ResourceIdentifier] {
        &self.identifiers
    }

    pub fn migrate_records(&self) -> bool {
        self.migrate_records
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// Split a whitespace separated id list, skipping empty pieces
pub fn parse_identifier_list(input: &str) -> Vec<ResourceIdentifier> {
    input
        .split_whitespace()
        .filter_map(|piece| ResourceIdentifier::new(piece).ok())
        .collect()
}

/// Interpret a yes/no answer. An empty answer counts as yes.
pub fn parse_yes_no(answer: &str) -> Result<bool> {
    match answer.trim().to_lowercase().as_str() {
        "" | "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        other => Err(MigrationError::InvalidRequest(format!(
            "Expected Y or N, got '{other}'"
        ))),
    }
}
