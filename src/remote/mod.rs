//! # Remote API Capabilities
//!
//! The migrator talks to two asymmetric APIs. The read API serves large
//! payloads at a generous rate but cannot write; the management API can create
//! and update but is throttled much harder. Both are modeled as capability
//! traits so the orchestrator never depends on a transport.
//!
//! - [`RemoteReadClient`] reads from the **source** environment (read tier)
//! - [`RemoteWriteClient`] probes and writes the **target** environment (write tier)
//! - [`in_memory::InMemorySpace`] implements both over a JSON snapshot

pub mod errors;
pub mod in_memory;

use crate::models::ResourceIdentifier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub use errors::{RemoteError, RemoteErrorKind};
pub use in_memory::{FaultRule, InMemorySpace, SpaceSnapshot};

/// Result of one remote call
pub type RemoteOutcome<T> = Result<T, RemoteError>;

/// Rate budget a call is charged against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiTier {
    Read,
    Write,
}

impl fmt::Display for ApiTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Every remote call the migrator can make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteOperation {
    FetchSchema,
    FetchMetadata,
    FetchRecords,
    FetchTargetSchema,
    CreateSchema,
    UpdateSchema,
    UpdateMetadata,
    CreateRecord,
}

impl RemoteOperation {
    /// Tier whose budget the operation consumes
    pub fn tier(&self) -> ApiTier {
        match self {
            Self::FetchSchema | Self::FetchMetadata | Self::FetchRecords => ApiTier::Read,
            _ => ApiTier::Write,
        }
    }

    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Self::FetchSchema | Self::FetchMetadata | Self::FetchRecords | Self::FetchTargetSchema
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchSchema => "fetch_schema",
            Self::FetchMetadata => "fetch_metadata",
            Self::FetchRecords => "fetch_records",
            Self::FetchTargetSchema => "fetch_target_schema",
            Self::CreateSchema => "create_schema",
            Self::UpdateSchema => "update_schema",
            Self::UpdateMetadata => "update_metadata",
            Self::CreateRecord => "create_record",
        }
    }
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content type definition, stripped of environment-specific system fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_field: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<Value>,
}

/// Editor interface of a content type (widget controls and help texts)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataPayload {
    #[serde(default)]
    pub controls: Vec<Value>,
}

/// One content entry; only its fields travel between environments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPayload {
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Read-only access to the source environment
#[async_trait]
pub trait RemoteReadClient: Send + Sync {
    async fn fetch_schema(&self, id: &ResourceIdentifier) -> RemoteOutcome<SchemaPayload>;

    async fn fetch_metadata(&self, id: &ResourceIdentifier) -> RemoteOutcome<MetadataPayload>;

    /// Fetch at most `page_size` records of the given content type
    async fn fetch_records(
        &self,
        type_id: &ResourceIdentifier,
        page_size: usize,
    ) -> RemoteOutcome<Vec<RecordPayload>>;
}

/// Read/write access to the target environment.
///
/// A schema write is only complete once the schema is active in the target:
/// implementations backed by an API with a draft/publish split must publish
/// (activate) the content type inside `create_schema` and `update_schema`
/// before returning `Ok`. Metadata and records for the type are written right
/// after and expect a published schema.
#[async_trait]
pub trait RemoteWriteClient: Send + Sync {
    /// Look the schema up in the target; `NotFound` means it must be created
    async fn fetch_target_schema(&self, id: &ResourceIdentifier) -> RemoteOutcome<SchemaPayload>;

    /// Create and publish a schema the target does not have yet
    async fn create_schema(
        &self,
        id: &ResourceIdentifier,
        payload: &SchemaPayload,
    ) -> RemoteOutcome<()>;

    /// Overwrite and republish an existing schema
    async fn update_schema(
        &self,
        id: &ResourceIdentifier,
        payload: &SchemaPayload,
    ) -> RemoteOutcome<()>;

    async fn update_metadata(
        &self,
        id: &ResourceIdentifier,
        payload: &MetadataPayload,
    ) -> RemoteOutcome<()>;

    async fn create_record(
        &self,
        type_id: &ResourceIdentifier,
        payload: &RecordPayload,
    ) -> RemoteOutcome<()>;
}
