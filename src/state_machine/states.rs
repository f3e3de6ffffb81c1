use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one resource migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    /// Created, nothing attempted yet
    #[default]
    Init,
    /// Reading the source schema and probing the target for it
    FetchingSchema,
    /// Target lacks the schema; creating it
    CreatingSchema,
    /// Target has the schema; overwriting it
    UpdatingSchema,
    /// Copying editor metadata from source to target
    PropagatingMetadata,
    /// Copying content records
    MigratingRecords,
    /// Finished; later stages may still have recorded failures
    Done,
    /// Aborted by a fatal schema failure or cancellation
    Failed,
}

impl MigrationState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::FetchingSchema => write!(f, "fetching_schema"),
            Self::CreatingSchema => write!(f, "creating_schema"),
            Self::UpdatingSchema => write!(f, "updating_schema"),
            Self::PropagatingMetadata => write!(f, "propagating_metadata"),
            Self::MigratingRecords => write!(f, "migrating_records"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for MigrationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Self::Init),
            "fetching_schema" => Ok(Self::FetchingSchema),
            "creating_schema" => Ok(Self::CreatingSchema),
            "updating_schema" => Ok(Self::UpdatingSchema),
            "propagating_metadata" => Ok(Self::PropagatingMetadata),
            "migrating_records" => Ok(Self::MigratingRecords),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid migration state: {s}")),
        }
    }
}
