use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure categories reported by the remote API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// The requested resource does not exist in the addressed environment
    NotFound,
    /// Network failure, timeout or throttling response; worth retrying
    Transient,
    /// The credential lacks the rights for this call
    Permission,
    /// The remote rejected the payload
    Validation,
    /// The remote answered with something we could not interpret
    Malformed,
    /// The credential itself is invalid or revoked
    Unauthorized,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Transient => write!(f, "transient"),
            Self::Permission => write!(f, "permission"),
            Self::Validation => write!(f, "validation"),
            Self::Malformed => write!(f, "malformed"),
            Self::Unauthorized => write!(f, "unauthorized"),
        }
    }
}

impl std::str::FromStr for RemoteErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_found" => Ok(Self::NotFound),
            "transient" => Ok(Self::Transient),
            "permission" => Ok(Self::Permission),
            "validation" => Ok(Self::Validation),
            "malformed" => Ok(Self::Malformed),
            "unauthorized" => Ok(Self::Unauthorized),
            _ => Err(format!("Invalid remote error kind: {s}")),
        }
    }
}

/// Error returned by a single remote call
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
    /// Where the failure happened (environment, operation), when known
    pub context: Option<String>,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Transient, message)
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Permission, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Validation, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Malformed, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Unauthorized, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == RemoteErrorKind::NotFound
    }
}
