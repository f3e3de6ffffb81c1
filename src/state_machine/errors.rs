use crate::error::MigrationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Invalid state transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;

impl From<StateMachineError> for MigrationError {
    fn from(error: StateMachineError) -> Self {
        MigrationError::StateTransition(error.to_string())
    }
}
