// State machine module for resource migration
//
// One machine per requested identifier. Transitions are decided by a pure table
// and the async driver performs the remote calls for each stage.

pub mod errors;
pub mod events;
pub mod resource_state_machine;
pub mod states;

// Re-export main types for convenient access
pub use errors::{StateMachineError, StateMachineResult};
pub use events::MigrationEvent;
pub use resource_state_machine::{
    determine_target_state, MigrationContext, ResourceMigrationStateMachine, StageSettings,
};
pub use states::MigrationState;
