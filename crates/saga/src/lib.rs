//! Coordination above the event dispatcher.
//!
//! This crate provides:
//! - `EventCoordinator`: handlers plus sagas whose output is coordinated in
//!   turn, with a bound on cascade depth
//! - `WorkflowCoordinator`: ordered steps with reverse-order compensation
//! - `EventRouter`: predicate-guarded routes per event type

pub mod coordinator;
pub mod error;
pub mod router;
pub mod state;
pub mod workflow;

pub use coordinator::{DEFAULT_MAX_CASCADE_DEPTH, ErrorHandler, EventCoordinator, Saga};
pub use error::{CoordinationError, Result, StepError, WorkflowError};
pub use router::EventRouter;
pub use state::WorkflowStatus;
pub use workflow::{
    CompensationStep, INITIAL_DATA_KEY, StepData, WorkflowCoordinator, WorkflowState, WorkflowStep,
};
