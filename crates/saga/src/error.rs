//! Coordination error types.

use event_bus::HandlerError;
use thiserror::Error;

use crate::state::WorkflowStatus;

/// Errors raised while coordinating events through handlers, sagas and routes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinationError {
    /// A plain handler failed and no error handler was registered for the type.
    #[error("Handler failed for event {event_type}: {source}")]
    HandlerFailed {
        event_type: &'static str,
        #[source]
        source: HandlerError,
    },

    /// The error handler for the event type rejected the failure.
    #[error("Error handler failed for event {event_type}: {source}")]
    ErrorHandlerFailed {
        event_type: &'static str,
        #[source]
        source: HandlerError,
    },

    /// A saga failed while reacting to an event.
    #[error("Saga {saga} failed for event {event_type}: {source}")]
    SagaFailed {
        saga: String,
        event_type: &'static str,
        #[source]
        source: HandlerError,
    },

    /// Sagas kept producing events past the configured bound.
    #[error("Saga cascade exceeded {max_depth} rounds with {pending} events still pending")]
    CascadeDepthExceeded { max_depth: usize, pending: usize },

    /// A matching route's handler failed.
    #[error("Route handler failed for event {event_type}: {source}")]
    RouteHandlerFailed {
        event_type: &'static str,
        #[source]
        source: HandlerError,
    },
}

/// Failure reported by a workflow step, validation or compensation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StepError(String);

impl StepError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur while executing a workflow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// A step failed; completed steps were compensated.
    #[error("Step {step} failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: StepError,
    },

    /// A step's result was rejected; completed steps were compensated.
    #[error("Validation failed for step {step}: {source}")]
    ValidationFailed {
        step: String,
        #[source]
        source: StepError,
    },

    /// Compensation itself failed after `failed_step` failed with `cause`.
    #[error(
        "Compensation for step {compensation_step} failed after step {failed_step} failed ({cause}): {source}"
    )]
    CompensationFailed {
        failed_step: String,
        compensation_step: String,
        cause: StepError,
        #[source]
        source: StepError,
    },

    /// The workflow has already run.
    #[error("Workflow already executed (status {status})")]
    AlreadyExecuted { status: WorkflowStatus },
}

/// Convenience type alias for coordination results.
pub type Result<T> = std::result::Result<T, CoordinationError>;
