//! Application error types.

use domain::ServiceError;
use event_bus::RegistryError;
use saga::{CoordinationError, WorkflowError};

/// Errors raised while configuring, wiring or running the kernel.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid configuration {key}={value}: {reason}")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Event registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Coordination error: {0}")]
    Coordination(#[from] CoordinationError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Failed to install metrics recorder: {0}")]
    Metrics(String),
}
