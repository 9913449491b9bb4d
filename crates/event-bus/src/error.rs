use thiserror::Error;

/// Errors raised by the event registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The event type was registered twice.
    ///
    /// Registration happens once at startup, so this is a programming error.
    #[error("event type {0} already registered")]
    DuplicateEventType(String),

    /// An emitted event has a type the registry does not know.
    #[error("unregistered event type: {0}")]
    UnregisteredEventType(String),

    /// An integrity check found event types that were never registered.
    #[error("found unregistered events: {0:?}")]
    Unregistered(Vec<String>),
}

/// Error returned by an event handler.
///
/// A dispatcher stops at the first handler that returns one of these and
/// hands it back to the caller unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler was invoked with an event of a type it cannot handle.
    #[error("invalid event type: expected {expected}, got {actual}")]
    UnexpectedEvent {
        expected: &'static str,
        actual: &'static str,
    },

    /// The handler failed while reacting to the event.
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    /// Creates a generic handler failure.
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
