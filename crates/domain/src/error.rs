//! Unit of work and repository error types.

use thiserror::Error;

/// Errors reported by a repository collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The aggregate could not be stored.
    #[error("Failed to save {aggregate_type} {aggregate_id}: {reason}")]
    SaveFailed {
        aggregate_type: &'static str,
        aggregate_id: String,
        reason: String,
    },

    /// The aggregate handed to a repository was of the wrong concrete type.
    #[error("Repository for {expected} received a different aggregate type")]
    TypeMismatch { expected: &'static str },
}

/// Errors that can occur while running a unit of work.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitOfWorkError {
    /// `commit` was called on a unit that already committed.
    #[error("Unit of work already committed")]
    AlreadyCommitted,

    /// `commit` or `rollback` was called on a unit that was rolled back.
    #[error("Unit of work already rolled back")]
    AlreadyRolledBack,

    /// An aggregate was registered after the unit reached a terminal state.
    #[error("Cannot register aggregates on a completed unit of work")]
    AlreadyCompleted,

    /// No repository is registered for the aggregate's type.
    #[error("No repository registered for aggregate type {aggregate_type}")]
    RepositoryNotFound { aggregate_type: &'static str },

    /// A repository failed to persist an aggregate.
    ///
    /// Aggregates saved earlier in the same commit stay saved.
    #[error("Failed to persist {aggregate_type} {aggregate_id}: {source}")]
    Persistence {
        aggregate_type: &'static str,
        aggregate_id: String,
        #[source]
        source: RepositoryError,
    },
}

/// Result type for unit of work operations.
pub type Result<T> = std::result::Result<T, UnitOfWorkError>;

/// Errors returned by [`BlogService`](crate::service::BlogService) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Post error: {0}")]
    Post(#[from] crate::post::PostError),

    #[error("Comment error: {0}")]
    Comment(#[from] crate::comment::CommentError),

    #[error("Rating error: {0}")]
    Rating(#[from] crate::rating::RatingError),

    #[error("User error: {0}")]
    User(#[from] crate::user::UserError),

    #[error("Unit of work error: {0}")]
    UnitOfWork(#[from] UnitOfWorkError),

    /// Aggregate not found.
    #[error("{aggregate_type} not found: {aggregate_id}")]
    NotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    /// A business rule denied the operation.
    #[error("Not allowed: requires {rule}")]
    NotAllowed { rule: String },
}
