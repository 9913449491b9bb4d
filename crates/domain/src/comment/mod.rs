//! Comment aggregate and related types.

mod aggregate;
mod events;

pub use aggregate::Comment;
pub use events::{CommentArchivedData, CommentCreatedData, CommentEditedData, CommentEvent};

use common::AggregateId;
use event_bus::{DomainEvent, EventRegistrar, EventRegistry};
use thiserror::Error;

/// Event types emitted by comments.
pub const EVENT_TYPES: &[&str] = &["CommentCreated", "CommentEdited", "CommentArchived"];

/// Errors that can occur during comment operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommentError {
    #[error("Comment cannot be empty")]
    CommentCannotBeEmpty,

    #[error("Comment is already archived")]
    AlreadyArchived,
}

/// Registers the comment event types.
pub struct CommentEvents;

impl EventRegistrar for CommentEvents {
    fn register_events(&self, registry: &EventRegistry) -> event_bus::Result<()> {
        let id = AggregateId::default();
        registry.register(
            CommentEvent::comment_created(id.clone(), id.clone(), id.clone(), "").shared(),
            "Raised when a new comment is created",
        )?;
        registry.register(
            CommentEvent::comment_edited(id.clone(), "").shared(),
            "Raised when a comment is edited",
        )?;
        registry.register(
            CommentEvent::comment_archived(id).shared(),
            "Raised when a comment is archived",
        )
    }
}
