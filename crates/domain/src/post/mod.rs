//! Post aggregate and related types.

mod aggregate;
mod events;

pub use aggregate::Post;
pub use events::{
    PostArchivedData, PostContentEditedData, PostCreatedData, PostEvent, PostTitleEditedData,
};

use common::AggregateId;
use event_bus::{DomainEvent, EventRegistrar, EventRegistry};
use thiserror::Error;

/// Event types emitted by posts.
pub const EVENT_TYPES: &[&str] = &[
    "PostCreated",
    "PostTitleEdited",
    "PostContentEdited",
    "PostArchived",
];

/// Errors that can occur during post operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PostError {
    #[error("Post title cannot be empty")]
    TitleCannotBeEmpty,

    #[error("Post content cannot be empty")]
    ContentCannotBeEmpty,

    /// The post is archived and can no longer change.
    #[error("Post is already archived")]
    AlreadyArchived,
}

/// Registers the post event types.
pub struct PostEvents;

impl EventRegistrar for PostEvents {
    fn register_events(&self, registry: &EventRegistry) -> event_bus::Result<()> {
        let id = AggregateId::default();
        registry.register(
            PostEvent::post_created(id.clone(), id.clone(), "", "").shared(),
            "Raised when a new post is created",
        )?;
        registry.register(
            PostEvent::post_title_edited(id.clone(), "").shared(),
            "Raised when a post's title is edited",
        )?;
        registry.register(
            PostEvent::post_content_edited(id.clone(), "").shared(),
            "Raised when a post's content is edited",
        )?;
        registry.register(
            PostEvent::post_archived(id).shared(),
            "Raised when a post is archived",
        )
    }
}
