//! Post domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_bus::DomainEvent;
use serde::{Deserialize, Serialize};

/// Events that can occur on a post aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PostEvent {
    /// Post was created.
    PostCreated(PostCreatedData),

    /// Post title was changed.
    PostTitleEdited(PostTitleEditedData),

    /// Post content was changed.
    PostContentEdited(PostContentEditedData),

    /// Post was archived.
    PostArchived(PostArchivedData),
}

impl DomainEvent for PostEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PostEvent::PostCreated(_) => "PostCreated",
            PostEvent::PostTitleEdited(_) => "PostTitleEdited",
            PostEvent::PostContentEdited(_) => "PostContentEdited",
            PostEvent::PostArchived(_) => "PostArchived",
        }
    }

    fn occurred_on(&self) -> DateTime<Utc> {
        match self {
            PostEvent::PostCreated(data) => data.occurred_on,
            PostEvent::PostTitleEdited(data) => data.occurred_on,
            PostEvent::PostContentEdited(data) => data.occurred_on,
            PostEvent::PostArchived(data) => data.occurred_on,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Data for PostCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCreatedData {
    pub post_id: AggregateId,

    /// The user who wrote the post.
    pub author_id: AggregateId,

    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub occurred_on: DateTime<Utc>,
}

/// Data for PostTitleEdited event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostTitleEditedData {
    pub post_id: AggregateId,
    pub new_title: String,
    pub edited_at: DateTime<Utc>,
    pub occurred_on: DateTime<Utc>,
}

/// Data for PostContentEdited event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostContentEditedData {
    pub post_id: AggregateId,
    pub new_content: String,
    pub edited_at: DateTime<Utc>,
    pub occurred_on: DateTime<Utc>,
}

/// Data for PostArchived event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostArchivedData {
    pub post_id: AggregateId,
    pub archived_at: DateTime<Utc>,
    pub occurred_on: DateTime<Utc>,
}

// Convenience constructors for events
impl PostEvent {
    pub fn post_created(
        post_id: AggregateId,
        author_id: AggregateId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        PostEvent::PostCreated(PostCreatedData {
            post_id,
            author_id,
            title: title.into(),
            content: content.into(),
            created_at: now,
            occurred_on: now,
        })
    }

    pub fn post_title_edited(post_id: AggregateId, new_title: impl Into<String>) -> Self {
        let now = Utc::now();
        PostEvent::PostTitleEdited(PostTitleEditedData {
            post_id,
            new_title: new_title.into(),
            edited_at: now,
            occurred_on: now,
        })
    }

    pub fn post_content_edited(post_id: AggregateId, new_content: impl Into<String>) -> Self {
        let now = Utc::now();
        PostEvent::PostContentEdited(PostContentEditedData {
            post_id,
            new_content: new_content.into(),
            edited_at: now,
            occurred_on: now,
        })
    }

    pub fn post_archived(post_id: AggregateId) -> Self {
        let now = Utc::now();
        PostEvent::PostArchived(PostArchivedData {
            post_id,
            archived_at: now,
            occurred_on: now,
        })
    }

    /// Returns the id of the post this event belongs to.
    pub fn post_id(&self) -> &AggregateId {
        match self {
            PostEvent::PostCreated(data) => &data.post_id,
            PostEvent::PostTitleEdited(data) => &data.post_id,
            PostEvent::PostContentEdited(data) => &data.post_id,
            PostEvent::PostArchived(data) => &data.post_id,
        }
    }
}
