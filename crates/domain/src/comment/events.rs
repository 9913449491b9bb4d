//! Comment domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_bus::DomainEvent;
use serde::{Deserialize, Serialize};

/// Events that can occur on a comment aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CommentEvent {
    /// Comment was written on a post.
    CommentCreated(CommentCreatedData),

    /// Comment text was changed.
    CommentEdited(CommentEditedData),

    /// Comment was archived.
    CommentArchived(CommentArchivedData),
}

impl DomainEvent for CommentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CommentEvent::CommentCreated(_) => "CommentCreated",
            CommentEvent::CommentEdited(_) => "CommentEdited",
            CommentEvent::CommentArchived(_) => "CommentArchived",
        }
    }

    fn occurred_on(&self) -> DateTime<Utc> {
        match self {
            CommentEvent::CommentCreated(data) => data.occurred_on,
            CommentEvent::CommentEdited(data) => data.occurred_on,
            CommentEvent::CommentArchived(data) => data.occurred_on,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentCreatedData {
    pub comment_id: AggregateId,
    pub post_id: AggregateId,
    pub commenter_id: AggregateId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub occurred_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentEditedData {
    pub comment_id: AggregateId,
    pub content: String,
    pub last_updated_at: DateTime<Utc>,
    pub occurred_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentArchivedData {
    pub comment_id: AggregateId,
    pub archived_at: DateTime<Utc>,
    pub occurred_on: DateTime<Utc>,
}

impl CommentEvent {
    pub fn comment_created(
        comment_id: AggregateId,
        post_id: AggregateId,
        commenter_id: AggregateId,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        CommentEvent::CommentCreated(CommentCreatedData {
            comment_id,
            post_id,
            commenter_id,
            content: content.into(),
            created_at: now,
            occurred_on: now,
        })
    }

    pub fn comment_edited(comment_id: AggregateId, content: impl Into<String>) -> Self {
        let now = Utc::now();
        CommentEvent::CommentEdited(CommentEditedData {
            comment_id,
            content: content.into(),
            last_updated_at: now,
            occurred_on: now,
        })
    }

    pub fn comment_archived(comment_id: AggregateId) -> Self {
        let now = Utc::now();
        CommentEvent::CommentArchived(CommentArchivedData {
            comment_id,
            archived_at: now,
            occurred_on: now,
        })
    }

    /// Returns the id of the comment this event belongs to.
    pub fn comment_id(&self) -> &AggregateId {
        match self {
            CommentEvent::CommentCreated(data) => &data.comment_id,
            CommentEvent::CommentEdited(data) => &data.comment_id,
            CommentEvent::CommentArchived(data) => &data.comment_id,
        }
    }
}
