use chrono::{DateTime, Utc};
use common::AggregateId;
use event_bus::DomainEvent;

use crate::aggregate::{EventAccumulator, EventAggregate};

use super::{CommentError, CommentEvent};

/// A comment left by a user on a post.
#[derive(Debug, Clone)]
pub struct Comment {
    events: EventAccumulator,
    post_id: AggregateId,
    commenter_id: AggregateId,
    content: String,
    created_at: DateTime<Utc>,
    last_updated_at: Option<DateTime<Utc>>,
    archived_at: Option<DateTime<Utc>>,
}

impl Comment {
    /// Creates a comment and records `CommentCreated`.
    pub fn new(
        post_id: AggregateId,
        commenter_id: AggregateId,
        content: impl Into<String>,
    ) -> Result<Self, CommentError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(CommentError::CommentCannotBeEmpty);
        }

        let mut comment = Comment {
            events: EventAccumulator::new(),
            post_id: AggregateId::default(),
            commenter_id: AggregateId::default(),
            content: String::new(),
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        };
        comment.raise(CommentEvent::comment_created(
            AggregateId::generate(),
            post_id,
            commenter_id,
            content,
        ));
        Ok(comment)
    }

    /// Replaces the comment text.
    pub fn edit(&mut self, content: impl Into<String>) -> Result<(), CommentError> {
        let content = content.into();
        if self.is_archived() {
            return Err(CommentError::AlreadyArchived);
        }
        if content.trim().is_empty() {
            return Err(CommentError::CommentCannotBeEmpty);
        }

        self.raise(CommentEvent::comment_edited(self.id(), content));
        Ok(())
    }

    pub fn archive(&mut self) -> Result<(), CommentError> {
        if self.is_archived() {
            return Err(CommentError::AlreadyArchived);
        }

        self.raise(CommentEvent::comment_archived(self.id()));
        Ok(())
    }

    fn raise(&mut self, event: CommentEvent) {
        match &event {
            CommentEvent::CommentCreated(data) => {
                self.events.set_id(data.comment_id.clone());
                self.post_id = data.post_id.clone();
                self.commenter_id = data.commenter_id.clone();
                self.content = data.content.clone();
                self.created_at = data.created_at;
            }
            CommentEvent::CommentEdited(data) => {
                self.content = data.content.clone();
                self.last_updated_at = Some(data.last_updated_at);
            }
            CommentEvent::CommentArchived(data) => {
                self.archived_at = Some(data.archived_at);
            }
        }
        self.events.record_event(event.shared());
    }

    pub fn id(&self) -> AggregateId {
        self.events.id()
    }

    pub fn set_id(&self, id: AggregateId) {
        self.events.set_id(id);
    }

    pub fn post_id(&self) -> &AggregateId {
        &self.post_id
    }

    pub fn commenter_id(&self) -> &AggregateId {
        &self.commenter_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_updated_at
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

impl EventAggregate for Comment {
    fn aggregate_type(&self) -> &'static str {
        "Comment"
    }

    fn accumulator(&self) -> &EventAccumulator {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment() -> Comment {
        Comment::new(AggregateId::new("p-1"), AggregateId::new("u-1"), "Nice post").unwrap()
    }

    #[test]
    fn test_new_comment() {
        let comment = comment();

        assert!(!comment.id().is_empty());
        assert_eq!(comment.post_id(), &AggregateId::new("p-1"));
        assert_eq!(comment.commenter_id(), &AggregateId::new("u-1"));

        let events = comment.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].downcast_ref::<CommentEvent>(),
            Some(CommentEvent::CommentCreated(data)) if data.content == "Nice post"
        ));
    }

    #[test]
    fn test_empty_comment_is_rejected() {
        let result = Comment::new(AggregateId::new("p-1"), AggregateId::new("u-1"), "");
        assert_eq!(result.unwrap_err(), CommentError::CommentCannotBeEmpty);
    }

    #[test]
    fn test_edit_records_new_content() {
        let mut comment = comment();
        comment.edit("Edited").unwrap();

        assert_eq!(comment.content(), "Edited");
        assert!(comment.last_updated_at().is_some());
        let events = comment.uncommitted_events();
        assert_eq!(events[1].event_type(), "CommentEdited");
    }

    #[test]
    fn test_edit_rejects_empty_content() {
        let mut comment = comment();
        assert_eq!(comment.edit(" "), Err(CommentError::CommentCannotBeEmpty));
        assert_eq!(comment.content(), "Nice post");
        assert_eq!(comment.uncommitted_events().len(), 1);
    }

    #[test]
    fn test_archived_comment_is_frozen() {
        let mut comment = comment();
        comment.archive().unwrap();

        assert!(comment.is_archived());
        assert_eq!(comment.archive(), Err(CommentError::AlreadyArchived));
        assert_eq!(comment.edit("Late"), Err(CommentError::AlreadyArchived));
        assert_eq!(comment.uncommitted_events().len(), 2);
    }
}
