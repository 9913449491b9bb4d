//! Post aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_bus::DomainEvent;

use crate::aggregate::{EventAccumulator, EventAggregate};

use super::{PostError, PostEvent};

/// A blog post.
///
/// Posts are never deleted. Archiving sets a flag and records its own event.
#[derive(Debug, Clone)]
pub struct Post {
    events: EventAccumulator,

    /// The user who wrote the post.
    author_id: AggregateId,

    title: String,
    content: String,
    created_at: DateTime<Utc>,
    last_edited_at: Option<DateTime<Utc>>,
    archived_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Creates a new post and records `PostCreated`.
    pub fn new(
        author_id: AggregateId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, PostError> {
        let title = title.into();
        let content = content.into();

        if title.trim().is_empty() {
            return Err(PostError::TitleCannotBeEmpty);
        }
        if content.trim().is_empty() {
            return Err(PostError::ContentCannotBeEmpty);
        }

        let mut post = Post {
            events: EventAccumulator::new(),
            author_id: AggregateId::default(),
            title: String::new(),
            content: String::new(),
            created_at: Utc::now(),
            last_edited_at: None,
            archived_at: None,
        };
        post.raise(PostEvent::post_created(
            AggregateId::generate(),
            author_id,
            title,
            content,
        ));
        Ok(post)
    }

    /// Replaces the title.
    pub fn edit_title(&mut self, title: impl Into<String>) -> Result<(), PostError> {
        let title = title.into();
        self.ensure_not_archived()?;
        if title.trim().is_empty() {
            return Err(PostError::TitleCannotBeEmpty);
        }

        self.raise(PostEvent::post_title_edited(self.id(), title));
        Ok(())
    }

    /// Replaces the content.
    pub fn edit_content(&mut self, content: impl Into<String>) -> Result<(), PostError> {
        let content = content.into();
        self.ensure_not_archived()?;
        if content.trim().is_empty() {
            return Err(PostError::ContentCannotBeEmpty);
        }

        self.raise(PostEvent::post_content_edited(self.id(), content));
        Ok(())
    }

    /// Archives the post.
    pub fn archive(&mut self) -> Result<(), PostError> {
        self.ensure_not_archived()?;
        self.raise(PostEvent::post_archived(self.id()));
        Ok(())
    }

    fn ensure_not_archived(&self) -> Result<(), PostError> {
        if self.is_archived() {
            return Err(PostError::AlreadyArchived);
        }
        Ok(())
    }

    /// Applies the event to this post and records it.
    fn raise(&mut self, event: PostEvent) {
        self.apply(&event);
        self.events.record_event(event.shared());
    }

    fn apply(&mut self, event: &PostEvent) {
        match event {
            PostEvent::PostCreated(data) => {
                self.events.set_id(data.post_id.clone());
                self.author_id = data.author_id.clone();
                self.title = data.title.clone();
                self.content = data.content.clone();
                self.created_at = data.created_at;
            }
            PostEvent::PostTitleEdited(data) => {
                self.title = data.new_title.clone();
                self.last_edited_at = Some(data.edited_at);
            }
            PostEvent::PostContentEdited(data) => {
                self.content = data.new_content.clone();
                self.last_edited_at = Some(data.edited_at);
            }
            PostEvent::PostArchived(data) => {
                self.archived_at = Some(data.archived_at);
            }
        }
    }
}

// Query methods
impl Post {
    pub fn id(&self) -> AggregateId {
        self.events.id()
    }

    /// Assigns an id to a post. Ignored if `id` is empty or one is already set.
    pub fn set_id(&self, id: AggregateId) {
        self.events.set_id(id);
    }

    pub fn author_id(&self) -> &AggregateId {
        &self.author_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_edited_at(&self) -> Option<DateTime<Utc>> {
        self.last_edited_at
    }

    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

impl EventAggregate for Post {
    fn aggregate_type(&self) -> &'static str {
        "Post"
    }

    fn accumulator(&self) -> &EventAccumulator {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post::new(AggregateId::new("u-1"), "Title", "Content").unwrap()
    }

    fn event_types(post: &Post) -> Vec<&'static str> {
        post.uncommitted_events()
            .iter()
            .map(|e| e.event_type())
            .collect()
    }

    #[test]
    fn test_new_post_records_created_event() {
        let post = post();

        assert!(!post.id().is_empty());
        assert_eq!(post.title(), "Title");
        assert_eq!(post.author_id(), &AggregateId::new("u-1"));

        let events = post.uncommitted_events();
        assert_eq!(events.len(), 1);
        match events[0].downcast_ref::<PostEvent>() {
            Some(PostEvent::PostCreated(data)) => {
                assert_eq!(data.post_id, post.id());
                assert_eq!(data.title, "Title");
                assert_eq!(data.content, "Content");
            }
            other => panic!("expected PostCreated, got {other:?}"),
        }
    }

    #[test]
    fn test_new_post_requires_title_and_content() {
        assert_eq!(
            Post::new(AggregateId::new("u-1"), "", "Content").unwrap_err(),
            PostError::TitleCannotBeEmpty
        );
        assert_eq!(
            Post::new(AggregateId::new("u-1"), "Title", "  ").unwrap_err(),
            PostError::ContentCannotBeEmpty
        );
    }

    #[test]
    fn test_edits_record_one_event_each() {
        let mut post = post();
        post.edit_title("New title").unwrap();
        post.edit_content("New content").unwrap();

        assert_eq!(post.title(), "New title");
        assert_eq!(post.content(), "New content");
        assert!(post.last_edited_at().is_some());
        assert_eq!(
            event_types(&post),
            vec!["PostCreated", "PostTitleEdited", "PostContentEdited"]
        );
    }

    #[test]
    fn test_failed_edit_records_nothing() {
        let mut post = post();
        assert_eq!(post.edit_title(""), Err(PostError::TitleCannotBeEmpty));
        assert_eq!(post.title(), "Title");
        assert_eq!(event_types(&post), vec!["PostCreated"]);
    }

    #[test]
    fn test_archive_twice_is_rejected() {
        let mut post = post();
        post.archive().unwrap();
        assert!(post.is_archived());

        assert_eq!(post.archive(), Err(PostError::AlreadyArchived));
        assert_eq!(post.edit_title("Late"), Err(PostError::AlreadyArchived));
        assert_eq!(event_types(&post), vec!["PostCreated", "PostArchived"]);
    }

    #[test]
    fn test_mark_committed_keeps_state() {
        let mut post = post();
        post.edit_title("Kept").unwrap();
        post.mark_events_as_committed();

        assert!(post.uncommitted_events().is_empty());
        assert_eq!(post.title(), "Kept");
    }

    #[test]
    fn test_set_id_ignores_empty_and_reassignment() {
        let post = post();
        let id = post.id();
        post.set_id(AggregateId::default());
        post.set_id(AggregateId::new("other"));
        assert_eq!(post.id(), id);
    }
}
