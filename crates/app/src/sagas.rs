//! Sagas reacting to committed blog events.

use std::sync::Arc;

use domain::{Comment, EventAggregate, InMemoryRepository, PostEvent, Repository};
use event_bus::{HandlerError, SharedEvent};
use saga::Saga;

/// Archives every open comment on a post once the post is archived.
///
/// Archived comments are saved straight to the comment repository and their
/// `CommentArchived` events are handed back to the coordinator.
pub struct ArchiveCommentsWithPost {
    comments: Arc<InMemoryRepository<Comment>>,
}

impl ArchiveCommentsWithPost {
    pub fn new(comments: Arc<InMemoryRepository<Comment>>) -> Self {
        Self { comments }
    }
}

impl Saga for ArchiveCommentsWithPost {
    fn name(&self) -> &str {
        "archive-comments-with-post"
    }

    fn handled_event_types(&self) -> &[&'static str] {
        &["PostArchived"]
    }

    fn handle(&self, event: &SharedEvent) -> Result<Vec<SharedEvent>, HandlerError> {
        let Some(PostEvent::PostArchived(data)) = event.downcast_ref::<PostEvent>() else {
            return Err(HandlerError::UnexpectedEvent {
                expected: "PostArchived",
                actual: event.event_type(),
            });
        };

        let mut produced = Vec::new();
        for mut comment in self.comments.find_all() {
            if comment.post_id() != &data.post_id || comment.is_archived() {
                continue;
            }
            comment
                .archive()
                .map_err(|e| HandlerError::failed(e.to_string()))?;
            self.comments
                .save(&comment)
                .map_err(|e| HandlerError::failed(e.to_string()))?;
            produced.extend(comment.uncommitted_events());
        }

        tracing::info!(
            post_id = %data.post_id,
            archived_comments = produced.len(),
            "Archived comments with post"
        );
        Ok(produced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AggregateId;
    use domain::Post;

    fn saved_comment(comments: &InMemoryRepository<Comment>, post: &AggregateId) -> Comment {
        let comment = Comment::new(post.clone(), AggregateId::generate(), "hi").unwrap();
        comments.save(&comment).unwrap();
        comment
    }

    #[test]
    fn archives_only_open_comments_on_the_archived_post() {
        let comments = Arc::new(InMemoryRepository::new());
        let mut post = Post::new(AggregateId::generate(), "T", "C").unwrap();
        let mine = saved_comment(&comments, &post.id());
        let elsewhere = saved_comment(&comments, &AggregateId::generate());
        let saga = ArchiveCommentsWithPost::new(comments.clone());

        post.archive().unwrap();
        let archived = post.uncommitted_events().pop().unwrap();
        let produced = saga.handle(&archived).unwrap();

        assert_eq!(produced.len(), 1);
        assert_eq!(produced[0].event_type(), "CommentArchived");
        assert!(comments.find_by_id(&mine.id()).unwrap().is_archived());
        assert!(!comments.find_by_id(&elsewhere.id()).unwrap().is_archived());

        // A second pass finds nothing left to archive.
        assert!(saga.handle(&archived).unwrap().is_empty());
    }

    #[test]
    fn rejects_other_post_events() {
        let saga = ArchiveCommentsWithPost::new(Arc::new(InMemoryRepository::new()));
        let post = Post::new(AggregateId::generate(), "T", "C").unwrap();

        let err = saga.handle(&post.uncommitted_events()[0]).unwrap_err();

        assert_eq!(
            err,
            HandlerError::UnexpectedEvent {
                expected: "PostArchived",
                actual: "PostCreated"
            }
        );
    }
}
