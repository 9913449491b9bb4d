//! Integration tests wiring the coordinator to the blog domain.

use std::sync::Arc;

use common::AggregateId;
use domain::{
    Comment, EventAggregate, InMemoryRepository, Post, PostEvent, Repository, RepositoryRegistry,
    UnitOfWorkFactory, blog_event_types, register_blog_events,
};
use event_bus::{EventRecorder, EventRegistry, HandlerError, InMemoryEventDispatcher, SharedEvent};
use saga::{
    CompensationStep, CoordinationError, EventCoordinator, EventRouter, Saga, StepError,
    WorkflowCoordinator, WorkflowError, WorkflowStatus, WorkflowStep,
};
use serde_json::json;

/// Archives every open comment on a post once the post is archived.
struct ArchiveCommentsWithPost {
    comments: Arc<InMemoryRepository<Comment>>,
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
        Ok(produced)
    }
}

struct Blog {
    comments: Arc<InMemoryRepository<Comment>>,
    coordinator: EventCoordinator,
    recorder: EventRecorder,
}

impl Blog {
    fn new() -> Self {
        let comments = Arc::new(InMemoryRepository::new());
        let coordinator = EventCoordinator::new();
        let recorder = EventRecorder::new();
        for event_type in blog_event_types() {
            coordinator.register_handler(event_type, recorder.handler());
        }
        coordinator.register_saga(Arc::new(ArchiveCommentsWithPost {
            comments: comments.clone(),
        }));
        Self {
            comments,
            coordinator,
            recorder,
        }
    }

    fn comment_on(&self, post: &Post, content: &str) -> Comment {
        let comment = Comment::new(post.id(), AggregateId::generate(), content).unwrap();
        self.comments.save(&comment).unwrap();
        comment.mark_events_as_committed();
        comment
    }
}

mod sagas {
    use super::*;

    #[test]
    fn archiving_a_post_cascades_to_its_comments() {
        let blog = Blog::new();
        let mut post = Post::new(AggregateId::generate(), "T", "C").unwrap();
        let first = blog.comment_on(&post, "first");
        let second = blog.comment_on(&post, "second");
        let other_post = Post::new(AggregateId::generate(), "Other", "Post").unwrap();
        let unrelated = blog.comment_on(&other_post, "elsewhere");

        post.archive().unwrap();
        blog.coordinator
            .coordinate(&post.uncommitted_events())
            .unwrap();

        assert_eq!(blog.recorder.events_of_type("PostArchived").len(), 1);
        assert_eq!(blog.recorder.events_of_type("CommentArchived").len(), 2);
        for id in [first.id(), second.id()] {
            assert!(blog.comments.find_by_id(&id).unwrap().is_archived());
        }
        assert!(!blog.comments.find_by_id(&unrelated.id()).unwrap().is_archived());
    }

    #[test]
    fn cascade_runs_once_per_archive() {
        let blog = Blog::new();
        let mut post = Post::new(AggregateId::generate(), "T", "C").unwrap();
        blog.comment_on(&post, "only");

        post.archive().unwrap();
        let events = post.uncommitted_events();
        blog.coordinator.coordinate(&events).unwrap();
        blog.coordinator.coordinate(&events).unwrap();

        // Already-archived comments are skipped on the second pass.
        assert_eq!(blog.recorder.events_of_type("CommentArchived").len(), 1);
    }

    #[test]
    fn coordinator_attached_to_dispatcher_runs_after_commit() {
        let registry = EventRegistry::new();
        register_blog_events(&registry).unwrap();
        let dispatcher = Arc::new(InMemoryEventDispatcher::new(Arc::new(registry)));

        let blog = Blog::new();
        let coordinator = Arc::new(blog.coordinator);
        coordinator.attach(&*dispatcher, ["PostArchived"]);

        let posts = Arc::new(InMemoryRepository::<Post>::new());
        let factory = UnitOfWorkFactory::new(
            dispatcher,
            Arc::new(RepositoryRegistry::new().with(posts)),
        );

        let mut post = Post::new(AggregateId::generate(), "T", "C").unwrap();
        let comments = blog.comments.clone();
        let comment = Comment::new(post.id(), AggregateId::generate(), "hi").unwrap();
        comments.save(&comment).unwrap();
        post.archive().unwrap();

        let mut uow = factory.create();
        uow.register(&post).unwrap();
        let summary = uow.commit().unwrap();

        assert!(summary.all_delivered());
        assert!(comments.find_by_id(&comment.id()).unwrap().is_archived());
        assert_eq!(blog.recorder.events_of_type("CommentArchived").len(), 1);
    }

    #[test]
    fn saga_rejects_foreign_events() {
        let blog = Blog::new();
        let saga = ArchiveCommentsWithPost {
            comments: blog.comments.clone(),
        };
        let post = Post::new(AggregateId::generate(), "T", "C").unwrap();

        let result = saga.handle(&post.uncommitted_events()[0]);

        assert_eq!(
            result.unwrap_err(),
            HandlerError::UnexpectedEvent {
                expected: "PostArchived",
                actual: "PostCreated"
            }
        );
    }

    #[test]
    fn failing_handler_surfaces_through_coordination() {
        let blog = Blog::new();
        blog.coordinator
            .on("PostCreated", |_| Err(HandlerError::failed("search index down")));
        let post = Post::new(AggregateId::generate(), "T", "C").unwrap();

        let err = blog
            .coordinator
            .coordinate(&post.uncommitted_events())
            .unwrap_err();

        assert!(matches!(
            err,
            CoordinationError::HandlerFailed {
                event_type: "PostCreated",
                ..
            }
        ));
    }
}

mod routing {
    use super::*;

    #[test]
    fn long_posts_route_to_review() {
        let router = EventRouter::new();
        let reviewed = EventRecorder::new();
        let handler = reviewed.handler();
        router.add_route(
            "PostCreated",
            |event| {
                matches!(
                    event.downcast_ref::<PostEvent>(),
                    Some(PostEvent::PostCreated(data)) if data.content.len() > 20
                )
            },
            move |event| handler(event),
        );

        let short = Post::new(AggregateId::generate(), "T", "short").unwrap();
        let long = Post::new(AggregateId::generate(), "T", "a".repeat(50)).unwrap();

        assert_eq!(router.route(&short.uncommitted_events()[0]).unwrap(), 0);
        assert_eq!(router.route(&long.uncommitted_events()[0]).unwrap(), 1);
        assert_eq!(reviewed.count(), 1);
    }
}

mod workflows {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn publishing_workflow_rolls_back_created_post() {
        let posts = Arc::new(InMemoryRepository::<Post>::new());
        let archived = Arc::new(Mutex::new(Vec::new()));

        let store = posts.clone();
        let create = WorkflowStep::new("create_post", move |data| {
            let title = data["initial"]["title"].as_str().unwrap_or_default();
            let post = Post::new(AggregateId::generate(), title, "body")
                .map_err(|e| StepError::new(e.to_string()))?;
            store
                .save(&post)
                .map_err(|e| StepError::new(e.to_string()))?;
            Ok(json!({ "post_id": post.id().as_str() }))
        });

        let notify = WorkflowStep::new("notify_followers", |_| {
            Err(StepError::new("mailer unavailable"))
        });

        let store = posts.clone();
        let log = archived.clone();
        let undo_create = CompensationStep::new("create_post", move |result| {
            let id = AggregateId::new(result["post_id"].as_str().unwrap_or_default());
            let mut post = store
                .find_by_id(&id)
                .ok_or_else(|| StepError::new("post vanished"))?;
            post.archive().map_err(|e| StepError::new(e.to_string()))?;
            store.save(&post).map_err(|e| StepError::new(e.to_string()))?;
            log.lock().unwrap().push(id);
            Ok(())
        });

        let mut workflow = WorkflowCoordinator::new(vec![create, notify], vec![undo_create]);
        let err = workflow.execute(json!({ "title": "Launch" })).unwrap_err();

        assert!(matches!(err, WorkflowError::StepFailed { ref step, .. } if step == "notify_followers"));
        assert_eq!(workflow.status(), WorkflowStatus::Failed);

        let archived = archived.lock().unwrap();
        assert_eq!(archived.len(), 1);
        assert!(posts.find_by_id(&archived[0]).unwrap().is_archived());
    }
}
