//! Blog kernel wiring.
//!
//! [`Blog::build`] assembles, from a [`Config`]:
//! - the event registry, checked for integrity at startup
//! - the lenient or strict dispatcher with logging and activity subscribers
//! - the [`BlogService`] committing through units of work
//! - an [`EventCoordinator`] cascading post archival to comments
//! - an [`EventRouter`] flagging long posts as featured

pub mod config;
pub mod demo;
pub mod error;
pub mod sagas;
pub mod telemetry;

pub use config::{Config, LogFormat};
pub use demo::{DemoReport, run_demo};
pub use error::AppError;
pub use sagas::ArchiveCommentsWithPost;

use std::sync::Arc;

use common::AggregateId;
use domain::{BlogService, PostEvent, blog_event_types, register_blog_events};
use event_bus::{
    EventDispatcher, EventDispatcherExt, EventRecorder, EventRegistry, HandlerError,
    InMemoryEventDispatcher, SharedEvent, ValidatingEventDispatcher,
};
use handlers::{ActivityView, subscribe, subscribe_loggers};
use saga::{
    CompensationStep, EventCoordinator, EventRouter, INITIAL_DATA_KEY, StepData, StepError,
    WorkflowCoordinator, WorkflowStep,
};
use serde_json::{Value, json};

/// Posts with at least this many characters of content are routed as featured.
pub const FEATURED_MIN_CONTENT_LEN: usize = 280;

/// Builds the event registry with every blog event and checks it is complete.
pub fn init_registry() -> Result<EventRegistry, AppError> {
    let registry = EventRegistry::new();
    register_blog_events(&registry)?;
    registry.check_integrity(blog_event_types())?;
    tracing::info!(event_types = registry.len(), "Event registry initialised");
    Ok(registry)
}

/// Builds the dispatcher selected by `strict`.
///
/// The strict dispatcher panics on unregistered events; the lenient one
/// warns and delivers them anyway.
pub fn build_dispatcher(registry: &Arc<EventRegistry>, strict: bool) -> Arc<dyn EventDispatcher> {
    let dispatcher = InMemoryEventDispatcher::new(registry.clone());
    if strict {
        Arc::new(ValidatingEventDispatcher::new(dispatcher, registry.clone()))
    } else {
        Arc::new(dispatcher)
    }
}

/// The assembled blog kernel.
pub struct Blog {
    registry: Arc<EventRegistry>,
    dispatcher: Arc<dyn EventDispatcher>,
    service: Arc<BlogService>,
    activity: Arc<ActivityView>,
    coordinator: Arc<EventCoordinator>,
    router: Arc<EventRouter>,
    featured: Arc<EventRecorder>,
}

impl Blog {
    pub fn build(config: &Config) -> Result<Self, AppError> {
        let registry = Arc::new(init_registry()?);
        let dispatcher = build_dispatcher(&registry, config.strict_events);

        subscribe_loggers(&*dispatcher);
        let activity = Arc::new(ActivityView::new());
        subscribe(activity.clone(), &*dispatcher);

        let service = Arc::new(BlogService::new(dispatcher.clone()));
        let coordinator = Arc::new(Self::build_coordinator(config, &dispatcher, &service));
        coordinator.attach(&*dispatcher, ["PostArchived"]);

        let featured = Arc::new(EventRecorder::new());
        let router = Arc::new(featured_router(&featured));
        let routes = router.clone();
        dispatcher.on("PostCreated", move |event| {
            routes
                .route(event)
                .map(|_| ())
                .map_err(|e| HandlerError::failed(e.to_string()))
        });

        tracing::info!(
            strict_events = config.strict_events,
            max_cascade_depth = config.max_cascade_depth,
            "Blog kernel ready"
        );

        Ok(Self {
            registry,
            dispatcher,
            service,
            activity,
            coordinator,
            router,
            featured,
        })
    }

    fn build_coordinator(
        config: &Config,
        dispatcher: &Arc<dyn EventDispatcher>,
        service: &BlogService,
    ) -> EventCoordinator {
        let coordinator = EventCoordinator::new().with_max_depth(config.max_cascade_depth);
        coordinator.register_saga(Arc::new(ArchiveCommentsWithPost::new(
            service.comments().clone(),
        )));

        // Saga-produced comment events reach subscribers through the dispatcher.
        for event_type in domain::comment::EVENT_TYPES.iter().copied() {
            let dispatcher = dispatcher.clone();
            coordinator.on(event_type, move |event| dispatcher.dispatch(event));
            coordinator.register_error_handler(event_type, |event, error| {
                tracing::warn!(
                    event_type = event.event_type(),
                    error = %error,
                    "Subscriber failed on cascaded event"
                );
                Ok(())
            });
        }
        coordinator
    }

    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<dyn EventDispatcher> {
        &self.dispatcher
    }

    pub fn service(&self) -> &BlogService {
        &self.service
    }

    pub fn activity(&self) -> &ActivityView {
        &self.activity
    }

    pub fn coordinator(&self) -> &Arc<EventCoordinator> {
        &self.coordinator
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    /// Ids of posts routed as featured, in creation order.
    pub fn featured_posts(&self) -> Vec<AggregateId> {
        self.featured
            .events()
            .iter()
            .filter_map(|event| event.downcast_ref::<PostEvent>())
            .map(|event| event.post_id().clone())
            .collect()
    }

    /// Publishes a post and its author's welcome comment as one workflow.
    ///
    /// If the comment cannot be added the post is archived again, so no
    /// post is left published without its welcome comment.
    #[tracing::instrument(skip(self, content, welcome))]
    pub fn publish_with_welcome(
        &self,
        author_id: &AggregateId,
        title: &str,
        content: &str,
        welcome: &str,
    ) -> Result<AggregateId, AppError> {
        let mut workflow = WorkflowCoordinator::new(
            vec![self.create_post_step(), self.welcome_comment_step()],
            vec![self.archive_post_compensation()],
        );

        workflow.execute(json!({
            "author_id": author_id.as_str(),
            "title": title,
            "content": content,
            "welcome": welcome,
        }))?;

        let post_id = workflow
            .state()
            .data
            .get("create_post")
            .and_then(|created| field(created, "post_id").ok())
            .unwrap_or_default();
        Ok(AggregateId::new(post_id))
    }

    fn create_post_step(&self) -> WorkflowStep {
        let service = self.service.clone();
        WorkflowStep::new("create_post", move |data| {
            let author_id = AggregateId::new(input(data, "author_id")?);
            let post = service
                .create_post(&author_id, input(data, "title")?, input(data, "content")?)
                .map_err(|e| StepError::new(e.to_string()))?;
            Ok(json!({ "post_id": post.id().as_str() }))
        })
    }

    fn welcome_comment_step(&self) -> WorkflowStep {
        let service = self.service.clone();
        WorkflowStep::new("welcome_comment", move |data| {
            let created = data
                .get("create_post")
                .ok_or_else(|| StepError::new("post was not created"))?;
            let post_id = AggregateId::new(field(created, "post_id")?);
            let author_id = AggregateId::new(input(data, "author_id")?);
            let comment = service
                .add_comment(&post_id, &author_id, input(data, "welcome")?)
                .map_err(|e| StepError::new(e.to_string()))?;
            Ok(json!({ "comment_id": comment.id().as_str() }))
        })
        .with_validation(|result| field(result, "comment_id").map(drop))
    }

    fn archive_post_compensation(&self) -> CompensationStep {
        let service = self.service.clone();
        CompensationStep::new("create_post", move |result| {
            let post_id = AggregateId::new(field(result, "post_id")?);
            service
                .archive_post(&post_id)
                .map(drop)
                .map_err(|e| StepError::new(e.to_string()))
        })
    }
}

impl std::fmt::Debug for Blog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blog")
            .field("event_types", &self.registry.len())
            .field("coordinator", &self.coordinator)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

/// Builds the router sending long posts to `featured`.
fn featured_router(featured: &EventRecorder) -> EventRouter {
    let router = EventRouter::new();
    let record = featured.handler();
    router.add_route(
        "PostCreated",
        |event| {
            matches!(
                event.downcast_ref::<PostEvent>(),
                Some(PostEvent::PostCreated(data)) if data.content.chars().count() >= FEATURED_MIN_CONTENT_LEN
            )
        },
        move |event: &SharedEvent| {
            tracing::info!(post_id = %event_post_id(event), "Featured post");
            metrics::counter!("featured_posts_total").increment(1);
            record(event)
        },
    );
    router
}

fn event_post_id(event: &SharedEvent) -> String {
    event
        .downcast_ref::<PostEvent>()
        .map(|event| event.post_id().to_string())
        .unwrap_or_default()
}

fn input<'a>(data: &'a StepData, key: &str) -> Result<&'a str, StepError> {
    let initial = data
        .get(INITIAL_DATA_KEY)
        .ok_or_else(|| StepError::new("workflow input missing"))?;
    field(initial, key)
}

fn field<'a>(value: &'a Value, key: &str) -> Result<&'a str, StepError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| StepError::new(format!("missing field '{key}'")))
}

/// Builds the kernel from `config` and runs the demo flow against it.
pub fn run(config: &Config) -> Result<DemoReport, AppError> {
    let blog = Blog::build(config)?;
    run_demo(&blog)
}
