//! Logging subscribers, one per aggregate family.

use std::marker::PhantomData;

use common::AggregateId;
use domain::{CommentEvent, PostEvent, RatingEvent, UserEvent};
use event_bus::{DomainEvent, HandlerError, SharedEvent};

use crate::subscriber::Subscriber;

/// An event family emitted by one aggregate type.
pub trait AggregateEventFamily: DomainEvent + 'static {
    /// Name of the event enum, reported when an event of another family arrives.
    const FAMILY: &'static str;

    /// Event types belonging to the family.
    const EVENT_TYPES: &'static [&'static str];

    /// The aggregate the event belongs to.
    fn aggregate_id(&self) -> &AggregateId;
}

impl AggregateEventFamily for PostEvent {
    const FAMILY: &'static str = "PostEvent";
    const EVENT_TYPES: &'static [&'static str] = domain::post::EVENT_TYPES;

    fn aggregate_id(&self) -> &AggregateId {
        self.post_id()
    }
}

impl AggregateEventFamily for CommentEvent {
    const FAMILY: &'static str = "CommentEvent";
    const EVENT_TYPES: &'static [&'static str] = domain::comment::EVENT_TYPES;

    fn aggregate_id(&self) -> &AggregateId {
        self.comment_id()
    }
}

impl AggregateEventFamily for RatingEvent {
    const FAMILY: &'static str = "RatingEvent";
    const EVENT_TYPES: &'static [&'static str] = domain::rating::EVENT_TYPES;

    fn aggregate_id(&self) -> &AggregateId {
        self.rating_id()
    }
}

impl AggregateEventFamily for UserEvent {
    const FAMILY: &'static str = "UserEvent";
    const EVENT_TYPES: &'static [&'static str] = domain::user::EVENT_TYPES;

    fn aggregate_id(&self) -> &AggregateId {
        self.user_id()
    }
}

/// Logs every event of one family.
///
/// Fails with [`HandlerError::UnexpectedEvent`] when handed an event from
/// another family, which means it was subscribed to the wrong type.
pub struct LoggingSubscriber<E> {
    name: &'static str,
    _family: PhantomData<fn() -> E>,
}

impl<E: AggregateEventFamily> LoggingSubscriber<E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            _family: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for LoggingSubscriber<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingSubscriber")
            .field("name", &self.name)
            .finish()
    }
}

impl<E: AggregateEventFamily> Subscriber for LoggingSubscriber<E> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn event_types(&self) -> Vec<&'static str> {
        E::EVENT_TYPES.to_vec()
    }

    fn handle(&self, event: &SharedEvent) -> Result<(), HandlerError> {
        let typed = event
            .downcast_ref::<E>()
            .ok_or(HandlerError::UnexpectedEvent {
                expected: E::FAMILY,
                actual: event.event_type(),
            })?;

        tracing::info!(
            subscriber = self.name,
            event_type = typed.event_type(),
            aggregate_id = %typed.aggregate_id(),
            occurred_on = %typed.occurred_on(),
            "Event handled"
        );
        Ok(())
    }
}

pub type PostLogSubscriber = LoggingSubscriber<PostEvent>;
pub type CommentLogSubscriber = LoggingSubscriber<CommentEvent>;
pub type RatingLogSubscriber = LoggingSubscriber<RatingEvent>;
pub type UserLogSubscriber = LoggingSubscriber<UserEvent>;

pub fn post_logger() -> PostLogSubscriber {
    LoggingSubscriber::new("post-log")
}

pub fn comment_logger() -> CommentLogSubscriber {
    LoggingSubscriber::new("comment-log")
}

pub fn rating_logger() -> RatingLogSubscriber {
    LoggingSubscriber::new("rating-log")
}

pub fn user_logger() -> UserLogSubscriber {
    LoggingSubscriber::new("user-log")
}
