//! Infrastructure event subscribers.
//!
//! This crate provides:
//! - [`Subscriber`] trait and [`subscribe`] to wire subscribers to a dispatcher
//! - Logging subscribers for each blog aggregate family
//! - [`ActivityView`], an in-memory read model of blog activity

pub mod activity;
pub mod logging;
pub mod subscriber;

pub use activity::{ActivitySnapshot, ActivityView, PostScore};
pub use logging::{
    AggregateEventFamily, CommentLogSubscriber, LoggingSubscriber, PostLogSubscriber,
    RatingLogSubscriber, UserLogSubscriber, comment_logger, post_logger, rating_logger,
    user_logger,
};
pub use subscriber::{Subscriber, subscribe};

use std::sync::Arc;

use event_bus::EventDispatcher;

/// Subscribes the four logging subscribers to `dispatcher`.
pub fn subscribe_loggers<D: EventDispatcher + ?Sized>(dispatcher: &D) {
    subscribe(Arc::new(post_logger()), dispatcher);
    subscribe(Arc::new(comment_logger()), dispatcher);
    subscribe(Arc::new(rating_logger()), dispatcher);
    subscribe(Arc::new(user_logger()), dispatcher);
}
