//! Domain layer for the blog.
//!
//! This crate provides:
//! - `EventAccumulator` and the `EventAggregate` trait shared by aggregates
//! - `UnitOfWork` to persist aggregates and dispatch their events
//! - `Specification` combinators and the blog's business rules
//! - Post, Comment, Rating and User aggregates with their events
//! - `BlogService`, the application service driving them

pub mod aggregate;
pub mod comment;
pub mod error;
pub mod post;
pub mod rating;
pub mod repository;
pub mod rules;
pub mod service;
pub mod specification;
pub mod unit_of_work;
pub mod user;

pub use aggregate::{EventAccumulator, EventAggregate};
pub use comment::{Comment, CommentError, CommentEvent, CommentEvents};
pub use error::{RepositoryError, Result, ServiceError, UnitOfWorkError};
pub use post::{Post, PostError, PostEvent, PostEvents};
pub use rating::{Rating, RatingError, RatingEvent, RatingEvents, RatingType};
pub use repository::{FailingRepository, InMemoryRepository, Repository, RepositoryRegistry};
pub use rules::{PostIsArchived, UserCanComment, UserCanCreatePost, UserIsAdmin};
pub use service::BlogService;
pub use specification::{PredicateSpecification, Specification, SpecificationExt};
pub use unit_of_work::{
    CommitSummary, DispatchFailure, UnitOfWork, UnitOfWorkFactory, UnitOfWorkState,
};
pub use user::{User, UserError, UserEvent, UserEvents, UserRole};

use event_bus::{EventRegistry, register_all};

pub type InMemoryPostRepository = InMemoryRepository<Post>;
pub type InMemoryCommentRepository = InMemoryRepository<Comment>;
pub type InMemoryRatingRepository = InMemoryRepository<Rating>;
pub type InMemoryUserRepository = InMemoryRepository<User>;

/// Registers every blog event type. Call once at startup.
pub fn register_blog_events(registry: &EventRegistry) -> event_bus::Result<()> {
    register_all(registry, &[&PostEvents, &CommentEvents, &RatingEvents, &UserEvents])
}

/// Every event type the blog aggregates can emit.
pub fn blog_event_types() -> impl Iterator<Item = &'static str> {
    post::EVENT_TYPES
        .iter()
        .chain(comment::EVENT_TYPES)
        .chain(rating::EVENT_TYPES)
        .chain(user::EVENT_TYPES)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_events_cover_every_emitted_type() {
        let registry = EventRegistry::new();
        register_blog_events(&registry).unwrap();

        assert!(registry.check_integrity(blog_event_types()).is_ok());
        assert_eq!(registry.len(), blog_event_types().count());
    }

    #[test]
    fn blog_events_register_once() {
        let registry = EventRegistry::new();
        register_blog_events(&registry).unwrap();
        assert!(register_blog_events(&registry).is_err());
    }
}
