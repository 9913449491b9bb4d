//! Blog application service.

use std::sync::Arc;

use common::AggregateId;
use event_bus::EventDispatcher;

use crate::aggregate::EventAggregate;
use crate::comment::Comment;
use crate::error::ServiceError;
use crate::post::Post;
use crate::rating::{Rating, RatingType};
use crate::repository::{InMemoryRepository, RepositoryRegistry};
use crate::rules::{PostIsArchived, UserCanComment, UserCanCreatePost};
use crate::specification::Specification;
use crate::unit_of_work::{CommitSummary, UnitOfWorkFactory};
use crate::user::{User, UserError, UserRole};

/// Service for blog operations.
///
/// Each operation loads or creates one aggregate, applies the change, and
/// commits it through a fresh unit of work so the change is saved before its
/// events reach subscribers.
pub struct BlogService {
    units: UnitOfWorkFactory,
    posts: Arc<InMemoryRepository<Post>>,
    comments: Arc<InMemoryRepository<Comment>>,
    ratings: Arc<InMemoryRepository<Rating>>,
    users: Arc<InMemoryRepository<User>>,
}

impl BlogService {
    /// Creates a service backed by in-memory repositories.
    pub fn new(dispatcher: Arc<dyn EventDispatcher>) -> Self {
        let posts = Arc::new(InMemoryRepository::new());
        let comments = Arc::new(InMemoryRepository::new());
        let ratings = Arc::new(InMemoryRepository::new());
        let users = Arc::new(InMemoryRepository::new());

        let repositories = RepositoryRegistry::new()
            .with(posts.clone())
            .with(comments.clone())
            .with(ratings.clone())
            .with(users.clone());

        Self {
            units: UnitOfWorkFactory::new(dispatcher, Arc::new(repositories)),
            posts,
            comments,
            ratings,
            users,
        }
    }

    pub fn posts(&self) -> &Arc<InMemoryRepository<Post>> {
        &self.posts
    }

    pub fn comments(&self) -> &Arc<InMemoryRepository<Comment>> {
        &self.comments
    }

    pub fn ratings(&self) -> &Arc<InMemoryRepository<Rating>> {
        &self.ratings
    }

    pub fn users(&self) -> &Arc<InMemoryRepository<User>> {
        &self.users
    }

    fn commit(&self, aggregate: &dyn EventAggregate) -> Result<CommitSummary, ServiceError> {
        let mut uow = self.units.create();
        uow.register(aggregate)?;
        Ok(uow.commit()?)
    }

    fn user(&self, id: &AggregateId) -> Result<User, ServiceError> {
        self.users.find_by_id(id).ok_or_else(|| not_found("User", id))
    }

    fn post(&self, id: &AggregateId) -> Result<Post, ServiceError> {
        self.posts.find_by_id(id).ok_or_else(|| not_found("Post", id))
    }

    fn rating(&self, id: &AggregateId) -> Result<Rating, ServiceError> {
        self.ratings.find_by_id(id).ok_or_else(|| not_found("Rating", id))
    }

    /// Registers a new user.
    #[tracing::instrument(skip(self, password_hash, roles))]
    pub fn register_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
        description: &str,
        roles: &[UserRole],
    ) -> Result<User, ServiceError> {
        let user = User::new(
            email,
            username,
            password_hash,
            description,
            roles.iter().copied(),
        )?;
        self.commit(&user)?;
        Ok(user)
    }

    /// Grants a role to an existing user.
    #[tracing::instrument(skip(self))]
    pub fn grant_role(&self, user_id: &AggregateId, role: UserRole) -> Result<User, ServiceError> {
        let mut user = self.user(user_id)?;
        user.add_role(role)?;
        self.commit(&user)?;
        Ok(user)
    }

    /// Revokes a role. A user's last role cannot be revoked.
    #[tracing::instrument(skip(self))]
    pub fn revoke_role(&self, user_id: &AggregateId, role: UserRole) -> Result<User, ServiceError> {
        let mut user = self.user(user_id)?;
        user.remove_role(role)?;
        self.commit(&user)?;
        Ok(user)
    }

    /// Replaces a user's roles with `roles`.
    ///
    /// Missing roles are granted before extra ones are revoked, so the user
    /// never passes through a roleless state. All changes commit together.
    #[tracing::instrument(skip(self))]
    pub fn set_user_roles(
        &self,
        user_id: &AggregateId,
        roles: &[UserRole],
    ) -> Result<User, ServiceError> {
        if roles.is_empty() {
            return Err(UserError::MissingUserRoles.into());
        }
        let mut user = self.user(user_id)?;

        for role in roles.iter().copied() {
            if !user.has_role(role) {
                user.add_role(role)?;
            }
        }
        let revoked: Vec<UserRole> = user.roles().filter(|role| !roles.contains(role)).collect();
        for role in revoked {
            user.remove_role(role)?;
        }

        self.commit(&user)?;
        Ok(user)
    }

    #[tracing::instrument(skip(self, description))]
    pub fn update_description(
        &self,
        user_id: &AggregateId,
        description: &str,
    ) -> Result<User, ServiceError> {
        let mut user = self.user(user_id)?;
        user.update_description(description)?;
        self.commit(&user)?;
        Ok(user)
    }

    /// Stores a new password hash. Callers hash the password first.
    #[tracing::instrument(skip(self, password_hash))]
    pub fn update_password(
        &self,
        user_id: &AggregateId,
        password_hash: &str,
    ) -> Result<User, ServiceError> {
        let mut user = self.user(user_id)?;
        user.update_password_hash(password_hash);
        self.commit(&user)?;
        Ok(user)
    }

    /// Publishes a post written by `author_id`.
    #[tracing::instrument(skip(self, content))]
    pub fn create_post(
        &self,
        author_id: &AggregateId,
        title: &str,
        content: &str,
    ) -> Result<Post, ServiceError> {
        let author = self.user(author_id)?;
        require(&UserCanCreatePost, &author)?;

        let post = Post::new(author_id.clone(), title, content)?;
        self.commit(&post)?;
        Ok(post)
    }

    #[tracing::instrument(skip(self))]
    pub fn edit_post_title(&self, post_id: &AggregateId, title: &str) -> Result<Post, ServiceError> {
        let mut post = self.post(post_id)?;
        post.edit_title(title)?;
        self.commit(&post)?;
        Ok(post)
    }

    #[tracing::instrument(skip(self))]
    pub fn archive_post(&self, post_id: &AggregateId) -> Result<Post, ServiceError> {
        let mut post = self.post(post_id)?;
        post.archive()?;
        self.commit(&post)?;
        Ok(post)
    }

    /// Adds a comment to a post that is still open.
    #[tracing::instrument(skip(self, content))]
    pub fn add_comment(
        &self,
        post_id: &AggregateId,
        commenter_id: &AggregateId,
        content: &str,
    ) -> Result<Comment, ServiceError> {
        let commenter = self.user(commenter_id)?;
        require(&UserCanComment, &commenter)?;
        let post = self.post(post_id)?;
        if PostIsArchived.is_satisfied_by(&post) {
            return Err(ServiceError::NotAllowed {
                rule: "post is not archived".to_string(),
            });
        }

        let comment = Comment::new(post_id.clone(), commenter_id.clone(), content)?;
        self.commit(&comment)?;
        Ok(comment)
    }

    /// Records a like or dislike on a post. Each user rates a post at most once.
    #[tracing::instrument(skip(self))]
    pub fn rate_post(
        &self,
        post_id: &AggregateId,
        user_id: &AggregateId,
        rating_type: RatingType,
    ) -> Result<Rating, ServiceError> {
        self.user(user_id)?;
        self.post(post_id)?;
        if self
            .ratings_on_post(post_id)
            .iter()
            .any(|rating| rating.user_id() == user_id)
        {
            return Err(ServiceError::NotAllowed {
                rule: "one rating per user per post".to_string(),
            });
        }

        let rating = Rating::new(post_id.clone(), user_id.clone(), rating_type);
        self.commit(&rating)?;
        Ok(rating)
    }

    /// Switches an existing rating between like and dislike.
    #[tracing::instrument(skip(self))]
    pub fn change_rating(
        &self,
        rating_id: &AggregateId,
        rating_type: RatingType,
    ) -> Result<Rating, ServiceError> {
        let mut rating = self.rating(rating_id)?;
        rating.change_rating(rating_type)?;
        self.commit(&rating)?;
        Ok(rating)
    }

    /// Removes a rating. The repository deletes it as part of the commit.
    #[tracing::instrument(skip(self))]
    pub fn remove_rating(&self, rating_id: &AggregateId) -> Result<Rating, ServiceError> {
        let mut rating = self.rating(rating_id)?;
        rating.remove()?;
        self.commit(&rating)?;
        Ok(rating)
    }

    /// Current ratings on a post, oldest first.
    pub fn ratings_on_post(&self, post_id: &AggregateId) -> Vec<Rating> {
        let mut ratings: Vec<Rating> = self
            .ratings
            .find_all()
            .into_iter()
            .filter(|rating| rating.post_id() == post_id)
            .collect();
        ratings.sort_by_key(Rating::created_at);
        ratings
    }
}

fn not_found(aggregate_type: &'static str, id: &AggregateId) -> ServiceError {
    ServiceError::NotFound {
        aggregate_type,
        aggregate_id: id.to_string(),
    }
}

fn require<T>(rule: &impl Specification<T>, candidate: &T) -> Result<(), ServiceError> {
    if rule.is_satisfied_by(candidate) {
        Ok(())
    } else {
        tracing::info!(rule = %rule.describe(), "Operation denied by business rule");
        Err(ServiceError::NotAllowed {
            rule: rule.describe(),
        })
    }
}
