//! Demo flow exercising the kernel end to end.

use domain::{RatingType, UserRole};
use handlers::ActivitySnapshot;
use serde::Serialize;

use crate::error::AppError;
use crate::Blog;

const PLACEHOLDER_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$demo";

/// What the demo left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoReport {
    pub users: usize,
    pub posts: usize,
    pub comments: usize,
    pub ratings: usize,
    pub featured_posts: usize,
    /// Whether the publishing workflow failed and was compensated.
    pub workflow_compensated: bool,
    pub activity: ActivitySnapshot,
}

/// Runs a short blog session through `blog`.
///
/// Registers three users, publishes and discusses posts, archives one post
/// (cascading to its comments), then runs a publishing workflow for a user
/// who may not comment, which fails and archives its post again.
#[tracing::instrument(skip_all)]
pub fn run_demo(blog: &Blog) -> Result<DemoReport, AppError> {
    let service = blog.service();

    let ada = service.register_user(
        "ada@example.com",
        "ada",
        PLACEHOLDER_HASH,
        "Writes about event-driven systems",
        &[UserRole::Author, UserRole::Commenter],
    )?;
    let bob = service.register_user(
        "bob@example.com",
        "bob",
        PLACEHOLDER_HASH,
        "Reader",
        &[UserRole::Commenter],
    )?;
    let cy = service.register_user(
        "cy@example.com",
        "cy",
        PLACEHOLDER_HASH,
        "Drafts only",
        &[UserRole::Author],
    )?;

    let essay = service.create_post(
        &ada.id(),
        "Event-driven kernels",
        &"Aggregates record what happened; the unit of work saves them and only then tells everyone else. "
            .repeat(4),
    )?;
    service.add_comment(&essay.id(), &bob.id(), "Great read")?;
    service.add_comment(&essay.id(), &ada.id(), "Thanks!")?;
    let like = service.rate_post(&essay.id(), &bob.id(), RatingType::Like)?;
    service.rate_post(&essay.id(), &cy.id(), RatingType::Dislike)?;
    service.edit_post_title(&essay.id(), "Event-driven kernels in Rust")?;

    let note = service.create_post(&cy.id(), "Scratch", "Short note")?;
    service.add_comment(&note.id(), &bob.id(), "First")?;
    service.archive_post(&note.id())?;
    service.remove_rating(&like.id())?;

    let workflow_compensated = match blog.publish_with_welcome(
        &cy.id(),
        "Announcements",
        "New posts every week",
        "Welcome!",
    ) {
        Ok(_) => false,
        Err(AppError::Workflow(e)) => {
            tracing::warn!(error = %e, "Publishing workflow rolled back");
            true
        }
        Err(e) => return Err(e),
    };

    let report = DemoReport {
        users: service.users().len(),
        posts: service.posts().len(),
        comments: service.comments().len(),
        ratings: service.ratings().len(),
        featured_posts: blog.featured_posts().len(),
        workflow_compensated,
        activity: blog.activity().snapshot(),
    };
    tracing::info!(
        events = report.activity.events_processed,
        posts = report.posts,
        "Demo finished"
    );
    Ok(report)
}
