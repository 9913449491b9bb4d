//! Activity view: an in-memory read model of blog activity.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use common::AggregateId;
use domain::{CommentEvent, PostEvent, RatingEvent, RatingType, blog_event_types};
use event_bus::{HandlerError, SharedEvent};
use serde::Serialize;

use crate::subscriber::Subscriber;

/// Like and dislike totals for one post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostScore {
    pub likes: u64,
    pub dislikes: u64,
}

impl PostScore {
    /// Likes minus dislikes.
    pub fn net(&self) -> i64 {
        self.likes as i64 - self.dislikes as i64
    }
}

/// Point-in-time copy of the view, suitable for logging as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivitySnapshot {
    pub events_processed: u64,
    pub events_by_type: BTreeMap<String, u64>,
    pub active_posts: usize,
    pub archived_posts: usize,
    pub comments: usize,
    pub ratings: usize,
}

#[derive(Debug, Default)]
struct Activity {
    events_processed: u64,
    events_by_type: BTreeMap<String, u64>,
    active_posts: HashSet<AggregateId>,
    archived_posts: HashSet<AggregateId>,
    comments_by_post: HashMap<AggregateId, HashSet<AggregateId>>,
    ratings: HashMap<AggregateId, (AggregateId, RatingType)>,
}

impl Activity {
    fn apply_post(&mut self, event: &PostEvent) {
        match event {
            PostEvent::PostCreated(data) => {
                self.active_posts.insert(data.post_id.clone());
            }
            PostEvent::PostArchived(data) => {
                self.active_posts.remove(&data.post_id);
                self.archived_posts.insert(data.post_id.clone());
            }
            PostEvent::PostTitleEdited(_) | PostEvent::PostContentEdited(_) => {}
        }
    }

    fn apply_comment(&mut self, event: &CommentEvent) {
        match event {
            CommentEvent::CommentCreated(data) => {
                self.comments_by_post
                    .entry(data.post_id.clone())
                    .or_default()
                    .insert(data.comment_id.clone());
            }
            CommentEvent::CommentArchived(data) => {
                for comments in self.comments_by_post.values_mut() {
                    comments.remove(&data.comment_id);
                }
            }
            CommentEvent::CommentEdited(_) => {}
        }
    }

    fn apply_rating(&mut self, event: &RatingEvent) {
        match event {
            RatingEvent::RatingCreated(data) => {
                self.ratings
                    .insert(data.rating_id.clone(), (data.post_id.clone(), data.rating_type));
            }
            RatingEvent::RatingChanged(data) => {
                if let Some((_, rating_type)) = self.ratings.get_mut(&data.rating_id) {
                    *rating_type = data.new_rating_type;
                }
            }
            RatingEvent::RatingRemoved(data) => {
                self.ratings.remove(&data.rating_id);
            }
        }
    }
}

/// Read model counting blog activity as events are dispatched.
///
/// Tracks how many events of each type were seen, which posts are active or
/// archived, open comments per post, and current ratings. Events for ratings
/// or comments it never saw created are counted but otherwise ignored.
#[derive(Debug, Default)]
pub struct ActivityView {
    activity: RwLock<Activity>,
}

impl ActivityView {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Activity> {
        self.activity.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies one event to the view.
    pub fn apply(&self, event: &SharedEvent) {
        let event_type = event.event_type();
        let mut activity = self.activity.write().unwrap_or_else(PoisonError::into_inner);

        activity.events_processed += 1;
        *activity
            .events_by_type
            .entry(event_type.to_string())
            .or_default() += 1;

        if let Some(event) = event.downcast_ref::<PostEvent>() {
            activity.apply_post(event);
        } else if let Some(event) = event.downcast_ref::<CommentEvent>() {
            activity.apply_comment(event);
        } else if let Some(event) = event.downcast_ref::<RatingEvent>() {
            activity.apply_rating(event);
        }

        metrics::counter!("activity_view_events_total", "event_type" => event_type).increment(1);
    }

    /// Number of events of a type seen so far.
    pub fn count(&self, event_type: &str) -> u64 {
        self.read()
            .events_by_type
            .get(event_type)
            .copied()
            .unwrap_or_default()
    }

    pub fn events_processed(&self) -> u64 {
        self.read().events_processed
    }

    pub fn is_active(&self, post_id: &AggregateId) -> bool {
        self.read().active_posts.contains(post_id)
    }

    pub fn is_archived(&self, post_id: &AggregateId) -> bool {
        self.read().archived_posts.contains(post_id)
    }

    /// Ids of posts that are not archived, in no particular order.
    pub fn active_posts(&self) -> Vec<AggregateId> {
        self.read().active_posts.iter().cloned().collect()
    }

    /// Number of unarchived comments on a post.
    pub fn comment_count(&self, post_id: &AggregateId) -> usize {
        self.read()
            .comments_by_post
            .get(post_id)
            .map_or(0, HashSet::len)
    }

    /// Current likes and dislikes on a post.
    pub fn score(&self, post_id: &AggregateId) -> PostScore {
        self.read()
            .ratings
            .values()
            .filter(|(post, _)| post == post_id)
            .fold(PostScore::default(), |mut score, (_, rating_type)| {
                match rating_type {
                    RatingType::Like => score.likes += 1,
                    RatingType::Dislike => score.dislikes += 1,
                }
                score
            })
    }

    pub fn snapshot(&self) -> ActivitySnapshot {
        let activity = self.read();
        ActivitySnapshot {
            events_processed: activity.events_processed,
            events_by_type: activity.events_by_type.clone(),
            active_posts: activity.active_posts.len(),
            archived_posts: activity.archived_posts.len(),
            comments: activity.comments_by_post.values().map(HashSet::len).sum(),
            ratings: activity.ratings.len(),
        }
    }

    /// Clears the view back to its initial state.
    pub fn reset(&self) {
        *self.activity.write().unwrap_or_else(PoisonError::into_inner) = Activity::default();
    }
}

impl Subscriber for ActivityView {
    fn name(&self) -> &'static str {
        "activity-view"
    }

    fn event_types(&self) -> Vec<&'static str> {
        blog_event_types().collect()
    }

    fn handle(&self, event: &SharedEvent) -> Result<(), HandlerError> {
        self.apply(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_bus::DomainEvent;

    fn id(s: &str) -> AggregateId {
        AggregateId::new(s)
    }

    fn view_with(events: Vec<SharedEvent>) -> ActivityView {
        let view = ActivityView::new();
        for event in &events {
            view.apply(event);
        }
        view
    }

    #[test]
    fn tracks_post_lifecycle() {
        let view = view_with(vec![
            PostEvent::post_created(id("p-1"), id("u-1"), "T", "C").shared(),
            PostEvent::post_created(id("p-2"), id("u-1"), "T", "C").shared(),
            PostEvent::post_title_edited(id("p-1"), "T2").shared(),
            PostEvent::post_archived(id("p-1")).shared(),
        ]);

        assert!(view.is_archived(&id("p-1")));
        assert!(!view.is_active(&id("p-1")));
        assert_eq!(view.active_posts(), vec![id("p-2")]);
        assert_eq!(view.count("PostCreated"), 2);
        assert_eq!(view.count("PostTitleEdited"), 1);
        assert_eq!(view.events_processed(), 4);
    }

    #[test]
    fn counts_open_comments_per_post() {
        let view = view_with(vec![
            CommentEvent::comment_created(id("c-1"), id("p-1"), id("u-1"), "a").shared(),
            CommentEvent::comment_created(id("c-2"), id("p-1"), id("u-2"), "b").shared(),
            CommentEvent::comment_created(id("c-3"), id("p-2"), id("u-2"), "c").shared(),
            CommentEvent::comment_archived(id("c-1")).shared(),
        ]);

        assert_eq!(view.comment_count(&id("p-1")), 1);
        assert_eq!(view.comment_count(&id("p-2")), 1);
        assert_eq!(view.comment_count(&id("p-3")), 0);
    }

    #[test]
    fn scores_follow_rating_changes_and_removals() {
        let view = view_with(vec![
            RatingEvent::rating_created(id("r-1"), id("p-1"), id("u-1"), RatingType::Like).shared(),
            RatingEvent::rating_created(id("r-2"), id("p-1"), id("u-2"), RatingType::Like).shared(),
            RatingEvent::rating_created(id("r-3"), id("p-1"), id("u-3"), RatingType::Like).shared(),
            RatingEvent::rating_changed(id("r-2"), RatingType::Dislike).shared(),
            RatingEvent::rating_removed(id("r-3"), id("p-1"), RatingType::Like).shared(),
        ]);

        let score = view.score(&id("p-1"));
        assert_eq!(score, PostScore { likes: 1, dislikes: 1 });
        assert_eq!(score.net(), 0);
    }

    #[test]
    fn unknown_ratings_are_counted_but_ignored() {
        let view = view_with(vec![
            RatingEvent::rating_changed(id("r-404"), RatingType::Dislike).shared(),
        ]);

        assert_eq!(view.count("RatingChanged"), 1);
        assert_eq!(view.snapshot().ratings, 0);
    }

    #[test]
    fn snapshot_serializes_and_reset_clears() {
        let view = view_with(vec![
            PostEvent::post_created(id("p-1"), id("u-1"), "T", "C").shared(),
        ]);

        let json = serde_json::to_value(view.snapshot()).unwrap();
        assert_eq!(json["events_by_type"]["PostCreated"], 1);
        assert_eq!(json["active_posts"], 1);

        view.reset();
        assert_eq!(view.snapshot(), ActivitySnapshot::default());
    }

    #[test]
    fn subscribes_to_every_blog_event() {
        let view = ActivityView::new();
        assert_eq!(view.event_types().len(), blog_event_types().count());
    }
}
