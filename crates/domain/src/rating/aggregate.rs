use chrono::{DateTime, Utc};
use common::AggregateId;
use event_bus::DomainEvent;

use crate::aggregate::{EventAccumulator, EventAggregate};

use super::{RatingError, RatingEvent, RatingType};

/// A user's like or dislike of a post.
///
/// Unlike the other aggregates a rating can be removed outright. Removal
/// records `RatingRemoved` and flags the rating so repositories delete it on
/// save; the events recorded before it are kept.
#[derive(Debug, Clone)]
pub struct Rating {
    events: EventAccumulator,
    post_id: AggregateId,
    user_id: AggregateId,
    rating_type: RatingType,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    removed: bool,
}

impl Rating {
    /// Creates a rating and records `RatingCreated`.
    pub fn new(post_id: AggregateId, user_id: AggregateId, rating_type: RatingType) -> Self {
        let mut rating = Rating {
            events: EventAccumulator::new(),
            post_id: AggregateId::default(),
            user_id: AggregateId::default(),
            rating_type,
            created_at: Utc::now(),
            updated_at: None,
            removed: false,
        };
        rating.raise(RatingEvent::rating_created(
            AggregateId::generate(),
            post_id,
            user_id,
            rating_type,
        ));
        rating
    }

    /// Switches the rating to `rating_type`.
    pub fn change_rating(&mut self, rating_type: RatingType) -> Result<(), RatingError> {
        self.ensure_present()?;

        self.raise(RatingEvent::rating_changed(self.id(), rating_type));
        Ok(())
    }

    /// Withdraws the rating. A rating can only be removed once.
    pub fn remove(&mut self) -> Result<(), RatingError> {
        self.ensure_present()?;

        self.raise(RatingEvent::rating_removed(
            self.id(),
            self.post_id.clone(),
            self.rating_type,
        ));
        Ok(())
    }

    fn ensure_present(&self) -> Result<(), RatingError> {
        if self.removed {
            return Err(RatingError::AlreadyRemoved);
        }
        Ok(())
    }

    fn raise(&mut self, event: RatingEvent) {
        match &event {
            RatingEvent::RatingCreated(data) => {
                self.events.set_id(data.rating_id.clone());
                self.post_id = data.post_id.clone();
                self.user_id = data.user_id.clone();
                self.rating_type = data.rating_type;
                self.created_at = data.created_at;
            }
            RatingEvent::RatingChanged(data) => {
                self.rating_type = data.new_rating_type;
                self.updated_at = Some(data.updated_at);
            }
            RatingEvent::RatingRemoved(_) => {
                self.removed = true;
            }
        }
        self.events.record_event(event.shared());
    }

    pub fn id(&self) -> AggregateId {
        self.events.id()
    }

    pub fn set_id(&self, id: AggregateId) {
        self.events.set_id(id);
    }

    pub fn post_id(&self) -> &AggregateId {
        &self.post_id
    }

    pub fn user_id(&self) -> &AggregateId {
        &self.user_id
    }

    pub fn rating_type(&self) -> RatingType {
        self.rating_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl EventAggregate for Rating {
    fn aggregate_type(&self) -> &'static str {
        "Rating"
    }

    fn accumulator(&self) -> &EventAccumulator {
        &self.events
    }

    fn is_removed(&self) -> bool {
        self.removed
    }
}
