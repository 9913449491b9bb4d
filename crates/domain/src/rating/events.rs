//! Rating domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_bus::DomainEvent;
use serde::{Deserialize, Serialize};

use super::RatingType;

/// Events that can occur on a rating aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RatingEvent {
    /// A user rated a post.
    RatingCreated(RatingCreatedData),

    /// The user switched between like and dislike.
    RatingChanged(RatingChangedData),

    /// The user withdrew the rating.
    RatingRemoved(RatingRemovedData),
}

impl DomainEvent for RatingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RatingEvent::RatingCreated(_) => "RatingCreated",
            RatingEvent::RatingChanged(_) => "RatingChanged",
            RatingEvent::RatingRemoved(_) => "RatingRemoved",
        }
    }

    fn occurred_on(&self) -> DateTime<Utc> {
        match self {
            RatingEvent::RatingCreated(data) => data.occurred_on,
            RatingEvent::RatingChanged(data) => data.occurred_on,
            RatingEvent::RatingRemoved(data) => data.occurred_on,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingCreatedData {
    pub rating_id: AggregateId,
    pub post_id: AggregateId,
    pub user_id: AggregateId,
    pub rating_type: RatingType,
    pub created_at: DateTime<Utc>,
    pub occurred_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChangedData {
    pub rating_id: AggregateId,
    pub new_rating_type: RatingType,
    pub updated_at: DateTime<Utc>,
    pub occurred_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRemovedData {
    pub rating_id: AggregateId,

    /// The post the removed rating belonged to.
    pub post_id: AggregateId,

    /// The rating that was withdrawn.
    pub rating_type: RatingType,

    pub occurred_on: DateTime<Utc>,
}

impl RatingEvent {
    pub fn rating_created(
        rating_id: AggregateId,
        post_id: AggregateId,
        user_id: AggregateId,
        rating_type: RatingType,
    ) -> Self {
        let now = Utc::now();
        RatingEvent::RatingCreated(RatingCreatedData {
            rating_id,
            post_id,
            user_id,
            rating_type,
            created_at: now,
            occurred_on: now,
        })
    }

    pub fn rating_changed(rating_id: AggregateId, new_rating_type: RatingType) -> Self {
        let now = Utc::now();
        RatingEvent::RatingChanged(RatingChangedData {
            rating_id,
            new_rating_type,
            updated_at: now,
            occurred_on: now,
        })
    }

    pub fn rating_removed(
        rating_id: AggregateId,
        post_id: AggregateId,
        rating_type: RatingType,
    ) -> Self {
        RatingEvent::RatingRemoved(RatingRemovedData {
            rating_id,
            post_id,
            rating_type,
            occurred_on: Utc::now(),
        })
    }

    pub fn rating_id(&self) -> &AggregateId {
        match self {
            RatingEvent::RatingCreated(data) => &data.rating_id,
            RatingEvent::RatingChanged(data) => &data.rating_id,
            RatingEvent::RatingRemoved(data) => &data.rating_id,
        }
    }
}
