//! Rating aggregate and related types.

mod aggregate;
mod events;

pub use aggregate::Rating;
pub use events::{RatingChangedData, RatingCreatedData, RatingEvent, RatingRemovedData};

use common::AggregateId;
use event_bus::{DomainEvent, EventRegistrar, EventRegistry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Event types emitted by ratings.
pub const EVENT_TYPES: &[&str] = &["RatingCreated", "RatingChanged", "RatingRemoved"];

/// Errors that can occur during rating operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RatingError {
    /// The rating was removed and can no longer change.
    #[error("Rating has been removed")]
    AlreadyRemoved,
}

/// Whether a rating is a like or a dislike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingType {
    Like,
    Dislike,
}

impl RatingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingType::Like => "like",
            RatingType::Dislike => "dislike",
        }
    }
}

impl std::fmt::Display for RatingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registers the rating event types.
pub struct RatingEvents;

impl EventRegistrar for RatingEvents {
    fn register_events(&self, registry: &EventRegistry) -> event_bus::Result<()> {
        let id = AggregateId::default();
        registry.register(
            RatingEvent::rating_created(id.clone(), id.clone(), id.clone(), RatingType::Like)
                .shared(),
            "Raised when a new rating is created",
        )?;
        registry.register(
            RatingEvent::rating_changed(id.clone(), RatingType::Like).shared(),
            "Raised when a rating is changed",
        )?;
        registry.register(
            RatingEvent::rating_removed(id.clone(), id, RatingType::Like).shared(),
            "Raised when a rating is removed",
        )
    }
}
