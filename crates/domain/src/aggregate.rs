//! Event accumulation shared by every aggregate.

use std::sync::{Mutex, MutexGuard, PoisonError};

use common::AggregateId;
use event_bus::{AsAny, SharedEvent};

#[derive(Debug, Default, Clone)]
struct Pending {
    id: AggregateId,
    events: Vec<SharedEvent>,
}

/// Identity and uncommitted events of one aggregate instance.
///
/// Aggregates hold one of these and delegate to it. All access goes through
/// an internal lock, so concurrent calls on the same instance never lose an
/// event; separate instances never contend.
#[derive(Debug, Default)]
pub struct EventAccumulator {
    pending: Mutex<Pending>,
}

impl EventAccumulator {
    /// Creates an accumulator with no id and no events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an accumulator with the given id.
    pub fn with_id(id: AggregateId) -> Self {
        let accumulator = Self::new();
        accumulator.set_id(id);
        accumulator
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the aggregate id, empty if none was assigned.
    pub fn id(&self) -> AggregateId {
        self.lock().id.clone()
    }

    /// Assigns the aggregate id.
    ///
    /// Empty ids are ignored, and so is any assignment once an id is set.
    pub fn set_id(&self, id: AggregateId) {
        if id.is_empty() {
            return;
        }

        let mut pending = self.lock();
        if pending.id.is_empty() {
            pending.id = id;
        } else if pending.id != id {
            tracing::debug!(aggregate_id = %pending.id, rejected = %id, "Ignoring id reassignment");
        }
    }

    /// Appends an event to the uncommitted list.
    pub fn record_event(&self, event: SharedEvent) {
        self.lock().events.push(event);
    }

    /// Returns a copy of the uncommitted events, oldest first.
    pub fn uncommitted_events(&self) -> Vec<SharedEvent> {
        self.lock().events.clone()
    }

    pub fn has_uncommitted_events(&self) -> bool {
        !self.lock().events.is_empty()
    }

    /// Clears the uncommitted list. A no-op when nothing is pending.
    pub fn mark_events_as_committed(&self) {
        self.lock().events.clear();
    }
}

impl Clone for EventAccumulator {
    fn clone(&self) -> Self {
        Self {
            pending: Mutex::new(self.lock().clone()),
        }
    }
}

/// An entity that records domain events as it changes.
///
/// The unit of work and repositories only see aggregates through this trait,
/// so they work the same for every aggregate type.
pub trait EventAggregate: AsAny + Send + Sync + 'static {
    /// Returns the aggregate type name, used in logs and errors.
    fn aggregate_type(&self) -> &'static str;

    /// Returns the accumulator holding this aggregate's id and events.
    fn accumulator(&self) -> &EventAccumulator;

    fn id(&self) -> AggregateId {
        self.accumulator().id()
    }

    fn uncommitted_events(&self) -> Vec<SharedEvent> {
        self.accumulator().uncommitted_events()
    }

    fn mark_events_as_committed(&self) {
        self.accumulator().mark_events_as_committed()
    }

    /// Whether the aggregate has been deleted. Repositories drop a removed
    /// aggregate on save instead of storing it.
    fn is_removed(&self) -> bool {
        false
    }
}
