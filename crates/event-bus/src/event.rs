//! Core domain event trait.

use std::any::Any;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Object-safe access to `Any` for concrete event types.
///
/// Implemented for every sized `'static` type, so event types never implement
/// it by hand.
pub trait AsAny {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Trait for domain events.
///
/// Domain events represent facts that have happened to an aggregate.
/// They are immutable once constructed and should be named in past tense.
/// Identity is structural: implementors derive `PartialEq` over their payload.
pub trait DomainEvent: AsAny + std::fmt::Debug + Send + Sync {
    /// Returns the event type name.
    ///
    /// This is the key used by the registry and by dispatcher subscriptions.
    fn event_type(&self) -> &'static str;

    /// Returns when the event occurred.
    fn occurred_on(&self) -> DateTime<Utc>;

    /// Returns the event payload as JSON, for logging and auditing.
    fn to_payload(&self) -> serde_json::Value;

    /// Wraps the event for sharing between the aggregate, dispatcher and handlers.
    fn shared(self) -> SharedEvent
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

/// A reference-counted, immutable domain event.
pub type SharedEvent = Arc<dyn DomainEvent>;

impl dyn DomainEvent {
    /// Returns the concrete event if it is of type `E`.
    pub fn downcast_ref<E: DomainEvent + 'static>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    /// Returns true if the concrete event is of type `E`.
    pub fn is<E: DomainEvent + 'static>(&self) -> bool {
        self.as_any().is::<E>()
    }
}
