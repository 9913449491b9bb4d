//! Subscriber trait and dispatcher wiring.

use std::sync::Arc;

use event_bus::{EventDispatcher, HandlerError, SharedEvent};

/// An infrastructure component that reacts to committed events.
///
/// Subscribers are registered with a dispatcher once at startup and receive
/// every event of the types they list.
pub trait Subscriber: Send + Sync + 'static {
    /// Returns the name of this subscriber.
    fn name(&self) -> &'static str;

    /// Event types this subscriber wants to receive.
    fn event_types(&self) -> Vec<&'static str>;

    /// Handles a single event.
    fn handle(&self, event: &SharedEvent) -> Result<(), HandlerError>;
}

/// Subscribes `subscriber` to each of its event types on `dispatcher`.
pub fn subscribe<S, D>(subscriber: Arc<S>, dispatcher: &D)
where
    S: Subscriber,
    D: EventDispatcher + ?Sized,
{
    let event_types = subscriber.event_types();
    for event_type in &event_types {
        let subscriber = subscriber.clone();
        dispatcher.subscribe(
            event_type,
            Arc::new(move |event: &SharedEvent| subscriber.handle(event)),
        );
    }
    tracing::debug!(
        subscriber = subscriber.name(),
        event_types = event_types.len(),
        "Registered subscriber"
    );
}
