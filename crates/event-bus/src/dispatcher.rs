//! In-process event dispatch.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{EventRegistry, HandlerError, SharedEvent};

/// A subscribed event handler.
pub type EventHandler = Arc<dyn Fn(&SharedEvent) -> Result<(), HandlerError> + Send + Sync>;

/// Routes events to the handlers subscribed to their type.
///
/// Delivery is synchronous: `dispatch` returns once every handler for the
/// event has run, or as soon as one of them fails.
pub trait EventDispatcher: Send + Sync {
    /// Subscribes a handler to an event type.
    ///
    /// Handlers for the same type run in subscription order.
    fn subscribe(&self, event_type: &str, handler: EventHandler);

    /// Delivers an event to its subscribers.
    ///
    /// Stops at the first handler error and returns it; the remaining
    /// handlers for this event are not invoked.
    fn dispatch(&self, event: &SharedEvent) -> Result<(), HandlerError>;
}

impl<D: EventDispatcher + ?Sized> EventDispatcher for Arc<D> {
    fn subscribe(&self, event_type: &str, handler: EventHandler) {
        (**self).subscribe(event_type, handler)
    }

    fn dispatch(&self, event: &SharedEvent) -> Result<(), HandlerError> {
        (**self).dispatch(event)
    }
}

/// Convenience methods for subscribing plain closures.
pub trait EventDispatcherExt: EventDispatcher {
    /// Subscribes a closure to an event type.
    fn on<F>(&self, event_type: &str, handler: F)
    where
        F: Fn(&SharedEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.subscribe(event_type, Arc::new(handler));
    }
}

impl<D: EventDispatcher + ?Sized> EventDispatcherExt for D {}

/// Dispatcher holding its subscriptions in memory.
///
/// Events whose type is missing from the registry are logged and still
/// delivered. Wrap it in [`ValidatingEventDispatcher`](crate::ValidatingEventDispatcher)
/// to make that fatal instead.
pub struct InMemoryEventDispatcher {
    registry: Arc<EventRegistry>,
    handlers: RwLock<HashMap<String, Vec<EventHandler>>>,
}

impl InMemoryEventDispatcher {
    /// Creates a dispatcher that checks events against `registry`.
    pub fn new(registry: Arc<EventRegistry>) -> Self {
        Self {
            registry,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the registry this dispatcher validates against.
    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }

    /// Number of handlers subscribed to an event type.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }
}

impl EventDispatcher for InMemoryEventDispatcher {
    fn subscribe(&self, event_type: &str, handler: EventHandler) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type.to_string())
            .or_default()
            .push(handler);

        tracing::debug!(event_type, "Subscribed event handler");
    }

    fn dispatch(&self, event: &SharedEvent) -> Result<(), HandlerError> {
        let event_type = event.event_type();

        if let Err(e) = self.registry.validate(&**event) {
            tracing::warn!(event_type, error = %e, "Dispatching unregistered event");
        }

        // Snapshot the subscriptions so handlers run without holding the lock.
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .cloned()
            .unwrap_or_default();

        metrics::counter!("events_dispatched_total", "event_type" => event_type).increment(1);

        for handler in &handlers {
            if let Err(e) = handler(event) {
                metrics::counter!("event_handler_failures_total", "event_type" => event_type)
                    .increment(1);
                tracing::warn!(event_type, error = %e, "Event handler failed");
                return Err(e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DomainEvent, EventRecorder};
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    #[derive(Debug, PartialEq)]
    struct Rang {
        bell: u32,
    }

    impl DomainEvent for Rang {
        fn event_type(&self) -> &'static str {
            "Rang"
        }
        fn occurred_on(&self) -> DateTime<Utc> {
            DateTime::<Utc>::MIN_UTC
        }
        fn to_payload(&self) -> serde_json::Value {
            serde_json::json!({ "bell": self.bell })
        }
    }

    #[derive(Debug)]
    struct Echoed;

    impl DomainEvent for Echoed {
        fn event_type(&self) -> &'static str {
            "Echoed"
        }
        fn occurred_on(&self) -> DateTime<Utc> {
            DateTime::<Utc>::MIN_UTC
        }
        fn to_payload(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
    }

    fn dispatcher() -> InMemoryEventDispatcher {
        let registry = EventRegistry::new();
        registry.register(Rang { bell: 0 }.shared(), "bell rang").unwrap();
        InMemoryEventDispatcher::new(Arc::new(registry))
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let dispatcher = dispatcher();
        let log = Arc::new(Mutex::new(Vec::new()));

        for name in ["h1", "h2", "h3"] {
            let log = log.clone();
            dispatcher.on("Rang", move |_| {
                log.lock().unwrap().push(format!("{name}:start"));
                log.lock().unwrap().push(format!("{name}:end"));
                Ok(())
            });
        }

        dispatcher.dispatch(&Rang { bell: 1 }.shared()).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["h1:start", "h1:end", "h2:start", "h2:end", "h3:start", "h3:end"]
        );
    }

    #[test]
    fn first_failure_stops_remaining_handlers() {
        let dispatcher = dispatcher();
        let second_ran = Arc::new(Mutex::new(false));

        dispatcher.on("Rang", |_| Err(HandlerError::failed("bell cracked")));
        let flag = second_ran.clone();
        dispatcher.on("Rang", move |_| {
            *flag.lock().unwrap() = true;
            Ok(())
        });

        let result = dispatcher.dispatch(&Rang { bell: 1 }.shared());

        assert_eq!(result, Err(HandlerError::failed("bell cracked")));
        assert!(!*second_ran.lock().unwrap());
    }

    #[test]
    fn dispatch_without_subscribers_is_ok() {
        let dispatcher = dispatcher();
        assert!(dispatcher.dispatch(&Rang { bell: 1 }.shared()).is_ok());
        assert_eq!(dispatcher.handler_count("Rang"), 0);
    }

    #[test]
    fn unregistered_events_are_still_delivered() {
        let dispatcher = dispatcher();
        let recorder = EventRecorder::new();
        recorder.subscribe(&dispatcher, ["Echoed"]);

        dispatcher.dispatch(&Echoed.shared()).unwrap();

        assert_eq!(recorder.count(), 1);
    }

    #[test]
    fn handlers_only_see_their_event_type() {
        let dispatcher = dispatcher();
        let recorder = EventRecorder::new();
        recorder.subscribe(&dispatcher, ["Rang"]);

        dispatcher.dispatch(&Echoed.shared()).unwrap();
        dispatcher.dispatch(&Rang { bell: 7 }.shared()).unwrap();

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].downcast_ref::<Rang>(), Some(&Rang { bell: 7 }));
    }

    // A handler may dispatch again on the same dispatcher. The nested event is
    // delivered in full before the outer handler list continues.
    #[test]
    fn reentrant_dispatch_runs_nested_handlers_first() {
        let dispatcher = Arc::new(dispatcher());
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner = dispatcher.clone();
        let l = log.clone();
        dispatcher.on("Rang", move |_| {
            l.lock().unwrap().push("rang:first");
            inner.dispatch(&Echoed.shared())
        });
        let l = log.clone();
        dispatcher.on("Rang", move |_| {
            l.lock().unwrap().push("rang:second");
            Ok(())
        });
        let l = log.clone();
        dispatcher.on("Echoed", move |_| {
            l.lock().unwrap().push("echoed");
            Ok(())
        });

        dispatcher.dispatch(&Rang { bell: 1 }.shared()).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["rang:first", "echoed", "rang:second"]
        );
    }

    // Subscribing from inside a handler does not deadlock; the new handler
    // only sees later dispatches.
    #[test]
    fn subscribing_during_dispatch_applies_to_next_event() {
        let dispatcher = Arc::new(dispatcher());
        let recorder = EventRecorder::new();

        let inner = dispatcher.clone();
        let late = recorder.clone();
        dispatcher.on("Rang", move |_| {
            late.subscribe(&inner, ["Rang"]);
            Ok(())
        });

        dispatcher.dispatch(&Rang { bell: 1 }.shared()).unwrap();
        assert_eq!(recorder.count(), 0);

        dispatcher.dispatch(&Rang { bell: 2 }.shared()).unwrap();
        assert_eq!(recorder.count(), 1);
    }
}
