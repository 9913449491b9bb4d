use std::sync::Arc;

use crate::{EventDispatcher, EventHandler, EventRegistry, HandlerError, SharedEvent};

/// Dispatcher decorator that refuses to deliver unregistered events.
///
/// An event whose type is not in the registry is treated as a broken event
/// contract and panics before any handler runs. Use it where failing fast is
/// wanted (tests, strict deployments); the plain
/// [`InMemoryEventDispatcher`](crate::InMemoryEventDispatcher) only warns.
pub struct ValidatingEventDispatcher<D> {
    inner: D,
    registry: Arc<EventRegistry>,
}

impl<D: EventDispatcher> ValidatingEventDispatcher<D> {
    pub fn new(inner: D, registry: Arc<EventRegistry>) -> Self {
        Self { inner, registry }
    }

    /// Returns the wrapped dispatcher.
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: EventDispatcher> EventDispatcher for ValidatingEventDispatcher<D> {
    fn subscribe(&self, event_type: &str, handler: EventHandler) {
        self.inner.subscribe(event_type, handler);
    }

    fn dispatch(&self, event: &SharedEvent) -> Result<(), HandlerError> {
        if let Err(e) = self.registry.validate(&**event) {
            tracing::error!(event_type = event.event_type(), error = %e, "Rejecting unregistered event");
            panic!("{e}");
        }
        self.inner.dispatch(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DomainEvent, EventRecorder, InMemoryEventDispatcher};
    use chrono::{DateTime, Utc};

    #[derive(Debug)]
    struct Known;

    impl DomainEvent for Known {
        fn event_type(&self) -> &'static str {
            "Known"
        }
        fn occurred_on(&self) -> DateTime<Utc> {
            DateTime::<Utc>::MIN_UTC
        }
        fn to_payload(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
    }

    #[derive(Debug)]
    struct Stray;

    impl DomainEvent for Stray {
        fn event_type(&self) -> &'static str {
            "Stray"
        }
        fn occurred_on(&self) -> DateTime<Utc> {
            DateTime::<Utc>::MIN_UTC
        }
        fn to_payload(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
    }

    fn strict() -> (ValidatingEventDispatcher<InMemoryEventDispatcher>, EventRecorder) {
        let registry = Arc::new(EventRegistry::new());
        registry.register(Known.shared(), "known").unwrap();
        let dispatcher = ValidatingEventDispatcher::new(
            InMemoryEventDispatcher::new(registry.clone()),
            registry,
        );
        let recorder = EventRecorder::new();
        recorder.subscribe(&dispatcher, ["Known", "Stray"]);
        (dispatcher, recorder)
    }

    #[test]
    fn registered_events_pass_through() {
        let (dispatcher, recorder) = strict();
        dispatcher.dispatch(&Known.shared()).unwrap();
        assert_eq!(recorder.count(), 1);
        assert_eq!(dispatcher.inner().handler_count("Known"), 1);
    }

    #[test]
    #[should_panic(expected = "unregistered event type: Stray")]
    fn unregistered_events_panic() {
        let (dispatcher, _recorder) = strict();
        let _ = dispatcher.dispatch(&Stray.shared());
    }

    #[test]
    fn panic_happens_before_delivery() {
        let (dispatcher, recorder) = strict();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = dispatcher.dispatch(&Stray.shared());
        }));
        assert!(result.is_err());
        assert_eq!(recorder.count(), 0);
    }
}
