use std::sync::{Arc, Mutex, PoisonError};

use crate::{EventDispatcher, EventHandler, SharedEvent};

/// Subscriber that keeps every event it receives.
///
/// Clones share the same log, so a test can hand one clone to a dispatcher
/// and inspect another.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<SharedEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the log.
    pub fn record(&self, event: &SharedEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(event));
    }

    /// Returns a handler that records into this log.
    pub fn handler(&self) -> EventHandler {
        let recorder = self.clone();
        Arc::new(move |event: &SharedEvent| {
            recorder.record(event);
            Ok(())
        })
    }

    /// Subscribes this recorder to each of the given event types.
    pub fn subscribe<'a, D>(&self, dispatcher: &D, event_types: impl IntoIterator<Item = &'a str>)
    where
        D: EventDispatcher + ?Sized,
    {
        for event_type in event_types {
            dispatcher.subscribe(event_type, self.handler());
        }
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<SharedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded events of one type.
    pub fn events_of_type(&self, event_type: &str) -> Vec<SharedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.event_type() == event_type)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl std::fmt::Debug for EventRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRecorder")
            .field("count", &self.count())
            .finish()
    }
}
