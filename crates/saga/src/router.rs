//! Conditional event routing.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use event_bus::{EventHandler, HandlerError, SharedEvent};

use crate::error::{CoordinationError, Result};

type Condition = Arc<dyn Fn(&SharedEvent) -> bool + Send + Sync>;

#[derive(Clone)]
struct EventRoute {
    condition: Condition,
    handler: EventHandler,
}

/// Sends each event to every route of its type whose condition holds.
///
/// Routes fire in registration order. The first handler error stops the
/// remaining routes for that event.
#[derive(Default)]
pub struct EventRouter {
    routes: RwLock<HashMap<String, Vec<EventRoute>>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route for an event type.
    pub fn add_route<C, F>(&self, event_type: &str, condition: C, handler: F)
    where
        C: Fn(&SharedEvent) -> bool + Send + Sync + 'static,
        F: Fn(&SharedEvent) -> std::result::Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type.to_string())
            .or_default()
            .push(EventRoute {
                condition: Arc::new(condition),
                handler: Arc::new(handler),
            });
    }

    /// Routes an event. Returns how many routes fired.
    pub fn route(&self, event: &SharedEvent) -> Result<usize> {
        let event_type = event.event_type();
        let routes = self
            .routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .cloned()
            .unwrap_or_default();

        let mut fired = 0;
        for route in routes.iter().filter(|route| (route.condition)(event)) {
            (route.handler)(event)
                .map_err(|source| CoordinationError::RouteHandlerFailed { event_type, source })?;
            fired += 1;
        }

        tracing::trace!(event_type, fired, "Routed event");
        Ok(fired)
    }

    /// Number of routes registered for an event type.
    pub fn route_count(&self, event_type: &str) -> usize {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field(
                "event_types",
                &self.routes.read().unwrap_or_else(PoisonError::into_inner).len(),
            )
            .finish()
    }
}
