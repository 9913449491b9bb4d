//! Event coordinator for cascading business reactions.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use event_bus::{EventDispatcher, EventHandler, HandlerError, SharedEvent};

use crate::error::{CoordinationError, Result};

/// Default bound on saga cascade rounds.
pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 16;

/// A long-running business process that reacts to events with new events.
pub trait Saga: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Event types this saga reacts to.
    fn handled_event_types(&self) -> &[&'static str];

    /// Reacts to an event, returning the events it produces.
    fn handle(&self, event: &SharedEvent) -> std::result::Result<Vec<SharedEvent>, HandlerError>;
}

/// Recovers from a handler failure for one event type.
///
/// Returning `Ok` swallows the failure and lets coordination continue.
pub type ErrorHandler =
    Arc<dyn Fn(&SharedEvent, &HandlerError) -> std::result::Result<(), HandlerError> + Send + Sync>;

#[derive(Default)]
struct Subscriptions {
    handlers: HashMap<String, Vec<EventHandler>>,
    sagas: HashMap<String, Vec<Arc<dyn Saga>>>,
    error_handlers: HashMap<String, ErrorHandler>,
}

/// Runs handlers and sagas for a batch of events, then coordinates whatever
/// the sagas produced.
///
/// Each round processes a whole batch in order: plain handlers for an event
/// run first, then its sagas. Events produced during a round form the next
/// batch. Coordination ends when a round produces nothing, or fails with
/// [`CoordinationError::CascadeDepthExceeded`] once more than `max_depth`
/// cascade rounds would be needed.
pub struct EventCoordinator {
    subscriptions: RwLock<Subscriptions>,
    max_depth: usize,
}

impl Default for EventCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl EventCoordinator {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(Subscriptions::default()),
            max_depth: DEFAULT_MAX_CASCADE_DEPTH,
        }
    }

    /// Sets the maximum number of cascade rounds after the initial batch.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Registers a plain handler for an event type.
    pub fn register_handler(&self, event_type: &str, handler: EventHandler) {
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }

    /// Registers a closure as a plain handler.
    pub fn on<F>(&self, event_type: &str, handler: F)
    where
        F: Fn(&SharedEvent) -> std::result::Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.register_handler(event_type, Arc::new(handler));
    }

    /// Registers a saga under every event type it handles.
    pub fn register_saga(&self, saga: Arc<dyn Saga>) {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for event_type in saga.handled_event_types() {
            subscriptions
                .sagas
                .entry((*event_type).to_string())
                .or_default()
                .push(saga.clone());
        }
        tracing::debug!(saga = saga.name(), "Registered saga");
    }

    /// Registers the error handler for an event type, replacing any earlier one.
    pub fn register_error_handler<F>(&self, event_type: &str, handler: F)
    where
        F: Fn(&SharedEvent, &HandlerError) -> std::result::Result<(), HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .error_handlers
            .insert(event_type.to_string(), Arc::new(handler));
    }

    /// Coordinates a batch of events and every event their sagas produce.
    #[tracing::instrument(skip_all, fields(events = events.len()))]
    pub fn coordinate(&self, events: &[SharedEvent]) -> Result<()> {
        let mut batch = events.to_vec();
        let mut depth = 0;

        while !batch.is_empty() {
            if depth > self.max_depth {
                tracing::warn!(
                    max_depth = self.max_depth,
                    pending = batch.len(),
                    "Saga cascade depth exceeded"
                );
                return Err(CoordinationError::CascadeDepthExceeded {
                    max_depth: self.max_depth,
                    pending: batch.len(),
                });
            }

            let mut produced = Vec::new();
            for event in &batch {
                self.handle_event(event)?;
                produced.extend(self.handle_sagas(event)?);
            }

            if !produced.is_empty() {
                metrics::counter!("saga_events_produced_total").increment(produced.len() as u64);
                tracing::info!(depth, produced = produced.len(), "Sagas produced events");
            }

            batch = produced;
            depth += 1;
        }

        Ok(())
    }

    fn handle_event(&self, event: &SharedEvent) -> Result<()> {
        let event_type = event.event_type();
        let (handlers, error_handler) = {
            let subscriptions = self
                .subscriptions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            (
                subscriptions
                    .handlers
                    .get(event_type)
                    .cloned()
                    .unwrap_or_default(),
                subscriptions.error_handlers.get(event_type).cloned(),
            )
        };

        let Some(error) = handlers.iter().find_map(|handler| handler(event).err()) else {
            return Ok(());
        };

        match error_handler {
            Some(recover) => {
                tracing::warn!(event_type, error = %error, "Handler failed, invoking error handler");
                recover(event, &error)
                    .map_err(|source| CoordinationError::ErrorHandlerFailed { event_type, source })
            }
            None => Err(CoordinationError::HandlerFailed {
                event_type,
                source: error,
            }),
        }
    }

    fn handle_sagas(&self, event: &SharedEvent) -> Result<Vec<SharedEvent>> {
        let event_type = event.event_type();
        let sagas = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sagas
            .get(event_type)
            .cloned()
            .unwrap_or_default();

        let mut produced = Vec::new();
        for saga in &sagas {
            let events = saga
                .handle(event)
                .map_err(|source| CoordinationError::SagaFailed {
                    saga: saga.name().to_string(),
                    event_type,
                    source,
                })?;
            produced.extend(events);
        }
        Ok(produced)
    }

    /// Subscribes this coordinator to `event_types` on a dispatcher.
    ///
    /// Each dispatched event is coordinated on its own; a coordination
    /// failure is reported back to the dispatcher as a handler error.
    pub fn attach<'a, D>(self: &Arc<Self>, dispatcher: &D, event_types: impl IntoIterator<Item = &'a str>)
    where
        D: EventDispatcher + ?Sized,
    {
        for event_type in event_types {
            let coordinator = Arc::clone(self);
            dispatcher.subscribe(
                event_type,
                Arc::new(move |event: &SharedEvent| {
                    coordinator
                        .coordinate(std::slice::from_ref(event))
                        .map_err(|e| HandlerError::failed(e.to_string()))
                }),
            );
        }
    }
}

impl std::fmt::Debug for EventCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscriptions = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("EventCoordinator")
            .field("handlers", &subscriptions.handlers.len())
            .field("sagas", &subscriptions.sagas.len())
            .field("error_handlers", &subscriptions.error_handlers.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
