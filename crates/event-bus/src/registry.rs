//! Catalog of known event types.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::{DomainEvent, RegistryError, Result, SharedEvent};

/// What the registry knows about one event type.
#[derive(Debug, Clone)]
pub struct EventMetadata {
    pub event_type: String,
    pub description: String,
    pub example: SharedEvent,
}

/// Catalog of the event types a process is allowed to emit.
///
/// Construct one at startup, register every event type once, then share it
/// (usually behind an `Arc`) with the dispatchers that validate against it.
/// Tests build their own instance so registrations never leak between them.
#[derive(Debug, Default)]
pub struct EventRegistry {
    events: RwLock<HashMap<String, EventMetadata>>,
}

impl EventRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an event type using an example instance.
    ///
    /// Fails if the type is already registered.
    pub fn register(&self, example: SharedEvent, description: impl Into<String>) -> Result<()> {
        let event_type = example.event_type();
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);

        if events.contains_key(event_type) {
            return Err(RegistryError::DuplicateEventType(event_type.to_string()));
        }

        events.insert(
            event_type.to_string(),
            EventMetadata {
                event_type: event_type.to_string(),
                description: description.into(),
                example,
            },
        );

        tracing::debug!(event_type, "Registered event type");
        Ok(())
    }

    /// Registers an event type, panicking on a duplicate.
    ///
    /// For startup code, where a duplicate registration is a wiring bug.
    pub fn must_register(&self, example: SharedEvent, description: impl Into<String>) {
        if let Err(e) = self.register(example, description) {
            panic!("{e}");
        }
    }

    /// Returns true if the event type is registered.
    pub fn is_registered(&self, event_type: &str) -> bool {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(event_type)
    }

    /// Checks that an event's type is registered.
    pub fn validate(&self, event: &dyn DomainEvent) -> Result<()> {
        if self.is_registered(event.event_type()) {
            Ok(())
        } else {
            Err(RegistryError::UnregisteredEventType(
                event.event_type().to_string(),
            ))
        }
    }

    /// Checks that an event's type is registered, panicking if it is not.
    pub fn must_validate(&self, event: &dyn DomainEvent) {
        if let Err(e) = self.validate(event) {
            panic!("{e}");
        }
    }

    /// Returns the metadata for an event type.
    pub fn metadata(&self, event_type: &str) -> Option<EventMetadata> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .cloned()
    }

    /// Lists every registered event type, sorted by type name.
    pub fn list(&self) -> Vec<EventMetadata> {
        let mut all: Vec<EventMetadata> = self
            .events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.event_type.cmp(&b.event_type));
        all
    }

    /// Verifies that every listed event type is registered.
    ///
    /// Returns all missing types at once rather than stopping at the first.
    pub fn check_integrity<'a>(&self, event_types: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        let missing: Vec<String> = event_types
            .into_iter()
            .filter(|t| !events.contains_key(*t))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::Unregistered(missing))
        }
    }

    /// Number of registered event types.
    pub fn len(&self) -> usize {
        self.events.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A module that knows how to register its own event types.
pub trait EventRegistrar {
    /// Registers every event type this module emits.
    fn register_events(&self, registry: &EventRegistry) -> Result<()>;
}

/// Runs each registrar in turn, stopping at the first failure.
pub fn register_all(registry: &EventRegistry, registrars: &[&dyn EventRegistrar]) -> Result<()> {
    for registrar in registrars {
        registrar.register_events(registry)?;
    }
    Ok(())
}
