pub mod dispatcher;
pub mod error;
pub mod event;
pub mod recorder;
pub mod registry;
pub mod validating;

pub use common::AggregateId;
pub use dispatcher::{EventDispatcher, EventDispatcherExt, EventHandler, InMemoryEventDispatcher};
pub use error::{HandlerError, RegistryError, Result};
pub use event::{AsAny, DomainEvent, SharedEvent};
pub use recorder::EventRecorder;
pub use registry::{EventMetadata, EventRegistrar, EventRegistry, register_all};
pub use validating::ValidatingEventDispatcher;
