//! Repository contract and the typed lookup used by the unit of work.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use common::AggregateId;

use crate::aggregate::EventAggregate;
use crate::error::RepositoryError;

/// Persistence for one aggregate type.
pub trait Repository: Send + Sync {
    /// The aggregate type this repository stores.
    type Aggregate: EventAggregate;

    /// Persists the aggregate's current state.
    fn save(&self, aggregate: &Self::Aggregate) -> Result<(), RepositoryError>;
}

/// Type-erased view of a repository, selected by aggregate `TypeId`.
trait ErasedRepository: Send + Sync {
    fn save_dyn(&self, aggregate: &dyn EventAggregate) -> Result<(), RepositoryError>;
}

struct Typed<R>(Arc<R>);

impl<R> ErasedRepository for Typed<R>
where
    R: Repository + 'static,
{
    fn save_dyn(&self, aggregate: &dyn EventAggregate) -> Result<(), RepositoryError> {
        let aggregate = aggregate
            .as_any()
            .downcast_ref::<R::Aggregate>()
            .ok_or(RepositoryError::TypeMismatch {
                expected: type_name::<R::Aggregate>(),
            })?;
        self.0.save(aggregate)
    }
}

/// Maps each aggregate type to the repository that persists it.
///
/// Built once at wiring time. Lookups go by the aggregate's concrete Rust
/// type, so a repository can only ever receive the type it was written for.
#[derive(Default)]
pub struct RepositoryRegistry {
    repositories: HashMap<TypeId, Arc<dyn ErasedRepository>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the repository for `R::Aggregate`, replacing any earlier one.
    pub fn register<R>(&mut self, repository: Arc<R>)
    where
        R: Repository + 'static,
    {
        self.repositories
            .insert(TypeId::of::<R::Aggregate>(), Arc::new(Typed(repository)));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<R>(mut self, repository: Arc<R>) -> Self
    where
        R: Repository + 'static,
    {
        self.register(repository);
        self
    }

    /// Returns true if a repository exists for the aggregate's type.
    pub fn contains(&self, aggregate: &dyn EventAggregate) -> bool {
        self.repositories.contains_key(&Any::type_id(aggregate.as_any()))
    }

    /// Saves an aggregate through the repository registered for its type.
    ///
    /// Returns `None` when no repository is registered.
    pub(crate) fn save(&self, aggregate: &dyn EventAggregate) -> Option<Result<(), RepositoryError>> {
        self.repositories
            .get(&Any::type_id(aggregate.as_any()))
            .map(|repository| repository.save_dyn(aggregate))
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

impl std::fmt::Debug for RepositoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryRegistry")
            .field("repositories", &self.repositories.len())
            .finish()
    }
}

/// In-memory repository keeping the latest saved copy of each aggregate.
#[derive(Debug)]
pub struct InMemoryRepository<A> {
    items: RwLock<HashMap<AggregateId, A>>,
}

impl<A> Default for InMemoryRepository<A> {
    fn default() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }
}

impl<A: EventAggregate + Clone> InMemoryRepository<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored copy of an aggregate.
    pub fn find_by_id(&self, id: &AggregateId) -> Option<A> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Returns every stored aggregate.
    pub fn find_all(&self) -> Vec<A> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: EventAggregate + Clone> Repository for InMemoryRepository<A> {
    type Aggregate = A;

    fn save(&self, aggregate: &A) -> Result<(), RepositoryError> {
        let id = aggregate.id();
        if id.is_empty() {
            return Err(RepositoryError::SaveFailed {
                aggregate_type: aggregate.aggregate_type(),
                aggregate_id: String::new(),
                reason: "aggregate has no id".to_string(),
            });
        }

        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if aggregate.is_removed() {
            items.remove(&id);
            return Ok(());
        }

        // The stored copy starts clean; pending events belong to the caller.
        let stored = aggregate.clone();
        stored.mark_events_as_committed();
        items.insert(id, stored);
        Ok(())
    }
}

/// Repository whose `save` always fails. Useful for exercising error paths.
#[derive(Debug)]
pub struct FailingRepository<A> {
    reason: String,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A> FailingRepository<A> {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            _aggregate: PhantomData,
        }
    }
}

impl<A: EventAggregate> Repository for FailingRepository<A> {
    type Aggregate = A;

    fn save(&self, aggregate: &A) -> Result<(), RepositoryError> {
        Err(RepositoryError::SaveFailed {
            aggregate_type: aggregate.aggregate_type(),
            aggregate_id: aggregate.id().to_string(),
            reason: self.reason.clone(),
        })
    }
}
