//! Persist a batch of aggregates, then deliver their events.

use std::sync::Arc;
use std::time::Instant;

use event_bus::{EventDispatcher, HandlerError, SharedEvent};
use serde::{Deserialize, Serialize};

use crate::aggregate::EventAggregate;
use crate::error::{Result, UnitOfWorkError};
use crate::repository::RepositoryRegistry;

/// Lifecycle of a unit of work.
///
/// ```text
/// Open ──┬──► Committed
///        └──► RolledBack
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UnitOfWorkState {
    /// Accepting aggregates.
    #[default]
    Open,

    /// Persisted and dispatched (terminal state).
    Committed,

    /// Events discarded (terminal state).
    RolledBack,
}

impl UnitOfWorkState {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UnitOfWorkState::Committed | UnitOfWorkState::RolledBack)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitOfWorkState::Open => "Open",
            UnitOfWorkState::Committed => "Committed",
            UnitOfWorkState::RolledBack => "RolledBack",
        }
    }

    fn terminal_error(&self) -> Option<UnitOfWorkError> {
        match self {
            UnitOfWorkState::Open => None,
            UnitOfWorkState::Committed => Some(UnitOfWorkError::AlreadyCommitted),
            UnitOfWorkState::RolledBack => Some(UnitOfWorkError::AlreadyRolledBack),
        }
    }
}

impl std::fmt::Display for UnitOfWorkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An event whose delivery failed during commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFailure {
    pub event_type: &'static str,
    pub error: HandlerError,
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Aggregates saved through a repository. Zero for event-only units.
    pub aggregates_persisted: usize,

    /// Events handed to the dispatcher, including those whose handlers failed.
    pub events_dispatched: usize,

    /// Events whose handlers failed. These did not abort the commit.
    pub failed_dispatches: Vec<DispatchFailure>,
}

impl CommitSummary {
    /// Returns true if every event was delivered without a handler error.
    pub fn all_delivered(&self) -> bool {
        self.failed_dispatches.is_empty()
    }
}

/// Single-use coordinator that saves aggregates and then dispatches their events.
///
/// Saving is the atomicity boundary. If any save fails the commit stops
/// before dispatching anything, but aggregates saved earlier in the same
/// commit are not undone. Once every save succeeds, events are dispatched in
/// registration order; a failing handler is logged and reported in the
/// [`CommitSummary`] without undoing the commit.
///
/// A unit of work is meant for one owner and one commit. It borrows the
/// aggregates it tracks, so they cannot change between registration and
/// commit.
pub struct UnitOfWork<'a> {
    dispatcher: Arc<dyn EventDispatcher>,
    repositories: Option<Arc<RepositoryRegistry>>,
    aggregates: Vec<&'a dyn EventAggregate>,
    state: UnitOfWorkState,
}

impl<'a> UnitOfWork<'a> {
    /// Creates a unit of work that saves through `repositories`.
    pub fn new(dispatcher: Arc<dyn EventDispatcher>, repositories: Arc<RepositoryRegistry>) -> Self {
        Self {
            dispatcher,
            repositories: Some(repositories),
            aggregates: Vec::new(),
            state: UnitOfWorkState::Open,
        }
    }

    /// Creates a unit of work that only dispatches events.
    ///
    /// For callers that persist through some other channel.
    pub fn event_only(dispatcher: Arc<dyn EventDispatcher>) -> Self {
        Self {
            dispatcher,
            repositories: None,
            aggregates: Vec::new(),
            state: UnitOfWorkState::Open,
        }
    }

    /// Tracks an aggregate for the next commit.
    ///
    /// Registering the same instance twice has no effect.
    pub fn register(&mut self, aggregate: &'a dyn EventAggregate) -> Result<()> {
        if self.state.is_terminal() {
            return Err(UnitOfWorkError::AlreadyCompleted);
        }

        if self
            .aggregates
            .iter()
            .any(|tracked| std::ptr::addr_eq(*tracked, aggregate))
        {
            return Ok(());
        }

        self.aggregates.push(aggregate);
        Ok(())
    }

    /// Returns the uncommitted events of every tracked aggregate, in commit order.
    pub fn events(&self) -> Vec<SharedEvent> {
        self.aggregates
            .iter()
            .flat_map(|aggregate| aggregate.uncommitted_events())
            .collect()
    }

    pub fn state(&self) -> UnitOfWorkState {
        self.state
    }

    pub fn is_committed(&self) -> bool {
        self.state == UnitOfWorkState::Committed
    }

    /// Number of tracked aggregates.
    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// Saves every tracked aggregate, then dispatches their events.
    ///
    /// A failed save returns the error and leaves the unit open, with no
    /// event dispatched. Committing twice returns `AlreadyCommitted`.
    #[tracing::instrument(skip(self), fields(aggregates = self.aggregates.len(), event_only = self.repositories.is_none()))]
    pub fn commit(&mut self) -> Result<CommitSummary> {
        if let Some(err) = self.state.terminal_error() {
            return Err(err);
        }

        let start = Instant::now();
        let mut summary = CommitSummary::default();

        if let Some(repositories) = &self.repositories {
            for aggregate in &self.aggregates {
                let aggregate_type = aggregate.aggregate_type();
                match repositories.save(*aggregate) {
                    None => {
                        tracing::warn!(aggregate_type, "No repository registered");
                        return Err(UnitOfWorkError::RepositoryNotFound { aggregate_type });
                    }
                    Some(Err(source)) => {
                        let aggregate_id = aggregate.id().to_string();
                        tracing::warn!(
                            aggregate_type,
                            aggregate_id = %aggregate_id,
                            saved = summary.aggregates_persisted,
                            error = %source,
                            "Save failed, aborting commit"
                        );
                        return Err(UnitOfWorkError::Persistence {
                            aggregate_type,
                            aggregate_id,
                            source,
                        });
                    }
                    Some(Ok(())) => summary.aggregates_persisted += 1,
                }
            }
        }

        for event in self.events() {
            summary.events_dispatched += 1;
            if let Err(error) = self.dispatcher.dispatch(&event) {
                tracing::error!(
                    event_type = event.event_type(),
                    error = %error,
                    "Event dispatch failed after commit"
                );
                summary.failed_dispatches.push(DispatchFailure {
                    event_type: event.event_type(),
                    error,
                });
            }
        }

        for aggregate in &self.aggregates {
            aggregate.mark_events_as_committed();
        }
        self.state = UnitOfWorkState::Committed;

        metrics::counter!("unit_of_work_commits_total").increment(1);
        metrics::histogram!("unit_of_work_commit_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        tracing::info!(
            persisted = summary.aggregates_persisted,
            dispatched = summary.events_dispatched,
            failed = summary.failed_dispatches.len(),
            "Unit of work committed"
        );

        Ok(summary)
    }

    /// Discards the pending events of every tracked aggregate.
    ///
    /// Nothing is saved or dispatched. In-memory changes already applied to
    /// the aggregates stay applied.
    pub fn rollback(&mut self) -> Result<()> {
        if let Some(err) = self.state.terminal_error() {
            return Err(err);
        }

        for aggregate in &self.aggregates {
            aggregate.mark_events_as_committed();
        }
        self.state = UnitOfWorkState::RolledBack;

        metrics::counter!("unit_of_work_rollbacks_total").increment(1);
        tracing::debug!(aggregates = self.aggregates.len(), "Unit of work rolled back");

        Ok(())
    }
}

impl std::fmt::Debug for UnitOfWork<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("aggregates", &self.aggregates.len())
            .field("event_only", &self.repositories.is_none())
            .field("state", &self.state)
            .finish()
    }
}

/// Mints fresh units of work that share one dispatcher and repository set.
#[derive(Clone)]
pub struct UnitOfWorkFactory {
    dispatcher: Arc<dyn EventDispatcher>,
    repositories: Arc<RepositoryRegistry>,
}

impl UnitOfWorkFactory {
    pub fn new(dispatcher: Arc<dyn EventDispatcher>, repositories: Arc<RepositoryRegistry>) -> Self {
        Self {
            dispatcher,
            repositories,
        }
    }

    /// Creates a unit of work that saves and dispatches.
    pub fn create<'a>(&self) -> UnitOfWork<'a> {
        UnitOfWork::new(self.dispatcher.clone(), self.repositories.clone())
    }

    /// Creates a unit of work that only dispatches.
    pub fn create_event_only<'a>(&self) -> UnitOfWork<'a> {
        UnitOfWork::event_only(self.dispatcher.clone())
    }
}
