//! Filter stages — the shared "transform a sequence of events" capability.
//!
//! Every pipeline stage, whether it validates, deduplicates, or indexes,
//! implements the one [`EventFilter`] trait and is chained by explicit
//! composition in the [`crate::log::EventLog`].

use std::collections::HashSet;

use async_trait::async_trait;
use eventloom_core::error::EngineError;
use eventloom_core::event::Event;
use eventloom_core::time::StreamTimestamp;
use uuid::Uuid;

/// A pipeline stage transforming a sequence of candidate events.
///
/// Pre-filter stages may reject or transform events before persistence;
/// a pre-filter error aborts the whole apply. Post-filter stages observe
/// durably committed events for side effects; their errors are reported
/// but never roll back the write.
#[async_trait]
pub trait EventFilter: Send + Sync {
    /// Transforms the event sequence, returning the events that proceed
    /// to the next stage.
    ///
    /// # Errors
    ///
    /// Stage-specific; see the stage's documentation.
    async fn transform(&self, events: Vec<Event>) -> Result<Vec<Event>, EngineError>;
}

/// Adapter turning a plain function into a filter stage.
pub struct FnFilter<F>(F);

impl<F> FnFilter<F>
where
    F: Fn(Vec<Event>) -> Result<Vec<Event>, EngineError> + Send + Sync,
{
    /// Wraps the function as an [`EventFilter`].
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> EventFilter for FnFilter<F>
where
    F: Fn(Vec<Event>) -> Result<Vec<Event>, EngineError> + Send + Sync,
{
    async fn transform(&self, events: Vec<Event>) -> Result<Vec<Event>, EngineError> {
        (self.0)(events)
    }
}

/// A pre-filter dropping events that collide on `(aggregate_id,
/// timestamp)` within one candidate sequence. The first event at a given
/// position wins; later collisions are discarded before persistence and
/// never become visible.
#[derive(Debug, Default)]
pub struct DuplicateTimestampFilter;

#[async_trait]
impl EventFilter for DuplicateTimestampFilter {
    async fn transform(&self, events: Vec<Event>) -> Result<Vec<Event>, EngineError> {
        let mut seen: HashSet<(Uuid, StreamTimestamp)> = HashSet::new();
        Ok(events
            .into_iter()
            .filter(|event| seen.insert((event.aggregate_id, event.timestamp.clone())))
            .collect())
    }
}
