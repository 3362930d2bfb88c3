//! Event log — the persistence boundary with its filter pipeline.

use std::sync::Arc;

use eventloom_core::error::EngineError;
use eventloom_core::event::Event;
use eventloom_core::store::EventStore;
use tracing::instrument;

use crate::filter::EventFilter;

/// The transform from candidate events to accepted, durable events.
///
/// Pre-filter stages run before persistence and may reject or transform
/// events; a rejected event is never durable and never later visible.
/// Post-filter stages run after a successful append and observe the
/// committed events for side effects (e.g. feeding the catalogue); their
/// failures are reported but never roll back the write, so the store and
/// its secondary indexes may be momentarily inconsistent.
pub struct EventLog {
    store: Arc<dyn EventStore>,
    pre_filters: Vec<Arc<dyn EventFilter>>,
    post_filters: Vec<Arc<dyn EventFilter>>,
}

impl EventLog {
    /// Creates a log over the given store with no filter stages.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            pre_filters: Vec::new(),
            post_filters: Vec::new(),
        }
    }

    /// Appends a pre-filter stage; stages run in registration order.
    #[must_use]
    pub fn with_pre_filter(mut self, filter: Arc<dyn EventFilter>) -> Self {
        self.pre_filters.push(filter);
        self
    }

    /// Appends a post-filter stage; stages run in registration order.
    #[must_use]
    pub fn with_post_filter(mut self, filter: Arc<dyn EventFilter>) -> Self {
        self.post_filters.push(filter);
        self
    }

    /// Applies candidate events through the pipeline, returning the
    /// accepted events.
    ///
    /// Per-aggregate presentation order is preserved through to the
    /// store, which appends in that order.
    ///
    /// # Errors
    ///
    /// Returns the first pre-filter error (nothing is persisted), or
    /// `EngineError::Append` if the store rejects the write (none of the
    /// batch's events are observable afterward).
    #[instrument(skip(self, events), fields(candidates = events.len()))]
    pub async fn apply(&self, mut events: Vec<Event>) -> Result<Vec<Event>, EngineError> {
        for filter in &self.pre_filters {
            events = filter.transform(events).await?;
        }
        if events.is_empty() {
            return Ok(events);
        }

        self.store.append(events.clone()).await?;

        for filter in &self.post_filters {
            match filter.transform(events.clone()).await {
                Ok(observed) => events = observed,
                Err(error) => {
                    tracing::warn!(%error, "post-filter failed after durable append");
                }
            }
        }
        Ok(events)
    }
}
