//! Event sourcing read path — caching, single-flight retrieval, replay.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use eventloom_core::error::EngineError;
use eventloom_core::event::Event;
use eventloom_core::store::EventRetriever;
use uuid::Uuid;

/// One aggregate's fetch cell: unset while absent or in flight, set once
/// the retrieval resolved. Waiters queue on the cell, so concurrent first
/// requests collapse into one retriever call.
type FetchCell = Arc<tokio::sync::OnceCell<Arc<Vec<Event>>>>;

/// An event source wrapping a retriever with an instance-owned cache.
///
/// Each aggregate's stream is fetched at most once and held immutably in
/// descending timestamp order. Concurrent requests for the same uncached
/// aggregate collapse into a single underlying retrieval, with every
/// caller observing the same resolved sequence. A failed retrieval leaves
/// the entry absent, so a later request retries; the cache is never
/// poisoned. The cache lives as long as this source (clones share it) and
/// can be dropped explicitly via [`CachingEventSource::invalidate`].
#[derive(Clone)]
pub struct CachingEventSource {
    retriever: Arc<dyn EventRetriever>,
    cells: Arc<Mutex<HashMap<Uuid, FetchCell>>>,
}

impl CachingEventSource {
    /// Creates a source retrieving through the given retriever, with an
    /// empty cache.
    #[must_use]
    pub fn new(retriever: Arc<dyn EventRetriever>) -> Self {
        Self {
            retriever,
            cells: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn cell_for(&self, aggregate_id: Uuid) -> FetchCell {
        self.cells
            .lock()
            .expect("cache lock poisoned")
            .entry(aggregate_id)
            .or_default()
            .clone()
    }

    /// Returns the aggregate's cached-or-fetched events in descending
    /// timestamp order.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Retrieval` if the fetch fails; the cache
    /// entry reverts to absent and a later call retries.
    pub async fn events_for(&self, aggregate_id: Uuid) -> Result<Arc<Vec<Event>>, EngineError> {
        let cell = self.cell_for(aggregate_id);
        let events = cell
            .get_or_try_init(|| async {
                tracing::debug!(%aggregate_id, "cache miss, fetching stream");
                let mut events = self.retriever.fetch(aggregate_id).await?;
                events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                Ok::<_, EngineError>(Arc::new(events))
            })
            .await?;
        Ok(Arc::clone(events))
    }

    /// Opens a replay handle over the aggregate's events, defaulting to
    /// the natural (most-recent-first) order.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Retrieval` if the fetch fails.
    pub async fn replaying(&self, aggregate_id: Uuid) -> Result<EventReplay, EngineError> {
        Ok(EventReplay::new(self.events_for(aggregate_id).await?))
    }

    /// Eagerly retrieves every id not already cached, returning a view
    /// scoped to exactly those ids.
    ///
    /// # Errors
    ///
    /// Returns the first retrieval failure; ids fetched before the
    /// failure stay cached.
    pub async fn preload(&self, aggregate_ids: &[Uuid]) -> Result<PreloadedSource, EngineError> {
        for &aggregate_id in aggregate_ids {
            self.events_for(aggregate_id).await?;
        }
        Ok(PreloadedSource {
            source: self.clone(),
            ids: aggregate_ids.iter().copied().collect(),
        })
    }

    /// Drops the cache entry for one aggregate; the next request fetches
    /// anew.
    ///
    /// # Panics
    ///
    /// Panics if the cache lock is poisoned.
    pub fn invalidate(&self, aggregate_id: Uuid) {
        self.cells
            .lock()
            .expect("cache lock poisoned")
            .remove(&aggregate_id);
    }

    /// Drops every cache entry.
    ///
    /// # Panics
    ///
    /// Panics if the cache lock is poisoned.
    pub fn invalidate_all(&self) {
        self.cells.lock().expect("cache lock poisoned").clear();
    }
}

/// A single-pass, finite, non-restartable view over one replay's events.
///
/// Consumed by value: re-replaying requires a new handle from the source.
/// Defaults to descending (most-recent-first) order;
/// [`EventReplay::in_ascending_order`] yields the reversed view of the
/// same underlying sequence.
#[derive(Debug)]
pub struct EventReplay {
    events: Arc<Vec<Event>>,
    ascending: bool,
}

impl EventReplay {
    pub(crate) fn new(events: Arc<Vec<Event>>) -> Self {
        Self {
            events,
            ascending: false,
        }
    }

    /// Switches the replay to oldest-first order.
    #[must_use]
    pub fn in_ascending_order(mut self) -> Self {
        self.ascending = true;
        self
    }

    /// Switches the replay back to most-recent-first order.
    #[must_use]
    pub fn in_descending_order(mut self) -> Self {
        self.ascending = false;
        self
    }

    /// Returns `true` if the replay will deliver oldest-first.
    #[must_use]
    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    /// Returns the number of events the replay will deliver.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if the replay has no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Consumes the replay, driving each event through the handler in
    /// replay order.
    pub fn collect_all<F: FnMut(&Event)>(self, mut handler: F) {
        if self.ascending {
            for event in self.events.iter().rev() {
                handler(event);
            }
        } else {
            for event in self.events.iter() {
                handler(event);
            }
        }
    }

    /// Consumes the replay into an owned event sequence in replay order.
    #[must_use]
    pub fn into_events(self) -> Vec<Event> {
        if self.ascending {
            self.events.iter().rev().cloned().collect()
        } else {
            self.events.as_ref().clone()
        }
    }
}

/// A view over a caching source scoped to an explicitly preloaded id set.
pub struct PreloadedSource {
    source: CachingEventSource,
    ids: HashSet<Uuid>,
}

impl PreloadedSource {
    /// Opens a replay handle for one preloaded aggregate. Served from the
    /// cache; no retrieval is triggered.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotPreloaded` if the id is outside this
    /// view's scope.
    pub async fn replaying(&self, aggregate_id: Uuid) -> Result<EventReplay, EngineError> {
        if !self.ids.contains(&aggregate_id) {
            return Err(EngineError::NotPreloaded(aggregate_id));
        }
        self.source.replaying(aggregate_id).await
    }

    /// Opens a replay merging every preloaded stream into one sequence,
    /// ordered by the temporal comparator with cross-stream ties broken
    /// by aggregate id so the merge is reproducible.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Retrieval` if a stream has to be re-fetched
    /// and the fetch fails.
    pub async fn replaying_merged(&self) -> Result<EventReplay, EngineError> {
        let mut merged: Vec<Event> = Vec::new();
        for &aggregate_id in &self.ids {
            merged.extend(self.source.events_for(aggregate_id).await?.iter().cloned());
        }
        merged.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.aggregate_id.cmp(&a.aggregate_id))
        });
        Ok(EventReplay::new(Arc::new(merged)))
    }

    /// Returns the ids this view is scoped to.
    #[must_use]
    pub fn ids(&self) -> &HashSet<Uuid> {
        &self.ids
    }
}
