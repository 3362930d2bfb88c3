//! Typed read path — replaying stored events back into typed calls
//! through a dispatch table.

use std::sync::Arc;

use eventloom_core::error::EngineError;
use eventloom_core::event::Event;
use eventloom_engine::sourcing::{CachingEventSource, EventReplay, PreloadedSource};
use uuid::Uuid;

use crate::table::{DispatchTable, EventCall};

/// An event source front-end that decodes replayed events into typed
/// calls for one aggregate type.
pub struct DispatchingEventSource<C: EventCall> {
    table: Arc<DispatchTable<C>>,
    source: CachingEventSource,
}

impl<C: EventCall> DispatchingEventSource<C> {
    /// Wraps a caching source with a table for one aggregate type.
    #[must_use]
    pub fn new(table: Arc<DispatchTable<C>>, source: CachingEventSource) -> Self {
        Self { table, source }
    }

    /// Opens a typed replay over one aggregate's events, in the natural
    /// (most-recent-first) order.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Retrieval` if the fetch fails.
    pub async fn replaying(&self, aggregate_id: Uuid) -> Result<TypedReplay<C>, EngineError> {
        Ok(TypedReplay::new(
            Arc::clone(&self.table),
            self.source.replaying(aggregate_id).await?,
            aggregate_id,
        ))
    }

    /// Eagerly caches the given ids and returns a typed view scoped to
    /// exactly those ids.
    ///
    /// # Errors
    ///
    /// Returns the first retrieval failure.
    pub async fn preload(
        &self,
        aggregate_ids: &[Uuid],
    ) -> Result<DispatchingPreloaded<C>, EngineError> {
        Ok(DispatchingPreloaded {
            table: Arc::clone(&self.table),
            preloaded: self.source.preload(aggregate_ids).await?,
        })
    }
}

/// A typed view over a preloaded id set.
pub struct DispatchingPreloaded<C: EventCall> {
    table: Arc<DispatchTable<C>>,
    preloaded: PreloadedSource,
}

impl<C: EventCall> DispatchingPreloaded<C> {
    /// Opens a typed replay for one preloaded aggregate.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotPreloaded` if the id is outside this
    /// view's scope.
    pub async fn replaying(&self, aggregate_id: Uuid) -> Result<TypedReplay<C>, EngineError> {
        Ok(TypedReplay::new(
            Arc::clone(&self.table),
            self.preloaded.replaying(aggregate_id).await?,
            aggregate_id,
        ))
    }
}

/// A summary of one typed replay: how many calls reached the handler,
/// and the decode failures tolerated along the way.
///
/// In the default lenient mode an undecodable event is skipped and its
/// error collected here, so a stream with events from a newer schema
/// still replays the events this table understands.
#[derive(Debug)]
pub struct ReplayReport {
    /// Calls delivered to the handler.
    pub delivered: usize,
    /// Decode failures skipped over.
    pub failures: Vec<EngineError>,
}

impl ReplayReport {
    /// Returns `true` if every event decoded and was delivered.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A single-pass typed replay over one aggregate's events.
pub struct TypedReplay<C: EventCall> {
    table: Arc<DispatchTable<C>>,
    replay: EventReplay,
    aggregate_id: Uuid,
    strict: bool,
}

impl<C: EventCall> std::fmt::Debug for TypedReplay<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedReplay")
            .field("table", &self.table)
            .field("replay", &self.replay)
            .field("aggregate_id", &self.aggregate_id)
            .field("strict", &self.strict)
            .finish()
    }
}

impl<C: EventCall> TypedReplay<C> {
    fn new(table: Arc<DispatchTable<C>>, replay: EventReplay, aggregate_id: Uuid) -> Self {
        Self {
            table,
            replay,
            aggregate_id,
            strict: false,
        }
    }

    /// Switches the replay to oldest-first order.
    #[must_use]
    pub fn in_ascending_order(mut self) -> Self {
        self.replay = self.replay.in_ascending_order();
        self
    }

    /// Switches the replay back to most-recent-first order.
    #[must_use]
    pub fn in_descending_order(mut self) -> Self {
        self.replay = self.replay.in_descending_order();
        self
    }

    /// Switches the replay to strict mode: the first decode failure
    /// aborts, and the stream's lifecycle shape is verified before any
    /// call is delivered.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Returns the number of events the replay will visit.
    #[must_use]
    pub fn len(&self) -> usize {
        self.replay.len()
    }

    /// Returns `true` if the replay has no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.replay.is_empty()
    }

    /// Consumes the replay, decoding each event and driving the typed
    /// call through the handler in replay order.
    ///
    /// # Errors
    ///
    /// In lenient mode only a handler-independent failure is impossible;
    /// decode failures are collected into the report. In strict mode the
    /// first decode failure is returned as an error, and a non-empty
    /// stream whose chronological shape is malformed is rejected with
    /// `EngineError::StreamIntegrity` before anything is delivered.
    pub fn collect_all<F: FnMut(C)>(self, mut handler: F) -> Result<ReplayReport, EngineError> {
        let ascending = self.replay.is_ascending();
        let Self {
            table,
            replay,
            aggregate_id,
            strict,
        } = self;
        let events = replay.into_events();
        if strict {
            Self::verify_shape(aggregate_id, &events, ascending)?;
        }

        let mut delivered = 0usize;
        let mut failures = Vec::new();
        for event in &events {
            match table.decode(event) {
                Ok(call) => {
                    handler(call);
                    delivered += 1;
                }
                Err(error) if strict => return Err(error),
                Err(error) => {
                    tracing::warn!(aggregate_id = %aggregate_id, %error, "skipping undecodable event");
                    failures.push(error);
                }
            }
        }
        Ok(ReplayReport {
            delivered,
            failures,
        })
    }

    /// Checks the chronological lifecycle shape: one initial event at
    /// the start, at most one terminal event at the end.
    fn verify_shape(
        aggregate_id: Uuid,
        events: &[Event],
        ascending: bool,
    ) -> Result<(), EngineError> {
        if events.is_empty() {
            return Ok(());
        }
        let chronological: Vec<&Event> = if ascending {
            events.iter().collect()
        } else {
            events.iter().rev().collect()
        };
        if !chronological[0].is_initial() {
            return Err(Self::integrity(
                aggregate_id,
                "stream does not begin with an initial event",
            ));
        }
        if chronological.iter().filter(|e| e.is_initial()).count() > 1 {
            return Err(Self::integrity(
                aggregate_id,
                "stream has more than one initial event",
            ));
        }
        if let Some(position) = chronological.iter().position(|e| e.is_terminal()) {
            if position != chronological.len() - 1 {
                return Err(Self::integrity(
                    aggregate_id,
                    "stream continues past a terminal event",
                ));
            }
        }
        Ok(())
    }

    fn integrity(aggregate_id: Uuid, message: &str) -> EngineError {
        EngineError::StreamIntegrity {
            aggregate_id,
            message: message.to_owned(),
        }
    }
}
