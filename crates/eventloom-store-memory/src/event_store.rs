//! In-memory append-only event store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use eventloom_core::error::EngineError;
use eventloom_core::event::Event;
use eventloom_core::store::{EventRetriever, EventStore};
use eventloom_core::time::StreamTimestamp;
use uuid::Uuid;

/// An in-memory append-only event store.
///
/// Each aggregate's stream holds the stored `serde_json` representation
/// of its events in insertion order; `fetch` returns them most-recent
/// first. Appends are all-or-nothing: the whole batch is validated
/// before anything is stored. Conflicting appends to the same aggregate
/// (timestamp collisions) are rejected, honoring the serialization
/// obligation the contracts place on the store.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    streams: Mutex<HashMap<Uuid, Vec<serde_json::Value>>>,
}

impl MemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored events across all streams.
    #[must_use]
    pub fn stored_count(&self) -> usize {
        self.streams
            .lock()
            .map_or(0, |streams| streams.values().map(Vec::len).sum())
    }
}

fn decode_stored(value: &serde_json::Value) -> Result<Event, EngineError> {
    Ok(serde_json::from_value(value.clone())?)
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn append(&self, events: Vec<Event>) -> Result<(), EngineError> {
        let mut streams = self
            .streams
            .lock()
            .map_err(|_| EngineError::Append("store lock poisoned".to_owned()))?;

        // Validate the whole batch before committing anything.
        let mut incoming: Vec<(Uuid, StreamTimestamp, serde_json::Value)> = Vec::new();
        for event in &events {
            let existing = streams.get(&event.aggregate_id);
            let collides_stored = existing.is_some_and(|stream| {
                stream.iter().any(|stored| {
                    decode_stored(stored)
                        .is_ok_and(|decoded| decoded.timestamp == event.timestamp)
                })
            });
            let collides_incoming = incoming.iter().any(|(id, timestamp, _)| {
                *id == event.aggregate_id && *timestamp == event.timestamp
            });
            if collides_stored || collides_incoming {
                return Err(EngineError::Append(format!(
                    "timestamp collision in stream of aggregate {}",
                    event.aggregate_id
                )));
            }
            incoming.push((
                event.aggregate_id,
                event.timestamp.clone(),
                serde_json::to_value(event)?,
            ));
        }

        for (aggregate_id, _, stored) in incoming {
            streams.entry(aggregate_id).or_default().push(stored);
        }
        Ok(())
    }
}

#[async_trait]
impl EventRetriever for MemoryEventStore {
    async fn fetch(&self, aggregate_id: Uuid) -> Result<Vec<Event>, EngineError> {
        let streams = self.streams.lock().map_err(|_| EngineError::Retrieval {
            aggregate_id,
            message: "store lock poisoned".to_owned(),
        })?;
        let Some(stream) = streams.get(&aggregate_id) else {
            return Ok(Vec::new());
        };
        // Natural order is descending insertion (most recent first).
        stream.iter().rev().map(decode_stored).collect()
    }
}
