//! Event batches — the unit of atomic commitment.

use eventloom_core::event::Event;
use uuid::Uuid;

/// A transient, single-producer accumulator of events.
///
/// A batch is owned exclusively by the code populating it: mutation goes
/// through `&mut self`, and completion consumes the batch by value, which
/// is the single synchronization point handing ownership to the log
/// pipeline. Batches are never persisted themselves — they are the unit
/// of commitment.
#[derive(Debug)]
pub struct EventBatch {
    id: Uuid,
    events: Vec<Event>,
}

impl EventBatch {
    pub(crate) fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            events: Vec::new(),
        }
    }

    /// Returns the batch identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Adds an event to the batch.
    pub fn accept(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Returns the events accumulated so far, in presentation order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Returns the number of accumulated events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if no events have been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub(crate) fn into_events(self) -> Vec<Event> {
        self.events
    }
}
