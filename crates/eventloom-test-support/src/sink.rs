//! Test sink — an `EventSink` that records every delivered batch.

use std::sync::Mutex;

use async_trait::async_trait;
use eventloom_core::event::Event;
use eventloom_core::store::EventSink;

/// A sink recording the events of every committed batch it is notified
/// with, in delivery order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<Vec<Event>>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every delivered batch.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn delivered(&self) -> Vec<Vec<Event>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn accept(&self, events: &[Event]) {
        self.batches.lock().unwrap().push(events.to_vec());
    }
}
