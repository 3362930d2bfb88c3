//! Event bus — write-path composition and post-commit fan-out.

use std::sync::Arc;

use eventloom_core::error::EngineError;
use eventloom_core::event::Event;
use eventloom_core::store::EventSink;

use crate::batch::EventBatch;
use crate::log::EventLog;

/// Hands out event batches and commits them through the log pipeline,
/// then notifies subscribers with the committed events.
///
/// Fan-out happens strictly after durable persistence: a sink never
/// observes events that failed to commit. Cloning the bus shares the
/// underlying log; [`EventBus::notifying`] produces a copy with an
/// additional subscriber, leaving the write contract unchanged.
#[derive(Clone)]
pub struct EventBus {
    log: Arc<EventLog>,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventBus {
    /// Creates a bus committing through the given log, with no
    /// subscribers.
    #[must_use]
    pub fn new(log: Arc<EventLog>) -> Self {
        Self {
            log,
            sinks: Vec::new(),
        }
    }

    /// Returns a copy of this bus that additionally streams every
    /// completed batch's events to the given sink.
    #[must_use]
    pub fn notifying(&self, sink: Arc<dyn EventSink>) -> Self {
        let mut sinks = self.sinks.clone();
        sinks.push(sink);
        Self {
            log: Arc::clone(&self.log),
            sinks,
        }
    }

    /// Starts a fresh batch. The caller owns it exclusively until
    /// completion.
    #[must_use]
    pub fn start_batch(&self) -> EventBatch {
        EventBatch::new()
    }

    /// Completes a batch: hands it to the log pipeline as a single unit,
    /// then notifies every subscriber with the accepted events.
    ///
    /// Blocks on the backing store; callers should treat completion as
    /// bounded by store latency. Completing an empty batch is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error if the write fails; none of the batch's
    /// events are observable afterward and no sink is notified.
    pub async fn complete(&self, batch: EventBatch) -> Result<Vec<Event>, EngineError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let batch_id = batch.id();
        let accepted = self.log.apply(batch.into_events()).await?;
        tracing::info!(%batch_id, events = accepted.len(), "batch committed");
        for sink in &self.sinks {
            sink.accept(&accepted).await;
        }
        Ok(accepted)
    }

    /// Composes start → populate → complete as one operation.
    ///
    /// If `populate` fails, the batch is dropped uncommitted and none of
    /// its events ever become visible.
    ///
    /// # Errors
    ///
    /// Returns the populate error, or the pipeline error if the commit
    /// fails.
    pub async fn dispatch<F>(&self, populate: F) -> Result<Vec<Event>, EngineError>
    where
        F: FnOnce(&mut EventBatch) -> Result<(), EngineError>,
    {
        let mut batch = self.start_batch();
        populate(&mut batch)?;
        self.complete(batch).await
    }
}
