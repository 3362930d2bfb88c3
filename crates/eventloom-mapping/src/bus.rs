//! Typed write path — dispatching batches of typed calls through an
//! event bus via a dispatch table.

use std::sync::Arc;

use eventloom_core::error::EngineError;
use eventloom_core::event::Event;
use eventloom_engine::batch::EventBatch;
use eventloom_engine::bus::EventBus;

use crate::table::{DispatchTable, EventCall};

/// An event bus front-end that accepts typed calls, encoding each
/// through the dispatch table before it enters the batch.
pub struct DispatchingEventBus<C: EventCall> {
    table: Arc<DispatchTable<C>>,
    bus: EventBus,
}

impl<C: EventCall> DispatchingEventBus<C> {
    /// Wraps a bus with a table for one aggregate type.
    #[must_use]
    pub fn new(table: Arc<DispatchTable<C>>, bus: EventBus) -> Self {
        Self { table, bus }
    }

    /// Opens a typed batch, hands it to `populate`, and commits it.
    ///
    /// Encoding happens eagerly inside `populate`, so a call that does
    /// not fit the table aborts the batch before anything is persisted.
    ///
    /// # Errors
    ///
    /// Returns the populate function's error with nothing committed, or
    /// `EngineError::Append` if the commit itself fails.
    pub async fn dispatch<F>(&self, populate: F) -> Result<Vec<Event>, EngineError>
    where
        F: FnOnce(&mut TypedBatch<'_, C>) -> Result<(), EngineError>,
    {
        let table = Arc::clone(&self.table);
        self.bus
            .dispatch(move |batch| {
                let mut typed = TypedBatch {
                    table: &table,
                    batch,
                };
                populate(&mut typed)
            })
            .await
    }
}

/// A batch view that accepts typed calls instead of raw event records.
pub struct TypedBatch<'a, C: EventCall> {
    table: &'a DispatchTable<C>,
    batch: &'a mut EventBatch,
}

impl<C: EventCall> TypedBatch<'_, C> {
    /// Encodes the call and stages the resulting event in the batch.
    ///
    /// # Errors
    ///
    /// Returns the table's encoding error; the batch keeps whatever was
    /// staged before, but a propagated error aborts the whole dispatch.
    pub fn emit(&mut self, call: &C) -> Result<(), EngineError> {
        let event = self.table.encode(call)?;
        self.batch.accept(event);
        Ok(())
    }

    /// Returns the number of events staged so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    /// Returns `true` if nothing has been staged yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}
