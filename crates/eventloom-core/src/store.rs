//! Storage collaborator contracts.
//!
//! These traits specify the external collaborators at their interface
//! boundary only; no wire format or storage technology is implied. The
//! in-memory reference implementations live in `eventloom-store-memory`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::command::{Command, CommandResult};
use crate::error::EngineError;
use crate::event::Event;

/// An append-only event store.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events durably, preserving the presented order within each
    /// aggregate's stream. The store is responsible for serializing or
    /// rejecting conflicting concurrent appends to the same aggregate;
    /// the engine does not implement optimistic concurrency control.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Append` if the write fails; none of the
    /// events are durable in that case.
    async fn append(&self, events: Vec<Event>) -> Result<(), EngineError>;
}

/// Retrieves the full event sequence for one aggregate.
#[async_trait]
pub trait EventRetriever: Send + Sync {
    /// Fetches all events for the aggregate in the store's natural order,
    /// which is most-recent-first (descending insertion).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Retrieval` if the fetch fails.
    async fn fetch(&self, aggregate_id: Uuid) -> Result<Vec<Event>, EngineError>;
}

/// The secondary index of aggregate identities by type.
#[async_trait]
pub trait CatalogueStore: Send + Sync {
    /// Registers an aggregate id under its type. Idempotent: registering
    /// an already-known id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Catalogue` if the update fails.
    async fn add(&self, aggregate_type: &str, aggregate_id: Uuid) -> Result<(), EngineError>;

    /// Deregisters an aggregate id. Removing an unknown id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Catalogue` if the update fails.
    async fn remove(&self, aggregate_type: &str, aggregate_id: Uuid) -> Result<(), EngineError>;

    /// Lists all known aggregate ids for the given type.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Catalogue` if the lookup fails.
    async fn list(&self, aggregate_type: &str) -> Result<BTreeSet<Uuid>, EngineError>;
}

/// The audit log behind the command pipeline.
#[async_trait]
pub trait CommandAudit: Send + Sync {
    /// Records an identified command before its execution.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Audit` if the write fails.
    async fn record_command(&self, command: &Command) -> Result<(), EngineError>;

    /// Records the outcome of a command's execution, including failures.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Audit` if the write fails.
    async fn record_result(&self, result: &CommandResult) -> Result<(), EngineError>;
}

/// A downstream sink for committed event batches (e.g. projections).
///
/// Sinks are notified strictly after durable persistence; delivery is
/// at-least-once from the bus's perspective. Failure handling is the
/// sink's own concern.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Accepts the events of one committed batch.
    async fn accept(&self, events: &[Event]);
}
