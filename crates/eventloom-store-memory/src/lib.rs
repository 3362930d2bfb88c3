//! In-memory implementations of the eventloom storage contracts.
//!
//! These are the reference collaborators: an append-only event store with
//! natural (descending-insertion) fetch order, an idempotent catalogue
//! store, and a command audit log. Events round-trip through their
//! `serde_json` representation at the store boundary, exercising the same
//! codec contract a document store would.

mod catalogue;
mod command_audit;
mod event_store;

pub use catalogue::MemoryCatalogueStore;
pub use command_audit::MemoryCommandAudit;
pub use event_store::MemoryEventStore;
