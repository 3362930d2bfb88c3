//! Eventloom Engine — the event batching, dispatch, and caching engine.
//!
//! Write path: an [`batch::EventBatch`] is populated by a single producer,
//! handed atomically to the [`log::EventLog`] filter pipeline (pre-filter,
//! durable append, post-filter), then fanned out to subscribers by the
//! [`bus::EventBus`]. Read path: a [`sourcing::CachingEventSource`]
//! retrieves each aggregate's stream at most once and replays it in either
//! temporal direction. Commands flow through the audited
//! [`command_log::CommandLog`] before being turned into events.

pub mod batch;
pub mod bus;
pub mod catalogue;
pub mod command_log;
pub mod filter;
pub mod log;
pub mod sourcing;
