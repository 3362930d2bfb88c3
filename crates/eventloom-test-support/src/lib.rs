//! Shared test doubles for the eventloom event-sourcing runtime.

mod clock;
mod retriever;
mod sink;

pub use clock::FixedClock;
pub use retriever::{CountingRetriever, FailingRetriever, FlakyRetriever};
pub use sink::RecordingSink;
