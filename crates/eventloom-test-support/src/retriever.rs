//! Test retrievers — `EventRetriever` doubles for the caching layer.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use eventloom_core::error::EngineError;
use eventloom_core::event::Event;
use eventloom_core::store::EventRetriever;
use uuid::Uuid;

/// A retriever serving a fixed event map while counting every `fetch`
/// call. An optional artificial delay widens the race window for
/// single-flight tests.
#[derive(Debug, Default)]
pub struct CountingRetriever {
    events: Mutex<HashMap<Uuid, Vec<Event>>>,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingRetriever {
    /// Creates a retriever serving the given events per aggregate.
    #[must_use]
    pub fn new(events: HashMap<Uuid, Vec<Event>>) -> Self {
        Self {
            events: Mutex::new(events),
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Adds an artificial delay before every fetch completes.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns how many times `fetch` has been called.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventRetriever for CountingRetriever {
    async fn fetch(&self, aggregate_id: Uuid) -> Result<Vec<Event>, EngineError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let events = self.events.lock().unwrap();
        Ok(events.get(&aggregate_id).cloned().unwrap_or_default())
    }
}

/// A retriever that always fails.
#[derive(Debug, Default)]
pub struct FailingRetriever;

#[async_trait]
impl EventRetriever for FailingRetriever {
    async fn fetch(&self, aggregate_id: Uuid) -> Result<Vec<Event>, EngineError> {
        Err(EngineError::Retrieval {
            aggregate_id,
            message: "connection refused".to_owned(),
        })
    }
}

/// A retriever that fails a configured number of times, then serves the
/// configured events. Used to verify that a failed retrieval does not
/// poison the cache.
#[derive(Debug)]
pub struct FlakyRetriever {
    events: Vec<Event>,
    remaining_failures: AtomicUsize,
    fetches: AtomicUsize,
}

impl FlakyRetriever {
    /// Creates a retriever that fails the first `failures` fetches.
    #[must_use]
    pub fn new(failures: usize, events: Vec<Event>) -> Self {
        Self {
            events,
            remaining_failures: AtomicUsize::new(failures),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Returns how many times `fetch` has been called.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventRetriever for FlakyRetriever {
    async fn fetch(&self, aggregate_id: Uuid) -> Result<Vec<Event>, EngineError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(EngineError::Retrieval {
                aggregate_id,
                message: "transient store failure".to_owned(),
            });
        }
        Ok(self.events.clone())
    }
}
