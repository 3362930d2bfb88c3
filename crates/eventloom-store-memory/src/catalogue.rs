//! In-memory catalogue store.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use eventloom_core::error::EngineError;
use eventloom_core::store::CatalogueStore;
use uuid::Uuid;

/// An in-memory catalogue store: `aggregate_type → set of aggregate ids`.
#[derive(Debug, Default)]
pub struct MemoryCatalogueStore {
    entries: Mutex<HashMap<String, BTreeSet<Uuid>>>,
}

impl MemoryCatalogueStore {
    /// Creates an empty catalogue store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> EngineError {
    EngineError::Catalogue("catalogue lock poisoned".to_owned())
}

#[async_trait]
impl CatalogueStore for MemoryCatalogueStore {
    async fn add(&self, aggregate_type: &str, aggregate_id: Uuid) -> Result<(), EngineError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries
            .entry(aggregate_type.to_owned())
            .or_default()
            .insert(aggregate_id);
        Ok(())
    }

    async fn remove(&self, aggregate_type: &str, aggregate_id: Uuid) -> Result<(), EngineError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        if let Some(ids) = entries.get_mut(aggregate_type) {
            ids.remove(&aggregate_id);
        }
        Ok(())
    }

    async fn list(&self, aggregate_type: &str) -> Result<BTreeSet<Uuid>, EngineError> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(aggregate_type).cloned().unwrap_or_default())
    }
}
