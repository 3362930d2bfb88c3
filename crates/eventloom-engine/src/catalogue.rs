//! Aggregate catalogue — the secondary index of aggregate identities.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use eventloom_core::error::EngineError;
use eventloom_core::event::Event;
use eventloom_core::store::CatalogueStore;
use uuid::Uuid;

use crate::filter::EventFilter;

/// Whether a terminal event removes its aggregate from the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminalPolicy {
    /// Terminated aggregates stay listed.
    #[default]
    Retain,
    /// A terminal event deregisters the aggregate.
    Remove,
}

/// A post-filter stage registering every committed event's
/// `(aggregate_type, aggregate_id)` in the catalogue store.
///
/// Registration is idempotent by the store contract. Wire it into the
/// log with [`crate::log::EventLog::with_post_filter`] so it only ever
/// observes durably committed events.
pub struct AggregateCatalogue {
    store: Arc<dyn CatalogueStore>,
    policy: TerminalPolicy,
}

impl AggregateCatalogue {
    /// Creates a catalogue with the default retain-on-terminal policy.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogueStore>) -> Self {
        Self::with_policy(store, TerminalPolicy::default())
    }

    /// Creates a catalogue with an explicit terminal policy.
    #[must_use]
    pub fn with_policy(store: Arc<dyn CatalogueStore>, policy: TerminalPolicy) -> Self {
        Self { store, policy }
    }

    /// Lists all known aggregate ids for the given type.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Catalogue` if the lookup fails.
    pub async fn ids_for(&self, aggregate_type: &str) -> Result<BTreeSet<Uuid>, EngineError> {
        self.store.list(aggregate_type).await
    }
}

#[async_trait]
impl EventFilter for AggregateCatalogue {
    async fn transform(&self, events: Vec<Event>) -> Result<Vec<Event>, EngineError> {
        for event in &events {
            if event.is_terminal() && self.policy == TerminalPolicy::Remove {
                self.store
                    .remove(&event.aggregate_type, event.aggregate_id)
                    .await?;
            } else {
                self.store
                    .add(&event.aggregate_type, event.aggregate_id)
                    .await?;
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use eventloom_core::event::{Event, EventCharacteristic, Payload, VersionedName};
    use eventloom_core::time::StreamTimestamp;
    use eventloom_store_memory::MemoryCatalogueStore;
    use uuid::Uuid;

    use super::{AggregateCatalogue, TerminalPolicy};
    use crate::filter::EventFilter;

    fn event(aggregate_id: Uuid, characteristic: EventCharacteristic, millis: i64) -> Event {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        Event::new(
            "person",
            aggregate_id,
            VersionedName::of("anything"),
            characteristic,
            StreamTimestamp::of("test", start).plus_millis(millis),
            Payload::new(),
        )
    }

    #[tokio::test]
    async fn test_registers_each_committed_event_idempotently() {
        // Arrange
        let store = Arc::new(MemoryCatalogueStore::new());
        let catalogue = AggregateCatalogue::new(Arc::clone(&store) as _);
        let id = Uuid::new_v4();

        // Act: two events for the same aggregate.
        catalogue
            .transform(vec![
                event(id, EventCharacteristic::Initial, 0),
                event(id, EventCharacteristic::Normal, 1),
            ])
            .await
            .unwrap();

        // Assert: one membership entry.
        let ids = catalogue.ids_for("person").await.unwrap();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains(&id));
    }

    #[tokio::test]
    async fn test_retain_policy_keeps_terminated_aggregates_listed() {
        // Arrange
        let store = Arc::new(MemoryCatalogueStore::new());
        let catalogue =
            AggregateCatalogue::with_policy(Arc::clone(&store) as _, TerminalPolicy::Retain);
        let id = Uuid::new_v4();

        // Act
        catalogue
            .transform(vec![
                event(id, EventCharacteristic::Initial, 0),
                event(id, EventCharacteristic::Terminal, 1),
            ])
            .await
            .unwrap();

        // Assert
        assert!(catalogue.ids_for("person").await.unwrap().contains(&id));
    }

    #[tokio::test]
    async fn test_remove_policy_deregisters_on_terminal_event() {
        // Arrange
        let store = Arc::new(MemoryCatalogueStore::new());
        let catalogue =
            AggregateCatalogue::with_policy(Arc::clone(&store) as _, TerminalPolicy::Remove);
        let id = Uuid::new_v4();

        // Act
        catalogue
            .transform(vec![
                event(id, EventCharacteristic::Initial, 0),
                event(id, EventCharacteristic::Terminal, 1),
            ])
            .await
            .unwrap();

        // Assert
        assert!(!catalogue.ids_for("person").await.unwrap().contains(&id));
    }
}
