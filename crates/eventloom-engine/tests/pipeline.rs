//! End-to-end pipeline tests: batch → pre-filter → store → catalogue →
//! sink, then read back through the caching source.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use eventloom_core::event::{Event, EventCharacteristic, Payload, VersionedName};
use eventloom_core::time::StreamTimestamp;
use eventloom_engine::bus::EventBus;
use eventloom_engine::catalogue::{AggregateCatalogue, TerminalPolicy};
use eventloom_engine::filter::DuplicateTimestampFilter;
use eventloom_engine::log::EventLog;
use eventloom_engine::sourcing::CachingEventSource;
use eventloom_store_memory::{MemoryCatalogueStore, MemoryEventStore};
use eventloom_test_support::RecordingSink;
use uuid::Uuid;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn person_event(
    aggregate_id: Uuid,
    name: &str,
    characteristic: EventCharacteristic,
    millis: i64,
) -> Event {
    let start = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
    Event::new(
        "person",
        aggregate_id,
        VersionedName::of(name),
        characteristic,
        StreamTimestamp::of("test", start).plus_millis(millis),
        Payload::new(),
    )
}

struct Pipeline {
    store: Arc<MemoryEventStore>,
    catalogue: Arc<AggregateCatalogue>,
    sink: Arc<RecordingSink>,
    bus: EventBus,
    source: CachingEventSource,
}

fn pipeline(policy: TerminalPolicy) -> Pipeline {
    let store = Arc::new(MemoryEventStore::new());
    let catalogue = Arc::new(AggregateCatalogue::with_policy(
        Arc::new(MemoryCatalogueStore::new()),
        policy,
    ));
    let sink = Arc::new(RecordingSink::new());
    let log = EventLog::new(Arc::clone(&store) as _)
        .with_pre_filter(Arc::new(DuplicateTimestampFilter))
        .with_post_filter(Arc::clone(&catalogue) as _);
    let bus = EventBus::new(Arc::new(log)).notifying(Arc::clone(&sink) as _);
    let source = CachingEventSource::new(Arc::clone(&store) as _);
    Pipeline {
        store,
        catalogue,
        sink,
        bus,
        source,
    }
}

#[tokio::test]
async fn test_committed_batch_is_stored_indexed_and_published() {
    init_tracing();

    // Arrange
    let pipeline = pipeline(TerminalPolicy::Retain);
    let id = Uuid::new_v4();

    // Act
    pipeline
        .bus
        .dispatch(|batch| {
            batch.accept(person_event(id, "created", EventCharacteristic::Initial, 0));
            batch.accept(person_event(id, "updated", EventCharacteristic::Normal, 1));
            Ok(())
        })
        .await
        .unwrap();

    // Assert: stored, indexed, and published.
    assert_eq!(pipeline.store.stored_count(), 2);
    assert!(
        pipeline
            .catalogue
            .ids_for("person")
            .await
            .unwrap()
            .contains(&id)
    );
    let delivered = pipeline.sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].len(), 2);
}

#[tokio::test]
async fn test_replay_after_commit_reflects_the_batch_in_both_orders() {
    init_tracing();

    // Arrange
    let pipeline = pipeline(TerminalPolicy::Retain);
    let id = Uuid::new_v4();
    pipeline
        .bus
        .dispatch(|batch| {
            batch.accept(person_event(id, "created", EventCharacteristic::Initial, 0));
            batch.accept(person_event(id, "renamed", EventCharacteristic::Normal, 1));
            batch.accept(person_event(id, "deleted", EventCharacteristic::Terminal, 2));
            Ok(())
        })
        .await
        .unwrap();

    // Act
    let descending: Vec<String> = pipeline
        .source
        .replaying(id)
        .await
        .unwrap()
        .into_events()
        .into_iter()
        .map(|e| e.event_type.name)
        .collect();
    let ascending: Vec<String> = pipeline
        .source
        .replaying(id)
        .await
        .unwrap()
        .in_ascending_order()
        .into_events()
        .into_iter()
        .map(|e| e.event_type.name)
        .collect();

    // Assert
    assert_eq!(descending, vec!["deleted", "renamed", "created"]);
    assert_eq!(ascending, vec!["created", "renamed", "deleted"]);
}

#[tokio::test]
async fn test_duplicate_timestamps_within_a_batch_are_filtered_before_the_store() {
    init_tracing();

    // Arrange
    let pipeline = pipeline(TerminalPolicy::Retain);
    let id = Uuid::new_v4();

    // Act: two events collide at the same stream position.
    let accepted = pipeline
        .bus
        .dispatch(|batch| {
            batch.accept(person_event(id, "created", EventCharacteristic::Initial, 0));
            batch.accept(person_event(id, "clash", EventCharacteristic::Normal, 0));
            Ok(())
        })
        .await
        .unwrap();

    // Assert
    assert_eq!(accepted.len(), 1);
    assert_eq!(pipeline.store.stored_count(), 1);
}

#[tokio::test]
async fn test_terminal_event_deregisters_under_remove_policy() {
    init_tracing();

    // Arrange
    let pipeline = pipeline(TerminalPolicy::Remove);
    let living = Uuid::new_v4();
    let deleted = Uuid::new_v4();

    // Act
    pipeline
        .bus
        .dispatch(|batch| {
            batch.accept(person_event(
                living,
                "created",
                EventCharacteristic::Initial,
                0,
            ));
            batch.accept(person_event(
                deleted,
                "created",
                EventCharacteristic::Initial,
                0,
            ));
            batch.accept(person_event(
                deleted,
                "deleted",
                EventCharacteristic::Terminal,
                1,
            ));
            Ok(())
        })
        .await
        .unwrap();

    // Assert
    let ids = pipeline.catalogue.ids_for("person").await.unwrap();
    assert!(ids.contains(&living));
    assert!(!ids.contains(&deleted));
}
