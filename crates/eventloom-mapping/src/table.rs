//! Dispatch tables — the per-aggregate-type codec between typed calls
//! and generic event records.
//!
//! A table is built once, explicitly, from the aggregate's registered
//! event kinds. Construction fails fast on a malformed registration, so
//! a table that exists is guaranteed well-formed.

use std::collections::HashMap;

use eventloom_core::error::EngineError;
use eventloom_core::event::{Event, EventCharacteristic, Payload};
use eventloom_core::time::StreamTimestamp;
use uuid::Uuid;

use crate::kind::EventKind;

/// The capability a typed event value needs for the table to route it:
/// which kind it is, and the two implicit parameters every event carries.
pub trait EventCall {
    /// The `(name, version)` of the kind this call maps to.
    fn kind(&self) -> (&'static str, &'static str);

    /// The call's position in its aggregate's timeline.
    fn timestamp(&self) -> &StreamTimestamp;

    /// The aggregate instance the call addresses.
    fn aggregate_id(&self) -> Uuid;
}

type EncodeFn<C> = Box<dyn Fn(&C) -> Result<Payload, EngineError> + Send + Sync>;
type DecodeFn<C> = Box<dyn Fn(StreamTimestamp, Uuid, &Payload) -> Result<C, EngineError> + Send + Sync>;

struct KindEntry<C> {
    kind: EventKind,
    encode: EncodeFn<C>,
    decode: DecodeFn<C>,
}

/// Builds a [`DispatchTable`] from explicit kind registrations.
pub struct DispatchTableBuilder<C> {
    aggregate_type: String,
    entries: Vec<KindEntry<C>>,
}

impl<C: EventCall> DispatchTableBuilder<C> {
    /// Starts a table for the given aggregate type.
    #[must_use]
    pub fn for_aggregate(aggregate_type: impl Into<String>) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            entries: Vec::new(),
        }
    }

    /// Registers one kind with its encode and decode functions.
    ///
    /// `encode` projects a typed call onto the kind's payload schema;
    /// `decode` reconstructs the call from the implicit parameters and
    /// the payload.
    #[must_use]
    pub fn on<E, D>(mut self, kind: EventKind, encode: E, decode: D) -> Self
    where
        E: Fn(&C) -> Result<Payload, EngineError> + Send + Sync + 'static,
        D: Fn(StreamTimestamp, Uuid, &Payload) -> Result<C, EngineError> + Send + Sync + 'static,
    {
        self.entries.push(KindEntry {
            kind,
            encode: Box::new(encode),
            decode: Box::new(decode),
        });
        self
    }

    /// Validates the registrations and produces the table.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DuplicateEventKind` if two registrations
    /// share a `(name, version)` pair, `EngineError::MissingInitial` or
    /// `EngineError::DuplicateInitial` unless exactly one kind is
    /// initial, and `EngineError::DuplicateTerminal` if more than one
    /// kind is terminal.
    pub fn build(self) -> Result<DispatchTable<C>, EngineError> {
        let mut by_kind = HashMap::new();
        let mut initial = 0usize;
        let mut terminal = 0usize;
        for (index, entry) in self.entries.iter().enumerate() {
            let key = (entry.kind.name.clone(), entry.kind.version.clone());
            if by_kind.insert(key, index).is_some() {
                return Err(EngineError::DuplicateEventKind {
                    aggregate_type: self.aggregate_type,
                    name: entry.kind.name.clone(),
                    version: entry.kind.version.clone(),
                });
            }
            match entry.kind.characteristic {
                EventCharacteristic::Initial => initial += 1,
                EventCharacteristic::Terminal => terminal += 1,
                EventCharacteristic::Normal => {}
            }
        }
        if initial == 0 {
            return Err(EngineError::MissingInitial(self.aggregate_type));
        }
        if initial > 1 {
            return Err(EngineError::DuplicateInitial(self.aggregate_type));
        }
        if terminal > 1 {
            return Err(EngineError::DuplicateTerminal(self.aggregate_type));
        }
        Ok(DispatchTable {
            aggregate_type: self.aggregate_type,
            entries: self.entries,
            by_kind,
        })
    }
}

/// An immutable codec for one aggregate type, routing typed calls to
/// event records and back by `(name, version)`.
pub struct DispatchTable<C> {
    aggregate_type: String,
    entries: Vec<KindEntry<C>>,
    by_kind: HashMap<(String, String), usize>,
}

impl<C> std::fmt::Debug for DispatchTable<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("aggregate_type", &self.aggregate_type)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl<C: EventCall> DispatchTable<C> {
    /// The aggregate type this table serves.
    #[must_use]
    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    fn entry(&self, name: &str, version: &str) -> Result<&KindEntry<C>, EngineError> {
        let key = (name.to_owned(), version.to_owned());
        let index = self
            .by_kind
            .get(&key)
            .ok_or_else(|| EngineError::UnknownEventKind {
                aggregate_type: self.aggregate_type.clone(),
                name: name.to_owned(),
                version: version.to_owned(),
            })?;
        Ok(&self.entries[*index])
    }

    /// Encodes a typed call into a generic event record, validating the
    /// produced payload against the kind's declared parameter schema.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnknownEventKind` if the call's kind is not
    /// registered, `EngineError::PayloadShape` if the encoded payload's
    /// field names diverge from the declared schema, or whatever the
    /// registered encode function reports.
    pub fn encode(&self, call: &C) -> Result<Event, EngineError> {
        let (name, version) = call.kind();
        let entry = self.entry(name, version)?;
        let payload = (entry.encode)(call)?;
        let produced: Vec<&str> = payload.names().collect();
        if produced != entry.kind.params {
            return Err(EngineError::PayloadShape {
                kind: format!("{name}/{version}"),
                message: format!(
                    "expected fields {:?}, got {produced:?}",
                    entry.kind.params
                ),
            });
        }
        Ok(Event::new(
            self.aggregate_type.clone(),
            call.aggregate_id(),
            entry.kind.versioned_name(),
            entry.kind.characteristic,
            call.timestamp().clone(),
            payload,
        ))
    }

    /// Decodes a generic event record back into a typed call.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnknownEventKind` if the event's
    /// `(name, version)` is not registered, or whatever the registered
    /// decode function reports for a malformed payload.
    pub fn decode(&self, event: &Event) -> Result<C, EngineError> {
        let entry = self.entry(&event.event_type.name, &event.event_type.version)?;
        (entry.decode)(event.timestamp.clone(), event.aggregate_id, &event.payload)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use eventloom_core::error::EngineError;
    use eventloom_core::event::{EventCharacteristic, Payload};
    use eventloom_core::time::StreamTimestamp;
    use uuid::Uuid;

    use super::{DispatchTable, DispatchTableBuilder, EventCall};
    use crate::kind::EventKind;

    #[derive(Debug, Clone, PartialEq)]
    enum CounterEvent {
        Started {
            timestamp: StreamTimestamp,
            counter_id: Uuid,
            start: i64,
        },
        Incremented {
            timestamp: StreamTimestamp,
            counter_id: Uuid,
            delta: i64,
        },
    }

    impl EventCall for CounterEvent {
        fn kind(&self) -> (&'static str, &'static str) {
            match self {
                Self::Started { .. } => ("started", "1"),
                Self::Incremented { .. } => ("incremented", "1"),
            }
        }

        fn timestamp(&self) -> &StreamTimestamp {
            match self {
                Self::Started { timestamp, .. } | Self::Incremented { timestamp, .. } => timestamp,
            }
        }

        fn aggregate_id(&self) -> Uuid {
            match self {
                Self::Started { counter_id, .. } | Self::Incremented { counter_id, .. } => {
                    *counter_id
                }
            }
        }
    }

    fn counter_table() -> DispatchTable<CounterEvent> {
        DispatchTableBuilder::for_aggregate("counter")
            .on(
                EventKind::initial("started").with_params(&["start"]),
                |call| match call {
                    CounterEvent::Started { start, .. } => Payload::new().with("start", start),
                    CounterEvent::Incremented { .. } => unreachable!(),
                },
                |timestamp, counter_id, payload| {
                    Ok(CounterEvent::Started {
                        timestamp,
                        counter_id,
                        start: payload.required("start")?,
                    })
                },
            )
            .on(
                EventKind::normal("incremented").with_params(&["delta"]),
                |call| match call {
                    CounterEvent::Incremented { delta, .. } => Payload::new().with("delta", delta),
                    CounterEvent::Started { .. } => unreachable!(),
                },
                |timestamp, counter_id, payload| {
                    Ok(CounterEvent::Incremented {
                        timestamp,
                        counter_id,
                        delta: payload.required("delta")?,
                    })
                },
            )
            .build()
            .unwrap()
    }

    fn at(millis: i64) -> StreamTimestamp {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        StreamTimestamp::of("test", start).plus_millis(millis)
    }

    #[test]
    fn test_decode_reverses_encode() {
        // Arrange
        let table = counter_table();
        let call = CounterEvent::Incremented {
            timestamp: at(5),
            counter_id: Uuid::new_v4(),
            delta: 3,
        };

        // Act
        let event = table.encode(&call).unwrap();
        let decoded = table.decode(&event).unwrap();

        // Assert
        assert_eq!(event.aggregate_type, "counter");
        assert_eq!(event.event_type.name, "incremented");
        assert_eq!(event.characteristic, EventCharacteristic::Normal);
        assert_eq!(decoded, call);
    }

    #[test]
    fn test_encode_rejects_an_unregistered_kind() {
        // Arrange: a table without the incremented kind.
        let table = DispatchTableBuilder::for_aggregate("counter")
            .on(
                EventKind::initial("started").with_params(&["start"]),
                |_| Payload::new().with("start", &0),
                |timestamp, counter_id, payload| {
                    Ok(CounterEvent::Started {
                        timestamp,
                        counter_id,
                        start: payload.required("start")?,
                    })
                },
            )
            .build()
            .unwrap();
        let call = CounterEvent::Incremented {
            timestamp: at(0),
            counter_id: Uuid::new_v4(),
            delta: 1,
        };

        // Act
        let result = table.encode(&call);

        // Assert
        match result.unwrap_err() {
            EngineError::UnknownEventKind { name, version, .. } => {
                assert_eq!(name, "incremented");
                assert_eq!(version, "1");
            }
            other => panic!("expected UnknownEventKind, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_rejects_a_payload_that_diverges_from_the_schema() {
        // Arrange: the encode function emits a field the kind never
        // declared.
        let table = DispatchTableBuilder::for_aggregate("counter")
            .on(
                EventKind::initial("started").with_params(&["start"]),
                |_| Payload::new().with("starrt", &0),
                |timestamp, counter_id, payload| {
                    Ok(CounterEvent::Started {
                        timestamp,
                        counter_id,
                        start: payload.required("start")?,
                    })
                },
            )
            .build()
            .unwrap();
        let call = CounterEvent::Started {
            timestamp: at(0),
            counter_id: Uuid::new_v4(),
            start: 0,
        };

        // Act
        let result = table.encode(&call);

        // Assert
        match result.unwrap_err() {
            EngineError::PayloadShape { kind, message } => {
                assert_eq!(kind, "started/1");
                assert!(message.contains("starrt"));
            }
            other => panic!("expected PayloadShape, got {other:?}"),
        }
    }

    #[test]
    fn test_build_requires_exactly_one_initial_kind() {
        // Act: no initial kind at all.
        let missing = DispatchTableBuilder::<CounterEvent>::for_aggregate("counter")
            .on(
                EventKind::normal("incremented"),
                |_| Ok(Payload::new()),
                |_, _, _| {
                    Err(EngineError::Validation("unused".to_owned()))
                },
            )
            .build();

        // Assert
        match missing.unwrap_err() {
            EngineError::MissingInitial(aggregate_type) => assert_eq!(aggregate_type, "counter"),
            other => panic!("expected MissingInitial, got {other:?}"),
        }
    }

    #[test]
    fn test_build_rejects_a_second_initial_kind() {
        // Act
        let result = DispatchTableBuilder::<CounterEvent>::for_aggregate("counter")
            .on(
                EventKind::initial("started"),
                |_| Ok(Payload::new()),
                |_, _, _| Err(EngineError::Validation("unused".to_owned())),
            )
            .on(
                EventKind::initial("restarted"),
                |_| Ok(Payload::new()),
                |_, _, _| Err(EngineError::Validation("unused".to_owned())),
            )
            .build();

        // Assert
        assert!(matches!(
            result.unwrap_err(),
            EngineError::DuplicateInitial(_)
        ));
    }

    #[test]
    fn test_build_rejects_a_duplicate_name_version_pair() {
        // Act
        let result = DispatchTableBuilder::<CounterEvent>::for_aggregate("counter")
            .on(
                EventKind::initial("started"),
                |_| Ok(Payload::new()),
                |_, _, _| Err(EngineError::Validation("unused".to_owned())),
            )
            .on(
                EventKind::normal("started"),
                |_| Ok(Payload::new()),
                |_, _, _| Err(EngineError::Validation("unused".to_owned())),
            )
            .build();

        // Assert
        match result.unwrap_err() {
            EngineError::DuplicateEventKind { name, version, .. } => {
                assert_eq!(name, "started");
                assert_eq!(version, "1");
            }
            other => panic!("expected DuplicateEventKind, got {other:?}"),
        }
    }

    #[test]
    fn test_distinct_versions_of_the_same_name_coexist() {
        // Act
        let result = DispatchTableBuilder::<CounterEvent>::for_aggregate("counter")
            .on(
                EventKind::initial("started"),
                |_| Ok(Payload::new()),
                |_, _, _| Err(EngineError::Validation("unused".to_owned())),
            )
            .on(
                EventKind::normal("started").versioned("2"),
                |_| Ok(Payload::new()),
                |_, _, _| Err(EngineError::Validation("unused".to_owned())),
            )
            .build();

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn test_decode_rejects_an_unregistered_event_type() {
        // Arrange
        let table = counter_table();
        let call = CounterEvent::Started {
            timestamp: at(0),
            counter_id: Uuid::new_v4(),
            start: 0,
        };
        let mut event = table.encode(&call).unwrap();
        event.event_type.version = "9".to_owned();

        // Act
        let result = table.decode(&event);

        // Assert
        assert!(matches!(
            result.unwrap_err(),
            EngineError::UnknownEventKind { .. }
        ));
    }
}
