//! Domain event model.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::EngineError;
use crate::time::StreamTimestamp;

/// How an event relates to the lifecycle of its aggregate's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCharacteristic {
    /// Creates the aggregate's stream. Exactly one per valid stream.
    Initial,
    /// An ordinary fact within the stream.
    Normal,
    /// Closes the stream. At most one per valid stream.
    Terminal,
}

/// An event type name paired with a schema version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionedName {
    /// The event type name.
    pub name: String,
    /// The schema version, `"1"` unless declared otherwise.
    pub version: String,
}

impl VersionedName {
    /// The version assumed when none is declared.
    pub const DEFAULT_VERSION: &'static str = "1";

    /// Creates a versioned name with an explicit version.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Creates a versioned name at the default version.
    #[must_use]
    pub fn of(name: impl Into<String>) -> Self {
        Self::new(name, Self::DEFAULT_VERSION)
    }
}

/// A single named payload field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadField {
    /// The declared parameter name.
    pub name: String,
    /// The field value.
    pub value: Value,
}

/// An ordered list of named, typed payload fields.
///
/// Order is significant: the codec contract is that decoding an encoded
/// payload yields the same fields, in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Payload(Vec<PayloadField>);

impl Payload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a named field, serializing the value.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Serialization` if the value cannot be
    /// serialized.
    pub fn with<T: Serialize + ?Sized>(mut self, name: &str, value: &T) -> Result<Self, EngineError> {
        self.0.push(PayloadField {
            name: name.to_owned(),
            value: serde_json::to_value(value)?,
        });
        Ok(self)
    }

    /// Returns the raw value of the named field, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Extracts a typed value from the named field.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::MissingField` if the field is absent, or
    /// `EngineError::Serialization` if the value has the wrong shape.
    pub fn required<T: DeserializeOwned>(&self, name: &str) -> Result<T, EngineError> {
        let value = self.get(name).ok_or_else(|| EngineError::MissingField {
            field: name.to_owned(),
        })?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Iterates over the declared field names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|f| f.name.as_str())
    }

    /// Iterates over the fields, in order.
    pub fn iter(&self) -> std::slice::Iter<'_, PayloadField> {
        self.0.iter()
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the payload has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Payload {
    type Item = &'a PayloadField;
    type IntoIter = std::slice::Iter<'a, PayloadField>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An immutable fact about an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// The aggregate type this event belongs to.
    pub aggregate_type: String,
    /// The aggregate instance this event belongs to.
    pub aggregate_id: Uuid,
    /// The event type name and schema version.
    pub event_type: VersionedName,
    /// Lifecycle characteristic within the aggregate's stream.
    pub characteristic: EventCharacteristic,
    /// Position in the stream's timeline.
    pub timestamp: StreamTimestamp,
    /// Ordered named payload fields.
    pub payload: Payload,
}

impl Event {
    /// Creates a new event.
    #[must_use]
    pub fn new(
        aggregate_type: impl Into<String>,
        aggregate_id: Uuid,
        event_type: VersionedName,
        characteristic: EventCharacteristic,
        timestamp: StreamTimestamp,
        payload: Payload,
    ) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            aggregate_id,
            event_type,
            characteristic,
            timestamp,
            payload,
        }
    }

    /// Returns `true` if this event creates its aggregate's stream.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.characteristic == EventCharacteristic::Initial
    }

    /// Returns `true` if this event closes its aggregate's stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.characteristic == EventCharacteristic::Terminal
    }
}
