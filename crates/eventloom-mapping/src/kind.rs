//! Event kind declarations — the registration metadata for one event
//! type.

use eventloom_core::event::{EventCharacteristic, VersionedName};

/// The declarative description of one event kind an aggregate's handler
/// understands: name, schema version (defaulting to `"1"`), lifecycle
/// characteristic, and the ordered payload parameter schema.
///
/// Timestamp and aggregate id are always the implicit first two
/// parameters of a typed call; `params` lists only the payload fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventKind {
    /// The event type name.
    pub name: String,
    /// The schema version.
    pub version: String,
    /// Lifecycle characteristic.
    pub characteristic: EventCharacteristic,
    /// The declared payload field names, in order.
    pub params: Vec<String>,
}

impl EventKind {
    fn new(name: impl Into<String>, characteristic: EventCharacteristic) -> Self {
        Self {
            name: name.into(),
            version: VersionedName::DEFAULT_VERSION.to_owned(),
            characteristic,
            params: Vec::new(),
        }
    }

    /// Declares the kind that creates an aggregate's stream.
    #[must_use]
    pub fn initial(name: impl Into<String>) -> Self {
        Self::new(name, EventCharacteristic::Initial)
    }

    /// Declares an ordinary kind.
    #[must_use]
    pub fn normal(name: impl Into<String>) -> Self {
        Self::new(name, EventCharacteristic::Normal)
    }

    /// Declares the kind that closes an aggregate's stream.
    #[must_use]
    pub fn terminal(name: impl Into<String>) -> Self {
        Self::new(name, EventCharacteristic::Terminal)
    }

    /// Overrides the schema version.
    #[must_use]
    pub fn versioned(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Declares the ordered payload parameter schema.
    #[must_use]
    pub fn with_params(mut self, params: &[&str]) -> Self {
        self.params = params.iter().map(|&p| p.to_owned()).collect();
        self
    }

    pub(crate) fn versioned_name(&self) -> VersionedName {
        VersionedName::new(self.name.clone(), self.version.clone())
    }
}

#[cfg(test)]
mod tests {
    use eventloom_core::event::EventCharacteristic;

    use super::EventKind;

    #[test]
    fn test_kind_defaults_to_version_one() {
        // Act
        let kind = EventKind::normal("age_updated").with_params(&["new_age"]);

        // Assert
        assert_eq!(kind.version, "1");
        assert_eq!(kind.characteristic, EventCharacteristic::Normal);
        assert_eq!(kind.params, vec!["new_age"]);
    }

    #[test]
    fn test_versioned_overrides_the_default() {
        // Act
        let kind = EventKind::initial("created").versioned("2");

        // Assert
        assert_eq!(kind.version, "2");
    }
}
