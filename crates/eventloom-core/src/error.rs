//! Engine error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for the event-sourcing engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The backing store rejected or failed an append.
    #[error("append to event store failed: {0}")]
    Append(String),

    /// The backing store failed to retrieve an aggregate's events.
    #[error("retrieval failed for aggregate {aggregate_id}: {message}")]
    Retrieval {
        /// The aggregate whose events could not be fetched.
        aggregate_id: Uuid,
        /// The underlying store failure.
        message: String,
    },

    /// The catalogue store failed an update or lookup.
    #[error("catalogue update failed: {0}")]
    Catalogue(String),

    /// The command audit log failed a write.
    #[error("command audit failed: {0}")]
    Audit(String),

    /// An event carried a `(name, version)` pair no dispatch-table entry
    /// was registered for. A data-integrity error, reported per event.
    #[error("unknown event kind {name}/{version} for aggregate type {aggregate_type}")]
    UnknownEventKind {
        /// The aggregate type being decoded.
        aggregate_type: String,
        /// The unrecognized event type name.
        name: String,
        /// The unrecognized schema version.
        version: String,
    },

    /// The same `(name, version)` pair was registered twice.
    #[error("event kind {name}/{version} registered twice for aggregate type {aggregate_type}")]
    DuplicateEventKind {
        /// The aggregate type being built.
        aggregate_type: String,
        /// The duplicated event type name.
        name: String,
        /// The duplicated schema version.
        version: String,
    },

    /// A dispatch table was built without an initial event kind.
    #[error("aggregate type {0} has no initial event kind")]
    MissingInitial(String),

    /// A dispatch table declared more than one initial event kind.
    #[error("aggregate type {0} declares more than one initial event kind")]
    DuplicateInitial(String),

    /// A dispatch table declared more than one terminal event kind.
    #[error("aggregate type {0} declares more than one terminal event kind")]
    DuplicateTerminal(String),

    /// A payload field required by a decoder was absent.
    #[error("payload field {field} is missing")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// An encoded payload did not match the kind's declared parameter
    /// schema.
    #[error("payload of event kind {kind} does not match its declared schema: {message}")]
    PayloadShape {
        /// The offending event kind.
        kind: String,
        /// What diverged from the schema.
        message: String,
    },

    /// A replay was requested for an aggregate outside a preloaded view.
    #[error("aggregate {0} was not preloaded into this view")]
    NotPreloaded(Uuid),

    /// A stream violated the initial/terminal shape invariants under
    /// strict replay.
    #[error("stream integrity violation for aggregate {aggregate_id}: {message}")]
    StreamIntegrity {
        /// The aggregate whose stream is malformed.
        aggregate_id: Uuid,
        /// Which invariant was violated.
        message: String,
    },

    /// A payload value could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A validation error raised by a filter stage.
    #[error("validation error: {0}")]
    Validation(String),
}
