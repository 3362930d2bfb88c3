//! Command model.
//!
//! Commands express intent to change aggregate state; events express fact.
//! A command acquires a server-assigned, time-ordered processing identifier
//! when it passes through the command log, and its outcome is audited as a
//! `CommandResult` — never replayed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{Event, Payload};
use crate::time::StreamTimestamp;

/// A request to change aggregate state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// The aggregate type the command addresses.
    pub aggregate_type: String,
    /// The aggregate instance the command addresses.
    pub aggregate_id: Uuid,
    /// The command type name.
    pub command_type: String,
    /// When the intent was expressed.
    pub timestamp: StreamTimestamp,
    /// Ordered named command parameters.
    pub payload: Payload,
    /// Server-assigned processing identifier, present once logged.
    pub processing_id: Option<Uuid>,
}

impl Command {
    /// Creates a new, not-yet-processed command.
    #[must_use]
    pub fn new(
        aggregate_type: impl Into<String>,
        aggregate_id: Uuid,
        command_type: impl Into<String>,
        timestamp: StreamTimestamp,
        payload: Payload,
    ) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            aggregate_id,
            command_type: command_type.into(),
            timestamp,
            payload,
            processing_id: None,
        }
    }

    /// Returns a copy of this command carrying its processing identifier.
    #[must_use]
    pub fn processed(self, processing_id: Uuid) -> Self {
        Self {
            processing_id: Some(processing_id),
            ..self
        }
    }

    /// Returns `true` if the command has been assigned a processing
    /// identifier.
    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.processing_id.is_some()
    }
}

/// The outcome of executing a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutcome {
    /// The command succeeded, producing zero or more events.
    Success(Vec<Event>),
    /// The command failed; the message describes why.
    Failure(String),
}

/// The audited record of a command's execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// The processing identifier of the command this result belongs to.
    pub processing_id: Uuid,
    /// The command type name, for audit readability.
    pub command_type: String,
    /// Success with resulting events, or failure.
    pub outcome: CommandOutcome,
    /// When execution completed.
    pub completed_at: DateTime<Utc>,
}
