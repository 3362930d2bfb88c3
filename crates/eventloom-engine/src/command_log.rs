//! Command pipeline — audit logging around command execution.
//!
//! Commands express intent; the pipeline audits that intent and its
//! outcome. Business logic runs between the two audit writes, emitting
//! zero or more events through an event batch. The command log itself
//! never produces events.

use std::sync::Arc;

use eventloom_core::clock::Clock;
use eventloom_core::command::{Command, CommandOutcome, CommandResult};
use eventloom_core::error::EngineError;
use eventloom_core::store::CommandAudit;
use tracing::instrument;
use uuid::Uuid;

use crate::batch::EventBatch;
use crate::bus::EventBus;

/// Audits commands and their results.
pub struct CommandLog {
    audit: Arc<dyn CommandAudit>,
}

impl CommandLog {
    /// Creates a log writing to the given audit store.
    #[must_use]
    pub fn new(audit: Arc<dyn CommandAudit>) -> Self {
        Self { audit }
    }

    /// Assigns the command a unique, strictly time-ordered processing
    /// identifier (a time-based UUID, collision-resistant) and records
    /// the identified command, returning it.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Audit` if the audit write fails.
    pub async fn log_command(&self, command: Command) -> Result<Command, EngineError> {
        let command = command.processed(Uuid::now_v7());
        self.audit.record_command(&command).await?;
        Ok(command)
    }

    /// Records the outcome of a command's execution, including failures.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Audit` if the audit write fails.
    pub async fn log_result(&self, result: &CommandResult) -> Result<(), EngineError> {
        self.audit.record_result(result).await
    }
}

/// Orchestrates the audited command pipeline: log the intent, run the
/// handler against a fresh batch, commit on success, audit the outcome.
pub struct CommandProcessor {
    log: CommandLog,
    bus: EventBus,
    clock: Arc<dyn Clock>,
}

impl CommandProcessor {
    /// Creates a processor committing through the given bus.
    #[must_use]
    pub fn new(log: CommandLog, bus: EventBus, clock: Arc<dyn Clock>) -> Self {
        Self { log, bus, clock }
    }

    /// Runs a command through the pipeline.
    ///
    /// The handler receives the identified command and a batch to emit
    /// events into. On handler success the batch is committed through the
    /// bus; on handler error the batch is dropped uncommitted. Either
    /// way the outcome is audited and returned — a failed command is a
    /// recorded `Failure` outcome, not an `Err`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Audit` if either audit write fails.
    #[instrument(skip(self, command, handler), fields(command_type = %command.command_type))]
    pub async fn process<F>(
        &self,
        command: Command,
        handler: F,
    ) -> Result<CommandResult, EngineError>
    where
        F: FnOnce(&Command, &mut EventBatch) -> Result<(), EngineError>,
    {
        let command = self.log.log_command(command).await?;
        let processing_id = command.processing_id.ok_or_else(|| {
            EngineError::Audit("command log did not assign a processing id".to_owned())
        })?;

        let mut batch = self.bus.start_batch();
        let outcome = match handler(&command, &mut batch) {
            Ok(()) => match self.bus.complete(batch).await {
                Ok(events) => CommandOutcome::Success(events),
                Err(error) => CommandOutcome::Failure(error.to_string()),
            },
            // The batch is dropped here, uncommitted.
            Err(error) => CommandOutcome::Failure(error.to_string()),
        };

        let result = CommandResult {
            processing_id,
            command_type: command.command_type.clone(),
            outcome,
            completed_at: self.clock.now(),
        };
        self.log.log_result(&result).await?;
        Ok(result)
    }
}
