//! In-memory command audit log.

use std::sync::Mutex;

use async_trait::async_trait;
use eventloom_core::command::{Command, CommandResult};
use eventloom_core::error::EngineError;
use eventloom_core::store::CommandAudit;

/// An in-memory command audit log recording commands and results in the
/// order they were written.
#[derive(Debug, Default)]
pub struct MemoryCommandAudit {
    commands: Mutex<Vec<Command>>,
    results: Mutex<Vec<CommandResult>>,
}

impl MemoryCommandAudit {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded commands.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    /// Returns a snapshot of the recorded results.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn results(&self) -> Vec<CommandResult> {
        self.results.lock().unwrap().clone()
    }
}

fn poisoned() -> EngineError {
    EngineError::Audit("audit lock poisoned".to_owned())
}

#[async_trait]
impl CommandAudit for MemoryCommandAudit {
    async fn record_command(&self, command: &Command) -> Result<(), EngineError> {
        self.commands
            .lock()
            .map_err(|_| poisoned())?
            .push(command.clone());
        Ok(())
    }

    async fn record_result(&self, result: &CommandResult) -> Result<(), EngineError> {
        self.results
            .lock()
            .map_err(|_| poisoned())?
            .push(result.clone());
        Ok(())
    }
}
