//! Time source behind `StreamTimestamp::now`.
//!
//! Event and command timestamps are never read from the ambient system
//! clock directly; they go through this trait so replays and audits can
//! be driven by a frozen clock in tests.

use chrono::{DateTime, Utc};

/// A source of wall-clock instants for stream timestamps and audit
/// records.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The runtime clock, reading actual wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, SystemClock};

    #[test]
    fn test_system_clock_never_runs_backwards_across_reads() {
        // Arrange
        let clock = SystemClock;

        // Act
        let first = clock.now();
        let second = clock.now();

        // Assert
        assert!(second >= first);
    }

    #[test]
    fn test_system_clock_is_usable_as_a_trait_object() {
        // Arrange
        let clock: &dyn Clock = &SystemClock;

        // Act
        let now = clock.now();

        // Assert
        assert!(now.timestamp() > 0);
    }
}
