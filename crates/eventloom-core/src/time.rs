//! Temporal model — the ordering primitive for event streams.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

/// A point in a named event stream's timeline.
///
/// Orders events both within one aggregate's stream and across streams
/// during merge replay. The order is total: ascending by instant, with
/// ties broken by stream id so that repeated comparisons are consistent.
/// Descending replay is the reversed view of this same order, never a
/// separate storage order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamTimestamp {
    /// The stream this timestamp belongs to.
    pub stream_id: String,
    /// Wall-clock instant.
    pub instant: DateTime<Utc>,
}

impl StreamTimestamp {
    /// Creates a timestamp at an explicit instant.
    #[must_use]
    pub fn of(stream_id: impl Into<String>, instant: DateTime<Utc>) -> Self {
        Self {
            stream_id: stream_id.into(),
            instant,
        }
    }

    /// Creates a timestamp at the clock's current instant.
    #[must_use]
    pub fn now(stream_id: impl Into<String>, clock: &dyn Clock) -> Self {
        Self::of(stream_id, clock.now())
    }

    /// Returns a copy shifted forward by the given number of milliseconds.
    #[must_use]
    pub fn plus_millis(&self, millis: i64) -> Self {
        Self {
            stream_id: self.stream_id.clone(),
            instant: self.instant + Duration::milliseconds(millis),
        }
    }
}

impl Ord for StreamTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant
            .cmp(&other.instant)
            .then_with(|| self.stream_id.cmp(&other.stream_id))
    }
}

impl PartialOrd for StreamTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
