//! Event log abstraction.
//!
//! The log is the durable, per-stream, append-only store of event records.
//! It assigns 1-based stream versions at append time and enforces the
//! caller's [`ExpectedStreamState`] before writing anything.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// An event record ready to be appended. The log assigns its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Stream this event belongs to.
    pub stream_id: Uuid,
    /// Type tag for deserialization routing.
    pub event_type: String,
    /// Encoded event payload.
    pub payload: Vec<u8>,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Stream this event belongs to.
    pub stream_id: Uuid,
    /// Type tag for deserialization routing.
    pub event_type: String,
    /// Encoded event payload.
    pub payload: Vec<u8>,
    /// 1-based position within the stream.
    pub version: u64,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Builds the stored form of `record` at `version`.
    #[must_use]
    pub fn from_record(record: EventRecord, version: u64) -> Self {
        Self {
            event_id: record.event_id,
            stream_id: record.stream_id,
            event_type: record.event_type,
            payload: record.payload,
            version,
            occurred_at: record.occurred_at,
        }
    }
}

/// Caller's assertion about the target stream at append time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedStreamState {
    /// No check; append whatever the stream holds.
    Any,
    /// The stream must not have any events yet.
    NoStream,
    /// The stream must already have at least one event.
    #[default]
    StreamExists,
    /// The stream must be at exactly this version. `Exact(0)` means empty.
    Exact(u64),
}

impl ExpectedStreamState {
    /// Returns `true` if a stream currently at `current_version` satisfies
    /// this expectation. Version `0` means the stream has no events.
    #[must_use]
    pub fn is_satisfied_by(self, current_version: u64) -> bool {
        match self {
            Self::Any => true,
            Self::NoStream => current_version == 0,
            Self::StreamExists => current_version > 0,
            Self::Exact(version) => current_version == version,
        }
    }
}

impl fmt::Display for ExpectedStreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any stream state"),
            Self::NoStream => f.write_str("no stream"),
            Self::StreamExists => f.write_str("an existing stream"),
            Self::Exact(version) => write!(f, "version {version}"),
        }
    }
}

/// Durable event log.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Loads the events of `stream_id` with a version strictly greater than
    /// `after_version`, in append order. Returns an empty list when there is
    /// nothing after the cursor.
    async fn read(
        &self,
        stream_id: Uuid,
        after_version: Option<u64>,
    ) -> Result<Vec<StoredEvent>, DomainError>;

    /// Appends `events` to `stream_id` as one atomic batch, after checking
    /// `expected` against the current stream version. Returns the stream
    /// version after the append.
    ///
    /// A failed expectation yields `DomainError::ConcurrencyConflict` and
    /// writes nothing.
    async fn append(
        &self,
        stream_id: Uuid,
        expected: ExpectedStreamState,
        events: &[EventRecord],
    ) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_expectation_is_stream_exists() {
        assert_eq!(
            ExpectedStreamState::default(),
            ExpectedStreamState::StreamExists
        );
    }

    #[test]
    fn test_no_stream_is_satisfied_only_by_empty_stream() {
        assert!(ExpectedStreamState::NoStream.is_satisfied_by(0));
        assert!(!ExpectedStreamState::NoStream.is_satisfied_by(1));
    }

    #[test]
    fn test_stream_exists_requires_an_event() {
        assert!(!ExpectedStreamState::StreamExists.is_satisfied_by(0));
        assert!(ExpectedStreamState::StreamExists.is_satisfied_by(3));
    }

    #[test]
    fn test_exact_matches_only_that_version() {
        assert!(ExpectedStreamState::Exact(2).is_satisfied_by(2));
        assert!(!ExpectedStreamState::Exact(2).is_satisfied_by(3));
        assert!(ExpectedStreamState::Exact(0).is_satisfied_by(0));
    }

    #[test]
    fn test_any_accepts_everything() {
        assert!(ExpectedStreamState::Any.is_satisfied_by(0));
        assert!(ExpectedStreamState::Any.is_satisfied_by(42));
    }
}
