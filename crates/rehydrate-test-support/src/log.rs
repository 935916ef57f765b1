//! Test logs: mock `EventLog` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use rehydrate_core::error::DomainError;
use rehydrate_core::log::{EventLog, EventRecord, ExpectedStreamState, StoredEvent};
use uuid::Uuid;

/// An append recorded by [`RecordingEventLog`].
pub type RecordedAppend = (Uuid, ExpectedStreamState, Vec<EventRecord>);

/// An event log that records all `read` and `append` calls. Serves the
/// configured events from `read`, honoring the version cursor, and always
/// accepts appends without checking the expectation.
#[derive(Debug)]
pub struct RecordingEventLog {
    stored: Vec<StoredEvent>,
    reads: Mutex<Vec<(Uuid, Option<u64>)>>,
    appended: Mutex<Vec<RecordedAppend>>,
}

impl RecordingEventLog {
    /// Create a new recording log that serves `stored` from every `read`.
    #[must_use]
    pub fn new(stored: Vec<StoredEvent>) -> Self {
        Self {
            stored,
            reads: Mutex::new(Vec::new()),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all `read` calls as `(stream_id, after_version)`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn reads(&self) -> Vec<(Uuid, Option<u64>)> {
        self.reads.lock().unwrap().clone()
    }

    /// Returns a snapshot of all batches that were appended.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<RecordedAppend> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventLog for RecordingEventLog {
    async fn read(
        &self,
        stream_id: Uuid,
        after_version: Option<u64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        self.reads.lock().unwrap().push((stream_id, after_version));
        let cursor = after_version.unwrap_or(0);
        Ok(self
            .stored
            .iter()
            .filter(|event| event.version > cursor)
            .cloned()
            .collect())
    }

    async fn append(
        &self,
        stream_id: Uuid,
        expected: ExpectedStreamState,
        events: &[EventRecord],
    ) -> Result<u64, DomainError> {
        let mut appended = self.appended.lock().unwrap();
        appended.push((stream_id, expected, events.to_vec()));
        let written: usize = appended.iter().map(|(_, _, batch)| batch.len()).sum();
        let base = self.stored.last().map_or(0, |event| event.version);
        Ok(base + written as u64)
    }
}

/// An event log that always returns an empty event list and silently accepts
/// appends. Useful for testing "stream not found" scenarios and creation
/// commands.
#[derive(Debug)]
pub struct EmptyEventLog;

#[async_trait]
impl EventLog for EmptyEventLog {
    async fn read(
        &self,
        _stream_id: Uuid,
        _after_version: Option<u64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append(
        &self,
        _stream_id: Uuid,
        _expected: ExpectedStreamState,
        events: &[EventRecord],
    ) -> Result<u64, DomainError> {
        Ok(events.len() as u64)
    }
}

/// An event log that always returns a persistence error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingEventLog;

#[async_trait]
impl EventLog for FailingEventLog {
    async fn read(
        &self,
        _stream_id: Uuid,
        _after_version: Option<u64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Persistence("connection refused".into()))
    }

    async fn append(
        &self,
        _stream_id: Uuid,
        _expected: ExpectedStreamState,
        _events: &[EventRecord],
    ) -> Result<u64, DomainError> {
        Err(DomainError::Persistence("connection refused".into()))
    }
}

/// An event log whose streams always sit at a fixed version, so every append
/// is rejected as a concurrency conflict. Reads return nothing.
#[derive(Debug)]
pub struct ConflictingEventLog {
    /// Version reported as the actual stream version in conflicts.
    pub actual: u64,
}

#[async_trait]
impl EventLog for ConflictingEventLog {
    async fn read(
        &self,
        _stream_id: Uuid,
        _after_version: Option<u64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append(
        &self,
        stream_id: Uuid,
        expected: ExpectedStreamState,
        _events: &[EventRecord],
    ) -> Result<u64, DomainError> {
        Err(DomainError::ConcurrencyConflict {
            stream_id,
            expected,
            actual: self.actual,
        })
    }
}

/// An event log whose calls never complete. Useful for testing cancellation.
#[derive(Debug)]
pub struct StalledEventLog;

#[async_trait]
impl EventLog for StalledEventLog {
    async fn read(
        &self,
        _stream_id: Uuid,
        _after_version: Option<u64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        std::future::pending().await
    }

    async fn append(
        &self,
        _stream_id: Uuid,
        _expected: ExpectedStreamState,
        _events: &[EventRecord],
    ) -> Result<u64, DomainError> {
        std::future::pending().await
    }
}
