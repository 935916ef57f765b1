//! In-memory implementation of the `EventLog` trait.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use rehydrate_core::error::DomainError;
use rehydrate_core::log::{EventLog, EventRecord, ExpectedStreamState, StoredEvent};

/// Event log that keeps every stream in a hash map.
///
/// A batch is checked and written under a single write lock, so readers never
/// observe part of a batch and two racing appends are serialized. Clones share
/// the same streams.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventLog {
    streams: Arc<RwLock<HashMap<Uuid, Vec<StoredEvent>>>>,
}

impl InMemoryEventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::Persistence("in-memory event log lock poisoned".into())
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    #[tracing::instrument(skip(self))]
    async fn read(
        &self,
        stream_id: Uuid,
        after_version: Option<u64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let cursor = after_version.unwrap_or(0);
        let streams = self.streams.read().map_err(|_| poisoned())?;
        let events: Vec<StoredEvent> = streams
            .get(&stream_id)
            .map(|stream| {
                stream
                    .iter()
                    .filter(|event| event.version > cursor)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        tracing::trace!(count = events.len(), "read events");
        Ok(events)
    }

    #[tracing::instrument(skip(self, events), fields(event_count = events.len()))]
    async fn append(
        &self,
        stream_id: Uuid,
        expected: ExpectedStreamState,
        events: &[EventRecord],
    ) -> Result<u64, DomainError> {
        if let Some(stray) = events.iter().find(|event| event.stream_id != stream_id) {
            return Err(DomainError::Persistence(format!(
                "event {} targets stream {}, not {stream_id}",
                stray.event_id, stray.stream_id
            )));
        }

        let mut streams = self.streams.write().map_err(|_| poisoned())?;
        let stream = streams.entry(stream_id).or_default();
        let current = stream.last().map_or(0, |event| event.version);
        if !expected.is_satisfied_by(current) {
            tracing::debug!(current, %expected, "expectation failed");
            return Err(DomainError::ConcurrencyConflict {
                stream_id,
                expected,
                actual: current,
            });
        }

        stream.extend(
            events
                .iter()
                .cloned()
                .zip(current + 1..)
                .map(|(record, version)| StoredEvent::from_record(record, version)),
        );
        let version = stream.last().map_or(0, |event| event.version);
        tracing::debug!(version, "events appended to stream");
        Ok(version)
    }
}
