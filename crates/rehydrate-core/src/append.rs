//! Persistence of an aggregate's pending changes.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::cancel::run_cancellable;
use crate::codec::{Codec, JsonCodec};
use crate::error::DomainError;
use crate::event::{DomainEvent, EventKind};
use crate::log::{EventLog, EventRecord, ExpectedStreamState};

/// Outcome of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Committed {
    /// Stream version after the commit.
    pub stream_version: u64,
    /// Number of events written.
    pub event_count: usize,
}

/// Writes an aggregate's pending changes to the log as one atomic batch.
#[derive(Clone)]
pub struct Appender<C: Codec = JsonCodec> {
    log: Arc<dyn EventLog>,
    codec: C,
}

impl Appender {
    /// Creates an appender using the JSON codec.
    #[must_use]
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self::with_codec(log, JsonCodec)
    }
}

impl<C: Codec> Appender<C> {
    /// Creates an appender encoding payloads with `codec`.
    #[must_use]
    pub fn with_codec(log: Arc<dyn EventLog>, codec: C) -> Self {
        Self { log, codec }
    }

    /// Appends the pending changes of `aggregate` under the `expected` stream
    /// state and clears them once the log acknowledges the batch.
    ///
    /// An aggregate without pending changes is left alone and the log is not
    /// called.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` if a change cannot be encoded; the
    /// log is not called.
    /// Returns `DomainError::ConcurrencyConflict` if the log rejects
    /// `expected`, `DomainError::Persistence` if the log fails, and
    /// `DomainError::Cancelled` if `cancel` fires first. In every error case
    /// the pending changes are kept.
    #[tracing::instrument(
        skip(self, aggregate, cancel),
        fields(
            aggregate = A::AGGREGATE_TYPE,
            stream_id = %aggregate.aggregate_id(),
            pending = aggregate.pending_changes().len(),
        )
    )]
    pub async fn commit<A: AggregateRoot>(
        &self,
        aggregate: &mut A,
        expected: ExpectedStreamState,
        cancel: &CancellationToken,
    ) -> Result<Committed, DomainError> {
        let stream_id = aggregate.aggregate_id();
        if aggregate.pending_changes().is_empty() {
            tracing::debug!("nothing to commit");
            return Ok(Committed {
                stream_version: aggregate.committed_version(),
                event_count: 0,
            });
        }

        let records = self.to_records(stream_id, aggregate.pending_changes())?;
        let stream_version = run_cancellable(cancel, self.log.append(stream_id, expected, &records))
            .await
            .inspect_err(|err| {
                if err.is_conflict() {
                    tracing::warn!(%err, "commit rejected");
                }
            })?;

        aggregate.clear_pending_changes();
        tracing::debug!(stream_version, "committed pending changes");
        Ok(Committed {
            stream_version,
            event_count: records.len(),
        })
    }

    fn to_records<K: EventKind>(
        &self,
        stream_id: Uuid,
        pending: &[DomainEvent<K>],
    ) -> Result<Vec<EventRecord>, DomainError> {
        pending
            .iter()
            .enumerate()
            .map(|(index, event)| {
                let payload = event.kind.encode(&self.codec).map_err(|source| {
                    DomainError::Serialization {
                        index,
                        event_type: event.event_type(),
                        source,
                    }
                })?;
                Ok(EventRecord {
                    event_id: event.metadata.event_id,
                    stream_id,
                    event_type: event.event_type().to_owned(),
                    payload,
                    occurred_at: event.metadata.occurred_at,
                })
            })
            .collect()
    }
}

impl<C: Codec + std::fmt::Debug> std::fmt::Debug for Appender<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Appender")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
