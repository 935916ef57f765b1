//! Aggregate reconstruction from stored events.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::cancel::run_cancellable;
use crate::codec::{Codec, JsonCodec};
use crate::error::DomainError;
use crate::event::{DomainEvent, EventKind, EventMetadata};
use crate::log::{EventLog, StoredEvent};
use crate::registry::{EventRegistry, TypeResolver};

type Factory<A> = Box<dyn Fn(Uuid) -> A + Send + Sync>;

/// Rebuilds aggregates of type `A` by folding their stream in log order.
///
/// Built once per aggregate type: it owns the aggregate's dispatch table, the
/// factory that creates blank instances, and the optional type resolver.
pub struct Replayer<A: AggregateRoot, C: Codec = JsonCodec> {
    log: Arc<dyn EventLog>,
    codec: C,
    registry: EventRegistry<A::Event, C>,
    factory: Factory<A>,
    resolver: Option<Box<dyn TypeResolver>>,
}

impl<A: AggregateRoot> Replayer<A> {
    /// Creates a replayer using the JSON codec.
    #[must_use]
    pub fn new(
        log: Arc<dyn EventLog>,
        factory: impl Fn(Uuid) -> A + Send + Sync + 'static,
    ) -> Self {
        Self::with_codec(log, JsonCodec, factory)
    }
}

impl<A: AggregateRoot, C: Codec> Replayer<A, C> {
    /// Creates a replayer decoding payloads with `codec`.
    #[must_use]
    pub fn with_codec(
        log: Arc<dyn EventLog>,
        codec: C,
        factory: impl Fn(Uuid) -> A + Send + Sync + 'static,
    ) -> Self {
        Self {
            log,
            codec,
            registry: A::Event::registry::<C>(),
            factory: Box::new(factory),
            resolver: None,
        }
    }

    /// Routes stored type tags through `resolver` instead of looking them up
    /// in the dispatch table as-is.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl TypeResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Reconstructs the aggregate of `stream_id` from the events after
    /// `after_version` (all events when `None`), folded onto a blank instance
    /// from the factory.
    ///
    /// With a cursor only the tail is folded, so the aggregate's `version()`
    /// and `committed_version()` count the tail alone, not the stream
    /// position. Do not commit it with `Exact(committed_version())`; to bring
    /// an aggregate loaded earlier up to date use [`Replayer::resume`].
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StreamNotFound` if the log has no events to fold.
    /// Returns `DomainError::InvalidRecord`, `TypeResolution`,
    /// `HandlerNotFound` or `Deserialization` if any event cannot be decoded;
    /// nothing is applied in that case.
    /// Returns `DomainError::Cancelled` if `cancel` fires during the read.
    #[tracing::instrument(skip(self, cancel), fields(aggregate = A::AGGREGATE_TYPE))]
    pub async fn replay(
        &self,
        stream_id: Uuid,
        after_version: Option<u64>,
        cancel: &CancellationToken,
    ) -> Result<A, DomainError> {
        let stored = run_cancellable(cancel, self.log.read(stream_id, after_version)).await?;
        if stored.is_empty() {
            tracing::debug!("no events to replay");
            return Err(DomainError::StreamNotFound(stream_id));
        }

        let events = self.decode_all(stream_id, after_version.unwrap_or(0), &stored)?;
        let mut aggregate = (self.factory)(stream_id);
        for event in &events {
            aggregate.apply(event);
        }
        tracing::debug!(applied = events.len(), "replayed aggregate");
        Ok(aggregate)
    }

    /// Brings `aggregate` up to date by folding the events written after its
    /// current version. Returns it unchanged when the stream has nothing new.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the aggregate has pending changes.
    /// Otherwise fails like [`Replayer::replay`], except that an empty read
    /// is not an error; on failure the aggregate is dropped.
    #[tracing::instrument(
        skip(self, aggregate, cancel),
        fields(aggregate = A::AGGREGATE_TYPE, stream_id = %aggregate.aggregate_id())
    )]
    pub async fn resume(
        &self,
        mut aggregate: A,
        cancel: &CancellationToken,
    ) -> Result<A, DomainError> {
        if !aggregate.pending_changes().is_empty() {
            return Err(DomainError::Validation(
                "cannot resume an aggregate with pending changes".into(),
            ));
        }

        let stream_id = aggregate.aggregate_id();
        let cursor = aggregate.version();
        let stored = run_cancellable(cancel, self.log.read(stream_id, Some(cursor))).await?;
        let events = self.decode_all(stream_id, cursor, &stored)?;
        for event in &events {
            aggregate.apply(event);
        }
        tracing::debug!(from_version = cursor, applied = events.len(), "resumed aggregate");
        Ok(aggregate)
    }

    /// Decodes the whole batch before anything is applied, so a corrupt
    /// stream never yields a partially folded aggregate.
    fn decode_all(
        &self,
        stream_id: Uuid,
        cursor: u64,
        stored: &[StoredEvent],
    ) -> Result<Vec<DomainEvent<A::Event>>, DomainError> {
        let mut events = Vec::with_capacity(stored.len());
        let mut expected_version = cursor;
        for record in stored {
            expected_version = expected_version.checked_add(1).ok_or_else(|| {
                DomainError::InvalidRecord {
                    stream_id,
                    version: record.version,
                    reason: format!("no version can follow {expected_version}"),
                }
            })?;
            events.push(self.decode(stream_id, expected_version, record)?);
        }
        Ok(events)
    }

    fn decode(
        &self,
        stream_id: Uuid,
        expected_version: u64,
        record: &StoredEvent,
    ) -> Result<DomainEvent<A::Event>, DomainError> {
        let invalid = |reason: String| DomainError::InvalidRecord {
            stream_id,
            version: record.version,
            reason,
        };
        if record.stream_id != stream_id {
            return Err(invalid(format!(
                "record belongs to stream {}",
                record.stream_id
            )));
        }
        if record.version != expected_version {
            return Err(invalid(format!("expected version {expected_version}")));
        }
        if record.event_type.is_empty() {
            return Err(invalid("empty event type".into()));
        }

        let event_type = self
            .resolve(&record.event_type)
            .ok_or_else(|| DomainError::TypeResolution {
                stream_id,
                version: record.version,
                event_type: record.event_type.clone(),
            })?;
        let kind = self
            .registry
            .decode(&event_type, &self.codec, &record.payload)
            .ok_or_else(|| DomainError::HandlerNotFound {
                aggregate: A::AGGREGATE_TYPE,
                event_type: event_type.clone(),
            })?
            .map_err(|source| DomainError::Deserialization {
                stream_id,
                version: record.version,
                event_type: event_type.clone(),
                source,
            })?;

        Ok(DomainEvent {
            metadata: EventMetadata {
                event_id: record.event_id,
                occurred_at: record.occurred_at,
            },
            kind,
        })
    }

    fn resolve(&self, stored_type: &str) -> Option<String> {
        match &self.resolver {
            Some(resolver) => resolver.resolve(stored_type),
            None => self
                .registry
                .contains(stored_type)
                .then(|| stored_type.to_owned()),
        }
    }
}

impl<A: AggregateRoot, C: Codec + fmt::Debug> fmt::Debug for Replayer<A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replayer")
            .field("aggregate", &A::AGGREGATE_TYPE)
            .field("codec", &self.codec)
            .field("registry", &self.registry)
            .field("custom_resolver", &self.resolver.is_some())
            .finish_non_exhaustive()
    }
}
