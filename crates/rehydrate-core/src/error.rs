//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::codec::CodecError;
use crate::log::ExpectedStreamState;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A fresh replay found no events for the stream.
    #[error("stream not found: {0}")]
    StreamNotFound(Uuid),

    /// A stored type tag could not be resolved.
    #[error("cannot resolve event type `{event_type}` at version {version} of stream {stream_id}")]
    TypeResolution {
        /// The stream being replayed.
        stream_id: Uuid,
        /// Version of the offending event.
        version: u64,
        /// The stored type tag.
        event_type: String,
    },

    /// Payload bytes did not match the schema of the resolved type.
    #[error("cannot decode `{event_type}` at version {version} of stream {stream_id}: {source}")]
    Deserialization {
        /// The stream being replayed.
        stream_id: Uuid,
        /// Version of the offending event.
        version: u64,
        /// The resolved type tag.
        event_type: String,
        /// The codec failure.
        #[source]
        source: CodecError,
    },

    /// The aggregate has no handler for a resolved event type.
    #[error("aggregate `{aggregate}` has no handler for event type `{event_type}`")]
    HandlerNotFound {
        /// The aggregate type being replayed.
        aggregate: &'static str,
        /// The resolved type tag.
        event_type: String,
    },

    /// A stored record failed integrity checks before it could be applied.
    #[error("invalid event record at version {version} of stream {stream_id}: {reason}")]
    InvalidRecord {
        /// The stream being replayed.
        stream_id: Uuid,
        /// Version reported by the record.
        version: u64,
        /// What was wrong with the record.
        reason: String,
    },

    /// A pending change could not be serialized; nothing was appended.
    #[error("cannot encode pending change #{index} (`{event_type}`): {source}")]
    Serialization {
        /// Position of the change in the pending list.
        index: usize,
        /// Type tag of the change.
        event_type: &'static str,
        /// The codec failure.
        #[source]
        source: CodecError,
    },

    /// Optimistic concurrency conflict.
    #[error(
        "concurrency conflict on stream {stream_id}: expected {expected}, found version {actual} \
         (replay the stream and retry)"
    )]
    ConcurrencyConflict {
        /// The stream that had the conflict.
        stream_id: Uuid,
        /// The caller's assertion.
        expected: ExpectedStreamState,
        /// The actual stream version found.
        actual: u64,
    },

    /// A domain operation was rejected by business rules.
    #[error("validation error: {0}")]
    Validation(String),

    /// The underlying log failed for infrastructural reasons.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The operation was cancelled before the log acknowledged it.
    #[error("operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Returns `true` for an optimistic concurrency conflict, the one failure
    /// callers are expected to retry after replaying fresh state.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}
