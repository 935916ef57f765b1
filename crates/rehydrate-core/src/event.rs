//! Domain event abstractions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::codec::{Codec, CodecError};
use crate::registry::EventRegistry;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Timestamp of event creation, assigned by the producer.
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// Creates metadata for a new event with a fresh identifier, stamped with
    /// the clock's current time.
    #[must_use]
    pub fn new(clock: &dyn Clock) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: clock.now(),
        }
    }
}

/// The closed set of event variants an aggregate can apply.
///
/// Implemented by one enum per aggregate. Each variant wraps a payload struct
/// and has a stable type tag; the tag is what the log stores next to the
/// encoded payload.
pub trait EventKind: Send + Sync + fmt::Debug + Sized + 'static {
    /// Returns the type tag of the concrete variant.
    fn event_type(&self) -> &'static str;

    /// Encodes the payload of the concrete variant, without the enum wrapper.
    ///
    /// # Errors
    ///
    /// Returns `CodecError` if the codec cannot serialize the payload.
    fn encode<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, CodecError>;

    /// Builds the dispatch table mapping every type tag of this event set to
    /// a decoder for its payload.
    fn registry<C: Codec>() -> EventRegistry<Self, C>;
}

/// Domain event envelope: metadata plus the typed payload variant.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent<K> {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: K,
}

impl<K: EventKind> DomainEvent<K> {
    /// Wraps `kind` in a new envelope stamped by `clock`.
    #[must_use]
    pub fn new(kind: K, clock: &dyn Clock) -> Self {
        Self {
            metadata: EventMetadata::new(clock),
            kind,
        }
    }

    /// Returns the type tag of the payload variant.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }
}
