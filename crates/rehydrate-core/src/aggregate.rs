//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::{DomainEvent, EventKind};

/// Trait for aggregate roots that reconstitute from event history.
///
/// Domain operations apply the event they produce to in-memory state and
/// push it onto the pending list, so state is always current; the pending
/// list only records what the log has not seen yet.
pub trait AggregateRoot: Send + Sync {
    /// The closed event set this aggregate produces and consumes.
    type Event: EventKind;

    /// Aggregate type name, used in logs and errors.
    const AGGREGATE_TYPE: &'static str;

    /// Returns the aggregate identifier, which is also its stream identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the number of events applied, committed and pending.
    fn version(&self) -> u64;

    /// Apply an event to mutate internal state and advance the version.
    fn apply(&mut self, event: &DomainEvent<Self::Event>);

    /// Returns pending events produced by domain operations, in order.
    fn pending_changes(&self) -> &[DomainEvent<Self::Event>];

    /// Clears pending events after persistence.
    fn clear_pending_changes(&mut self);

    /// Returns the stream version the aggregate was loaded at, before any
    /// pending change.
    fn committed_version(&self) -> u64 {
        self.version()
            .saturating_sub(self.pending_changes().len() as u64)
    }
}
