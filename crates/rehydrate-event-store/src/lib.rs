//! Rehydrate Event Store: durable and in-memory `EventLog` implementations.

pub mod in_memory_event_log;
pub mod pg_event_log;
pub mod schema;
