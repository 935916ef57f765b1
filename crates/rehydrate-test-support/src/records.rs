//! Builders for stored event records.

use rehydrate_core::log::StoredEvent;
use uuid::Uuid;

use crate::clock::fixed_now;

/// Builds a `StoredEvent` at `version` whose payload is `payload` encoded as
/// JSON, stamped with [`fixed_now`].
///
/// # Panics
///
/// Panics if `payload` cannot be encoded, which a `serde_json::Value` never
/// fails to do.
#[must_use]
pub fn stored_event(
    stream_id: Uuid,
    version: u64,
    event_type: &str,
    payload: &serde_json::Value,
) -> StoredEvent {
    StoredEvent {
        event_id: Uuid::new_v4(),
        stream_id,
        event_type: event_type.to_owned(),
        payload: serde_json::to_vec(payload).unwrap(),
        version,
        occurred_at: fixed_now(),
    }
}
