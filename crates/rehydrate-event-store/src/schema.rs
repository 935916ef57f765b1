//! Event log database schema.

/// Name of the constraint that serializes writers on a stream.
pub const STREAM_VERSION_CONSTRAINT: &str = "event_records_stream_version_key";

/// SQL to create the event records table.
pub const CREATE_EVENT_RECORDS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS event_records (
    event_id    UUID PRIMARY KEY,
    stream_id   UUID NOT NULL,
    version     BIGINT NOT NULL CHECK (version > 0),
    event_type  VARCHAR(255) NOT NULL,
    payload     BYTEA NOT NULL,
    occurred_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT event_records_stream_version_key UNIQUE (stream_id, version)
);
";
