//! `PostgreSQL` implementation of the `EventLog` trait.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use rehydrate_core::error::DomainError;
use rehydrate_core::log::{EventLog, EventRecord, ExpectedStreamState, StoredEvent};

use crate::schema::{CREATE_EVENT_RECORDS_TABLE, STREAM_VERSION_CONSTRAINT};

/// PostgreSQL-backed event log.
///
/// Each append runs in one transaction that first takes a per-stream
/// advisory lock, so the expectation is checked against the version the
/// batch is written after. Dropping the future before the commit rolls the
/// whole batch back.
#[derive(Debug, Clone)]
pub struct PgEventLog {
    pool: PgPool,
}

impl PgEventLog {
    /// Creates a new `PgEventLog`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the event records table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Persistence` if the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::raw_sql(CREATE_EVENT_RECORDS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(())
    }
}

fn persistence(err: sqlx::Error) -> DomainError {
    DomainError::Persistence(err.to_string())
}

fn to_db_version(version: u64) -> Result<i64, DomainError> {
    i64::try_from(version)
        .map_err(|_| DomainError::Persistence(format!("version {version} out of range")))
}

fn from_db_version(version: i64) -> Result<u64, DomainError> {
    u64::try_from(version)
        .map_err(|_| DomainError::Persistence(format!("negative version {version} in log")))
}

fn to_stored_event(row: &PgRow) -> Result<StoredEvent, DomainError> {
    Ok(StoredEvent {
        event_id: row.try_get("event_id").map_err(persistence)?,
        stream_id: row.try_get("stream_id").map_err(persistence)?,
        event_type: row.try_get("event_type").map_err(persistence)?,
        payload: row.try_get("payload").map_err(persistence)?,
        version: from_db_version(row.try_get("version").map_err(persistence)?)?,
        occurred_at: row.try_get("occurred_at").map_err(persistence)?,
    })
}

/// Maps a failed insert. Writers serialize on the stream lock, so a taken
/// version only shows up when something bypassed it; the stream is then at
/// least at `version`. Anything else is an infrastructure failure.
fn insert_error(
    err: sqlx::Error,
    stream_id: Uuid,
    expected: ExpectedStreamState,
    version: u64,
) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.constraint() == Some(STREAM_VERSION_CONSTRAINT) {
            return DomainError::ConcurrencyConflict {
                stream_id,
                expected,
                actual: version,
            };
        }
    }
    persistence(err)
}

#[async_trait]
impl EventLog for PgEventLog {
    #[tracing::instrument(skip(self))]
    async fn read(
        &self,
        stream_id: Uuid,
        after_version: Option<u64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let cursor = to_db_version(after_version.unwrap_or(0))?;
        let rows = sqlx::query(
            r"
            SELECT event_id, stream_id, version, event_type, payload, occurred_at
            FROM event_records
            WHERE stream_id = $1 AND version > $2
            ORDER BY version ASC
            ",
        )
        .bind(stream_id)
        .bind(cursor)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        tracing::trace!(count = rows.len(), "read events");
        rows.iter().map(to_stored_event).collect()
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

        let mut tx = self.pool.begin().await.map_err(persistence)?;

        // Held until commit or rollback; serializes appends to this stream.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(stream_id)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

        let current: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version), 0) FROM event_records WHERE stream_id = $1",
        )
        .bind(stream_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(persistence)?;
        let current = from_db_version(current)?;

        if !expected.is_satisfied_by(current) {
            tracing::debug!(current, %expected, "expectation failed");
            return Err(DomainError::ConcurrencyConflict {
                stream_id,
                expected,
                actual: current,
            });
        }

        let mut version = current;
        for event in events {
            version += 1;
            sqlx::query(
                r"
                INSERT INTO event_records
                    (event_id, stream_id, version, event_type, payload, occurred_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(event.event_id)
            .bind(stream_id)
            .bind(to_db_version(version)?)
            .bind(&event.event_type)
            .bind(event.payload.as_slice())
            .bind(event.occurred_at)
            .execute(&mut *tx)
            .await
            .map_err(|err| insert_error(err, stream_id, expected, version))?;
        }

        tx.commit().await.map_err(persistence)?;
        tracing::debug!(version, "events appended to stream");
        Ok(version)
    }
}
