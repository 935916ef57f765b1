//! Loads and saves catalog items through the event log.

use std::sync::Arc;

use rehydrate_core::aggregate::AggregateRoot;
use rehydrate_core::append::{Appender, Committed};
use rehydrate_core::error::DomainError;
use rehydrate_core::log::{EventLog, ExpectedStreamState};
use rehydrate_core::replay::Replayer;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::aggregates::CatalogItem;

/// Commit attempts made by [`CatalogStore::execute`] unless configured.
pub const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Pairs a replayer and an appender over one event log.
#[derive(Debug)]
pub struct CatalogStore {
    replayer: Replayer<CatalogItem>,
    appender: Appender,
    max_attempts: u32,
}

impl CatalogStore {
    /// Creates a store over `log`.
    #[must_use]
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self {
            replayer: Replayer::new(Arc::clone(&log), CatalogItem::new),
            appender: Appender::new(log),
            max_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
        }
    }

    /// Sets how many times [`CatalogStore::execute`] tries to commit before
    /// giving up on a conflict. Values below one are treated as one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Rebuilds the item from its full stream.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StreamNotFound` if the item has no events, or any
    /// replay error.
    pub async fn load(
        &self,
        item_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<CatalogItem, DomainError> {
        self.replayer.replay(item_id, None, cancel).await
    }

    /// Commits the changes of an item whose stream must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the stream already has
    /// events, or any commit error.
    pub async fn insert(
        &self,
        item: &mut CatalogItem,
        cancel: &CancellationToken,
    ) -> Result<Committed, DomainError> {
        self.appender
            .commit(item, ExpectedStreamState::NoStream, cancel)
            .await
    }

    /// Replays the item, runs `operation` on it and commits the result
    /// against the version that was replayed. A conflicting commit starts
    /// over from a fresh replay until the attempts run out.
    ///
    /// # Errors
    ///
    /// Returns whatever `operation` returns, any replay or commit error, or
    /// the last `DomainError::ConcurrencyConflict` once every attempt lost.
    #[tracing::instrument(skip(self, cancel, operation))]
    pub async fn execute<F>(
        &self,
        item_id: Uuid,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<Committed, DomainError>
    where
        F: FnMut(&mut CatalogItem) -> Result<(), DomainError>,
    {
        let mut attempt = 1;
        loop {
            let mut item = self.load(item_id, cancel).await?;
            let expected = ExpectedStreamState::Exact(item.committed_version());
            operation(&mut item)?;

            match self.appender.commit(&mut item, expected, cancel).await {
                Err(err) if err.is_conflict() && attempt < self.max_attempts => {
                    tracing::info!(attempt, %err, "retrying after conflict");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rehydrate_core::log::{EventRecord, StoredEvent};
    use rehydrate_test_support::{
        ConflictingEventLog, EmptyEventLog, FixedClock, RecordingEventLog, stored_event,
    };
    use serde_json::json;

    use super::*;

    fn created(item_id: Uuid) -> StoredEvent {
        stored_event(
            item_id,
            1,
            "catalog.item_created",
            &json!({"name": "Oak chair", "sku": "CH-001"}),
        )
    }

    #[tokio::test]
    async fn test_execute_commits_against_replayed_version() {
        // Arrange
        let item_id = Uuid::new_v4();
        let log = Arc::new(RecordingEventLog::new(vec![created(item_id)]));
        let store = CatalogStore::new(log.clone());

        // Act
        let committed = store
            .execute(item_id, &CancellationToken::new(), |item| {
                item.rename("Walnut chair", &FixedClock::default())
            })
            .await
            .unwrap();

        // Assert
        assert_eq!(committed.event_count, 1);
        let appended = log.appended_events();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].1, ExpectedStreamState::Exact(1));
    }

    /// Serves a created item but rejects every append.
    struct AlwaysBehind {
        reads: RecordingEventLog,
        appends: ConflictingEventLog,
    }

    #[async_trait]
    impl EventLog for AlwaysBehind {
        async fn read(
            &self,
            stream_id: Uuid,
            after_version: Option<u64>,
        ) -> Result<Vec<StoredEvent>, DomainError> {
            self.reads.read(stream_id, after_version).await
        }

        async fn append(
            &self,
            stream_id: Uuid,
            expected: ExpectedStreamState,
            events: &[EventRecord],
        ) -> Result<u64, DomainError> {
            self.appends.append(stream_id, expected, events).await
        }
    }

    #[tokio::test]
    async fn test_execute_gives_up_after_max_attempts() {
        // Arrange
        let item_id = Uuid::new_v4();
        let log = Arc::new(AlwaysBehind {
            reads: RecordingEventLog::new(vec![created(item_id)]),
            appends: ConflictingEventLog { actual: 4 },
        });
        let store = CatalogStore::new(log.clone()).with_max_attempts(2);
        let mut calls = 0;

        // Act
        let result = store
            .execute(item_id, &CancellationToken::new(), |item| {
                calls += 1;
                item.rename(&format!("Chair {calls}"), &FixedClock::default())
            })
            .await;

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::ConcurrencyConflict { actual: 4, .. })
        ));
        assert_eq!(calls, 2);
        assert_eq!(log.reads.reads().len(), 2);
    }

    #[tokio::test]
    async fn test_operation_error_skips_the_commit() {
        let item_id = Uuid::new_v4();
        let log = Arc::new(RecordingEventLog::new(vec![created(item_id)]));
        let store = CatalogStore::new(log.clone());

        let result = store
            .execute(item_id, &CancellationToken::new(), |_| {
                Err(DomainError::Validation("nope".into()))
            })
            .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(log.appended_events().is_empty());
    }

    #[tokio::test]
    async fn test_load_of_missing_item_is_not_found() {
        let store = CatalogStore::new(Arc::new(EmptyEventLog));

        let result = store.load(Uuid::new_v4(), &CancellationToken::new()).await;

        assert!(matches!(result, Err(DomainError::StreamNotFound(_))));
    }
}
