//! The walkthrough: create an item, rename it, race several writers on the
//! same stream, then read it back.

use std::sync::Arc;

use rehydrate_catalog::application::command_handlers::{handle_create_item, handle_rename_item};
use rehydrate_catalog::application::query_handlers::{CatalogItemView, get_item_by_id};
use rehydrate_catalog::application::store::CatalogStore;
use rehydrate_catalog::domain::commands::{CreateItem, RenameItem};
use rehydrate_core::clock::Clock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppError;

/// Outcome of the concurrent rename race.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RaceSummary {
    /// Writers whose rename was committed.
    pub committed: u32,
    /// Writers that ran out of attempts.
    pub conflicted: u32,
}

/// Runs the walkthrough against `store` and returns the final view of the
/// item together with the race outcome.
///
/// # Errors
///
/// Returns `AppError::Domain` if a step other than a racing rename fails, and
/// `AppError::Task` if a writer task dies.
#[tracing::instrument(skip(store, clock, cancel))]
pub async fn run(
    store: Arc<CatalogStore>,
    clock: Arc<dyn Clock>,
    writers: u32,
    cancel: &CancellationToken,
) -> Result<(CatalogItemView, RaceSummary), AppError> {
    let item_id = Uuid::new_v4();

    let created = handle_create_item(
        &CreateItem {
            correlation_id: Uuid::new_v4(),
            item_id,
            name: "Oak chair".into(),
            sku: "CH-001".into(),
        },
        clock.as_ref(),
        &store,
        cancel,
    )
    .await?;
    tracing::info!(%item_id, version = created.stream_version, "item created");

    let renamed = handle_rename_item(
        &RenameItem {
            correlation_id: Uuid::new_v4(),
            item_id,
            name: "Walnut chair".into(),
        },
        clock.as_ref(),
        &store,
        cancel,
    )
    .await?;
    tracing::info!(version = renamed.stream_version, "item renamed");

    let summary = race(&store, &clock, item_id, writers, cancel).await?;
    tracing::info!(
        committed = summary.committed,
        conflicted = summary.conflicted,
        "rename race finished"
    );

    let view = get_item_by_id(item_id, &store, cancel).await?;
    Ok((view, summary))
}

async fn race(
    store: &Arc<CatalogStore>,
    clock: &Arc<dyn Clock>,
    item_id: Uuid,
    writers: u32,
    cancel: &CancellationToken,
) -> Result<RaceSummary, AppError> {
    let mut tasks = JoinSet::new();
    for writer in 0..writers {
        let store = Arc::clone(store);
        let clock = Arc::clone(clock);
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let command = RenameItem {
                correlation_id: Uuid::new_v4(),
                item_id,
                name: format!("Chair from writer {writer}"),
            };
            handle_rename_item(&command, clock.as_ref(), &store, &cancel).await
        });
    }

    let mut summary = RaceSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok(committed) => {
                tracing::debug!(version = committed.stream_version, "racing rename committed");
                summary.committed += 1;
            }
            Err(err) if err.is_conflict() => {
                tracing::warn!(%err, "racing rename gave up");
                summary.conflicted += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use rehydrate_core::clock::SystemClock;
    use rehydrate_core::error::DomainError;
    use rehydrate_event_store::in_memory_event_log::InMemoryEventLog;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_walkthrough_commits_every_writer_with_enough_attempts() {
        // Arrange
        let writers = 5;
        let store = Arc::new(
            CatalogStore::new(Arc::new(InMemoryEventLog::new())).with_max_attempts(writers + 1),
        );

        // Act
        let (view, summary) = run(store, Arc::new(SystemClock), writers, &CancellationToken::new())
            .await
            .unwrap();

        // Assert
        assert_eq!(
            summary,
            RaceSummary {
                committed: writers,
                conflicted: 0,
            }
        );
        assert_eq!(view.version, 2 + u64::from(writers));
        assert!(view.name.unwrap().starts_with("Chair from writer"));
    }

    #[tokio::test]
    async fn test_cancelled_walkthrough_stops_before_writing() {
        let log = Arc::new(InMemoryEventLog::new());
        let store = Arc::new(CatalogStore::new(log));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = run(store, Arc::new(SystemClock), 2, &cancel).await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::Cancelled))
        ));
    }
}
